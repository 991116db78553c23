//! `karma watch`: a stdio stand-in for a chat network.
//!
//! Every stdin line is treated as one channel message from the configured
//! user; acknowledgement replies come back on stdout. Useful for poking at
//! the pipeline and for driving the store file without a chat connection.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};

use karma_store::{FileStore, KarmaLedger};
use karma_sync::{ChatTransport, KarmaPipeline, TransportError};

/// Prints replies to stdout instead of a chat network.
struct StdioTransport;

#[async_trait]
impl ChatTransport for StdioTransport {
    async fn reply(
        &self,
        _network: &str,
        channel: &str,
        user: &str,
        text: &str,
        highlight: bool,
    ) -> Result<(), TransportError> {
        if highlight {
            println!("[{channel}] {user}: {text}");
        } else {
            println!("[{channel}] {text}");
        }
        Ok(())
    }
}

pub async fn run(
    store_path: &Path,
    network: &str,
    user: &str,
    channel: &str,
    highlight_char: char,
) -> Result<()> {
    let store = Arc::new(FileStore::open(store_path)?);
    let ledger = Arc::new(KarmaLedger::new(store));
    let pipeline = KarmaPipeline::with_filter(
        ledger,
        Arc::new(StdioTransport),
        Box::new(move |message| !message.starts_with(highlight_char)),
    );

    tracing::info!(network, user, channel, "watching stdin for karma expressions");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        pipeline.handle_message(network, user, channel, &line).await;
    }
    Ok(())
}
