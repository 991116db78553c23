//! The chat-transport contract.
//!
//! Connecting to a network and receiving messages is outside this crate;
//! the pipeline only needs a way to send one reply back into the channel
//! a message came from.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("reply to {channel} on {network} failed: {reason}")]
    Reply {
        network: String,
        channel: String,
        reason: String,
    },
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Deliver `text` to `channel` on `network`, optionally highlighting
    /// `user` the way the network's conventions do.
    async fn reply(
        &self,
        network: &str,
        channel: &str,
        user: &str,
        text: &str,
        highlight: bool,
    ) -> Result<(), TransportError>;
}
