//! Karma CLI
//!
//! Unified command-line interface for:
//! - Migrating legacy `perl.DazKarma.*` counters into canonical records
//! - Watching a line stream and applying karma expressions live
//! - Parsing a message into karma-change events (debugging aid)
//! - Showing a term's current record

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use karma_store::{FileStore, KarmaLedger};
use karma_sync::Migration;

mod progress;
mod watch;

#[derive(Parser)]
#[command(name = "karma")]
#[command(author, version, about = "Karma tracker for chat networks")]
struct Cli {
    /// Path to the JSON property-store file.
    #[arg(long, global = true, default_value = "karma-store.json")]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Consolidate legacy three-counter karma data into canonical records.
    Migrate {
        /// Network whose data to migrate.
        #[arg(long)]
        network: String,
        /// Per-term verbose logging instead of a rolling progress line.
        #[arg(long)]
        debug: bool,
    },

    /// Read chat lines from stdin and apply karma expressions live.
    Watch {
        /// Network the lines belong to.
        #[arg(long)]
        network: String,
        /// Nick attributed to the incoming lines.
        #[arg(long, default_value = "console")]
        user: String,
        /// Channel used for replies.
        #[arg(long, default_value = "#console")]
        channel: String,
        /// Lines starting with this character are commands for the bot
        /// and never change karma.
        #[arg(long, default_value = "}")]
        highlight_char: char,
    },

    /// Parse a message and print the karma-change events as JSON.
    Parse {
        /// The message to parse.
        message: String,
    },

    /// Show a term's canonical karma record.
    Show {
        /// Network to look in.
        #[arg(long)]
        network: String,
        /// The term to look up.
        term: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Migrate { network, debug } => migrate(&cli.store, &network, debug).await,
        Commands::Watch {
            network,
            user,
            channel,
            highlight_char,
        } => watch::run(&cli.store, &network, &user, &channel, highlight_char).await,
        Commands::Parse { message } => parse(&message),
        Commands::Show { network, term } => show(&cli.store, &network, &term).await,
    }
}

async fn migrate(store_path: &std::path::Path, network: &str, debug: bool) -> Result<()> {
    let store = Arc::new(FileStore::open(store_path)?);

    println!("Starting migration for network '{network}'...");
    let report = Migration::new(store, network)
        .on_event(progress::renderer(debug))
        .run()
        .await?;

    println!(
        "{}",
        format!(
            "Done, karma for network '{network}' migrated! ({} keys, {} terms, {} stored, {} failed)",
            report.keys, report.terms, report.stored, report.write_failures
        )
        .green()
    );
    if report.write_failures > 0 {
        anyhow::bail!("{} canonical writes failed", report.write_failures);
    }
    Ok(())
}

fn parse(message: &str) -> Result<()> {
    let changes = karma_grammar::parse_message(message)?;
    println!("{}", serde_json::to_string_pretty(&changes)?);
    Ok(())
}

async fn show(store_path: &std::path::Path, network: &str, term: &str) -> Result<()> {
    let store = Arc::new(FileStore::open(store_path)?);
    let ledger = KarmaLedger::new(store);
    match ledger.get_karma(network, term).await? {
        Some(record) => println!("{record}"),
        None => println!("{} has no karma yet", term.trim()),
    }
    Ok(())
}
