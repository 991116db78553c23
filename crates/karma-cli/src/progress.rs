//! Rendering of migration progress events.
//!
//! Default mode keeps a rolling percentage line on stdout; `--debug`
//! switches to one verbose line per term, the way the predecessor
//! migration script reported.

use std::io::Write;

use karma_sync::{MigrationEvent, MigrationEventHandler};

pub fn renderer(debug: bool) -> MigrationEventHandler {
    Box::new(move |event| {
        if debug {
            verbose(event);
        } else {
            rolling(event);
        }
    })
}

fn verbose(event: &MigrationEvent) {
    match event {
        MigrationEvent::KeysDiscovered { count } => {
            println!("Got {count} terms, migrating...");
        }
        MigrationEvent::Deduplicated { term } => {
            println!("Deduplicated legacy counters for '{term}'");
        }
        MigrationEvent::UpvotesRepaired { term, from, to } => {
            println!("Adjusted up-votes from {from} to {to} for '{term}'");
        }
        MigrationEvent::DownvotesRepaired { term, from, to } => {
            println!("Adjusted down-votes from {from} to {to} for '{term}'");
        }
        MigrationEvent::TermMerged { term, counters } => {
            println!(
                "\"{term}\" {} (+{}, {})",
                counters.total, counters.up, counters.down
            );
        }
        MigrationEvent::WriteFailed { term, error } => {
            println!("Error storing new value for \"{term}\": {error}");
        }
        MigrationEvent::KeyProcessed { .. } | MigrationEvent::StoreProgress { .. } => {}
    }
}

fn rolling(event: &MigrationEvent) {
    match event {
        MigrationEvent::KeysDiscovered { count } => {
            println!("Got {count} terms, migrating...");
        }
        MigrationEvent::KeyProcessed { done, total } => {
            roll("Parsed", *done, *total);
        }
        MigrationEvent::StoreProgress { done, total } => {
            roll("Stored", *done, *total);
        }
        MigrationEvent::WriteFailed { term, error } => {
            println!("\nError storing new value for \"{term}\": {error}");
        }
        _ => {}
    }
}

fn roll(verb: &str, done: usize, total: usize) {
    let percentage = if total == 0 {
        100.0
    } else {
        done as f64 / total as f64 * 100.0
    };
    print!("{verb} {done}/{total} ({percentage:.2}%)\r");
    let _ = std::io::stdout().flush();
    if done == total {
        println!();
    }
}
