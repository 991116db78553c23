//! Legacy karma reconciliation.
//!
//! The predecessor bot stored three independent counters per raw term:
//!
//! ```text
//! perl.DazKarma.karma_<term>      running total
//! perl.DazKarma.upkarma_<term>    up-votes
//! perl.DazKarma.downkarma_<term>  down-votes (stored positive)
//! ```
//!
//! Nothing kept them consistent, and raw terms differing only in case or
//! surrounding whitespace were separate keys. This module consolidates the
//! lot into one canonical `karma.terms.<term>` record per normalized term:
//! read all three counters per key, merge duplicates, repair totals, write
//! records. Progress is reported through [`MigrationEvent`]s; the caller
//! decides how to render them.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use karma_store::{normalize_term, PropertyStore, Scope, StoreError, CANONICAL_PREFIX};

use crate::task::{run_parallel, run_sequential, Step};

/// Base namespace of the legacy storage scheme.
pub const LEGACY_BASE: &str = "perl.DazKarma";
/// Relative key prefix (under [`LEGACY_BASE`]) identifying a term's total.
const LEGACY_TERM_PREFIX: &str = "karma_";

pub const LEGACY_TOTAL_PREFIX: &str = "perl.DazKarma.karma_";
pub const LEGACY_UP_PREFIX: &str = "perl.DazKarma.upkarma_";
pub const LEGACY_DOWN_PREFIX: &str = "perl.DazKarma.downkarma_";

/// The three legacy counters of one term while it is being reconciled.
///
/// `down` is negated on read and kept negative through merge and repair;
/// it flips back to a positive magnitude in the canonical write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LegacyCounterSet {
    pub total: i64,
    pub up: i64,
    pub down: i64,
}

impl LegacyCounterSet {
    /// Fold another raw key's counters into this entry (duplicate raw
    /// keys that normalize to the same term).
    pub fn merge(&mut self, other: &LegacyCounterSet) {
        self.total += other.total;
        self.up += other.up;
        self.down += other.down;
    }

    /// Force `up + down == total` by growing whichever side fell behind.
    ///
    /// Returns what changed, for progress reporting.
    pub fn repair(&mut self) -> Repairs {
        let mut repairs = Repairs::default();
        let sum = self.up + self.down;
        if sum < self.total {
            repairs.up = Some((self.up, self.up + (self.total - sum)));
            self.up += self.total - sum;
        } else if sum > self.total {
            repairs.down = Some((self.down, self.down + (self.total - sum)));
            self.down += self.total - sum;
        }
        repairs
    }
}

/// Counter adjustments made by [`LegacyCounterSet::repair`], as
/// `(before, after)` pairs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Repairs {
    pub up: Option<(i64, i64)>,
    pub down: Option<(i64, i64)>,
}

/// Progress and outcome notifications emitted while a migration runs.
#[derive(Debug, Clone)]
pub enum MigrationEvent {
    /// Legacy term keys discovered under the base namespace.
    KeysDiscovered { count: usize },
    /// A raw key mapped to a term that was already reconciled.
    Deduplicated { term: String },
    /// Up-votes were adjusted to close a total mismatch.
    UpvotesRepaired { term: String, from: i64, to: i64 },
    /// Down-votes were adjusted to close a total mismatch.
    DownvotesRepaired { term: String, from: i64, to: i64 },
    /// A term's post-merge, post-repair counters.
    TermMerged {
        term: String,
        counters: LegacyCounterSet,
    },
    /// One raw key fully processed (read + merge + repair).
    KeyProcessed { done: usize, total: usize },
    /// One canonical write attempted.
    StoreProgress { done: usize, total: usize },
    /// A canonical write failed; the run continues.
    WriteFailed { term: String, error: String },
}

pub type MigrationEventHandler = Box<dyn Fn(&MigrationEvent) + Send + Sync>;

/// Outcome counts of a migration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Legacy term keys processed.
    pub keys: usize,
    /// Distinct normalized terms after deduplication.
    pub terms: usize,
    /// Canonical records written successfully.
    pub stored: usize,
    /// Canonical writes that failed.
    pub write_failures: usize,
}

/// One-shot consolidation of a network's legacy counters.
pub struct Migration<S> {
    store: Arc<S>,
    network: String,
    handlers: Vec<MigrationEventHandler>,
}

impl<S> Migration<S>
where
    S: PropertyStore + 'static,
{
    pub fn new(store: Arc<S>, network: &str) -> Migration<S> {
        Migration {
            store,
            network: network.to_string(),
            handlers: Vec::new(),
        }
    }

    /// Register a progress observer.
    pub fn on_event(mut self, handler: MigrationEventHandler) -> Migration<S> {
        self.handlers.push(handler);
        self
    }

    fn emit(&self, event: MigrationEvent) {
        for handler in &self.handlers {
            handler(&event);
        }
    }

    /// Run the full reconciliation.
    ///
    /// Only the initial key listing is fatal; individual canonical write
    /// failures are reported, counted and skipped.
    pub async fn run(&self) -> Result<MigrationReport, StoreError> {
        let scope = Scope::network(&self.network);

        let keys = self.store.property_keys(LEGACY_BASE, &scope).await?;
        let terms: Vec<String> = keys
            .into_iter()
            .filter_map(|key| key.strip_prefix(LEGACY_TERM_PREFIX).map(str::to_string))
            .collect();
        let total_keys = terms.len();
        self.emit(MigrationEvent::KeysDiscovered { count: total_keys });

        let retrieved: Mutex<BTreeMap<String, LegacyCounterSet>> = Mutex::new(BTreeMap::new());
        let done = AtomicUsize::new(0);

        // One raw key fully resolved before the next begins; merge results
        // depend on this ordering.
        {
            let scope = &scope;
            let retrieved = &retrieved;
            let done = &done;
            run_sequential(terms, |raw| async move {
                let mut counters = self.read_legacy_counters(scope, &raw).await;
                let term = normalize_term(&raw);
                if !term.is_empty() {
                    let mut entries = retrieved.lock();
                    if let Some(previous) = entries.get(&term) {
                        counters.merge(previous);
                        self.emit(MigrationEvent::Deduplicated { term: term.clone() });
                    }

                    // Repair runs every time an entry is touched, so with
                    // three or more raw keys collapsing onto one term the
                    // outcome depends on key enumeration order. Kept
                    // as-is: it reproduces the counters the predecessor
                    // migration produced for the same data.
                    let repairs = counters.repair();
                    if let Some((from, to)) = repairs.up {
                        self.emit(MigrationEvent::UpvotesRepaired {
                            term: term.clone(),
                            from,
                            to,
                        });
                    }
                    if let Some((from, to)) = repairs.down {
                        self.emit(MigrationEvent::DownvotesRepaired {
                            term: term.clone(),
                            from,
                            to,
                        });
                    }

                    self.emit(MigrationEvent::TermMerged {
                        term: term.clone(),
                        counters,
                    });
                    entries.insert(term, counters);
                }

                let processed = done.fetch_add(1, Ordering::SeqCst) + 1;
                self.emit(MigrationEvent::KeyProcessed {
                    done: processed,
                    total: total_keys,
                });
                Step::Continue
            })
            .await;
        }

        let retrieved = retrieved.into_inner();
        let term_count = retrieved.len();
        let stored = AtomicUsize::new(0);
        let attempted = AtomicUsize::new(0);
        let write_failures = AtomicUsize::new(0);

        {
            let scope = &scope;
            let stored = &stored;
            let attempted = &attempted;
            let write_failures = &write_failures;
            run_sequential(retrieved, |(term, counters)| async move {
                let key = format!("{CANONICAL_PREFIX}{term}");
                let value = serde_json::json!({
                    "term": term,
                    "up": counters.up,
                    "down": -counters.down,
                })
                .to_string();

                match self.store.set_property(&key, &value, scope).await {
                    Ok(()) => {
                        stored.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(err) => {
                        write_failures.fetch_add(1, Ordering::SeqCst);
                        tracing::error!(%term, %err, "canonical karma write failed");
                        self.emit(MigrationEvent::WriteFailed {
                            term: term.clone(),
                            error: err.to_string(),
                        });
                    }
                }
                let done = attempted.fetch_add(1, Ordering::SeqCst) + 1;
                self.emit(MigrationEvent::StoreProgress {
                    done,
                    total: term_count,
                });
                Step::Continue
            })
            .await;
        }

        Ok(MigrationReport {
            keys: total_keys,
            terms: term_count,
            stored: stored.into_inner(),
            write_failures: write_failures.into_inner(),
        })
    }

    /// Read a raw key's three legacy counters, concurrently. Missing,
    /// unreadable or non-numeric values count as zero; `down` comes back
    /// negated.
    async fn read_legacy_counters(&self, scope: &Scope, raw: &str) -> LegacyCounterSet {
        #[derive(Clone, Copy)]
        enum Field {
            Total,
            Up,
            Down,
        }

        let counters = Arc::new(Mutex::new(LegacyCounterSet::default()));
        run_parallel([Field::Total, Field::Up, Field::Down], |field| {
            let store = Arc::clone(&self.store);
            let scope = scope.clone();
            let raw = raw.to_string();
            let counters = Arc::clone(&counters);
            async move {
                let prefix = match field {
                    Field::Total => LEGACY_TOTAL_PREFIX,
                    Field::Up => LEGACY_UP_PREFIX,
                    Field::Down => LEGACY_DOWN_PREFIX,
                };
                let key = format!("{prefix}{raw}");
                let number = match store.get_property(&key, &scope).await {
                    Ok(Some(value)) => value.trim().parse::<i64>().unwrap_or(0),
                    Ok(None) => 0,
                    Err(err) => {
                        tracing::warn!(%key, %err, "legacy counter read failed, counting as zero");
                        0
                    }
                };
                let mut acc = counters.lock();
                match field {
                    Field::Total => acc.total = number,
                    Field::Up => acc.up = number,
                    Field::Down => acc.down = -number,
                }
            }
        })
        .await;

        let result = *counters.lock();
        result
    }
}
