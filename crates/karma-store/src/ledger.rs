//! The canonical karma ledger.
//!
//! One durable record per `(network, normalized term)` at
//! `karma.terms.<term>`, holding non-negative up/down counters. Live
//! updates only ever add magnitude to one side; there is no undo, so both
//! counters are monotonically non-decreasing.
//!
//! Updates are read-modify-write against a remote store, so the ledger
//! serializes them per key with an async mutex: two concurrent votes for
//! the same term on the same network cannot overwrite one another, even
//! when messages arrive from multiple channels at once.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::store::{PropertyStore, Scope, StoreError};
use crate::term::normalize_term;
use crate::CANONICAL_PREFIX;

/// Canonical per-term counters, exactly the JSON shape at
/// `karma.terms.<term>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KarmaRecord {
    pub term: String,
    pub up: u64,
    pub down: u64,
}

impl KarmaRecord {
    pub fn new(term: &str) -> KarmaRecord {
        KarmaRecord {
            term: normalize_term(term),
            up: 0,
            down: 0,
        }
    }

    /// Up-votes minus down-votes.
    pub fn score(&self) -> i64 {
        self.up as i64 - self.down as i64
    }
}

impl std::fmt::Display for KarmaRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.score() {
            0 => write!(
                f,
                "{} has neutral karma (+{}, -{})",
                self.term, self.up, self.down
            ),
            score => write!(
                f,
                "{} has a karma of {} (+{}, -{})",
                self.term, score, self.up, self.down
            ),
        }
    }
}

/// Ledger over an external property store.
///
/// A record that fails to deserialize is treated like an absent record
/// for updates (logged, then rebuilt from the incoming vote) so one bad
/// value cannot wedge a term forever; plain reads surface it as
/// [`StoreError::Corrupt`] instead.
pub struct KarmaLedger<S> {
    store: Arc<S>,
    update_locks: DashMap<(String, String), Arc<Mutex<()>>>,
}

impl<S: PropertyStore> KarmaLedger<S> {
    pub fn new(store: Arc<S>) -> KarmaLedger<S> {
        KarmaLedger {
            store,
            update_locks: DashMap::new(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Add `magnitude` up-votes for `term`, creating the record if absent.
    /// Returns the post-update score.
    pub async fn add_karma(
        &self,
        network: &str,
        user: &str,
        term: &str,
        magnitude: u32,
    ) -> Result<i64, StoreError> {
        self.apply(network, user, term, u64::from(magnitude), 0).await
    }

    /// Add `magnitude` down-votes for `term`, symmetrically.
    pub async fn remove_karma(
        &self,
        network: &str,
        user: &str,
        term: &str,
        magnitude: u32,
    ) -> Result<i64, StoreError> {
        self.apply(network, user, term, 0, u64::from(magnitude)).await
    }

    /// The current record for `term`, or `None` if nobody voted yet.
    pub async fn get_karma(
        &self,
        network: &str,
        term: &str,
    ) -> Result<Option<KarmaRecord>, StoreError> {
        let normalized = normalize_term(term);
        let key = record_key(&normalized);
        let scope = Scope::network(network);
        match self.store.get_property(&key, &scope).await? {
            Some(value) => {
                let record =
                    serde_json::from_str(&value).map_err(|err| StoreError::Corrupt {
                        key: key.clone(),
                        source: err,
                    })?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn apply(
        &self,
        network: &str,
        user: &str,
        term: &str,
        up: u64,
        down: u64,
    ) -> Result<i64, StoreError> {
        let normalized = normalize_term(term);
        let key = record_key(&normalized);
        let scope = Scope::network(network);

        let lock = self
            .update_locks
            .entry((network.to_string(), normalized.clone()))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let mut record = match self.store.get_property(&key, &scope).await? {
            Some(value) => serde_json::from_str(&value).unwrap_or_else(|err| {
                tracing::warn!(%key, %err, "discarding corrupt karma record");
                KarmaRecord::new(&normalized)
            }),
            None => KarmaRecord::new(&normalized),
        };

        record.up += up;
        record.down += down;

        let value = serde_json::to_string(&record).map_err(|err| StoreError::Write {
            key: key.clone(),
            reason: err.to_string(),
        })?;
        self.store.set_property(&key, &value, &scope).await?;

        tracing::debug!(
            network,
            user,
            term = %record.term,
            up,
            down,
            score = record.score(),
            "karma updated"
        );
        Ok(record.score())
    }
}

fn record_key(normalized_term: &str) -> String {
    format!("{CANONICAL_PREFIX}{normalized_term}")
}
