//! In-memory property store.
//!
//! Backs tests and local experiments. Keys are bucketed per scope; the
//! whole thing is just a concurrent map. Write and read failures can be
//! injected to exercise the error paths of the ledger, the pipeline and
//! the migration without a misbehaving service.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::store::{PropertyStore, Scope, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    properties: DashMap<(Scope, String), String>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    /// Make every subsequent `get_property` fail.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `set_property` fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Seed a property without going through the async contract.
    pub fn seed(&self, network: &str, key: &str, value: &str) {
        self.properties
            .insert((Scope::network(network), key.to_string()), value.to_string());
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

#[async_trait]
impl PropertyStore for MemoryStore {
    async fn get_property(&self, key: &str, scope: &Scope) -> Result<Option<String>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Read {
                key: key.to_string(),
                reason: "injected read failure".to_string(),
            });
        }
        Ok(self
            .properties
            .get(&(scope.clone(), key.to_string()))
            .map(|entry| entry.value().clone()))
    }

    async fn set_property(&self, key: &str, value: &str, scope: &Scope) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Write {
                key: key.to_string(),
                reason: "injected write failure".to_string(),
            });
        }
        self.properties
            .insert((scope.clone(), key.to_string()), value.to_string());
        Ok(())
    }

    async fn property_keys(&self, prefix: &str, scope: &Scope) -> Result<Vec<String>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Keys {
                prefix: prefix.to_string(),
                reason: "injected read failure".to_string(),
            });
        }
        let namespace = format!("{prefix}.");
        let mut keys: Vec<String> = self
            .properties
            .iter()
            .filter(|entry| entry.key().0 == *scope)
            .filter_map(|entry| {
                entry
                    .key()
                    .1
                    .strip_prefix(&namespace)
                    .map(str::to_string)
            })
            .collect();
        keys.sort();
        Ok(keys)
    }
}
