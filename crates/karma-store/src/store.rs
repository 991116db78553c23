//! The asynchronous property-store contract.
//!
//! Modeled on the network bot's property service: string keys, string
//! values, scoped per chat network. The transport behind it (unix socket,
//! TCP, local file) is not this crate's concern.

use async_trait::async_trait;
use thiserror::Error;

/// Visibility scope for a property.
///
/// Karma state is always network-scoped; the scope is still an explicit
/// value (rather than a bare `&str`) to keep room for the service's wider
/// receiver/sender scoping without changing the trait.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope {
    network: String,
}

impl Scope {
    pub fn network(network: &str) -> Scope {
        Scope {
            network: network.to_string(),
        }
    }

    pub fn network_name(&self) -> &str {
        &self.network
    }
}

/// A failed store round-trip.
///
/// Surfaced to the caller as a failed result; the store layer never
/// retries on its own. Retry policy, if any, belongs to the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("property read failed for '{key}': {reason}")]
    Read { key: String, reason: String },
    #[error("property write failed for '{key}': {reason}")]
    Write { key: String, reason: String },
    #[error("property key listing failed for prefix '{prefix}': {reason}")]
    Keys { prefix: String, reason: String },
    #[error("stored value for '{key}' is not valid JSON: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Request/response contract of the external property store.
///
/// All operations are asynchronous and may fail; `get_property` returning
/// `Ok(None)` means the key is absent, which is not an error.
#[async_trait]
pub trait PropertyStore: Send + Sync {
    async fn get_property(&self, key: &str, scope: &Scope) -> Result<Option<String>, StoreError>;

    async fn set_property(&self, key: &str, value: &str, scope: &Scope) -> Result<(), StoreError>;

    /// All keys in the `prefix` namespace within `scope`, returned
    /// relative to the namespace: for a stored key `perl.DazKarma.karma_x`
    /// and prefix `perl.DazKarma`, the listing contains `karma_x`.
    async fn property_keys(&self, prefix: &str, scope: &Scope) -> Result<Vec<String>, StoreError>;
}
