//! Karma storage layer
//!
//! Provides the pieces between a karma-change event and durable state:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      KARMA LEDGER                        │
//! │                                                          │
//! │  add/remove/get ──► per-key lock ──► read-modify-write   │
//! │                                          │               │
//! │                                          ▼               │
//! │                                  PropertyStore trait     │
//! │                                  (memory / JSON file /   │
//! │                                   remote service)        │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The property store is an opaque external key-value service; this crate
//! only pins down its request/response contract and ships two local
//! backends (in-memory and JSON-file) so the ledger can be used and tested
//! without a network service.

pub mod file;
pub mod ledger;
pub mod memory;
pub mod store;
pub mod term;


pub use file::FileStore;
pub use ledger::{KarmaLedger, KarmaRecord};
pub use memory::MemoryStore;
pub use store::{PropertyStore, Scope, StoreError};
pub use term::normalize_term;

/// Key prefix for canonical per-term records.
pub const CANONICAL_PREFIX: &str = "karma.terms.";
