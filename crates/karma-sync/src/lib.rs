//! Karma orchestration
//!
//! Two flows share this crate:
//!
//! 1. **Live updates** — an incoming chat message is parsed into
//!    karma-change events which are applied to the ledger strictly in
//!    source order, with acknowledgement replies for `(notify)` votes.
//! 2. **Migration** — a one-shot reconciliation of the legacy
//!    three-counter storage scheme (`perl.DazKarma.*`) into canonical
//!    `karma.terms.*` records: deduplicate terms that normalize to the
//!    same key, repair counters that drifted apart, write one record per
//!    term.
//!
//! Both are driven by the same two iteration primitives in [`task`]:
//! strictly sequential processing where ordering is part of the contract,
//! and fan-out with a completion barrier where it is not.

pub mod migrate;
pub mod pipeline;
pub mod task;
pub mod transport;

pub use migrate::{
    LegacyCounterSet, Migration, MigrationEvent, MigrationEventHandler, MigrationReport,
};
pub use pipeline::{KarmaPipeline, MessageFilter};
pub use task::{run_parallel, run_sequential, Step};
pub use transport::{ChatTransport, TransportError};
