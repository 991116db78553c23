//! Karma expression grammar
//!
//! This crate turns a free-form chat message into an ordered sequence of
//! structured karma-change events. The grammar recognizes expressions like
//! `widget++`, `"coffee machine"--` or `cake++ (notify)` anywhere inside a
//! message; everything that is not a karma expression is skipped.
//!
//! The parser is pure and synchronous: deciding what the events *mean*
//! (ledger updates, replies) is the job of the pipeline crate.

pub mod change;
pub mod expr;

pub use change::{ChangeKind, Direction, KarmaChange};
pub use expr::{parse_message, ParseError};
