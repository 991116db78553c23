//! Event types produced by the karma expression grammar.

use serde::{Deserialize, Serialize};

/// Whether a change wants an acknowledgement reply.
///
/// `Vote` is the default: the score changes and nobody is told. `Notify`
/// is requested explicitly in the message (trailing `(notify)` marker) and
/// asks for one reply carrying the post-update score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Vote,
    Notify,
}

impl Default for ChangeKind {
    fn default() -> Self {
        ChangeKind::Vote
    }
}

/// Direction and magnitude of a karma change.
///
/// The magnitude is always at least 1; it comes from the length of the
/// operator run in the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "direction", content = "magnitude", rename_all = "snake_case")]
pub enum Direction {
    Up(u32),
    Down(u32),
}

impl Direction {
    /// The operator-run magnitude, regardless of direction.
    pub fn magnitude(&self) -> u32 {
        match *self {
            Direction::Up(n) | Direction::Down(n) => n,
        }
    }
}

/// One recognized karma expression.
///
/// `term` is the raw operand with surrounding whitespace trimmed; it is
/// *not* lowercased here. Normalization to a ledger key happens at the
/// store boundary so replies can echo the term as the user wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KarmaChange {
    pub term: String,
    #[serde(default)]
    pub kind: ChangeKind,
    #[serde(flatten)]
    pub direction: Direction,
}

impl KarmaChange {
    pub fn new(term: &str, direction: Direction, kind: ChangeKind) -> KarmaChange {
        KarmaChange {
            term: term.trim().to_string(),
            kind,
            direction,
        }
    }
}
