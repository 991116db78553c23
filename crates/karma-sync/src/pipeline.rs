//! Live update pipeline: one chat message in, ledger mutations and
//! acknowledgement replies out.

use std::sync::Arc;

use karma_grammar::{parse_message, ChangeKind, Direction, KarmaChange};
use karma_store::{KarmaLedger, PropertyStore};

use crate::task::{run_sequential, Step};
use crate::transport::ChatTransport;

/// Decides whether a message may change karma at all (e.g. bot commands
/// are addressed to the bot, not karma text). Injected by the embedder.
pub type MessageFilter = Box<dyn Fn(&str) -> bool + Send + Sync>;

pub struct KarmaPipeline<S, T> {
    ledger: Arc<KarmaLedger<S>>,
    transport: Arc<T>,
    filter: MessageFilter,
}

impl<S, T> KarmaPipeline<S, T>
where
    S: PropertyStore,
    T: ChatTransport,
{
    /// A pipeline that considers every message.
    pub fn new(ledger: Arc<KarmaLedger<S>>, transport: Arc<T>) -> KarmaPipeline<S, T> {
        Self::with_filter(ledger, transport, Box::new(|_| true))
    }

    pub fn with_filter(
        ledger: Arc<KarmaLedger<S>>,
        transport: Arc<T>,
        filter: MessageFilter,
    ) -> KarmaPipeline<S, T> {
        KarmaPipeline {
            ledger,
            transport,
            filter,
        }
    }

    pub fn ledger(&self) -> &Arc<KarmaLedger<S>> {
        &self.ledger
    }

    /// Process one incoming message.
    ///
    /// Events from a single message are applied strictly in source order,
    /// one ledger mutation in flight at a time, so a later `(notify)`
    /// reply reflects every change up to and including its own. A message
    /// that does not tokenize is logged and contributes nothing; a store
    /// failure for one event drops that event's reply and processing
    /// continues with the next event.
    pub async fn handle_message(&self, network: &str, user: &str, channel: &str, message: &str) {
        if !(self.filter)(message) {
            tracing::trace!(network, channel, "message filtered, skipping");
            return;
        }

        let changes = match parse_message(message) {
            Ok(changes) => changes,
            Err(err) => {
                tracing::warn!(network, channel, user, %err, "parse error while processing message");
                return;
            }
        };

        run_sequential(changes, |change| async move {
            self.apply_change(network, user, channel, &change).await;
            Step::Continue
        })
        .await;
    }

    async fn apply_change(&self, network: &str, user: &str, channel: &str, change: &KarmaChange) {
        let (verb, result) = match change.direction {
            Direction::Up(magnitude) => (
                "increased",
                self.ledger
                    .add_karma(network, user, &change.term, magnitude)
                    .await,
            ),
            Direction::Down(magnitude) => (
                "decreased",
                self.ledger
                    .remove_karma(network, user, &change.term, magnitude)
                    .await,
            ),
        };

        let score = match result {
            Ok(score) => score,
            Err(err) => {
                tracing::error!(network, term = %change.term, %err, "karma update failed");
                return;
            }
        };

        if change.kind == ChangeKind::Notify {
            let text = format!(
                "{user} {verb} the karma of {term} to {score}",
                term = change.term
            );
            if let Err(err) = self
                .transport
                .reply(network, channel, user, &text, false)
                .await
            {
                tracing::warn!(network, channel, %err, "acknowledgement reply failed");
            }
        }
    }
}
