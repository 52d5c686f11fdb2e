//! Ledger change notifications.
//!
//! The [`Engine`](crate::Engine) tells an injected [`LedgerNotifier`] about
//! every committed change to a room's ledger. Publishing is fire-and-forget:
//! a failed or lagging subscriber never fails the mutation that produced the
//! event.

use std::fmt;

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{Expense, Message, RoomSummary};

/// A change to a room's ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerEvent {
    ExpenseAdded(Expense),
    ExpenseUpdated(Expense),
    ExpenseDeleted { expense_id: Uuid },
    NewMessage(Message),
    SummaryUpdated(RoomSummary),
}

impl LedgerEvent {
    /// Event name on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ExpenseAdded(_) => "expense_added",
            Self::ExpenseUpdated(_) => "expense_updated",
            Self::ExpenseDeleted { .. } => "expense_deleted",
            Self::NewMessage(_) => "new_message",
            Self::SummaryUpdated(_) => "summary_updated",
        }
    }
}

/// An event tagged with the room it belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoomEvent {
    pub room_id: String,
    pub event: LedgerEvent,
}

/// Sink for ledger events.
pub trait LedgerNotifier: Send + Sync {
    fn publish(&self, room_id: &str, event: LedgerEvent);
}

/// Drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotifier;

impl LedgerNotifier for NoopNotifier {
    fn publish(&self, _room_id: &str, _event: LedgerEvent) {}
}

/// Fans events out to every subscriber through a tokio broadcast channel.
#[derive(Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<RoomEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RoomEvent> {
        self.sender.subscribe()
    }
}

impl fmt::Debug for BroadcastNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BroadcastNotifier")
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

impl LedgerNotifier for BroadcastNotifier {
    fn publish(&self, room_id: &str, event: LedgerEvent) {
        tracing::trace!(room_id, kind = event.kind(), "publishing ledger event");
        // No receivers is not an error.
        let _ = self.sender.send(RoomEvent {
            room_id: room_id.to_string(),
            event,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Currency, summarize};

    fn summary(room_id: &str) -> RoomSummary {
        summarize(room_id, Currency::default(), &[], ["a"])
    }

    #[tokio::test]
    async fn broadcast_delivers_to_every_subscriber() {
        let notifier = BroadcastNotifier::new(8);
        let mut first = notifier.subscribe();
        let mut second = notifier.subscribe();

        notifier.publish("r1", LedgerEvent::SummaryUpdated(summary("r1")));

        for rx in [&mut first, &mut second] {
            let event = rx.recv().await.unwrap();
            assert_eq!(event.room_id, "r1");
            assert_eq!(event.event.kind(), "summary_updated");
        }
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let notifier = BroadcastNotifier::new(1);
        notifier.publish(
            "r1",
            LedgerEvent::ExpenseDeleted {
                expense_id: Uuid::nil(),
            },
        );
        NoopNotifier.publish("r1", LedgerEvent::SummaryUpdated(summary("r1")));
    }
}
