//! Ticket lifecycle notifications
//!
//! Services publish onto a `tokio::sync::broadcast` channel; any number of
//! subscribers may listen. Publishing never fails: with no subscribers the
//! event is dropped.

use crate::core::{Status, Ticket, TicketId};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 100;

/// Event types emitted by the desk
#[derive(Debug, Clone)]
pub enum DeskEvent {
    TicketCreated {
        ticket: Box<Ticket>,
    },
    StatusChanged {
        ticket_id: TicketId,
        old_status: Status,
        new_status: Status,
    },
    CommentAdded {
        ticket_id: TicketId,
        external: bool,
    },
    TicketSynced {
        ticket_id: TicketId,
        external_id: String,
    },
}

/// Broadcast hub shared by the services
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DeskEvent>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Get an event receiver
    pub fn subscribe(&self) -> broadcast::Receiver<DeskEvent> {
        self.sender.subscribe()
    }

    pub fn ticket_created(&self, ticket: &Ticket) {
        tracing::info!(ticket = %ticket.display_number, "ticket created");
        self.publish(DeskEvent::TicketCreated {
            ticket: Box::new(ticket.clone()),
        });
    }

    pub fn status_changed(&self, ticket: &Ticket, old_status: Status) {
        tracing::info!(
            ticket = %ticket.display_number,
            from = %old_status,
            to = %ticket.status,
            "status changed"
        );
        self.publish(DeskEvent::StatusChanged {
            ticket_id: ticket.id.clone(),
            old_status,
            new_status: ticket.status,
        });
    }

    pub fn comment_added(&self, ticket_id: &TicketId, external: bool) {
        self.publish(DeskEvent::CommentAdded {
            ticket_id: ticket_id.clone(),
            external,
        });
    }

    pub fn ticket_synced(&self, ticket: &Ticket, external_id: &str) {
        tracing::info!(
            ticket = %ticket.display_number,
            external_id,
            "ticket reconciled"
        );
        self.publish(DeskEvent::TicketSynced {
            ticket_id: ticket.id.clone(),
            external_id: external_id.to_string(),
        });
    }

    fn publish(&self, event: DeskEvent) {
        // No receivers is fine
        let _ = self.sender.send(event);
    }
}
