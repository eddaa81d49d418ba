//! Ticket status state machine
//!
//! Every status may move to every other status. Which moves make sense is a
//! business policy decided by callers, not something this machine enforces.
//! The machine guarantees three things per transition: exactly one history
//! entry recording the status being left, `resolved_at` set on the first move
//! into `resolved`, and `closed_at` set on the first move into `closed`.
//! Neither timestamp is ever cleared.
//!
//! Callers must not request a transition into the status the ticket already
//! has; [`crate::services::TicketService`] rejects that before getting here.

use super::{Status, StatusChange, Ticket};
use chrono::{DateTime, Utc};

/// Actor recorded for transitions driven by reconciliation
pub const REMOTE_SYNC_ACTOR: &str = "remote-sync";

impl Ticket {
    /// Move the ticket to `to`, recording who did it and why
    pub fn transition(
        &mut self,
        to: Status,
        actor: impl Into<String>,
        note: Option<String>,
    ) -> &StatusChange {
        self.transition_at(to, actor, note, Utc::now())
    }

    /// Same as [`Ticket::transition`] with an explicit clock
    pub fn transition_at(
        &mut self,
        to: Status,
        actor: impl Into<String>,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> &StatusChange {
        debug_assert_ne!(self.status, to, "transition into the current status");

        self.status_history.push(StatusChange {
            status: self.status,
            actor: actor.into(),
            changed_at: now,
            note,
        });

        match to {
            Status::Resolved if self.resolved_at.is_none() => self.resolved_at = Some(now),
            Status::Closed if self.closed_at.is_none() => self.closed_at = Some(now),
            _ => {},
        }

        tracing::debug!(
            ticket = %self.display_number,
            from = %self.status,
            to = %to,
            "status transition"
        );

        self.status = to;
        self.updated_at = now;
        &self.status_history[self.status_history.len() - 1]
    }

    /// Most recent history entry, if any
    pub fn last_change(&self) -> Option<&StatusChange> {
        self.status_history.last()
    }
}
