//! Shared fixtures for unit tests

#![cfg(test)]

use crate::core::{
    DEFAULT_PREFIX, DisplayNumber, Priority, Requester, Status, Ticket, TicketBuilder,
};
use crate::events::EventBus;
use crate::services::{NewTicket, TicketService};
use crate::storage::FileStorage;
use chrono::{NaiveDate, Utc};
use std::sync::atomic::{AtomicU32, Ordering};
use tempfile::TempDir;

static NEXT_SEQUENCE: AtomicU32 = AtomicU32::new(1);

/// A desk initialized in a temporary directory
pub struct TestDesk {
    pub temp_dir: TempDir,
    pub storage: FileStorage,
    pub service: TicketService,
}

impl TestDesk {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let storage = FileStorage::new(temp_dir.path().join(".etdesk"));
        storage
            .ensure_directories()
            .expect("Failed to initialize desk");
        let service = TicketService::new(storage.clone(), DEFAULT_PREFIX, EventBus::new());

        Self {
            temp_dir,
            storage,
            service,
        }
    }
}

/// Create an unsaved ticket with a unique display number
pub fn create_test_ticket(subject: &str, priority: Priority, status: Status) -> Ticket {
    let sequence = NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed) % 9999 + 1;
    let date = NaiveDate::from_ymd_opt(2024, 1, 15).expect("valid date");
    let number = DisplayNumber::new(DEFAULT_PREFIX, date, sequence).expect("valid display number");

    let mut ticket = TicketBuilder::new(number)
        .subject(subject)
        .description(format!("Description for {subject}"))
        .priority(priority)
        .status(status)
        .requester(Requester::new("cust-1").with_email("customer@example.com"))
        .build();
    let now = Utc::now();
    if matches!(status, Status::Resolved | Status::Closed) {
        ticket.resolved_at = Some(now);
    }
    if status == Status::Closed {
        ticket.closed_at = Some(now);
    }
    ticket
}

/// Valid creation input from a single requester
pub fn new_ticket(subject: &str) -> NewTicket {
    NewTicket {
        subject: subject.to_string(),
        description: format!("Details about {subject}"),
        requester: Requester::new("cust-1"),
        ..NewTicket::default()
    }
}
