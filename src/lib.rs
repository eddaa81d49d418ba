//! etdesk - support desk with optional external helpdesk mirroring
//!
//! This crate provides:
//! - Tickets with per-day display numbers (`ET-YYYYMMDD-NNNN`) allocated atomically
//! - A permissive status state machine with an append-only history
//! - Categories carrying default priority, tags, assignee and SLA thresholds
//! - Push and pull reconciliation against any REST helpdesk exposing the
//!   contract in [`sync`]

// Allow missing error documentation for internal implementations
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::fn_params_excessive_bools)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::too_many_lines)]

//! # Concurrent Safety
//!
//! Every read-modify-write on the desk's files runs under an exclusive lock
//! file, so several processes may create and update tickets at once. Display
//! numbers come from a per-day counter incremented under that lock and are
//! never handed out twice.
//!
//! # Example
//!
//! ```rust,ignore
//! use etdesk::events::EventBus;
//! use etdesk::services::{NewTicket, TicketService};
//! use etdesk::storage::FileStorage;
//!
//! let storage = FileStorage::new(".etdesk");
//! storage.ensure_directories()?;
//! let service = TicketService::new(storage, "ET", EventBus::new());
//!
//! let ticket = service.create(NewTicket {
//!     subject: "Cannot log in".to_string(),
//!     description: "Password reset mail never arrives".to_string(),
//!     requester: etdesk::core::Requester::new("cust-17"),
//!     ..NewTicket::default()
//! })?;
//! println!("{}", ticket.display_number); // ET-20240115-0001
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod events;
pub mod services;
pub mod storage;
pub mod sync;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use error::{DeskError, Result};
