//! Reconciliation with an external helpdesk
//!
//! The desk works fully offline. When helpdesk credentials are configured,
//! tickets and comments can be pushed to the helpdesk and its state pulled
//! back. Without credentials every operation here fails with
//! [`crate::DeskError::IntegrationDisabled`].

mod engine;
mod http;
mod mapping;
mod remote;

pub use engine::{
    PULLED_STATUS_NOTE, ReconciliationEngine, RemoteLink, SkippedFile, SyncFailure, SyncReport,
};
pub use http::HttpHelpdesk;
pub use mapping::{RemoteCode, RemoteEnum};
pub use remote::{
    CreateNoteRequest, CreateTicketRequest, RemoteConversation, RemoteHelpdesk, RemoteTicket,
    UpdateTicketRequest,
};
