//! Contract with the external helpdesk
//!
//! Any REST helpdesk that exposes these five endpoints can back the
//! reconciliation engine:
//!
//! ```text
//! POST /tickets                     create
//! PUT  /tickets/{id}                update
//! GET  /tickets/{id}                fetch
//! GET  /tickets/{id}/conversations  list replies and notes
//! POST /tickets/{id}/notes          add a note
//! ```

use super::mapping::{RemoteCode, RemoteEnum};
use crate::core::{ChangedFields, Comment, Ticket, TicketField};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of `POST /tickets`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateTicketRequest {
    pub subject: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub priority: RemoteCode,
    pub status: RemoteCode,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_fields: BTreeMap<String, serde_json::Value>,
}

impl CreateTicketRequest {
    pub fn from_ticket(ticket: &Ticket) -> Self {
        Self {
            subject: ticket.subject.clone(),
            description: ticket.description.clone(),
            email: ticket.requester.email.clone(),
            name: ticket.requester.name.clone(),
            phone: ticket.requester.phone.clone(),
            priority: ticket.priority.to_remote(),
            status: ticket.status.to_remote(),
            tags: ticket.tags.clone(),
            custom_fields: ticket.custom_fields.clone(),
        }
    }
}

/// Body of `PUT /tickets/{id}`; absent fields are left alone remotely
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateTicketRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<RemoteCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RemoteCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl UpdateTicketRequest {
    /// Carry only the fields named in `changed`
    pub fn from_changes(ticket: &Ticket, changed: &ChangedFields) -> Self {
        let mut request = Self::default();
        for field in changed {
            match field {
                TicketField::Subject => request.subject = Some(ticket.subject.clone()),
                TicketField::Description => {
                    request.description = Some(ticket.description.clone());
                },
                TicketField::Priority => request.priority = Some(ticket.priority.to_remote()),
                TicketField::Status => request.status = Some(ticket.status.to_remote()),
                TicketField::Tags => request.tags = Some(ticket.tags.clone()),
            }
        }
        request
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Ticket as returned by the helpdesk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteTicket {
    pub id: u64,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub description: String,
    pub priority: RemoteCode,
    pub status: RemoteCode,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Reply or note on a helpdesk ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConversation {
    pub id: u64,
    #[serde(default)]
    pub body_text: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `POST /tickets/{id}/notes`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateNoteRequest {
    pub body: String,
    pub private: bool,
}

impl CreateNoteRequest {
    pub fn from_comment(comment: &Comment) -> Self {
        Self {
            body: comment.body.clone(),
            private: !comment.is_visible_publicly(),
        }
    }
}

/// Operations the reconciliation engine needs from a helpdesk
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteHelpdesk: Send + Sync {
    async fn create_ticket(&self, request: &CreateTicketRequest) -> Result<RemoteTicket>;

    async fn update_ticket(
        &self,
        remote_id: &str,
        request: &UpdateTicketRequest,
    ) -> Result<RemoteTicket>;

    async fn get_ticket(&self, remote_id: &str) -> Result<RemoteTicket>;

    async fn conversations(&self, remote_id: &str) -> Result<Vec<RemoteConversation>>;

    async fn create_note(
        &self,
        remote_id: &str,
        request: &CreateNoteRequest,
    ) -> Result<RemoteConversation>;

    /// Human-facing link to the helpdesk ticket
    fn ticket_url(&self, remote_id: &str) -> String;
}
