use super::TicketId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a comment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(Uuid);

impl CommentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CommentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A comment on a ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub ticket_id: TicketId,
    pub author_id: String,
    pub body: String,
    /// `None` means the author did not choose; treated as public
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    /// Id of the matching conversation entry in the external helpdesk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(ticket_id: TicketId, author_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: CommentId::new(),
            ticket_id,
            author_id: author_id.into(),
            body: body.into(),
            is_public: None,
            external_id: None,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub const fn with_visibility(mut self, is_public: bool) -> Self {
        self.is_public = Some(is_public);
        self
    }

    /// Visible to the requester unless explicitly marked internal
    pub fn is_visible_publicly(&self) -> bool {
        self.is_public != Some(false)
    }
}
