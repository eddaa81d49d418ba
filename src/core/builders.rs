use super::{Channel, DisplayNumber, Priority, Requester, Status, Ticket, TicketId};
use chrono::Utc;
use std::collections::BTreeMap;

/// Builder for creating Ticket instances
///
/// A display number is mandatory, everything else has a default.
pub struct TicketBuilder {
    display_number: DisplayNumber,
    subject: Option<String>,
    description: Option<String>,
    category: Option<String>,
    priority: Option<Priority>,
    status: Option<Status>,
    tags: Vec<String>,
    requester: Requester,
    assignee: Option<String>,
    channel: Channel,
    custom_fields: BTreeMap<String, serde_json::Value>,
}

impl TicketBuilder {
    /// Create a new ticket builder
    #[must_use]
    pub fn new(display_number: DisplayNumber) -> Self {
        Self {
            display_number,
            subject: None,
            description: None,
            category: None,
            priority: None,
            status: None,
            tags: Vec::new(),
            requester: Requester::default(),
            assignee: None,
            channel: Channel::default(),
            custom_fields: BTreeMap::new(),
        }
    }

    /// Set the subject
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the description
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the category name
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the priority
    #[must_use]
    pub const fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the status
    #[must_use]
    pub const fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    /// Add a single tag
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Set the requester
    #[must_use]
    pub fn requester(mut self, requester: Requester) -> Self {
        self.requester = requester;
        self
    }

    /// Set assignee
    #[must_use]
    pub fn assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    /// Set the origin channel
    #[must_use]
    pub const fn channel(mut self, channel: Channel) -> Self {
        self.channel = channel;
        self
    }

    /// Set a custom field
    #[must_use]
    pub fn custom_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.custom_fields.insert(key.into(), value);
        self
    }

    /// Set all custom fields
    #[must_use]
    pub fn custom_fields(mut self, fields: BTreeMap<String, serde_json::Value>) -> Self {
        self.custom_fields = fields;
        self
    }

    /// Build the ticket
    pub fn build(self) -> Ticket {
        let created_at = Utc::now();
        Ticket {
            id: TicketId::new(),
            display_number: self.display_number,
            subject: self.subject.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            category: self.category,
            priority: self.priority.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            tags: self.tags,
            requester: self.requester,
            assignee: self.assignee,
            channel: self.channel,
            external_id: None,
            external_url: None,
            last_synced_at: None,
            first_response_at: None,
            resolved_at: None,
            closed_at: None,
            status_history: Vec::new(),
            custom_fields: self.custom_fields,
            created_at,
            updated_at: created_at,
        }
    }
}
