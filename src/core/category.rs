use super::{Priority, Ticket};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Response and resolution targets, in hours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaThresholds {
    pub response_hours: u32,
    pub resolution_hours: u32,
}

impl Default for SlaThresholds {
    fn default() -> Self {
        Self {
            response_hours: 24,
            resolution_hours: 72,
        }
    }
}

impl SlaThresholds {
    pub const fn new(response_hours: u32, resolution_hours: u32) -> Self {
        Self {
            response_hours,
            resolution_hours,
        }
    }

    pub const fn response_minutes(&self) -> u64 {
        self.response_hours as u64 * 60
    }

    pub const fn resolution_minutes(&self) -> u64 {
        self.resolution_hours as u64 * 60
    }
}

/// A ticket category with its defaults and SLA
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub default_priority: Priority,
    #[serde(default)]
    pub default_tags: Vec<String>,
    /// Staff member new tickets in this category are assigned to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_assign_to: Option<String>,
    #[serde(default)]
    pub sla: SlaThresholds,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            default_priority: Priority::default(),
            default_tags: Vec::new(),
            auto_assign_to: None,
            sla: SlaThresholds::default(),
            is_default: false,
            is_active: true,
        }
    }

    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.default_priority = priority;
        self
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn with_sla(mut self, response_hours: u32, resolution_hours: u32) -> Self {
        self.sla = SlaThresholds::new(response_hours, resolution_hours);
        self
    }

    #[must_use]
    pub fn with_auto_assign(mut self, assignee: impl Into<String>) -> Self {
        self.auto_assign_to = Some(assignee.into());
        self
    }

    #[must_use]
    pub const fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn response_due(&self, created_at: DateTime<Utc>) -> DateTime<Utc> {
        created_at + Duration::hours(i64::from(self.sla.response_hours))
    }

    pub fn resolution_due(&self, created_at: DateTime<Utc>) -> DateTime<Utc> {
        created_at + Duration::hours(i64::from(self.sla.resolution_hours))
    }

    /// Report how a ticket stands against this category's SLA
    pub fn sla_report(&self, ticket: &Ticket, now: DateTime<Utc>) -> SlaReport {
        let response_due = self.response_due(ticket.created_at);
        let resolution_due = self.resolution_due(ticket.created_at);
        SlaReport {
            response_due,
            resolution_due,
            response_breached: ticket.first_response_at.unwrap_or(now) > response_due,
            resolution_breached: ticket.resolved_at.unwrap_or(now) > resolution_due,
        }
    }
}

/// Where a ticket stands against its category SLA; informational only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlaReport {
    pub response_due: DateTime<Utc>,
    pub resolution_due: DateTime<Utc>,
    pub response_breached: bool,
    pub resolution_breached: bool,
}
