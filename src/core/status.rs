use crate::error::DeskError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ticket status
///
/// The set is closed: no other value can be stored on a ticket. Any status
/// may move to any other; see [`crate::core::lifecycle`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Open,
    InProgress,
    PendingCustomer,
    Resolved,
    Closed,
}

impl Status {
    /// Every status in workflow order
    pub const ALL: [Self; 5] = [
        Self::Open,
        Self::InProgress,
        Self::PendingCustomer,
        Self::Resolved,
        Self::Closed,
    ];

    /// Wire name of the status
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::PendingCustomer => "pending_customer",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    /// Closed tickets are excluded from reconciliation
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "pending_customer" => Ok(Self::PendingCustomer),
            "resolved" => Ok(Self::Resolved),
            "closed" => Ok(Self::Closed),
            other => Err(DeskError::Validation(format!(
                "invalid status '{other}', expected one of open, in_progress, \
                 pending_customer, resolved, closed"
            ))),
        }
    }
}
