//! Priority and status codes used by the external helpdesk
//!
//! Local to remote is total. Remote to local falls back to a fixed default
//! for unknown codes, since the helpdesk may add codes at any time.

use crate::core::{Priority, Status};

/// Numeric code on the helpdesk side
pub type RemoteCode = u32;

/// Local values that have a helpdesk code
pub trait RemoteEnum: Copy + Sized {
    /// Value used for codes not listed below
    const FALLBACK: Self;

    /// Known code for this value; total
    fn to_remote(self) -> RemoteCode;

    /// Known value for `code`, if any
    fn try_from_remote(code: RemoteCode) -> Option<Self>;

    fn from_remote(code: RemoteCode) -> Self {
        Self::try_from_remote(code).unwrap_or_else(|| {
            tracing::debug!(code, "unknown remote code, using fallback");
            Self::FALLBACK
        })
    }
}

impl RemoteEnum for Priority {
    const FALLBACK: Self = Self::Medium;

    fn to_remote(self) -> RemoteCode {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Urgent => 4,
        }
    }

    fn try_from_remote(code: RemoteCode) -> Option<Self> {
        match code {
            1 => Some(Self::Low),
            2 => Some(Self::Medium),
            3 => Some(Self::High),
            4 => Some(Self::Urgent),
            _ => None,
        }
    }
}

impl RemoteEnum for Status {
    const FALLBACK: Self = Self::Open;

    fn to_remote(self) -> RemoteCode {
        match self {
            Self::Open => 2,
            Self::InProgress => 3,
            Self::PendingCustomer => 4,
            Self::Resolved => 5,
            Self::Closed => 6,
        }
    }

    fn try_from_remote(code: RemoteCode) -> Option<Self> {
        match code {
            2 => Some(Self::Open),
            3 => Some(Self::InProgress),
            4 => Some(Self::PendingCustomer),
            5 => Some(Self::Resolved),
            6 => Some(Self::Closed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_codes() {
        assert_eq!(Priority::Low.to_remote(), 1);
        assert_eq!(Priority::Medium.to_remote(), 2);
        assert_eq!(Priority::High.to_remote(), 3);
        assert_eq!(Priority::Urgent.to_remote(), 4);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Status::Open.to_remote(), 2);
        assert_eq!(Status::InProgress.to_remote(), 3);
        assert_eq!(Status::PendingCustomer.to_remote(), 4);
        assert_eq!(Status::Resolved.to_remote(), 5);
        assert_eq!(Status::Closed.to_remote(), 6);
    }

    #[test]
    fn test_every_local_value_maps() {
        for priority in Priority::ALL {
            assert_eq!(Priority::from_remote(priority.to_remote()), priority);
        }
        for status in Status::ALL {
            assert_eq!(Status::from_remote(status.to_remote()), status);
        }
    }

    #[test]
    fn test_known_codes_round_trip() {
        for code in 1..=4 {
            assert_eq!(Priority::from_remote(code).to_remote(), code);
        }
        for code in 2..=6 {
            assert_eq!(Status::from_remote(code).to_remote(), code);
        }
    }

    #[test]
    fn test_unknown_codes_fall_back() {
        assert_eq!(Priority::from_remote(0), Priority::Medium);
        assert_eq!(Priority::from_remote(99), Priority::Medium);
        assert_eq!(Status::from_remote(1), Status::Open);
        assert_eq!(Status::from_remote(7), Status::Open);
        assert!(Status::try_from_remote(1).is_none());
    }
}
