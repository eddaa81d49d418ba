//! Error types for etdesk
//!
//! Every fallible operation in the crate returns [`Result`], whose error type
//! is [`DeskError`]. Variants map onto how callers are expected to react:
//! validation, lookup and conflict errors are final, remote and lock errors
//! may succeed on a later attempt.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for etdesk operations
pub type Result<T> = std::result::Result<T, DeskError>;

/// Main error type for etdesk
#[derive(Error, Debug)]
pub enum DeskError {
    /// Input rejected before any mutation took place
    #[error("Validation error: {0}")]
    Validation(String),

    /// Ticket lookup failed
    #[error("Ticket not found: {id}")]
    TicketNotFound { id: String },

    /// Category lookup failed
    #[error("Category not found: {name}")]
    CategoryNotFound { name: String },

    /// The daily ticket sequence has no values left
    #[error("Ticket identifiers exhausted for {date}")]
    IdentifierExhausted { date: String },

    /// No credentials are configured for the external helpdesk
    #[error("External helpdesk integration is disabled")]
    IntegrationDisabled,

    /// Transport failure, timeout, or non-2xx answer from the external helpdesk
    #[error("Remote helpdesk error: {0}")]
    Remote(String),

    /// Operation conflicts with the current state of the ticket
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Could not acquire a storage lock in time
    #[error("Timed out waiting for lock: {}", path.display())]
    LockTimeout { path: PathBuf },

    /// Storage directory has not been initialized
    #[error("Desk not initialized. Run 'etdesk init' first")]
    NotInitialized,

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Custom error with message
    #[error("{0}")]
    Custom(String),
}

impl DeskError {
    /// Create a custom error with a message
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create a validation error with a message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a remote error with a message
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::Remote(msg.into())
    }

    /// Check if a later retry could succeed without caller changes
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Remote(_) | Self::LockTimeout { .. })
    }

    /// Check if this error stems from configuration
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::IntegrationDisabled | Self::NotInitialized
        )
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::TicketNotFound { id } => format!("No ticket matches '{id}'"),
            Self::CategoryNotFound { name } => format!("No category named '{name}'"),
            Self::IntegrationDisabled => {
                "The external helpdesk is not configured, nothing was sent".to_string()
            },
            _ => self.to_string(),
        }
    }

    /// Get suggestions for fixing the error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::NotInitialized => vec!["Run 'etdesk init' to create the desk".to_string()],
            Self::TicketNotFound { .. } => vec![
                "Use 'etdesk list' to see all tickets".to_string(),
                "Tickets can be referenced by UUID, display number or external id".to_string(),
            ],
            Self::CategoryNotFound { .. } => {
                vec!["Use 'etdesk category list' to see configured categories".to_string()]
            },
            Self::IntegrationDisabled => vec![
                "Set ETDESK_REMOTE__BASE_URL and ETDESK_REMOTE__API_KEY".to_string(),
                "Or add a 'remote' section to the desk config.yaml".to_string(),
            ],
            Self::LockTimeout { .. } => vec![
                "Another etdesk process may be running; retry in a moment".to_string(),
            ],
            Self::IdentifierExhausted { .. } => {
                vec!["No more tickets can be opened today".to_string()]
            },
            _ => vec![],
        }
    }
}
