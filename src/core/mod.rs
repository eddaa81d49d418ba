//! Domain model: tickets, comments, categories and the status state machine

mod builders;
mod category;
mod channel;
mod comment;
mod display_number;
pub mod lifecycle;
mod priority;
mod status;
mod ticket;

pub use builders::TicketBuilder;
pub use category::{Category, SlaReport, SlaThresholds};
pub use channel::Channel;
pub use comment::{Comment, CommentId};
pub use display_number::{
    DEFAULT_PREFIX, DisplayNumber, MAX_DAILY_SEQUENCE, day_key, is_valid_prefix,
};
pub use lifecycle::REMOTE_SYNC_ACTOR;
pub use priority::Priority;
pub use status::Status;
pub use ticket::{ChangedFields, Requester, StatusChange, Ticket, TicketField, TicketId};
