//! Persistent storage for the desk

mod file;
mod lock;
mod repository;

pub use file::{FileStorage, TicketScan, UnreadableTicket};
pub use lock::{FileLock, LockOptions};
pub use repository::{
    CategoryRepository, CommentRepository, SequenceRepository, TicketRepository,
};
