//! Desk services built on top of storage

mod categories;
mod identifier;
mod tickets;

pub use categories::CategoryRegistry;
pub use identifier::IdentifierGenerator;
pub use tickets::{AuthorRole, NewTicket, REOPEN_NOTE, TicketEdit, TicketService};
