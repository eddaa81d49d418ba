use crate::core::{Category, Comment, DisplayNumber, Ticket, TicketId};
use crate::error::{DeskError, Result};

/// Repository trait for ticket storage operations
///
/// This trait defines the interface for storing and retrieving tickets,
/// allowing for different storage implementations.
pub trait TicketRepository: Send + Sync {
    /// Saves a ticket to the repository
    fn save(&self, ticket: &Ticket) -> Result<()>;

    /// Loads a ticket by ID
    fn load(&self, id: &TicketId) -> Result<Ticket>;

    /// Loads all tickets
    fn load_all(&self) -> Result<Vec<Ticket>>;

    /// Applies `f` to a stored ticket and persists the result atomically
    fn modify<F>(&self, id: &TicketId, f: F) -> Result<Ticket>
    where
        F: FnOnce(&mut Ticket) -> Result<()>;

    /// Checks if a ticket exists by ID
    fn exists(&self, id: &TicketId) -> Result<bool> {
        match self.load(id) {
            Ok(_) => Ok(true),
            Err(DeskError::TicketNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Finds tickets matching a predicate
    fn find<F>(&self, predicate: F) -> Result<Vec<Ticket>>
    where
        F: Fn(&Ticket) -> bool,
    {
        Ok(self.load_all()?.into_iter().filter(predicate).collect())
    }

    /// Finds the ticket with the given display number
    fn find_by_display_number(&self, number: &DisplayNumber) -> Result<Option<Ticket>> {
        Ok(self
            .find(|t| &t.display_number == number)?
            .into_iter()
            .next())
    }

    /// Finds the ticket mirrored by the given external id
    fn find_by_external_id(&self, external_id: &str) -> Result<Option<Ticket>> {
        Ok(self
            .find(|t| t.external_id.as_deref() == Some(external_id))?
            .into_iter()
            .next())
    }
}

/// Repository trait for ticket comments
pub trait CommentRepository: Send + Sync {
    /// Lists a ticket's comments in insertion order
    fn comments(&self, ticket_id: &TicketId) -> Result<Vec<Comment>>;

    /// Appends a comment
    fn add_comment(&self, comment: &Comment) -> Result<()>;

    /// Appends a comment unless one with the same external id exists
    ///
    /// The check and the insert happen under one lock, so concurrent imports
    /// of the same remote entry store it once. Returns whether it was stored.
    fn add_comment_unless_imported(&self, comment: &Comment) -> Result<bool>;

    /// Replaces a stored comment with the same id
    fn replace_comment(&self, comment: &Comment) -> Result<()>;
}

/// Repository trait for the category registry
pub trait CategoryRepository: Send + Sync {
    /// Loads every category
    fn categories(&self) -> Result<Vec<Category>>;

    /// Applies `f` to the full registry and persists it as one write
    fn modify_categories<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Vec<Category>) -> Result<R>;
}

/// Repository trait for per-day counters
pub trait SequenceRepository: Send + Sync {
    /// Increments the counter for `day` unless it already reached `max`
    fn increment(&self, day: &str, max: u32) -> Result<Option<u32>>;
}

use super::file::FileStorage;

impl TicketRepository for FileStorage {
    fn save(&self, ticket: &Ticket) -> Result<()> {
        self.save_ticket(ticket)
    }

    fn load(&self, id: &TicketId) -> Result<Ticket> {
        self.load_ticket(id)
    }

    fn load_all(&self) -> Result<Vec<Ticket>> {
        self.load_all_tickets()
    }

    fn modify<F>(&self, id: &TicketId, f: F) -> Result<Ticket>
    where
        F: FnOnce(&mut Ticket) -> Result<()>,
    {
        self.update_ticket(id, f)
    }
}

impl CommentRepository for FileStorage {
    fn comments(&self, ticket_id: &TicketId) -> Result<Vec<Comment>> {
        self.load_comments(ticket_id)
    }

    fn add_comment(&self, comment: &Comment) -> Result<()> {
        self.update_comments(&comment.ticket_id, |comments| {
            comments.push(comment.clone());
            Ok(())
        })
    }

    fn add_comment_unless_imported(&self, comment: &Comment) -> Result<bool> {
        self.update_comments(&comment.ticket_id, |comments| {
            let duplicate = comment.external_id.as_ref().is_some_and(|external_id| {
                comments
                    .iter()
                    .any(|c| c.external_id.as_ref() == Some(external_id))
            });
            if duplicate {
                return Ok(false);
            }
            comments.push(comment.clone());
            Ok(true)
        })
    }

    fn replace_comment(&self, comment: &Comment) -> Result<()> {
        self.update_comments(&comment.ticket_id, |comments| {
            let slot = comments
                .iter_mut()
                .find(|c| c.id == comment.id)
                .ok_or_else(|| DeskError::custom(format!("comment {} not found", comment.id)))?;
            *slot = comment.clone();
            Ok(())
        })
    }
}

impl CategoryRepository for FileStorage {
    fn categories(&self) -> Result<Vec<Category>> {
        self.load_categories()
    }

    fn modify_categories<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Vec<Category>) -> Result<R>,
    {
        self.update_categories(f)
    }
}

impl SequenceRepository for FileStorage {
    fn increment(&self, day: &str, max: u32) -> Result<Option<u32>> {
        self.increment_sequence(day, max)
    }
}
