//! Ticket creation, edits, transitions and the comment policy

use super::{CategoryRegistry, IdentifierGenerator};
use crate::core::{
    Category, ChangedFields, Channel, Comment, DisplayNumber, Priority, Requester, Status,
    Ticket, TicketBuilder, TicketField, TicketId,
};
use crate::error::{DeskError, Result};
use crate::events::EventBus;
use crate::storage::{CommentRepository, FileStorage, TicketRepository};
use chrono::Utc;
use std::collections::BTreeMap;

/// Note recorded when a requester reply re-opens a resolved ticket
pub const REOPEN_NOTE: &str = "Reopened automatically after requester reply";

/// Input for creating a ticket
#[derive(Debug, Clone, Default)]
pub struct NewTicket {
    pub subject: String,
    pub description: String,
    pub category: Option<String>,
    pub priority: Option<Priority>,
    pub tags: Vec<String>,
    pub requester: Requester,
    pub assignee: Option<String>,
    pub channel: Channel,
    pub custom_fields: BTreeMap<String, serde_json::Value>,
}

/// Local edit of mirrored fields; `None` leaves a field as is
#[derive(Debug, Clone, Default)]
pub struct TicketEdit {
    pub subject: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub tags: Option<Vec<String>>,
    pub assignee: Option<String>,
}

/// Who wrote a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorRole {
    Requester,
    Staff,
}

/// Ticket operations over file storage
#[derive(Debug, Clone)]
pub struct TicketService {
    storage: FileStorage,
    identifiers: IdentifierGenerator<FileStorage>,
    categories: CategoryRegistry<FileStorage>,
    events: EventBus,
}

impl TicketService {
    pub fn new(storage: FileStorage, prefix: impl Into<String>, events: EventBus) -> Self {
        Self {
            identifiers: IdentifierGenerator::new(storage.clone(), prefix),
            categories: CategoryRegistry::new(storage.clone()),
            storage,
            events,
        }
    }

    pub const fn storage(&self) -> &FileStorage {
        &self.storage
    }

    pub const fn categories(&self) -> &CategoryRegistry<FileStorage> {
        &self.categories
    }

    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Create a ticket with a fresh display number and category defaults
    ///
    /// All validation happens before a number is allocated; if allocation
    /// fails nothing is written.
    pub fn create(&self, new: NewTicket) -> Result<Ticket> {
        validate_new(&new)?;
        let category = self.resolve_category(new.category.as_deref())?;

        let display_number = self.identifiers.next_for_today()?;
        let ticket = build_ticket(display_number, new, category.as_ref());
        self.storage.save(&ticket)?;

        self.events.ticket_created(&ticket);
        Ok(ticket)
    }

    fn resolve_category(&self, name: Option<&str>) -> Result<Option<Category>> {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => {
                let category = self.categories.get(name)?;
                if !category.is_active {
                    return Err(DeskError::validation(format!(
                        "category '{}' is inactive",
                        category.name
                    )));
                }
                Ok(Some(category))
            },
            None => self.categories.default_category(),
        }
    }

    /// Resolve a UUID, display number or external id to a ticket
    pub fn get(&self, reference: &str) -> Result<Ticket> {
        let reference = reference.trim();
        if let Ok(id) = TicketId::parse_str(reference) {
            return self.storage.load(&id);
        }
        if let Ok(number) = reference.parse::<DisplayNumber>() {
            if let Some(ticket) = self.storage.find_by_display_number(&number)? {
                return Ok(ticket);
            }
        }
        self.storage
            .find_by_external_id(reference)?
            .ok_or_else(|| DeskError::TicketNotFound {
                id: reference.to_string(),
            })
    }

    /// All tickets, optionally restricted to one status
    pub fn list(&self, status: Option<Status>) -> Result<Vec<Ticket>> {
        self.storage
            .find(|t| status.is_none_or(|s| t.status == s))
    }

    /// Apply a local edit and report which mirrored fields changed
    pub fn edit(&self, id: &TicketId, edit: TicketEdit) -> Result<(Ticket, ChangedFields)> {
        if edit.subject.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(DeskError::validation("subject must not be empty"));
        }

        let mut changed = ChangedFields::new();
        let ticket = self.storage.modify(id, |ticket| {
            if let Some(subject) = edit.subject {
                if ticket.subject != subject {
                    ticket.subject = subject;
                    changed.insert(TicketField::Subject);
                }
            }
            if let Some(description) = edit.description {
                if ticket.description != description {
                    ticket.description = description;
                    changed.insert(TicketField::Description);
                }
            }
            if let Some(priority) = edit.priority {
                if ticket.priority != priority {
                    ticket.priority = priority;
                    changed.insert(TicketField::Priority);
                }
            }
            if let Some(tags) = edit.tags {
                if ticket.tags != tags {
                    ticket.tags = tags;
                    changed.insert(TicketField::Tags);
                }
            }
            if let Some(assignee) = edit.assignee {
                ticket.assignee = Some(assignee);
            }
            ticket.updated_at = Utc::now();
            Ok(())
        })?;
        Ok((ticket, changed))
    }

    /// Move a ticket to a new status through the state machine
    ///
    /// Rejects a move into the status the ticket already has.
    pub fn transition(
        &self,
        id: &TicketId,
        to: Status,
        actor: &str,
        note: Option<String>,
    ) -> Result<Ticket> {
        if actor.trim().is_empty() {
            return Err(DeskError::validation("actor must not be empty"));
        }

        let mut from = to;
        let ticket = self.storage.modify(id, |ticket| {
            if ticket.status == to {
                return Err(DeskError::validation(format!(
                    "ticket {} is already {to}",
                    ticket.display_number
                )));
            }
            from = ticket.status;
            ticket.transition(to, actor, note);
            Ok(())
        })?;

        self.events.status_changed(&ticket, from);
        Ok(ticket)
    }

    /// Add a comment, applying the first-response and re-open rules
    ///
    /// A public staff comment records the first response. A requester comment
    /// on a resolved ticket moves it back to `open`.
    pub fn add_comment(
        &self,
        id: &TicketId,
        author_id: &str,
        body: &str,
        is_public: Option<bool>,
        role: AuthorRole,
    ) -> Result<(Comment, Ticket)> {
        if body.trim().is_empty() {
            return Err(DeskError::validation("comment body must not be empty"));
        }
        if author_id.trim().is_empty() {
            return Err(DeskError::validation("author must not be empty"));
        }

        let ticket = self.storage.load(id)?;
        let mut comment = Comment::new(ticket.id.clone(), author_id, body);
        comment.is_public = is_public;
        self.storage.add_comment(&comment)?;
        self.events.comment_added(&ticket.id, false);

        let ticket = match role {
            AuthorRole::Staff if comment.is_visible_publicly() => {
                self.storage.modify(id, |t| {
                    t.record_first_response(comment.created_at);
                    Ok(())
                })?
            },
            AuthorRole::Requester if ticket.status == Status::Resolved => {
                self.reopen_after_reply(id, author_id)?
            },
            _ => ticket,
        };

        Ok((comment, ticket))
    }

    fn reopen_after_reply(&self, id: &TicketId, author_id: &str) -> Result<Ticket> {
        let mut reopened = false;
        let ticket = self.storage.modify(id, |ticket| {
            // Status may have moved since the comment was stored
            if ticket.status == Status::Resolved {
                ticket.transition(Status::Open, author_id, Some(REOPEN_NOTE.to_string()));
                reopened = true;
            }
            Ok(())
        })?;
        if reopened {
            self.events.status_changed(&ticket, Status::Resolved);
        }
        Ok(ticket)
    }

    /// Comments of a ticket in insertion order
    pub fn comments(&self, id: &TicketId) -> Result<Vec<Comment>> {
        self.storage.comments(id)
    }
}

fn validate_new(new: &NewTicket) -> Result<()> {
    if new.subject.trim().is_empty() {
        return Err(DeskError::validation("subject must not be empty"));
    }
    if new.description.trim().is_empty() {
        return Err(DeskError::validation("description must not be empty"));
    }
    if new.requester.id.trim().is_empty() {
        return Err(DeskError::validation("requester must not be empty"));
    }
    Ok(())
}

fn build_ticket(number: DisplayNumber, new: NewTicket, category: Option<&Category>) -> Ticket {
    let priority = new
        .priority
        .or_else(|| category.map(|c| c.default_priority))
        .unwrap_or_default();
    let assignee = new
        .assignee
        .or_else(|| category.and_then(|c| c.auto_assign_to.clone()));

    let mut builder = TicketBuilder::new(number)
        .subject(new.subject.trim())
        .description(new.description)
        .priority(priority)
        .requester(new.requester)
        .channel(new.channel)
        .custom_fields(new.custom_fields);
    if let Some(category) = category {
        builder = builder.category(category.name.clone());
    }
    if let Some(assignee) = assignee {
        builder = builder.assignee(assignee);
    }

    let mut ticket = builder.build();
    ticket.merge_tags(new.tags.into_iter().map(|t| t.trim().to_string()));
    if let Some(category) = category {
        ticket.merge_tags(category.default_tags.iter().cloned());
    }
    ticket
}
