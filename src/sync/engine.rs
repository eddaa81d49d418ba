//! Push and pull between local tickets and their helpdesk mirrors
//!
//! On pull the helpdesk wins: subject, description, priority, status and tags
//! are overwritten with the remote values, including local edits made since
//! the last push. There is no field-level merge. Local writes and pulls may
//! race on the same ticket; the last one to store wins.
//!
//! Every operation is independent and can be retried.
//! [`ReconciliationEngine::sync_all`] reconciles linked, non-closed tickets
//! one after another. A failure on one ticket is logged and counted, then the
//! batch moves on. Storage work runs on the blocking pool so lock waits never
//! stall the async workers.

use super::http::HttpHelpdesk;
use super::mapping::RemoteEnum;
use super::remote::{
    CreateNoteRequest, CreateTicketRequest, RemoteConversation, RemoteHelpdesk,
    UpdateTicketRequest,
};
use crate::config::RemoteConfig;
use crate::core::{
    ChangedFields, Comment, CommentId, Priority, REMOTE_SYNC_ACTOR, Status, Ticket, TicketId,
};
use crate::error::{DeskError, Result};
use crate::events::EventBus;
use crate::storage::{CommentRepository, FileStorage, TicketRepository};
use chrono::Utc;
use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Note recorded on status changes pulled from the helpdesk
pub const PULLED_STATUS_NOTE: &str = "Status changed in external helpdesk";

/// Where a ticket lives in the helpdesk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteLink {
    pub external_id: String,
    pub external_url: String,
}

/// A ticket the batch could not reconcile
#[derive(Debug, Clone, Serialize)]
pub struct SyncFailure {
    pub ticket: String,
    pub external_id: String,
    pub error: String,
}

/// A ticket file the batch could not read
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: Vec<SyncFailure>,
    pub unreadable: Vec<SkippedFile>,
    pub comments_imported: usize,
    /// Batch stopped early on request
    pub cancelled: bool,
}

impl SyncReport {
    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }
}

/// Keeps local tickets and helpdesk mirrors approximately consistent
pub struct ReconciliationEngine {
    storage: FileStorage,
    remote: Option<Arc<dyn RemoteHelpdesk>>,
    events: EventBus,
    call_timeout: Duration,
}

impl std::fmt::Debug for ReconciliationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationEngine")
            .field("storage", &self.storage)
            .field("enabled", &self.remote.is_some())
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

impl ReconciliationEngine {
    /// Create an engine; with `remote` set to `None` every operation fails
    /// with [`DeskError::IntegrationDisabled`]
    pub fn new(
        storage: FileStorage,
        remote: Option<Arc<dyn RemoteHelpdesk>>,
        events: EventBus,
    ) -> Self {
        Self {
            storage,
            remote,
            events,
            call_timeout: RemoteConfig::default().timeout(),
        }
    }

    /// Create an engine talking HTTP, or a disabled one without credentials
    pub fn from_config(
        storage: FileStorage,
        config: &RemoteConfig,
        events: EventBus,
    ) -> Result<Self> {
        let remote: Option<Arc<dyn RemoteHelpdesk>> = if config.is_enabled() {
            Some(Arc::new(HttpHelpdesk::new(config)?))
        } else {
            tracing::debug!("helpdesk credentials absent, reconciliation disabled");
            None
        };
        Ok(Self::new(storage, remote, events).with_call_timeout(config.timeout()))
    }

    /// Bound every remote call by `timeout`
    #[must_use]
    pub const fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub const fn is_enabled(&self) -> bool {
        self.remote.is_some()
    }

    fn remote(&self) -> Result<&dyn RemoteHelpdesk> {
        self.remote.as_deref().ok_or(DeskError::IntegrationDisabled)
    }

    async fn call<T>(&self, what: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.call_timeout, fut)
            .await
            .map_err(|_| {
                DeskError::remote(format!("{what}: timed out after {:?}", self.call_timeout))
            })?
    }

    /// Run file storage work on the blocking pool
    async fn with_storage<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&FileStorage) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let storage = self.storage.clone();
        tokio::task::spawn_blocking(move || f(&storage))
            .await
            .map_err(|e| DeskError::custom(format!("storage task failed: {e}")))?
    }

    async fn load(&self, id: &TicketId) -> Result<Ticket> {
        let id = id.clone();
        self.with_storage(move |storage| storage.load(&id)).await
    }

    async fn linked_ticket(&self, external_id: &str) -> Result<Ticket> {
        let wanted = external_id.to_string();
        self.with_storage(move |storage| {
            storage
                .find_by_external_id(&wanted)?
                .ok_or(DeskError::TicketNotFound { id: wanted })
        })
        .await
    }

    /// Create the helpdesk mirror of a ticket
    ///
    /// A ticket can be pushed as a create exactly once; a second attempt
    /// fails with [`DeskError::Conflict`].
    pub async fn push_create(&self, id: &TicketId) -> Result<RemoteLink> {
        let remote = self.remote()?;
        let ticket = self.load(id).await?;
        if ticket.is_linked() {
            return Err(already_linked(&ticket));
        }

        let request = CreateTicketRequest::from_ticket(&ticket);
        let created = self
            .call("create ticket", remote.create_ticket(&request))
            .await?;

        let link = RemoteLink {
            external_id: created.id.to_string(),
            external_url: remote.ticket_url(&created.id.to_string()),
        };
        let stored = link.clone();
        let id = id.clone();
        let ticket = self
            .with_storage(move |storage| {
                storage.modify(&id, |t| {
                    if t.is_linked() {
                        tracing::warn!(
                            ticket = %t.display_number,
                            orphan = %stored.external_id,
                            "ticket was linked concurrently, helpdesk copy left orphaned"
                        );
                        return Err(already_linked(t));
                    }
                    t.external_id = Some(stored.external_id);
                    t.external_url = Some(stored.external_url);
                    t.last_synced_at = Some(Utc::now());
                    Ok(())
                })
            })
            .await?;

        self.events.ticket_synced(&ticket, &link.external_id);
        Ok(link)
    }

    /// Send changed fields of a linked ticket
    ///
    /// Returns `false` without calling the helpdesk when nothing mirrored changed.
    pub async fn push_update(&self, id: &TicketId, changed: &ChangedFields) -> Result<bool> {
        let remote = self.remote()?;
        let ticket = self.load(id).await?;
        let external_id = require_link(&ticket)?;

        let request = UpdateTicketRequest::from_changes(&ticket, changed);
        if request.is_empty() {
            tracing::debug!(ticket = %ticket.display_number, "nothing to push");
            return Ok(false);
        }

        self.call("update ticket", remote.update_ticket(&external_id, &request))
            .await?;
        let id = id.clone();
        let ticket = self
            .with_storage(move |storage| {
                storage.modify(&id, |t| {
                    t.last_synced_at = Some(Utc::now());
                    Ok(())
                })
            })
            .await?;

        self.events.ticket_synced(&ticket, &external_id);
        Ok(true)
    }

    /// Mirror a local comment as a helpdesk note
    ///
    /// The note id is stored on the comment so a later pull does not import
    /// it back. Pushing the same comment twice is a [`DeskError::Conflict`].
    pub async fn push_comment(
        &self,
        ticket_id: &TicketId,
        comment_id: &CommentId,
    ) -> Result<Comment> {
        let remote = self.remote()?;
        let ticket = self.load(ticket_id).await?;
        let external_id = require_link(&ticket)?;

        let id = ticket_id.clone();
        let mut comment = self
            .with_storage(move |storage| storage.comments(&id))
            .await?
            .into_iter()
            .find(|c| &c.id == comment_id)
            .ok_or_else(|| DeskError::custom(format!("comment {comment_id} not found")))?;
        if comment.external_id.is_some() {
            return Err(DeskError::Conflict(format!(
                "comment {comment_id} is already in the helpdesk"
            )));
        }

        let request = CreateNoteRequest::from_comment(&comment);
        let note = self
            .call("create note", remote.create_note(&external_id, &request))
            .await?;

        comment.external_id = Some(note.id.to_string());
        let stored = comment.clone();
        self.with_storage(move |storage| storage.replace_comment(&stored))
            .await?;
        tracing::info!(
            ticket = %ticket.display_number,
            note = note.id,
            private = request.private,
            "comment pushed"
        );
        Ok(comment)
    }

    /// Overwrite a local ticket with its helpdesk state
    pub async fn pull_ticket(&self, external_id: &str) -> Result<Ticket> {
        let remote = self.remote()?;
        let local = self.linked_ticket(external_id).await?;
        self.pull_into(remote, &local.id, external_id).await
    }

    async fn pull_into(
        &self,
        remote: &dyn RemoteHelpdesk,
        id: &TicketId,
        external_id: &str,
    ) -> Result<Ticket> {
        let fetched = self
            .call("fetch ticket", remote.get_ticket(external_id))
            .await?;

        let status = Status::from_remote(fetched.status);
        let id = id.clone();
        let (ticket, previous_status) = self
            .with_storage(move |storage| {
                let mut previous = None;
                let ticket = storage.modify(&id, |t| {
                    t.subject = fetched.subject;
                    t.description = fetched.description;
                    t.priority = Priority::from_remote(fetched.priority);
                    t.tags = fetched.tags;
                    if t.status != status {
                        previous = Some(t.status);
                        let note = Some(PULLED_STATUS_NOTE.to_string());
                        t.transition(status, REMOTE_SYNC_ACTOR, note);
                    }
                    let now = Utc::now();
                    t.last_synced_at = Some(now);
                    t.updated_at = now;
                    Ok(())
                })?;
                Ok((ticket, previous))
            })
            .await?;

        if let Some(old) = previous_status {
            self.events.status_changed(&ticket, old);
        }
        self.events.ticket_synced(&ticket, external_id);
        Ok(ticket)
    }

    /// Import helpdesk conversation entries not yet stored locally
    ///
    /// Returns only the newly imported comments; running it again on an
    /// unchanged conversation imports nothing.
    pub async fn pull_comments(&self, external_id: &str) -> Result<Vec<Comment>> {
        let remote = self.remote()?;
        let ticket = self.linked_ticket(external_id).await?;
        self.pull_comments_into(remote, &ticket, external_id).await
    }

    async fn pull_comments_into(
        &self,
        remote: &dyn RemoteHelpdesk,
        ticket: &Ticket,
        external_id: &str,
    ) -> Result<Vec<Comment>> {
        let entries = self
            .call("list conversations", remote.conversations(external_id))
            .await?;
        let candidates: Vec<Comment> = entries
            .into_iter()
            .map(|entry| import_comment(ticket, entry))
            .collect();

        let display_number = ticket.display_number.clone();
        let imported = self
            .with_storage(move |storage| {
                let mut imported = Vec::new();
                for comment in candidates {
                    if storage.add_comment_unless_imported(&comment)? {
                        imported.push(comment);
                    } else {
                        tracing::debug!(
                            ticket = %display_number,
                            entry = comment.external_id.as_deref().unwrap_or_default(),
                            "conversation entry already imported"
                        );
                    }
                }
                Ok(imported)
            })
            .await?;

        for _ in &imported {
            self.events.comment_added(&ticket.id, true);
        }
        if !imported.is_empty() {
            tracing::info!(
                ticket = %ticket.display_number,
                count = imported.len(),
                "imported helpdesk comments"
            );
        }
        Ok(imported)
    }

    /// Pull one ticket, then its comments
    pub async fn sync_ticket(&self, external_id: &str) -> Result<usize> {
        let remote = self.remote()?;
        let ticket = self.linked_ticket(external_id).await?;
        self.reconcile(remote, &ticket, external_id).await
    }

    async fn reconcile(
        &self,
        remote: &dyn RemoteHelpdesk,
        ticket: &Ticket,
        external_id: &str,
    ) -> Result<usize> {
        let ticket = self.pull_into(remote, &ticket.id, external_id).await?;
        Ok(self
            .pull_comments_into(remote, &ticket, external_id)
            .await?
            .len())
    }

    /// Reconcile every linked ticket that is not closed
    pub async fn sync_all(&self) -> Result<SyncReport> {
        self.sync_all_with_cancel(&CancellationToken::new()).await
    }

    /// Like [`ReconciliationEngine::sync_all`], stopping before the next
    /// ticket once `cancel` fires
    ///
    /// Tickets reconciled before cancellation stay reconciled. Ticket files
    /// that cannot be read are listed in [`SyncReport::unreadable`] and do not
    /// stop the batch.
    pub async fn sync_all_with_cancel(&self, cancel: &CancellationToken) -> Result<SyncReport> {
        let remote = self.remote()?;
        let scan = self.with_storage(|storage| storage.scan_tickets()).await?;

        let mut report = SyncReport::default();
        for bad in scan.unreadable {
            tracing::warn!(
                path = %bad.path.display(),
                error = %bad.error,
                "skipping unreadable ticket file"
            );
            report.unreadable.push(SkippedFile {
                path: bad.path,
                error: bad.error.to_string(),
            });
        }

        let candidates: Vec<Ticket> = scan
            .tickets
            .into_iter()
            .filter(|t| t.is_linked() && !t.status.is_terminal())
            .collect();
        tracing::info!(count = candidates.len(), "starting helpdesk sync");

        for ticket in candidates {
            if cancel.is_cancelled() {
                report.cancelled = true;
                tracing::info!("helpdesk sync cancelled");
                break;
            }
            let Some(external_id) = ticket.external_id.clone() else {
                continue;
            };

            report.attempted += 1;
            match self.reconcile(remote, &ticket, &external_id).await {
                Ok(imported) => {
                    report.succeeded += 1;
                    report.comments_imported += imported;
                },
                Err(error) => {
                    tracing::warn!(
                        ticket = %ticket.display_number,
                        external_id = %external_id,
                        %error,
                        "ticket sync failed"
                    );
                    report.failed.push(SyncFailure {
                        ticket: ticket.display_number.to_string(),
                        external_id,
                        error: error.to_string(),
                    });
                },
            }
        }

        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failure_count(),
            unreadable = report.unreadable.len(),
            comments = report.comments_imported,
            "helpdesk sync finished"
        );
        Ok(report)
    }
}

fn already_linked(ticket: &Ticket) -> DeskError {
    DeskError::Conflict(format!(
        "ticket {} is already linked to helpdesk ticket {}",
        ticket.display_number,
        ticket.external_id.as_deref().unwrap_or_default()
    ))
}

fn require_link(ticket: &Ticket) -> Result<String> {
    ticket
        .external_id
        .clone()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            DeskError::validation(format!(
                "ticket {} has no helpdesk counterpart",
                ticket.display_number
            ))
        })
}

/// Author defaults to the requester; the helpdesk exposes no usable author mapping
fn import_comment(ticket: &Ticket, entry: RemoteConversation) -> Comment {
    let mut comment = Comment::new(
        ticket.id.clone(),
        ticket.requester.id.clone(),
        entry.body_text,
    );
    comment.is_public = Some(!entry.private);
    comment.external_id = Some(entry.id.to_string());
    if let Some(created_at) = entry.created_at {
        comment.created_at = created_at;
    }
    comment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::remote::{MockRemoteHelpdesk, RemoteTicket};
    use crate::test_utils::{TestDesk, new_ticket};

    fn engine(desk: &TestDesk, mock: MockRemoteHelpdesk) -> ReconciliationEngine {
        ReconciliationEngine::new(
            desk.storage.clone(),
            Some(Arc::new(mock)),
            desk.service.events().clone(),
        )
    }

    fn remote_ticket(id: u64) -> RemoteTicket {
        RemoteTicket {
            id,
            subject: "remote subject".to_string(),
            description: "remote description".to_string(),
            priority: 4,
            status: 5,
            tags: vec!["remote".to_string()],
        }
    }

    fn link(desk: &TestDesk, ticket: &Ticket, external_id: &str) {
        desk.storage
            .modify(&ticket.id, |t| {
                t.external_id = Some(external_id.to_string());
                Ok(())
            })
            .unwrap();
    }

    #[tokio::test]
    async fn test_disabled_engine_fails_fast() {
        let desk = TestDesk::new();
        let ticket = desk.service.create(new_ticket("Offline")).unwrap();
        let engine = ReconciliationEngine::new(
            desk.storage.clone(),
            None,
            desk.service.events().clone(),
        );

        assert!(!engine.is_enabled());
        assert!(matches!(
            engine.push_create(&ticket.id).await,
            Err(DeskError::IntegrationDisabled)
        ));
        assert!(matches!(
            engine.push_update(&ticket.id, &ChangedFields::new()).await,
            Err(DeskError::IntegrationDisabled)
        ));
        assert!(matches!(
            engine.push_comment(&ticket.id, &CommentId::new()).await,
            Err(DeskError::IntegrationDisabled)
        ));
        assert!(matches!(
            engine.pull_ticket("1").await,
            Err(DeskError::IntegrationDisabled)
        ));
        assert!(matches!(
            engine.pull_comments("1").await,
            Err(DeskError::IntegrationDisabled)
        ));
        assert!(matches!(
            engine.sync_all().await,
            Err(DeskError::IntegrationDisabled)
        ));
    }

    #[tokio::test]
    async fn test_from_config_without_credentials_is_disabled() {
        let desk = TestDesk::new();
        let engine = ReconciliationEngine::from_config(
            desk.storage.clone(),
            &RemoteConfig::default(),
            EventBus::new(),
        )
        .unwrap();
        assert!(!engine.is_enabled());
    }

    #[tokio::test]
    async fn test_push_create_links_once() {
        let desk = TestDesk::new();
        let ticket = desk.service.create(new_ticket("Push me")).unwrap();

        let mut mock = MockRemoteHelpdesk::new();
        mock.expect_create_ticket()
            .withf(|req| req.subject == "Push me" && req.status == 2 && req.priority == 2)
            .times(1)
            .returning(|_| Ok(remote_ticket(501)));
        mock.expect_ticket_url()
            .withf(|id| id == "501")
            .returning(|id| format!("https://desk.example.com/tickets/{id}"));
        let engine = engine(&desk, mock);

        let link = engine.push_create(&ticket.id).await.unwrap();
        assert_eq!(link.external_id, "501");
        assert_eq!(link.external_url, "https://desk.example.com/tickets/501");

        let stored = desk.storage.load(&ticket.id).unwrap();
        assert_eq!(stored.external_id.as_deref(), Some("501"));
        assert!(stored.last_synced_at.is_some());

        // Mock would panic on a second create call
        assert!(matches!(
            engine.push_create(&ticket.id).await,
            Err(DeskError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_push_create_remote_error_leaves_ticket_unlinked() {
        let desk = TestDesk::new();
        let ticket = desk.service.create(new_ticket("Fails")).unwrap();

        let mut mock = MockRemoteHelpdesk::new();
        mock.expect_create_ticket()
            .returning(|_| Err(DeskError::remote("503 Service Unavailable")));
        let engine = engine(&desk, mock);

        let result = engine.push_create(&ticket.id).await;
        assert!(matches!(result, Err(DeskError::Remote(_))));
        assert!(!desk.storage.load(&ticket.id).unwrap().is_linked());
    }

    #[tokio::test]
    async fn test_push_update_sends_only_changes() {
        let desk = TestDesk::new();
        let ticket = desk.service.create(new_ticket("Update me")).unwrap();
        link(&desk, &ticket, "77");
        let ticket = desk
            .service
            .transition(&ticket.id, Status::InProgress, "agent", None)
            .unwrap();

        let mut mock = MockRemoteHelpdesk::new();
        mock.expect_update_ticket()
            .withf(|id, req| {
                id == "77"
                    && *req
                        == UpdateTicketRequest {
                            status: Some(3),
                            ..UpdateTicketRequest::default()
                        }
            })
            .times(1)
            .returning(|_, _| Ok(remote_ticket(77)));
        let engine = engine(&desk, mock);

        let changed: ChangedFields = [crate::core::TicketField::Status].into();
        assert!(engine.push_update(&ticket.id, &changed).await.unwrap());
        assert!(!engine.push_update(&ticket.id, &ChangedFields::new()).await.unwrap());
    }

    #[tokio::test]
    async fn test_push_update_requires_link() {
        let desk = TestDesk::new();
        let ticket = desk.service.create(new_ticket("Unlinked")).unwrap();
        let engine = engine(&desk, MockRemoteHelpdesk::new());

        let changed: ChangedFields = [crate::core::TicketField::Subject].into();
        assert!(matches!(
            engine.push_update(&ticket.id, &changed).await,
            Err(DeskError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_push_comment_marks_internal_notes_private() {
        let desk = TestDesk::new();
        let ticket = desk.service.create(new_ticket("Notes")).unwrap();
        link(&desk, &ticket, "12");
        let (comment, _) = desk
            .service
            .add_comment(
                &ticket.id,
                "agent",
                "internal only",
                Some(false),
                crate::services::AuthorRole::Staff,
            )
            .unwrap();

        let mut mock = MockRemoteHelpdesk::new();
        mock.expect_create_note()
            .withf(|id, req| id == "12" && req.private && req.body == "internal only")
            .times(1)
            .returning(|_, _| {
                Ok(RemoteConversation {
                    id: 9001,
                    body_text: "internal only".to_string(),
                    private: true,
                    created_at: None,
                })
            });
        let engine = engine(&desk, mock);

        let pushed = engine.push_comment(&ticket.id, &comment.id).await.unwrap();
        assert_eq!(pushed.external_id.as_deref(), Some("9001"));
        assert_eq!(
            desk.storage.comments(&ticket.id).unwrap()[0].external_id.as_deref(),
            Some("9001")
        );
        assert!(matches!(
            engine.push_comment(&ticket.id, &comment.id).await,
            Err(DeskError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_pull_ticket_overwrites_and_records_history() {
        let desk = TestDesk::new();
        let ticket = desk.service.create(new_ticket("Local subject")).unwrap();
        link(&desk, &ticket, "300");

        let mut mock = MockRemoteHelpdesk::new();
        mock.expect_get_ticket()
            .withf(|id| id == "300")
            .returning(|_| Ok(remote_ticket(300)));
        let engine = engine(&desk, mock);

        let pulled = engine.pull_ticket("300").await.unwrap();
        assert_eq!(pulled.subject, "remote subject");
        assert_eq!(pulled.description, "remote description");
        assert_eq!(pulled.priority, Priority::Urgent);
        assert_eq!(pulled.status, Status::Resolved);
        assert_eq!(pulled.tags, vec!["remote"]);
        assert!(pulled.resolved_at.is_some());

        let change = pulled.last_change().unwrap();
        assert_eq!(change.status, Status::Open);
        assert_eq!(change.actor, REMOTE_SYNC_ACTOR);

        // Same remote state again: no new history entry
        let again = engine.pull_ticket("300").await.unwrap();
        assert_eq!(again.status_history.len(), 1);
    }

    #[tokio::test]
    async fn test_pull_ticket_unknown_codes_fall_back() {
        let desk = TestDesk::new();
        let ticket = desk.service.create(new_ticket("Odd codes")).unwrap();
        link(&desk, &ticket, "301");

        let mut mock = MockRemoteHelpdesk::new();
        mock.expect_get_ticket().returning(|_| {
            Ok(RemoteTicket {
                priority: 42,
                status: 17,
                ..remote_ticket(301)
            })
        });
        let engine = engine(&desk, mock);

        let pulled = engine.pull_ticket("301").await.unwrap();
        assert_eq!(pulled.priority, Priority::Medium);
        assert_eq!(pulled.status, Status::Open);
        assert!(pulled.status_history.is_empty());
    }

    #[tokio::test]
    async fn test_pull_unknown_external_id_is_not_found() {
        let desk = TestDesk::new();
        let engine = engine(&desk, MockRemoteHelpdesk::new());
        assert!(matches!(
            engine.pull_ticket("404").await,
            Err(DeskError::TicketNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_pull_comments_maps_privacy_and_author() {
        let desk = TestDesk::new();
        let ticket = desk.service.create(new_ticket("Talkative")).unwrap();
        link(&desk, &ticket, "55");

        let mut mock = MockRemoteHelpdesk::new();
        mock.expect_conversations().returning(|_| {
            Ok(vec![
                RemoteConversation {
                    id: 1,
                    body_text: "public reply".to_string(),
                    private: false,
                    created_at: None,
                },
                RemoteConversation {
                    id: 2,
                    body_text: "private note".to_string(),
                    private: true,
                    created_at: None,
                },
            ])
        });
        let engine = engine(&desk, mock);

        let imported = engine.pull_comments("55").await.unwrap();
        assert_eq!(imported.len(), 2);
        assert!(imported.iter().all(|c| c.author_id == ticket.requester.id));
        assert_eq!(imported[0].is_public, Some(true));
        assert_eq!(imported[1].is_public, Some(false));
        assert_eq!(imported[1].external_id.as_deref(), Some("2"));

        assert!(engine.pull_comments("55").await.unwrap().is_empty());
        assert_eq!(desk.storage.comments(&ticket.id).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_slow_remote_call_times_out() {
        let desk = TestDesk::new();

        let engine = engine(&desk, MockRemoteHelpdesk::new())
            .with_call_timeout(Duration::from_millis(20));

        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<(), DeskError>(())
        };
        let result = engine.call("slow call", slow).await;
        assert!(matches!(result, Err(DeskError::Remote(ref msg)) if msg.contains("timed out")));
    }

    #[tokio::test]
    async fn test_sync_all_skips_unreadable_ticket_files() {
        let desk = TestDesk::new();
        let healthy = desk.service.create(new_ticket("Healthy")).unwrap();
        link(&desk, &healthy, "80");
        let damaged = desk.service.create(new_ticket("Damaged")).unwrap();
        link(&desk, &damaged, "81");
        let damaged_path = desk
            .storage
            .base_dir()
            .join("tickets")
            .join(format!("{}.yaml", damaged.id));
        std::fs::write(&damaged_path, "not: [valid").unwrap();

        let mut mock = MockRemoteHelpdesk::new();
        mock.expect_get_ticket()
            .withf(|id| id == "80")
            .times(1)
            .returning(|_| Ok(remote_ticket(80)));
        mock.expect_conversations()
            .withf(|id| id == "80")
            .times(1)
            .returning(|_| Ok(Vec::new()));
        let engine = engine(&desk, mock);

        let report = engine.sync_all().await.unwrap();
        assert_eq!(report.attempted, 1);
        assert_eq!(report.succeeded, 1);
        assert!(report.failed.is_empty());
        assert_eq!(report.unreadable.len(), 1);
        assert_eq!(report.unreadable[0].path, damaged_path);
    }

    #[tokio::test]
    async fn test_sync_all_honours_cancellation() {
        let desk = TestDesk::new();
        let ticket = desk.service.create(new_ticket("Never synced")).unwrap();
        link(&desk, &ticket, "70");
        let engine = engine(&desk, MockRemoteHelpdesk::new());

        let cancel = CancellationToken::new();
        cancel.cancel();
        let report = engine.sync_all_with_cancel(&cancel).await.unwrap();
        assert!(report.cancelled);
        assert_eq!(report.attempted, 0);
    }
}
