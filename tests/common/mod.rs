//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use etdesk::core::{DEFAULT_PREFIX, Requester};
use etdesk::error::{DeskError, Result};
use etdesk::events::EventBus;
use etdesk::services::{NewTicket, TicketService};
use etdesk::storage::FileStorage;
use etdesk::sync::{
    CreateNoteRequest, CreateTicketRequest, RemoteConversation, RemoteHelpdesk, RemoteTicket,
    UpdateTicketRequest,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

/// A desk in a temporary directory
pub struct Desk {
    pub temp_dir: TempDir,
    pub storage: FileStorage,
    pub service: TicketService,
}

impl Desk {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let storage = FileStorage::new(temp_dir.path().join(".etdesk"));
        storage.ensure_directories().expect("Failed to initialize desk");
        let service = TicketService::new(storage.clone(), DEFAULT_PREFIX, EventBus::new());
        Self {
            temp_dir,
            storage,
            service,
        }
    }

    /// Another service over the same files, as a second process would see them
    pub fn second_service(&self) -> TicketService {
        TicketService::new(
            FileStorage::new(self.storage.base_dir()),
            DEFAULT_PREFIX,
            EventBus::new(),
        )
    }
}

pub fn new_ticket(subject: &str, requester: &str) -> NewTicket {
    NewTicket {
        subject: subject.to_string(),
        description: format!("Details about {subject}"),
        requester: Requester::new(requester).with_email(format!("{requester}@example.com")),
        ..NewTicket::default()
    }
}

#[derive(Default)]
struct FakeState {
    next_id: u64,
    tickets: HashMap<u64, RemoteTicket>,
    conversations: HashMap<u64, Vec<RemoteConversation>>,
    failing: HashSet<u64>,
    creates: usize,
    updates: Vec<(u64, UpdateTicketRequest)>,
}

/// In-memory helpdesk
#[derive(Default)]
pub struct FakeHelpdesk {
    state: Mutex<FakeState>,
    delay: Option<Duration>,
}

impl FakeHelpdesk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps for `delay` before answering
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Make every call about `remote_id` fail with a server error
    pub fn fail(&self, remote_id: u64) {
        self.state.lock().unwrap().failing.insert(remote_id);
    }

    /// Change a remote ticket as a helpdesk agent would
    pub fn edit<F: FnOnce(&mut RemoteTicket)>(&self, remote_id: u64, f: F) {
        let mut state = self.state.lock().unwrap();
        f(state.tickets.get_mut(&remote_id).expect("unknown remote ticket"));
    }

    pub fn add_conversation(&self, remote_id: u64, body: &str, private: bool) -> u64 {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = 10_000 + state.next_id;
        state
            .conversations
            .entry(remote_id)
            .or_default()
            .push(RemoteConversation {
                id,
                body_text: body.to_string(),
                private,
                created_at: None,
            });
        id
    }

    pub fn creates(&self) -> usize {
        self.state.lock().unwrap().creates
    }

    pub fn updates(&self) -> Vec<(u64, UpdateTicketRequest)> {
        self.state.lock().unwrap().updates.clone()
    }

    pub fn ticket(&self, remote_id: u64) -> Option<RemoteTicket> {
        self.state.lock().unwrap().tickets.get(&remote_id).cloned()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check(&self, remote_id: &str) -> Result<u64> {
        let id: u64 = remote_id
            .parse()
            .map_err(|_| DeskError::remote(format!("bad remote id {remote_id}")))?;
        let state = self.state.lock().unwrap();
        if state.failing.contains(&id) {
            return Err(DeskError::remote("500 Internal Server Error"));
        }
        if !state.tickets.contains_key(&id) {
            return Err(DeskError::remote(format!("404 Not Found: {id}")));
        }
        Ok(id)
    }
}

#[async_trait]
impl RemoteHelpdesk for FakeHelpdesk {
    async fn create_ticket(&self, request: &CreateTicketRequest) -> Result<RemoteTicket> {
        self.pause().await;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        state.creates += 1;
        let ticket = RemoteTicket {
            id: state.next_id,
            subject: request.subject.clone(),
            description: request.description.clone(),
            priority: request.priority,
            status: request.status,
            tags: request.tags.clone(),
        };
        state.tickets.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    async fn update_ticket(
        &self,
        remote_id: &str,
        request: &UpdateTicketRequest,
    ) -> Result<RemoteTicket> {
        self.pause().await;
        let id = self.check(remote_id)?;
        let mut state = self.state.lock().unwrap();
        state.updates.push((id, request.clone()));
        let ticket = state.tickets.get_mut(&id).expect("checked above");
        if let Some(status) = request.status {
            ticket.status = status;
        }
        if let Some(priority) = request.priority {
            ticket.priority = priority;
        }
        Ok(ticket.clone())
    }

    async fn get_ticket(&self, remote_id: &str) -> Result<RemoteTicket> {
        self.pause().await;
        let id = self.check(remote_id)?;
        Ok(self.state.lock().unwrap().tickets[&id].clone())
    }

    async fn conversations(&self, remote_id: &str) -> Result<Vec<RemoteConversation>> {
        self.pause().await;
        let id = self.check(remote_id)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .conversations
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_note(
        &self,
        remote_id: &str,
        request: &CreateNoteRequest,
    ) -> Result<RemoteConversation> {
        self.pause().await;
        let id = self.check(remote_id)?;
        let note_id = self.add_conversation(id, &request.body, request.private);
        Ok(RemoteConversation {
            id: note_id,
            body_text: request.body.clone(),
            private: request.private,
            created_at: None,
        })
    }

    fn ticket_url(&self, remote_id: &str) -> String {
        format!("https://support.example.com/tickets/{remote_id}")
    }
}
