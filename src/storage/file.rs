//! YAML file storage
//!
//! Layout under the desk directory:
//!
//! ```text
//! tickets/<uuid>.yaml         one file per ticket
//! comments/<ticket-uuid>.yaml all comments of one ticket
//! categories.yaml             the whole category registry
//! sequences/<YYYYMMDD>        per-day ticket counter
//! locks/                      lock files
//! ```
//!
//! Every read-modify-write happens under a [`FileLock`], and files are
//! replaced by rename so readers never observe a partial write.

use super::lock::FileLock;
use crate::core::{Category, Comment, Ticket, TicketId};
use crate::error::{DeskError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const TICKETS_DIR: &str = "tickets";
const COMMENTS_DIR: &str = "comments";
const SEQUENCES_DIR: &str = "sequences";
const LOCKS_DIR: &str = "locks";
const CATEGORIES_FILE: &str = "categories.yaml";

/// A ticket file that failed to parse
#[derive(Debug)]
pub struct UnreadableTicket {
    pub path: PathBuf,
    pub error: DeskError,
}

/// Outcome of reading the whole tickets directory
#[derive(Debug, Default)]
pub struct TicketScan {
    pub tickets: Vec<Ticket>,
    pub unreadable: Vec<UnreadableTicket>,
}

/// File-based storage for tickets, comments, categories and counters
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_dir: PathBuf,
}

impl FileStorage {
    /// Create a storage rooted at `base_dir`; nothing is touched on disk
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Create the directory layout if missing
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [TICKETS_DIR, COMMENTS_DIR, SEQUENCES_DIR, LOCKS_DIR] {
            fs::create_dir_all(self.base_dir.join(dir))?;
        }
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.base_dir.join(TICKETS_DIR).is_dir()
    }

    fn ticket_path(&self, id: &TicketId) -> PathBuf {
        self.base_dir.join(TICKETS_DIR).join(format!("{id}.yaml"))
    }

    fn comments_path(&self, ticket_id: &TicketId) -> PathBuf {
        self.base_dir.join(COMMENTS_DIR).join(format!("{ticket_id}.yaml"))
    }

    fn sequence_path(&self, day: &str) -> PathBuf {
        self.base_dir.join(SEQUENCES_DIR).join(day)
    }

    /// Take the named exclusive lock
    pub fn lock(&self, name: &str) -> Result<FileLock> {
        let dir = self.base_dir.join(LOCKS_DIR);
        fs::create_dir_all(&dir)?;
        FileLock::acquire(dir.join(format!("{name}.lock")))
    }

    // ----- tickets -----

    pub fn save_ticket(&self, ticket: &Ticket) -> Result<()> {
        let _lock = self.lock(&format!("ticket-{}", ticket.id))?;
        write_yaml(&self.ticket_path(&ticket.id), ticket)
    }

    pub fn load_ticket(&self, id: &TicketId) -> Result<Ticket> {
        read_yaml(&self.ticket_path(id))?.ok_or_else(|| DeskError::TicketNotFound {
            id: id.to_string(),
        })
    }

    /// Load, modify and store one ticket while holding its lock
    pub fn update_ticket<F>(&self, id: &TicketId, f: F) -> Result<Ticket>
    where
        F: FnOnce(&mut Ticket) -> Result<()>,
    {
        let _lock = self.lock(&format!("ticket-{id}"))?;
        let mut ticket = self.load_ticket(id)?;
        f(&mut ticket)?;
        write_yaml(&self.ticket_path(id), &ticket)?;
        Ok(ticket)
    }

    /// All tickets, ordered by display number
    ///
    /// Fails on the first ticket file that cannot be parsed.
    pub fn load_all_tickets(&self) -> Result<Vec<Ticket>> {
        let scan = self.scan_tickets()?;
        match scan.unreadable.into_iter().next() {
            Some(bad) => Err(bad.error),
            None => Ok(scan.tickets),
        }
    }

    /// Every readable ticket, ordered by display number, and the files that
    /// could not be parsed
    pub fn scan_tickets(&self) -> Result<TicketScan> {
        let dir = self.base_dir.join(TICKETS_DIR);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(TicketScan::default()),
            Err(e) => return Err(e.into()),
        };

        let mut scan = TicketScan::default();
        for entry in entries {
            let path = entry?.path();
            if !path.extension().is_some_and(|ext| ext == "yaml") {
                continue;
            }
            match read_yaml::<Ticket>(&path) {
                Ok(Some(ticket)) => scan.tickets.push(ticket),
                // Deleted since the directory was listed
                Ok(None) => {},
                Err(error) => scan.unreadable.push(UnreadableTicket { path, error }),
            }
        }
        scan.tickets.sort_by(|a, b| a.display_number.cmp(&b.display_number));
        Ok(scan)
    }

    /// Remove a ticket together with its comments
    pub fn delete_ticket(&self, id: &TicketId) -> Result<()> {
        let _lock = self.lock(&format!("ticket-{id}"))?;
        match fs::remove_file(self.ticket_path(id)) {
            Ok(()) => {},
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(DeskError::TicketNotFound { id: id.to_string() });
            },
            Err(e) => return Err(e.into()),
        }
        let _comments_lock = self.lock(&format!("comments-{id}"))?;
        match fs::remove_file(self.comments_path(id)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    // ----- comments -----

    pub fn load_comments(&self, ticket_id: &TicketId) -> Result<Vec<Comment>> {
        Ok(read_yaml(&self.comments_path(ticket_id))?.unwrap_or_default())
    }

    /// Modify a ticket's comment list while holding its lock
    pub fn update_comments<F, R>(&self, ticket_id: &TicketId, f: F) -> Result<R>
    where
        F: FnOnce(&mut Vec<Comment>) -> Result<R>,
    {
        let _lock = self.lock(&format!("comments-{ticket_id}"))?;
        let path = self.comments_path(ticket_id);
        let mut comments: Vec<Comment> = read_yaml(&path)?.unwrap_or_default();
        let result = f(&mut comments)?;
        write_yaml(&path, &comments)?;
        Ok(result)
    }

    // ----- categories -----

    pub fn load_categories(&self) -> Result<Vec<Category>> {
        Ok(read_yaml(&self.base_dir.join(CATEGORIES_FILE))?.unwrap_or_default())
    }

    /// Modify the whole category registry as one locked write
    pub fn update_categories<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Vec<Category>) -> Result<R>,
    {
        let _lock = self.lock("categories")?;
        let path = self.base_dir.join(CATEGORIES_FILE);
        let mut categories: Vec<Category> = read_yaml(&path)?.unwrap_or_default();
        let result = f(&mut categories)?;
        write_yaml(&path, &categories)?;
        Ok(result)
    }

    // ----- sequences -----

    /// Atomically increment the counter for `day` and return the new value
    ///
    /// Returns `None`, leaving the counter untouched, once it has reached `max`.
    pub fn increment_sequence(&self, day: &str, max: u32) -> Result<Option<u32>> {
        let _lock = self.lock(&format!("sequence-{day}"))?;
        let path = self.sequence_path(day);
        let current = match fs::read_to_string(&path) {
            Ok(content) => content.trim().parse::<u32>().map_err(|e| {
                DeskError::custom(format!("corrupt counter {}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };

        if current >= max {
            return Ok(None);
        }
        let next = current + 1;
        write_atomic(&path, next.to_string().as_bytes())?;
        Ok(Some(next))
    }

    /// Overwrite the counter for `day`
    pub fn set_sequence(&self, day: &str, value: u32) -> Result<()> {
        let _lock = self.lock(&format!("sequence-{day}"))?;
        write_atomic(&self.sequence_path(day), value.to_string().as_bytes())
    }
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(serde_yaml::from_str(&content)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn write_yaml<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let content = serde_yaml::to_string(value)?;
    write_atomic(path, content.as_bytes())
}

fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
    fs::write(&tmp, content)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}
