//! Exclusive lock files
//!
//! A lock is a file created with `create_new`, which the OS guarantees is
//! atomic: of any number of concurrent creators exactly one succeeds. The
//! others back off and retry. Locks left behind by crashed processes are
//! reclaimed once they are older than [`LockOptions::stale_after`].
//!
//! Reclaiming happens under a second `create_new` guard next to the lock, and
//! staleness is checked again while holding it. Two waiters that both saw the
//! same stale lock therefore remove it once; the slower one finds either no
//! lock or a fresh one. Each lock records an owner token and is only removed
//! on drop while it still carries that token.

use crate::error::{DeskError, Result};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// Retry behaviour for lock acquisition
#[derive(Debug, Clone, Copy)]
pub struct LockOptions {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub stale_after: Duration,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            max_attempts: 1000,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(20),
            stale_after: Duration::from_secs(30),
        }
    }
}

/// Held lock; released on drop
#[derive(Debug)]
pub struct FileLock {
    path: PathBuf,
    token: String,
}

impl FileLock {
    /// Acquire the lock at `path` with default options
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self> {
        Self::acquire_with(path, LockOptions::default())
    }

    /// Acquire the lock at `path`, retrying with exponential backoff
    pub fn acquire_with(path: impl Into<PathBuf>, options: LockOptions) -> Result<Self> {
        let path = path.into();
        let mut backoff = options.initial_backoff;

        for attempt in 0..options.max_attempts {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    // Owner pid first, for humans inspecting a stuck lock
                    let token = format!("{}:{}", std::process::id(), Uuid::new_v4().simple());
                    if let Err(e) = writeln!(file, "{token}") {
                        drop(file);
                        let _ = fs::remove_file(&path);
                        return Err(e.into());
                    }
                    return Ok(Self { path, token });
                },
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if is_stale(&path, options.stale_after)
                        && reclaim_stale(&path, options.stale_after)
                    {
                        continue;
                    }
                    if attempt > 0 && attempt % 100 == 0 {
                        tracing::debug!(lock = %path.display(), attempt, "waiting for lock");
                    }
                    thread::sleep(backoff);
                    backoff = (backoff * 2).min(options.max_backoff);
                },
                Err(e) => return Err(e.into()),
            }
        }

        Err(DeskError::LockTimeout { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // A lock reclaimed from under a slow holder belongs to someone else now
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim() == self.token => {
                let _ = fs::remove_file(&self.path);
            },
            Ok(_) => {
                tracing::warn!(lock = %self.path.display(), "lock was reclaimed while held");
            },
            Err(_) => {},
        }
    }
}

fn reclaim_guard_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".reclaim");
    path.with_file_name(name)
}

/// Remove the stale lock at `path`, at most once across concurrent waiters
///
/// Returns whether a lock was removed.
fn reclaim_stale(path: &Path, stale_after: Duration) -> bool {
    let guard = reclaim_guard_path(path);
    if OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&guard)
        .is_err()
    {
        // Someone else is reclaiming; a guard orphaned by a crash ages out
        if is_stale(&guard, stale_after) {
            let _ = fs::remove_file(&guard);
        }
        return false;
    }

    let removed = is_stale(path, stale_after) && fs::remove_file(path).is_ok();
    if removed {
        tracing::warn!(lock = %path.display(), "reclaimed stale lock");
    }
    let _ = fs::remove_file(&guard);
    removed
}

fn is_stale(path: &Path, stale_after: Duration) -> bool {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age > stale_after)
}
