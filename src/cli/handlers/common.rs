use crate::config::{DEFAULT_STORAGE_DIR, DeskConfig};
use crate::error::{DeskError, Result};
use crate::events::EventBus;
use crate::services::TicketService;
use crate::storage::FileStorage;
use crate::sync::ReconciliationEngine;
use std::path::{Path, PathBuf};

/// Find the closest directory at or above `start` that holds a desk
pub fn find_project_root(start: &Path) -> Result<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(DEFAULT_STORAGE_DIR).is_dir())
        .map(Path::to_path_buf)
        .ok_or(DeskError::NotInitialized)
}

/// Everything a command needs to work on an initialized desk
pub struct HandlerContext {
    pub config: DeskConfig,
    pub service: TicketService,
}

impl HandlerContext {
    /// Locate the desk from the current directory and load its configuration
    pub fn load() -> Result<Self> {
        let root = find_project_root(&std::env::current_dir()?)?;
        let config = DeskConfig::load(Some(&root.join(DEFAULT_STORAGE_DIR)))?;

        let storage = FileStorage::new(&config.storage_dir);
        if !storage.is_initialized() {
            return Err(DeskError::NotInitialized);
        }
        tracing::debug!(storage = %storage.base_dir().display(), "desk located");

        let service = TicketService::new(storage, config.ticket_prefix.clone(), EventBus::new());
        Ok(Self { config, service })
    }

    pub const fn storage(&self) -> &FileStorage {
        self.service.storage()
    }

    /// Reconciliation engine for this desk; disabled without credentials
    pub fn engine(&self) -> Result<ReconciliationEngine> {
        ReconciliationEngine::from_config(
            self.storage().clone(),
            &self.config.remote,
            self.service.events().clone(),
        )
    }
}
