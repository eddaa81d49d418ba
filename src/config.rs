//! Configuration management
//!
//! Settings are layered, lowest precedence first: built-in defaults, the user
//! config file in the platform config directory, `<storage_dir>/config.yaml`,
//! then `ETDESK_*` environment variables (`__` separates nesting levels, e.g.
//! `ETDESK_REMOTE__API_KEY`).

use crate::core::{DEFAULT_PREFIX, is_valid_prefix};
use crate::error::{DeskError, Result};
use config::{Config as ConfigSource, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory used when none is given
pub const DEFAULT_STORAGE_DIR: &str = ".etdesk";

const ENV_PREFIX: &str = "ETDESK";
const CONFIG_FILE: &str = "config.yaml";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    /// Follows the desk's location; never written to the project file
    #[serde(skip_serializing)]
    pub storage_dir: PathBuf,
    pub ticket_prefix: String,
    pub remote: RemoteConfig,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            ticket_prefix: DEFAULT_PREFIX.to_string(),
            remote: RemoteConfig::default(),
        }
    }
}

/// External helpdesk connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// API root, e.g. `https://acme.example-desk.com/api/v2`
    pub base_url: Option<String>,
    /// Base for human-facing ticket links; falls back to `base_url`
    pub portal_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            portal_url: None,
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl RemoteConfig {
    /// Both an endpoint and a credential are required
    pub fn is_enabled(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.base_url) && present(&self.api_key)
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl DeskConfig {
    /// Load configuration from all sources
    pub fn load(storage_dir: Option<&Path>) -> Result<Self> {
        Self::load_with_env(storage_dir, None)
    }

    /// Load configuration, reading environment variables from `env` when given
    pub fn load_with_env(
        storage_dir: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        let storage_dir =
            storage_dir.map_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR), Path::to_path_buf);

        let mut builder = ConfigSource::builder()
            .set_default("storage_dir", storage_dir.to_string_lossy().to_string())?
            .set_default("ticket_prefix", DEFAULT_PREFIX)?
            .set_default("remote.timeout_secs", 30_i64)?;

        if let Some(path) = user_config_path() {
            builder = builder.add_source(File::from(path).required(false));
        }

        let config = builder
            .add_source(File::from(storage_dir.join(CONFIG_FILE)).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .source(env),
            )
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Check invariants the type system cannot express
    pub fn validate(&self) -> Result<()> {
        if !is_valid_prefix(&self.ticket_prefix) {
            return Err(DeskError::validation(format!(
                "ticket_prefix '{}' must be uppercase letters and digits",
                self.ticket_prefix
            )));
        }
        if self.remote.timeout_secs == 0 {
            return Err(DeskError::validation("remote.timeout_secs must be positive"));
        }
        Ok(())
    }

    /// Write the project config file, leaving credentials out
    pub fn save_project_file(&self) -> Result<PathBuf> {
        let mut shareable = self.clone();
        shareable.remote.api_key = None;
        let path = self.storage_dir.join(CONFIG_FILE);
        std::fs::write(&path, serde_yaml::to_string(&shareable)?)?;
        Ok(path)
    }
}

fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "etdesk", "etdesk").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}
