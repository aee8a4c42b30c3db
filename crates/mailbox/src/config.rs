//! Configuration for opening a mailbox store
//!
//! Settings are loaded (in order of priority) from:
//! 1. Environment variables (`MAILBOX_BACKEND`, `MAILBOX_DATABASE_PATH`)
//! 2. JSON file (`mailbox.json` in the config directory)
//! 3. Built-in defaults

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use crate::error::MailboxError;
use crate::notification::DEFAULT_BADGE_CAP;
use crate::storage::{EmailUserStore, InMemoryEmailUserStore, SqliteEmailUserStore};

/// Config filename in the mailbox config directory
pub const CONFIG_FILE: &str = "mailbox.json";

const DATABASE_FILE: &str = "mailbox.sqlite";

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sqlite,
    Memory,
}

impl FromStr for Backend {
    type Err = MailboxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Backend::Sqlite),
            "memory" => Ok(Backend::Memory),
            other => Err(MailboxError::UnknownBackend(other.to_string())),
        }
    }
}

/// Mailbox settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailboxConfig {
    pub backend: Backend,
    /// SQLite file; defaults to `mailbox.sqlite` in the config directory
    pub database_path: Option<PathBuf>,
    /// Largest unseen count shown as a number in the badge
    pub badge_cap: usize,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Sqlite,
            database_path: None,
            badge_cap: DEFAULT_BADGE_CAP,
        }
    }
}

impl MailboxConfig {
    /// Load from the config directory, then apply environment overrides
    pub fn load() -> Result<Self> {
        let config: Self = config::load_json_or_default(CONFIG_FILE)?;
        config.with_env_overrides()
    }

    /// Load from a specific JSON file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let config: Self = config::load_json_file(path)?;
        config.with_env_overrides()
    }

    /// Parse from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse mailbox config JSON")
    }

    fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply `MAILBOX_BACKEND` / `MAILBOX_DATABASE_PATH` as returned by `var`
    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(backend) = var("MAILBOX_BACKEND") {
            self.backend = backend.parse()?;
        }
        if let Some(path) = var("MAILBOX_DATABASE_PATH").filter(|p| !p.is_empty()) {
            self.database_path = Some(PathBuf::from(path));
        }
        Ok(self)
    }

    /// The SQLite file this config points at
    pub fn resolved_database_path(&self) -> Option<PathBuf> {
        self.database_path
            .clone()
            .or_else(|| config::config_path(DATABASE_FILE))
    }

    /// Open the configured store
    pub fn open_store(&self) -> Result<Arc<dyn EmailUserStore>> {
        match self.backend {
            Backend::Memory => {
                info!("Using in-memory mailbox store");
                Ok(Arc::new(InMemoryEmailUserStore::new()))
            }
            Backend::Sqlite => {
                let path = self
                    .resolved_database_path()
                    .context("Could not determine mailbox database path")?;
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create database directory: {}", parent.display())
                    })?;
                }
                info!("Opening mailbox database at {}", path.display());
                Ok(Arc::new(SqliteEmailUserStore::open(&path)?))
            }
        }
    }
}
