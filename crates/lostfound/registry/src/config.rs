//! Registry configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default journal file name inside the data directory.
pub const DEFAULT_JOURNAL_FILE: &str = "registry.wal";

/// When journal appends are forced to disk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// fsync after every append
    #[default]
    Immediate,
    /// No explicit fsync; the OS decides
    OsManaged,
}

/// Registry configuration. Without a data directory the registry is purely
/// in memory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Directory holding the journal
    pub data_dir: Option<PathBuf>,
    /// Journal file name, relative to `data_dir`
    pub journal_file: String,
    pub sync_mode: SyncMode,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            journal_file: DEFAULT_JOURNAL_FILE.to_string(),
            sync_mode: SyncMode::default(),
        }
    }
}

impl RegistryConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.data_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn with_sync_mode(mut self, sync_mode: SyncMode) -> Self {
        self.sync_mode = sync_mode;
        self
    }

    /// Full journal path, if persistence is enabled.
    pub fn journal_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(&self.journal_file))
    }
}
