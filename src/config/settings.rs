//! User settings for bkup
//!
//! A flat record persisted as `config.json` at the backup root: the capacity
//! limit and the directory `bkup go` last jumped away from.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::BkupPaths;
use crate::error::{BkupError, BkupResult};
use crate::fs::FileSystem;
use crate::storage::file_io::{read_json, write_json_atomic};

/// Default number of slots kept per project
pub const DEFAULT_MAX_VERSIONS: i64 = 10;

/// User settings for bkup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Slots per project; zero or negative means unbounded
    #[serde(default = "default_max_versions")]
    pub max_versions: i64,

    /// Directory recorded by the last `bkup go`, empty when unset
    #[serde(default)]
    pub prev_path: String,
}

fn default_max_versions() -> i64 {
    DEFAULT_MAX_VERSIONS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_versions: default_max_versions(),
            prev_path: String::new(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or default settings if the file doesn't exist
    ///
    /// A file that exists but doesn't parse is fatal: capacity and revert
    /// decisions must not run on guessed values.
    pub fn load_or_default<F: FileSystem + ?Sized>(fs: &F, paths: &BkupPaths) -> BkupResult<Self> {
        let settings_path = paths.settings_file();
        match read_json(fs, &settings_path) {
            Ok(Some(settings)) => Ok(settings),
            // Don't save yet - let the caller decide when to persist
            Ok(None) => Ok(Settings::default()),
            Err(BkupError::ConfigCorrupt(msg)) => Err(BkupError::ConfigCorrupt(format!(
                "{} (fix or delete the file)",
                msg
            ))),
            Err(e) => Err(e),
        }
    }

    /// Save settings to disk atomically
    pub fn save<F: FileSystem + ?Sized>(&self, fs: &F, paths: &BkupPaths) -> BkupResult<()> {
        write_json_atomic(fs, &paths.settings_file(), self)
    }

    /// The recorded previous directory, if any
    pub fn prev_path(&self) -> Option<PathBuf> {
        let trimmed = self.prev_path.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }

    /// Whether the capacity is unbounded
    pub fn is_unbounded(&self) -> bool {
        self.max_versions <= 0
    }
}
