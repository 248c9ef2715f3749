//! Version catalog
//!
//! Lists the numbered slot directories of a project and resolves each one's
//! creation time through the [`MetadataStore`].

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use super::metadata::{MetadataStore, TimestampSource};
use crate::config::paths::parse_slot_dir_name;
use crate::error::{BkupError, BkupResult};
use crate::fs::{EntryKind, FileSystem};

/// One existing backup of a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSlot {
    pub slot_number: u32,
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub timestamp_source: TimestampSource,
}

impl BackupSlot {
    /// Whether `created_at` came from the sidecar rather than a fallback
    pub fn has_metadata(&self) -> bool {
        self.timestamp_source == TimestampSource::Sidecar
    }
}

/// Reads the set of existing slots for a project
pub struct VersionCatalog<'a> {
    fs: &'a dyn FileSystem,
}

impl<'a> VersionCatalog<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self { fs }
    }

    /// List the slots under `project_dir`, ascending by slot number
    ///
    /// Entries that are not directories named `<project>_<digits>` are
    /// skipped; the directory may hold unrelated files. A missing project
    /// directory simply has no slots.
    pub fn list(&self, project_dir: &Path, project: &str) -> BkupResult<Vec<BackupSlot>> {
        let entries = match self.fs.read_dir(project_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(BkupError::io("list", project_dir, e)),
        };

        let metadata = MetadataStore::new(self.fs);
        let mut slots = Vec::new();

        for entry in entries {
            if entry.kind != EntryKind::Dir {
                continue;
            }
            let Some(slot_number) = entry
                .name
                .to_str()
                .and_then(|name| parse_slot_dir_name(project, name))
            else {
                debug!(entry = %entry.path.display(), "skipping non-slot entry");
                continue;
            };

            let resolved = metadata.read(&entry.path)?;
            slots.push(BackupSlot {
                slot_number,
                path: entry.path,
                created_at: resolved.created_at,
                timestamp_source: resolved.source,
            });
        }

        slots.sort_by_key(|s| s.slot_number);
        Ok(slots)
    }

    /// The most recently created slot, or `None` when there are no backups yet
    pub fn newest(&self, project_dir: &Path, project: &str) -> BkupResult<Option<BackupSlot>> {
        let slots = self.list(project_dir, project)?;
        Ok(newest_of(&slots).cloned())
    }

    /// Look up a single slot by number
    pub fn get(&self, project_dir: &Path, project: &str, slot: u32) -> BkupResult<Option<BackupSlot>> {
        let slots = self.list(project_dir, project)?;
        Ok(slots.into_iter().find(|s| s.slot_number == slot))
    }
}

/// Greatest `created_at`; ties go to the greatest slot number
pub fn newest_of(slots: &[BackupSlot]) -> Option<&BackupSlot> {
    slots.iter().max_by_key(|s| (s.created_at, s.slot_number))
}

/// Smallest `created_at`; ties go to the smallest slot number
pub fn oldest_of<'s>(slots: impl IntoIterator<Item = &'s BackupSlot>) -> Option<&'s BackupSlot> {
    slots.into_iter().min_by_key(|s| (s.created_at, s.slot_number))
}
