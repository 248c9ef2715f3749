//! Backup manager for bkup
//!
//! Ties the catalog, the allocator and the writer together: read the current
//! slots, decide where the next backup goes, then commit it.

use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::info;

use super::allocator::{allocate, CapacityPolicy, ProtectedSlots};
use super::catalog::{BackupSlot, VersionCatalog};
use super::project::Project;
use super::writer::BackupWriter;
use crate::config::paths::{BkupPaths, SETTINGS_FILE_NAME};
use crate::error::{BkupError, BkupResult};
use crate::fs::{EntryKind, FileSystem};

/// Result of creating a backup
#[derive(Debug, Clone)]
pub struct BackupOutcome {
    pub slot_number: u32,
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    /// The backup that was overwritten to make room, in queue mode
    pub evicted: Option<BackupSlot>,
}

/// Result of a clean operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanResult {
    /// Number of top-level items removed
    pub removed: usize,
    /// Whether `config.json` was present and kept
    pub kept_config: bool,
}

/// Manages backup creation, listing and cleanup
pub struct BackupManager<'a> {
    fs: &'a dyn FileSystem,
    paths: BkupPaths,
}

impl<'a> BackupManager<'a> {
    /// Create a new BackupManager
    pub fn new(fs: &'a dyn FileSystem, paths: BkupPaths) -> Self {
        Self { fs, paths }
    }

    /// Get the path layout
    pub fn paths(&self) -> &BkupPaths {
        &self.paths
    }

    /// List the project's backups, ascending by slot number
    pub fn list_backups(&self, project: &Project) -> BkupResult<Vec<BackupSlot>> {
        VersionCatalog::new(self.fs).list(&self.paths.project_dir(project.name()), project.name())
    }

    /// Get the most recently created backup
    pub fn newest_backup(&self, project: &Project) -> BkupResult<Option<BackupSlot>> {
        VersionCatalog::new(self.fs).newest(&self.paths.project_dir(project.name()), project.name())
    }

    /// Back up the project's live directory into a slot chosen by `policy`
    ///
    /// Slots in `protected` are never chosen for eviction. Nothing is
    /// modified if the policy refuses.
    pub fn create_backup(
        &self,
        project: &Project,
        policy: &CapacityPolicy,
        protected: &ProtectedSlots,
        now: DateTime<Utc>,
    ) -> BkupResult<BackupOutcome> {
        self.check_source(project)?;

        let project_dir = self.paths.project_dir(project.name());
        let slots = VersionCatalog::new(self.fs).list(&project_dir, project.name())?;
        let allocation = allocate(&slots, policy, protected)?;

        let path = BackupWriter::new(self.fs).write(
            project.root(),
            &project_dir,
            project.name(),
            allocation.slot_number,
            now,
        )?;

        match &allocation.evicted {
            Some(old) => info!(
                project = project.name(),
                slot = allocation.slot_number,
                replaced_created_at = %old.created_at,
                "overwrote oldest backup"
            ),
            None => info!(project = project.name(), slot = allocation.slot_number, "created backup"),
        }

        Ok(BackupOutcome {
            slot_number: allocation.slot_number,
            path,
            created_at: now,
            evicted: allocation.evicted,
        })
    }

    /// Refuse sources that are missing or that contain the backup root
    fn check_source(&self, project: &Project) -> BkupResult<()> {
        let root = project.root();
        match self.fs.symlink_metadata(root) {
            Ok(meta) if meta.kind == EntryKind::Dir => {}
            Ok(_) => {
                return Err(BkupError::Validation(format!(
                    "{} is not a directory",
                    root.display()
                )))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(BkupError::NotFound {
                    entity_type: "Directory",
                    identifier: root.display().to_string(),
                })
            }
            Err(e) => return Err(BkupError::io("inspect", root, e)),
        }

        if self.paths.base_dir().starts_with(root) {
            return Err(BkupError::Validation(format!(
                "cannot back up {}: it contains the backup root {}",
                root.display(),
                self.paths.base_dir().display()
            )));
        }
        Ok(())
    }

    /// Delete everything under the backup root except `config.json`
    pub fn clean_all(&self) -> BkupResult<CleanResult> {
        let base = self.paths.base_dir();
        let entries = match self.fs.read_dir(base) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(CleanResult::default()),
            Err(e) => return Err(BkupError::io("read backup root", base, e)),
        };

        let mut result = CleanResult::default();
        for entry in entries {
            if entry.kind == EntryKind::File && entry.name == SETTINGS_FILE_NAME {
                result.kept_config = true;
                continue;
            }
            let removal = match entry.kind {
                EntryKind::Dir => self.fs.remove_dir_all(&entry.path),
                EntryKind::File | EntryKind::Symlink => self.fs.remove_file(&entry.path),
            };
            removal.map_err(|e| BkupError::io("remove", &entry.path, e))?;
            result.removed += 1;
        }

        info!(removed = result.removed, "cleaned backup root");
        Ok(result)
    }

    /// Delete every backup of one project
    pub fn clean_project(&self, project: &Project) -> BkupResult<usize> {
        let project_dir = self.paths.project_dir(project.name());
        let count = self.list_backups(project)?.len();
        match self.fs.remove_dir_all(&project_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(BkupError::io("remove", &project_dir, e)),
        }
        info!(project = project.name(), removed = count, "cleaned project backups");
        Ok(count)
    }
}
