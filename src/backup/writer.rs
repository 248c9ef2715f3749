//! Backup writer
//!
//! Materializes one slot: copies the source tree and stamps a fresh sidecar.
//! The copy is assembled in a hidden sibling directory and only renamed onto
//! the slot path once complete, so a failed backup never shows up in the
//! catalog as a valid slot.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use super::metadata::MetadataStore;
use crate::config::paths::slot_dir_name;
use crate::error::{BkupError, BkupResult};
use crate::fs::FileSystem;

/// Writes backups into slot directories
pub struct BackupWriter<'a> {
    fs: &'a dyn FileSystem,
}

impl<'a> BackupWriter<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self { fs }
    }

    /// Copy `source` into slot `slot` of `project` under `project_dir`
    ///
    /// Any previous contents of the slot are replaced. On failure the new
    /// data is discarded and no partially written slot is left behind.
    pub fn write(
        &self,
        source: &Path,
        project_dir: &Path,
        project: &str,
        slot: u32,
        now: DateTime<Utc>,
    ) -> BkupResult<PathBuf> {
        let slot_name = slot_dir_name(project, slot);
        let slot_path = project_dir.join(&slot_name);
        let incoming = project_dir.join(format!(".{}.incoming-{}", slot_name, Uuid::new_v4().simple()));

        self.fs
            .create_dir_all(project_dir)
            .map_err(|e| BkupError::io("create directory", project_dir, e))?;

        if let Err(e) = self.assemble(source, &incoming, now) {
            self.discard(&incoming);
            return Err(e);
        }

        if self.fs.exists(&slot_path) {
            debug!(slot = %slot_path.display(), "clearing previous slot contents");
            if let Err(e) = self.fs.remove_dir_all(&slot_path) {
                self.discard(&incoming);
                return Err(BkupError::io("clear slot", &slot_path, e));
            }
        }

        if let Err(e) = self.fs.rename(&incoming, &slot_path) {
            self.discard(&incoming);
            return Err(BkupError::io("commit slot", &slot_path, e));
        }

        Ok(slot_path)
    }

    fn assemble(&self, source: &Path, incoming: &Path, now: DateTime<Utc>) -> BkupResult<()> {
        self.fs
            .create_dir_all(incoming)
            .map_err(|e| BkupError::io("create directory", incoming, e))?;
        self.fs
            .copy_tree(source, incoming)
            .map_err(|e| BkupError::io("copy tree from", source, e))?;
        MetadataStore::new(self.fs).write(incoming, now)
    }

    fn discard(&self, dir: &Path) {
        if !self.fs.exists(dir) {
            return;
        }
        if let Err(e) = self.fs.remove_dir_all(dir) {
            warn!(path = %dir.display(), error = %e, "could not remove incomplete backup");
        }
    }
}
