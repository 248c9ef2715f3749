//! Backup restoration for bkup
//!
//! A pull replaces the live directory's contents with one backup slot:
//!
//! 1. Verify the requested slot exists (nothing is touched otherwise).
//! 2. Back up the live directory with the requested slot protected.
//! 3. Stage a copy of the slot next to the live directory.
//! 4. Clear the live directory in place and copy the staged tree into it.
//! 5. Discard the staging directory.
//!
//! Failing at steps 1-3 leaves the live directory unchanged. A failure in
//! step 4 keeps the staged copy and reports where both it and the safety
//! backup are.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use super::allocator::{CapacityPolicy, ProtectedSlots};
use super::manager::{BackupManager, BackupOutcome};
use super::metadata::{MetadataStore, TimestampSource, METADATA_FILE_NAME};
use super::project::Project;
use crate::config::paths::{slot_dir_name, BkupPaths};
use crate::error::{BkupError, BkupResult};
use crate::fs::{clear_dir, FileSystem};

/// Handles restoring from backups
pub struct RestoreManager<'a> {
    fs: &'a dyn FileSystem,
    paths: BkupPaths,
}

/// Result of a pull
#[derive(Debug, Clone)]
pub struct RestoreResult {
    /// Slot the live directory was restored from
    pub restored_slot: u32,
    /// Path of that slot
    pub restored_from: PathBuf,
    /// Creation time of the restored backup
    pub backup_date: DateTime<Utc>,
    /// Whether `backup_date` came from the sidecar
    pub backup_date_source: TimestampSource,
    /// Top-level entries written into the live directory
    pub entries_restored: usize,
    /// Backup of the live directory taken just before the restore
    pub safety_backup: BackupOutcome,
}

impl RestoreResult {
    /// Get a summary of what was restored
    pub fn summary(&self) -> String {
        format!(
            "Restored slot {} ({} item(s), created {}). Previous state saved in slot {}",
            self.restored_slot,
            self.entries_restored,
            self.backup_date.format("%Y-%m-%d %H:%M:%S UTC"),
            self.safety_backup.slot_number,
        )
    }
}

impl<'a> RestoreManager<'a> {
    /// Create a new RestoreManager
    pub fn new(fs: &'a dyn FileSystem, paths: BkupPaths) -> Self {
        Self { fs, paths }
    }

    /// Replace the contents of the project's live directory with slot `slot`
    pub fn pull(
        &self,
        project: &Project,
        slot: u32,
        policy: &CapacityPolicy,
        now: DateTime<Utc>,
    ) -> BkupResult<RestoreResult> {
        let live = project.root();
        let slot_path = self.paths.slot_dir(project.name(), slot);
        self.verify_slot(&slot_path, project.name(), slot)?;

        let staging = staging_dir(live, project.name())?;
        let resolved = MetadataStore::new(self.fs).read(&slot_path)?;

        // The safety backup must exist before the live directory is touched
        let safety_backup = BackupManager::new(self.fs, self.paths.clone()).create_backup(
            project,
            policy,
            &ProtectedSlots::single(slot),
            now,
        )?;
        info!(
            project = project.name(),
            slot = safety_backup.slot_number,
            "saved pre-pull state"
        );

        if let Err(e) = self.stage(&slot_path, &staging) {
            self.discard(&staging);
            return Err(e);
        }

        let entries_restored = self.swap_in(&staging, live, &safety_backup)?;
        self.discard(&staging);

        info!(project = project.name(), slot, entries = entries_restored, "pulled backup");
        Ok(RestoreResult {
            restored_slot: slot,
            restored_from: slot_path,
            backup_date: resolved.created_at,
            backup_date_source: resolved.source,
            entries_restored,
            safety_backup,
        })
    }

    fn verify_slot(&self, slot_path: &Path, project: &str, slot: u32) -> BkupResult<()> {
        match self.fs.symlink_metadata(slot_path) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(BkupError::slot_not_found(slot_dir_name(project, slot))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(BkupError::slot_not_found(slot_dir_name(project, slot)))
            }
            Err(e) => Err(BkupError::io("inspect", slot_path, e)),
        }
    }

    /// Copy the slot into a fresh staging directory, minus its sidecar
    fn stage(&self, slot_path: &Path, staging: &Path) -> BkupResult<()> {
        self.fs
            .create_dir_all(staging)
            .map_err(|e| BkupError::io("create staging directory", staging, e))?;
        self.fs
            .copy_tree(slot_path, staging)
            .map_err(|e| BkupError::io("stage backup from", slot_path, e))?;

        let sidecar = staging.join(METADATA_FILE_NAME);
        if self.fs.exists(&sidecar) {
            self.fs
                .remove_file(&sidecar)
                .map_err(|e| BkupError::io("remove", &sidecar, e))?;
        }
        Ok(())
    }

    /// Clear the live directory in place and fill it from the staged tree
    fn swap_in(&self, staging: &Path, live: &Path, safety: &BackupOutcome) -> BkupResult<usize> {
        let recovery = |op: &str, e: io::Error| {
            BkupError::Io(format!(
                "{} {} failed: {}. The staged copy is kept at {} and the previous contents are in {}",
                op,
                live.display(),
                e,
                staging.display(),
                safety.path.display()
            ))
        };

        let entries = self
            .fs
            .read_dir(staging)
            .map_err(|e| BkupError::io("read staging directory", staging, e))?
            .len();

        clear_dir(self.fs, live).map_err(|e| recovery("clearing", e))?;
        self.fs
            .copy_tree(staging, live)
            .map_err(|e| recovery("restoring into", e))?;
        Ok(entries)
    }

    fn discard(&self, staging: &Path) {
        if !self.fs.exists(staging) {
            return;
        }
        if let Err(e) = self.fs.remove_dir_all(staging) {
            warn!(path = %staging.display(), error = %e, "could not remove staging directory");
        }
    }
}

/// Hidden, uniquely named sibling of the live directory
fn staging_dir(live: &Path, project: &str) -> BkupResult<PathBuf> {
    let parent = live.parent().ok_or_else(|| {
        BkupError::Validation(format!("{} has no parent to stage a restore in", live.display()))
    })?;
    Ok(parent.join(format!(".{}.bkup-pull-{}", project, Uuid::new_v4().simple())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::fs::MemoryFs;
    use std::collections::BTreeMap;

    const LIVE: &str = "/work/x";

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn paths() -> BkupPaths {
        BkupPaths::with_base_dir(PathBuf::from("/b"))
    }

    fn project() -> Project {
        Project::current(&Context::new("/home/u", LIVE)).unwrap()
    }

    fn snapshot(fs: &MemoryFs, dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
        fs.descendants(dir)
            .into_iter()
            .filter_map(|p| {
                let data = fs.read(&p).ok()?;
                Some((p.strip_prefix(dir).ok()?.to_path_buf(), data))
            })
            .collect()
    }

    fn populate(fs: &MemoryFs) {
        fs.create_dir_all(Path::new("/work/x/docs")).unwrap();
        fs.write(Path::new("/work/x/a.txt"), b"original a").unwrap();
        fs.write(Path::new("/work/x/docs/b.md"), b"original b").unwrap();
    }

    fn mutate(fs: &MemoryFs) {
        fs.write(Path::new("/work/x/a.txt"), b"changed a").unwrap();
        fs.remove_dir_all(Path::new("/work/x/docs")).unwrap();
        fs.write(Path::new("/work/x/new.txt"), b"new").unwrap();
    }

    #[test]
    fn test_pull_round_trip() {
        let fs = MemoryFs::new();
        populate(&fs);
        let original = snapshot(&fs, Path::new(LIVE));
        let manager = BackupManager::new(&fs, paths());
        let policy = CapacityPolicy::new(5, false);
        let snap = manager
            .create_backup(&project(), &policy, &ProtectedSlots::none(), at(100))
            .unwrap();
        mutate(&fs);
        let mutated = snapshot(&fs, Path::new(LIVE));

        let result = RestoreManager::new(&fs, paths())
            .pull(&project(), snap.slot_number, &policy, at(200))
            .unwrap();

        assert_eq!(snapshot(&fs, Path::new(LIVE)), original);
        assert!(!fs.exists(Path::new("/work/x").join(METADATA_FILE_NAME).as_path()));
        assert_eq!(result.restored_slot, 0);
        assert_eq!(result.backup_date, at(100));
        assert_eq!(result.entries_restored, 2);

        // Safety backup holds the mutated state (plus its sidecar)
        let mut safety = snapshot(&fs, &result.safety_backup.path);
        safety.remove(Path::new(METADATA_FILE_NAME));
        assert_eq!(safety, mutated);
        assert_eq!(result.safety_backup.slot_number, 1);

        // No staging directory left behind
        let leftovers: Vec<_> = fs
            .read_dir(Path::new("/work"))
            .unwrap()
            .into_iter()
            .filter(|e| e.name.to_string_lossy().contains("bkup-pull"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_pull_missing_slot_touches_nothing() {
        let fs = MemoryFs::new();
        populate(&fs);
        let before = snapshot(&fs, Path::new(LIVE));

        let err = RestoreManager::new(&fs, paths())
            .pull(&project(), 7, &CapacityPolicy::new(5, false), at(1))
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(snapshot(&fs, Path::new(LIVE)), before);
        assert!(!fs.exists(Path::new("/b/x_backup")));
    }

    #[test]
    fn test_pull_aborts_when_safety_backup_refused() {
        let fs = MemoryFs::new();
        populate(&fs);
        let manager = BackupManager::new(&fs, paths());
        let policy = CapacityPolicy::new(2, false);
        manager.create_backup(&project(), &policy, &ProtectedSlots::none(), at(1)).unwrap();
        manager.create_backup(&project(), &policy, &ProtectedSlots::none(), at(2)).unwrap();
        mutate(&fs);
        let before = snapshot(&fs, Path::new(LIVE));

        let err = RestoreManager::new(&fs, paths())
            .pull(&project(), 0, &policy, at(3))
            .unwrap_err();

        assert!(matches!(err, BkupError::CapacityExceeded { .. }));
        assert_eq!(snapshot(&fs, Path::new(LIVE)), before);
    }

    #[test]
    fn test_pull_never_evicts_its_source_slot() {
        let fs = MemoryFs::new();
        populate(&fs);
        let manager = BackupManager::new(&fs, paths());
        let hard = CapacityPolicy::new(2, false);
        // Slot 0 is the oldest and therefore the natural victim
        manager.create_backup(&project(), &hard, &ProtectedSlots::none(), at(10)).unwrap();
        let original = snapshot(&fs, Path::new(LIVE));
        mutate(&fs);
        manager.create_backup(&project(), &hard, &ProtectedSlots::none(), at(20)).unwrap();

        let queue = CapacityPolicy::new(2, true);
        let result = RestoreManager::new(&fs, paths())
            .pull(&project(), 0, &queue, at(30))
            .unwrap();

        assert_eq!(result.safety_backup.slot_number, 1);
        assert_eq!(result.safety_backup.evicted.as_ref().unwrap().slot_number, 1);
        assert_eq!(snapshot(&fs, Path::new(LIVE)), original);
    }

    #[test]
    fn test_pull_with_every_slot_protected() {
        let fs = MemoryFs::new();
        populate(&fs);
        let manager = BackupManager::new(&fs, paths());
        manager
            .create_backup(&project(), &CapacityPolicy::new(1, false), &ProtectedSlots::none(), at(1))
            .unwrap();
        mutate(&fs);
        let before = snapshot(&fs, Path::new(LIVE));

        let err = RestoreManager::new(&fs, paths())
            .pull(&project(), 0, &CapacityPolicy::new(1, true), at(2))
            .unwrap_err();

        assert!(matches!(err, BkupError::AllCandidatesProtected { max_versions: 1 }));
        assert_eq!(snapshot(&fs, Path::new(LIVE)), before);
    }

    #[test]
    fn test_failed_staging_leaves_live_dir_alone() {
        let fs = MemoryFs::new();
        populate(&fs);
        let manager = BackupManager::new(&fs, paths());
        let policy = CapacityPolicy::new(5, false);
        manager.create_backup(&project(), &policy, &ProtectedSlots::none(), at(1)).unwrap();
        mutate(&fs);
        let before = snapshot(&fs, Path::new(LIVE));

        fs.fail_writes_where(|p| {
            p.parent()
                .and_then(Path::file_name)
                .is_some_and(|n| n.to_string_lossy().contains("bkup-pull"))
        });
        let err = RestoreManager::new(&fs, paths())
            .pull(&project(), 0, &policy, at(2))
            .unwrap_err();

        assert!(matches!(err, BkupError::Io(_)));
        assert_eq!(snapshot(&fs, Path::new(LIVE)), before);
        assert_eq!(fs.read_dir(Path::new("/work")).unwrap().len(), 1);
    }
}
