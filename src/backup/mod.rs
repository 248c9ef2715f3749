//! Versioned backup slots for bkup
//!
//! Each project (a directory, identified by its base name) owns a set of
//! numbered slot directories under `<backupRoot>/<project>_backup/`.
//!
//! # Architecture
//!
//! - `MetadataStore`: per-slot `.bkup_meta.json` sidecar holding the creation time
//! - `VersionCatalog`: lists slots and resolves their creation times
//! - `allocate`: picks the slot for the next backup under a `CapacityPolicy`
//! - `BackupWriter`: copies a tree into a slot, all or nothing
//! - `BackupManager`: catalog + allocator + writer, plus cleanup
//! - `RestoreManager`: the pull flow (safety backup, stage, swap)
//!
//! # Capacity
//!
//! With `max_versions > 0` slots are numbered `0..max_versions`. When they are
//! all in use a new backup is refused unless queue mode is on, in which case
//! the oldest slot (by sidecar timestamp, ties to the lower number) is
//! overwritten. With `max_versions <= 0` numbering just keeps growing.
//!
//! # Example
//!
//! ```rust,ignore
//! use bkup::backup::{BackupManager, CapacityPolicy, ProtectedSlots, Project};
//!
//! let fs = RealFs::new();
//! let manager = BackupManager::new(&fs, paths.clone());
//! let outcome = manager.create_backup(&project, &CapacityPolicy::new(10, false), &ProtectedSlots::none(), Utc::now())?;
//!
//! // Later, roll the live directory back to that slot
//! let restore = RestoreManager::new(&fs, paths);
//! let result = restore.pull(&project, outcome.slot_number, &policy, Utc::now())?;
//! println!("{}", result.summary());
//! ```

mod allocator;
mod catalog;
mod manager;
mod metadata;
mod project;
mod restore;
mod writer;

pub use allocator::{allocate, Allocation, CapacityPolicy, ProtectedSlots};
pub use catalog::{newest_of, oldest_of, BackupSlot, VersionCatalog};
pub use manager::{BackupManager, BackupOutcome, CleanResult};
pub use metadata::{MetadataStore, ResolvedTimestamp, SlotMetadata, TimestampSource, METADATA_FILE_NAME};
pub use project::Project;
pub use restore::{RestoreManager, RestoreResult};
pub use writer::BackupWriter;
