//! Per-slot metadata sidecar
//!
//! Each slot carries `.bkup_meta.json` recording when its current contents
//! were captured. Directory mtimes are not trustworthy for ordering (an
//! overwrite in queue mode rewrites them), so the sidecar is authoritative and
//! the mtime is only a fallback.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{BkupError, BkupResult};
use crate::fs::FileSystem;
use crate::storage::file_io::{read_json, write_json_atomic};

/// File name of the sidecar inside a slot directory
pub const METADATA_FILE_NAME: &str = ".bkup_meta.json";

/// On-disk sidecar record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotMetadata {
    /// Seconds since the Unix epoch; the value used for ordering
    pub created_unix: i64,
    /// Human-readable form of the same instant
    pub created_rfc3339: String,
}

impl SlotMetadata {
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            created_unix: created_at.timestamp(),
            created_rfc3339: created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// The recorded instant, if `created_unix` is in chrono's range
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created_unix, 0)
    }
}

/// Where a resolved creation time came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampSource {
    /// Parsed from the sidecar
    Sidecar,
    /// Sidecar absent or unreadable; slot directory mtime used instead
    ModifiedTime,
    /// Neither was available; the epoch is used so the slot sorts oldest
    Unknown,
}

/// A creation time together with its provenance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTimestamp {
    pub created_at: DateTime<Utc>,
    pub source: TimestampSource,
}

impl ResolvedTimestamp {
    /// Whether the sidecar was present and parseable
    pub fn has_metadata(&self) -> bool {
        self.source == TimestampSource::Sidecar
    }
}

/// Reads and writes slot sidecars
pub struct MetadataStore<'a> {
    fs: &'a dyn FileSystem,
}

impl<'a> MetadataStore<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self { fs }
    }

    /// Durably replace the sidecar of `slot_dir`
    pub fn write(&self, slot_dir: &Path, created_at: DateTime<Utc>) -> BkupResult<()> {
        let path = slot_dir.join(METADATA_FILE_NAME);
        write_json_atomic(self.fs, &path, &SlotMetadata::new(created_at))
    }

    /// Resolve the creation time of `slot_dir`: sidecar, then mtime, then epoch
    ///
    /// Only a genuine failure to read an existing sidecar is an error.
    pub fn read(&self, slot_dir: &Path) -> BkupResult<ResolvedTimestamp> {
        let path = slot_dir.join(METADATA_FILE_NAME);
        match read_json::<SlotMetadata, _>(self.fs, &path) {
            Ok(Some(meta)) => match meta.created_at() {
                Some(created_at) => {
                    return Ok(ResolvedTimestamp {
                        created_at,
                        source: TimestampSource::Sidecar,
                    })
                }
                None => warn!(
                    path = %path.display(),
                    created_unix = meta.created_unix,
                    "sidecar timestamp out of range, falling back to mtime"
                ),
            },
            Ok(None) => debug!(slot = %slot_dir.display(), "no sidecar, falling back to mtime"),
            Err(BkupError::ConfigCorrupt(msg)) => {
                warn!(error = %msg, "unparseable sidecar, falling back to mtime")
            }
            Err(e) => return Err(e),
        }

        Ok(self.fallback(slot_dir))
    }

    fn fallback(&self, slot_dir: &Path) -> ResolvedTimestamp {
        match self.fs.symlink_metadata(slot_dir).map(|m| m.modified) {
            Ok(Some(modified)) => ResolvedTimestamp {
                created_at: DateTime::<Utc>::from(modified),
                source: TimestampSource::ModifiedTime,
            },
            Ok(None) => {
                warn!(slot = %slot_dir.display(), "no modification time available");
                unknown()
            }
            Err(e) => {
                warn!(slot = %slot_dir.display(), error = %e, "could not stat slot directory");
                unknown()
            }
        }
    }
}

fn unknown() -> ResolvedTimestamp {
    ResolvedTimestamp {
        created_at: DateTime::UNIX_EPOCH,
        source: TimestampSource::Unknown,
    }
}
