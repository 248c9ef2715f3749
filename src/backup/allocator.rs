//! Slot allocation
//!
//! Decides which slot number the next backup of a project goes into. The
//! decision is a pure function of the catalog, the capacity policy and the
//! protected set; nothing here touches the filesystem.
//!
//! - Unbounded (`max_versions <= 0`): one past the highest existing slot.
//! - Bounded with room: the lowest free number in `[0, max_versions)`.
//! - Bounded and full, hard cap: refuse with `CapacityExceeded`.
//! - Bounded and full, queue mode: reuse the oldest unprotected slot.
//!
//! Slots numbered at or above `max_versions` (left over from a larger limit)
//! are ignored: never counted, never evicted.

use std::collections::BTreeSet;

use tracing::debug;

use super::catalog::{oldest_of, BackupSlot};
use crate::error::{BkupError, BkupResult};

/// How many slots a project may hold and what happens when they are full
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityPolicy {
    pub max_versions: i64,
    pub queue_mode: bool,
}

impl CapacityPolicy {
    pub fn new(max_versions: i64, queue_mode: bool) -> Self {
        Self {
            max_versions,
            queue_mode,
        }
    }

    /// The slot bound, or `None` when unbounded
    pub fn bound(&self) -> Option<u32> {
        if self.max_versions <= 0 {
            None
        } else {
            Some(u32::try_from(self.max_versions).unwrap_or(u32::MAX))
        }
    }
}

/// Slot numbers that must not be evicted by the current operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectedSlots(BTreeSet<u32>);

impl ProtectedSlots {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn single(slot: u32) -> Self {
        Self(BTreeSet::from([slot]))
    }

    pub fn insert(&mut self, slot: u32) {
        self.0.insert(slot);
    }

    pub fn contains(&self, slot: u32) -> bool {
        self.0.contains(&slot)
    }
}

impl FromIterator<u32> for ProtectedSlots {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Outcome of an allocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// Slot number the new backup is written to
    pub slot_number: u32,
    /// The existing backup that will be overwritten, in queue mode
    pub evicted: Option<BackupSlot>,
}

/// Choose the slot for the next backup
pub fn allocate(
    slots: &[BackupSlot],
    policy: &CapacityPolicy,
    protected: &ProtectedSlots,
) -> BkupResult<Allocation> {
    let Some(max) = policy.bound() else {
        let slot_number = match slots.iter().map(|s| s.slot_number).max() {
            Some(highest) => highest.checked_add(1).ok_or_else(|| {
                BkupError::Validation(format!("slot numbers exhausted (highest is {})", highest))
            })?,
            None => 0,
        };
        debug!(slot_number, "unbounded allocation");
        return Ok(Allocation {
            slot_number,
            evicted: None,
        });
    };

    let used: Vec<&BackupSlot> = slots.iter().filter(|s| s.slot_number < max).collect();
    let taken: BTreeSet<u32> = used.iter().map(|s| s.slot_number).collect();

    if (taken.len() as u64) < u64::from(max) {
        // A gap must exist below `max` since fewer than `max` numbers are taken
        let slot_number = (0..max).find(|n| !taken.contains(n)).unwrap_or(0);
        debug!(slot_number, max, "free slot");
        return Ok(Allocation {
            slot_number,
            evicted: None,
        });
    }

    if !policy.queue_mode {
        return Err(BkupError::CapacityExceeded { max_versions: max });
    }

    let victim = oldest_of(used.into_iter().filter(|s| !protected.contains(s.slot_number)))
        .ok_or(BkupError::AllCandidatesProtected { max_versions: max })?;

    debug!(slot_number = victim.slot_number, created_at = %victim.created_at, "evicting oldest slot");
    Ok(Allocation {
        slot_number: victim.slot_number,
        evicted: Some(victim.clone()),
    })
}
