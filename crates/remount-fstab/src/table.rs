//! Ordered partition tables.

use std::path::Path;

use remount_common::{RemountError, RemountResult};

use crate::entry::{MountTableEntry, PartitionDescriptor};
use crate::parse;

/// The static partition table, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fstab {
    entries: Vec<PartitionDescriptor>,
}

impl Fstab {
    /// Create an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Parse an fstab file.
    pub fn from_file(path: &Path) -> RemountResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RemountError::FstabRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(parse::parse_fstab(&content))
    }

    /// Point `slotselect` entries at the running slot's partitions.
    ///
    /// `slotselect` devices get `suffix`, `slotselect_other` devices the
    /// suffix of the other slot. An empty suffix (non-A/B device) leaves the
    /// table unchanged.
    pub fn apply_slot_suffix(&mut self, suffix: &str) {
        if suffix.is_empty() {
            return;
        }
        let other = other_slot_suffix(suffix);
        for entry in &mut self.entries {
            if entry.fs_mgr_flags.slot_select {
                entry.block_device.push_str(suffix);
            } else if entry.fs_mgr_flags.slot_select_other {
                entry.block_device.push_str(other);
            }
        }
    }

    /// First entry mounted at `mount_point`.
    #[must_use]
    pub fn entry_for_mount_point(&self, mount_point: &str) -> Option<&PartitionDescriptor> {
        self.entries.iter().find(|e| e.mount_point == mount_point)
    }

    /// Append an entry.
    pub fn push(&mut self, entry: PartitionDescriptor) {
        self.entries.push(entry);
    }

    /// Iterate entries in table order.
    pub fn iter(&self) -> std::slice::Iter<'_, PartitionDescriptor> {
        self.entries.iter()
    }

    /// Entries as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[PartitionDescriptor] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<PartitionDescriptor> for Fstab {
    fn from_iter<I: IntoIterator<Item = PartitionDescriptor>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Fstab {
    type Item = &'a PartitionDescriptor;
    type IntoIter = std::slice::Iter<'a, PartitionDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn other_slot_suffix(suffix: &str) -> &'static str {
    match suffix {
        "_a" => "_b",
        "_b" => "_a",
        _ => "",
    }
}

/// One snapshot of the live kernel mount table.
///
/// Mounting changes the table, so every snapshot is an independent value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountTable {
    entries: Vec<MountTableEntry>,
}

impl MountTable {
    /// Parse a `/proc/mounts` style file.
    pub fn from_file(path: &Path) -> RemountResult<Self> {
        let records = proc_mounts::MountIter::new_from_file(path).map_err(|e| RemountError::NoMounts {
            reason: format!("{}: {e}", path.display()),
        })?;
        Ok(parse::collect_mounts(records))
    }

    /// Oldest entry mounted at `mount_point`.
    #[must_use]
    pub fn find(&self, mount_point: &str) -> Option<&MountTableEntry> {
        self.entries.iter().find(|e| e.mount_point == mount_point)
    }

    /// Most recent entry mounted at `mount_point`, i.e. the one visible on top.
    #[must_use]
    pub fn find_latest(&self, mount_point: &str) -> Option<&MountTableEntry> {
        self.entries.iter().rev().find(|e| e.mount_point == mount_point)
    }

    /// Iterate entries, oldest first.
    pub fn iter(&self) -> std::slice::Iter<'_, MountTableEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<MountTableEntry> for MountTable {
    fn from_iter<I: IntoIterator<Item = MountTableEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
