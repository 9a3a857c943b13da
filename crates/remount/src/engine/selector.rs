//! Chooses which partitions a run works on.

use remount_common::{RemountError, RemountResult};
use remount_fstab::{Fstab, MountTable, PartitionDescriptor, system_mount_point};

use crate::services::OverlayManager;

/// Filesystems never remounted; the overlay strategy does not support them.
const UNSUPPORTED_FS: &[&str] = &["vfat"];

/// Ordered set of partitions keyed by mount point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    entries: Vec<PartitionDescriptor>,
}

impl SelectionSet {
    /// Add `entry` unless its mount point is already present.
    /// Returns whether it was inserted.
    pub fn insert(&mut self, entry: PartitionDescriptor) -> bool {
        if self.contains(&entry.mount_point) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Whether `mount_point` is selected.
    #[must_use]
    pub fn contains(&self, mount_point: &str) -> bool {
        self.entries.iter().any(|e| e.mount_point == mount_point)
    }

    /// Keep only the entries for which `keep` returns true.
    pub fn retain(&mut self, keep: impl FnMut(&mut PartitionDescriptor) -> bool) {
        self.entries.retain_mut(keep);
    }

    /// Selected mount points, in selection order.
    pub fn mount_points(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.mount_point.as_str())
    }

    /// Iterate entries.
    pub fn iter(&self) -> std::slice::Iter<'_, PartitionDescriptor> {
        self.entries.iter()
    }

    /// Iterate entries mutably.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, PartitionDescriptor> {
        self.entries.iter_mut()
    }

    /// Entries as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[PartitionDescriptor] {
        &self.entries
    }

    /// Number of selected partitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Candidate whose mount point strictly contains `entry`'s, if any.
#[must_use]
pub fn wrapped_entry<'c>(
    candidates: &'c Fstab,
    entry: &PartitionDescriptor,
) -> Option<&'c PartitionDescriptor> {
    let mount_point = entry.system_mount_point();
    candidates.iter().find(|candidate| {
        let parent = format!("{}/", candidate.system_mount_point());
        mount_point.starts_with(&parent)
    })
}

/// Whether `entry` may be remounted read-write.
#[must_use]
pub fn is_remountable(candidates: &Fstab, entry: &PartitionDescriptor) -> bool {
    let flags = &entry.fs_mgr_flags;
    if flags.vold_managed || flags.recovery_only || flags.slot_select_other {
        return false;
    }
    if !entry.read_only {
        return false;
    }
    if UNSUPPORTED_FS.contains(&entry.fs_type.as_str()) {
        return false;
    }
    if let Some(candidate) = candidates.entry_for_mount_point(&entry.mount_point) {
        return candidate.fs_type == entry.fs_type;
    }
    wrapped_entry(candidates, entry).is_none()
}

/// Resolves caller requests into a [`SelectionSet`].
pub struct PartitionSelector<'a> {
    fstab: &'a Fstab,
    candidates: &'a Fstab,
    overlay: &'a dyn OverlayManager,
    live: &'a MountTable,
}

impl<'a> PartitionSelector<'a> {
    /// Create a selector over `fstab`, using `live` to tell duplicate
    /// descriptors apart.
    pub fn new(
        fstab: &'a Fstab,
        candidates: &'a Fstab,
        overlay: &'a dyn OverlayManager,
        live: &'a MountTable,
    ) -> Self {
        Self {
            fstab,
            candidates,
            overlay,
            live,
        }
    }

    /// Every remountable partition in the table.
    #[must_use]
    pub fn select_all(&self) -> SelectionSet {
        let mut set = SelectionSet::default();
        for entry in self.fstab.iter().filter(|e| is_remountable(self.candidates, e)) {
            set.insert(entry.clone());
        }
        set
    }

    /// Partitions named by the caller, by mount point or name.
    ///
    /// Fails on the first request that matches nothing or is not
    /// remountable; nothing is mutated before selection completes.
    pub fn select_named<S: AsRef<str>>(&self, names: &[S]) -> RemountResult<SelectionSet> {
        let mut set = SelectionSet::default();
        for arg in names {
            let arg = arg.as_ref();
            let partition = system_mount_point(arg);

            let Some(mut entry) = self.find_partition(partition) else {
                tracing::error!(partition = %arg, "Unknown partition");
                return Err(RemountError::UnknownPartition {
                    name: arg.to_string(),
                });
            };

            if let Some(wrap) = wrapped_entry(self.candidates, entry) {
                tracing::info!(
                    partition = %arg,
                    overlay = %wrap.mount_point,
                    "Partition covered by overlayfs, switching"
                );
                entry = wrap;
            }

            // Already-overlaid partitions are kept so later stages skip
            // them gracefully on a repeated run.
            if !self.overlay.already_mounted(&entry.mount_point)
                && !is_remountable(self.candidates, entry)
            {
                tracing::error!(partition = %arg, "Invalid partition");
                return Err(RemountError::InvalidPartition {
                    name: arg.to_string(),
                });
            }

            if !set.insert(entry.clone()) {
                tracing::debug!(mount_point = %entry.mount_point, "Already selected");
            }
        }
        Ok(set)
    }

    /// First entry matching `partition` whose declared type is the type
    /// actually mounted there. Tables may list several entries for one
    /// mount point; only the live type tells them apart.
    fn find_partition(&self, partition: &str) -> Option<&'a PartitionDescriptor> {
        self.fstab.iter().find(|entry| {
            (partition == entry.system_mount_point() || partition == entry.name())
                && self
                    .mounted_at(&entry.mount_point)
                    .is_some_and(|fs_type| fs_type == entry.fs_type)
        })
    }

    /// Filesystem type mounted at `mount_point`, folding `/` and `/system`
    /// together for system-as-root devices.
    fn mounted_at(&self, mount_point: &str) -> Option<&'a str> {
        let complement = match mount_point {
            "/system" => Some("/"),
            "/" => Some("/system"),
            _ => None,
        };
        self.live
            .find(mount_point)
            .or_else(|| complement.and_then(|mp| self.live.find(mp)))
            .map(|e| e.fs_type.as_str())
    }
}
