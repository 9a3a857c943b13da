//! Loads the static partition table.

use std::path::Path;

use remount_common::{RemountError, RemountResult};
use remount_fstab::{Fstab, MountTable, PartitionDescriptor};

use crate::services::FstabSource;

/// Filesystem type the kernel reports for the initramfs root.
const SYNTHETIC_ROOT_FS: &str = "rootfs";

/// Loads the fstab a run works from.
pub struct FstabResolver<'a> {
    source: &'a dyn FstabSource,
}

impl<'a> FstabResolver<'a> {
    /// Create a resolver reading from `source`.
    pub fn new(source: &'a dyn FstabSource) -> Self {
        Self { source }
    }

    /// Load `explicit` if given, otherwise the platform default.
    ///
    /// Legacy single-partition layouts carry no `/` or `/system` entry in
    /// their default table; for those a root entry is synthesized from the
    /// live mount table.
    pub fn resolve(&self, explicit: Option<&Path>, live: &MountTable) -> RemountResult<Fstab> {
        let fstab = match explicit {
            Some(path) => self.source.read_file(path)?,
            None => {
                let mut fstab = self.source.read_default()?;
                add_missing_root(&mut fstab, live);
                fstab
            }
        };

        if fstab.is_empty() {
            return Err(RemountError::FstabRead {
                path: explicit.map_or_else(|| "default fstab".to_string(), |p| p.display().to_string()),
                reason: "no entries".to_string(),
            });
        }

        tracing::debug!(entries = fstab.len(), "Loaded fstab");
        Ok(fstab)
    }
}

fn add_missing_root(fstab: &mut Fstab, live: &MountTable) {
    if fstab.entry_for_mount_point("/system").is_some() || fstab.entry_for_mount_point("/").is_some() {
        return;
    }
    let Some(root) = live.find("/") else {
        return;
    };
    if root.fs_type == SYNTHETIC_ROOT_FS {
        return;
    }
    tracing::debug!(device = %root.block_device, fs_type = %root.fs_type, "Adding / entry from mount table");
    fstab.push(PartitionDescriptor::from(root));
}
