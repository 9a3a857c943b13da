//! Overlay fallback backed by a scratch directory.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use remount_common::{RemountError, RemountPaths, RemountResult};
use remount_fstab::{Fstab, PartitionDescriptor, system_mount_point};

use super::ProcMounts;
use crate::filesystem::OverlayFs;
use crate::services::{MountTableReader, OverlayManager};

/// Filesystems that cannot be written in place.
const READ_ONLY_FILESYSTEMS: &[&str] = &["erofs", "squashfs"];

/// Mount points never covered by an overlay.
const EXCLUDED_MOUNT_POINTS: &[&str] = &["/data", "/cache", "/metadata", "/mnt", "/apex"];

/// Overlays whose upper and work dirs live under one scratch root.
#[derive(Debug, Clone)]
pub struct ScratchOverlay {
    paths: RemountPaths,
    mounts: ProcMounts,
}

impl ScratchOverlay {
    /// Manager storing overlays under `paths.scratch_root`.
    #[must_use]
    pub const fn new(paths: RemountPaths, mounts: ProcMounts) -> Self {
        Self { paths, mounts }
    }

    fn overlay(&self, mount_point: &str) -> OverlayFs {
        OverlayFs::for_partition(&self.paths, mount_point)
    }

    /// Scratch directories referenced by a mounted overlay.
    fn scratch_in_use(&self) -> HashSet<PathBuf> {
        let Ok(table) = self.mounts.snapshot() else {
            return HashSet::new();
        };
        table
            .iter()
            .filter(|m| m.fs_type == "overlay")
            .flat_map(|m| m.options.iter())
            .filter_map(|opt| opt.strip_prefix("upperdir="))
            .filter_map(|upper| Path::new(upper).parent().map(Path::to_path_buf))
            .collect()
    }
}

/// Root and `/system` live on the running root filesystem; an overlay over
/// them only takes effect after a reboot.
fn is_system_root(mount_point: &str) -> bool {
    system_mount_point(mount_point) == "/system"
}

/// Directly below `/`, or `/` itself.
fn is_top_level(mount_point: &str) -> bool {
    mount_point.trim_start_matches('/').split('/').count() <= 1
}

impl OverlayManager for ScratchOverlay {
    fn candidates(&self, fstab: &Fstab) -> Fstab {
        fstab
            .iter()
            .filter(|entry| {
                let flags = &entry.fs_mgr_flags;
                entry.read_only
                    && !flags.vold_managed
                    && !flags.recovery_only
                    && !flags.slot_select_other
                    && entry.fs_type != "vfat"
                    && is_top_level(&entry.mount_point)
                    && !EXCLUDED_MOUNT_POINTS.contains(&entry.mount_point.as_str())
            })
            .cloned()
            .collect()
    }

    fn wants_overlay(&self, entry: &PartitionDescriptor) -> bool {
        READ_ONLY_FILESYSTEMS.contains(&entry.fs_type.as_str())
    }

    fn setup(&self, mount_point: &str, force: bool) -> RemountResult<bool> {
        let overlay = self.overlay(mount_point);
        overlay.create_dirs()?;
        tracing::debug!(
            mount_point,
            scratch = %overlay.scratch_dir().display(),
            "Prepared overlay scratch"
        );
        Ok(force || (is_system_root(mount_point) && !self.already_mounted(mount_point)))
    }

    fn already_mounted(&self, mount_point: &str) -> bool {
        self.mounts.snapshot().is_ok_and(|table| {
            table
                .find_latest(mount_point)
                .is_some_and(|m| m.fs_type == "overlay")
        })
    }

    fn mount_all(&self, partitions: &[PartitionDescriptor]) -> RemountResult<()> {
        let mut failed = Vec::new();
        for entry in partitions {
            let mount_point = entry.mount_point.as_str();
            if !self.wants_overlay(entry) || is_system_root(mount_point) || self.already_mounted(mount_point) {
                continue;
            }
            let overlay = self.overlay(mount_point);
            if !overlay.is_prepared() {
                continue;
            }
            if let Err(e) = overlay.mount() {
                tracing::warn!(mount_point, error = %e, "Failed to mount overlayfs");
                failed.push(mount_point);
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(RemountError::Overlay {
                mount_point: failed.join(","),
                reason: "mount failed".to_string(),
            })
        }
    }

    fn cleanup_scratch(&self) -> RemountResult<()> {
        let root = &self.paths.scratch_root;
        if !root.is_dir() {
            return Ok(());
        }

        let in_use = self.scratch_in_use();
        for dir in std::fs::read_dir(root)? {
            let path = dir?.path();
            if !path.is_dir() || in_use.contains(&path) {
                continue;
            }
            tracing::info!(path = %path.display(), "Removing stale overlay scratch");
            std::fs::remove_dir_all(&path)?;
        }
        Ok(())
    }
}
