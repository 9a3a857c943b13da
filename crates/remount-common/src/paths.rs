//! Well-known device paths and system property names.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;

/// Kernel mount table.
pub const PROC_MOUNTS: &str = "/proc/mounts";

/// Generic device name the kernel reports for the root filesystem.
pub const ROOT_ALIAS_DEVICE: &str = "/dev/root";

/// Directory holding device-mapper nodes for logical partitions.
pub const LOGICAL_MAPPER_DIR: &str = "/dev/block/mapper";

/// Directories searched, in order, for the default fstab.
pub const DEFAULT_FSTAB_DIRS: &[&str] = &["/odm/etc", "/vendor/etc", "/system/etc", "/"];

/// Default root for overlay scratch storage.
pub static SCRATCH_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var("REMOUNT_SCRATCH_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/mnt/scratch/overlay"))
});

/// System property names consulted by remount.
pub mod props {
    /// Virtual A/B is enabled.
    pub const VIRTUAL_AB_ENABLED: &str = "ro.virtual_ab.enabled";
    /// Virtual A/B is retrofitted.
    pub const VIRTUAL_AB_RETROFIT: &str = "ro.virtual_ab.retrofit";
    /// Build allows debugging.
    pub const DEBUGGABLE: &str = "ro.debuggable";
    /// Verified boot lock state.
    pub const VBMETA_DEVICE_STATE: &str = "ro.boot.vbmeta.device_state";
    /// Active boot slot suffix.
    pub const SLOT_SUFFIX: &str = "ro.boot.slot_suffix";
    /// Hardware name used to locate the default fstab.
    pub const BOOT_HARDWARE: &str = "ro.boot.hardware";
    /// Fallback hardware name.
    pub const HARDWARE: &str = "ro.hardware";
    /// Writing to this property asks init to reboot.
    pub const POWERCTL: &str = "sys.powerctl";
    /// Init state of the vold service.
    pub const VOLD_STATE: &str = "init.svc.vold";
}

/// Paths used by a remount run.
#[derive(Debug, Clone)]
pub struct RemountPaths {
    /// Kernel mount table.
    pub proc_mounts: PathBuf,
    /// Logical partition mapper directory.
    pub mapper_dir: PathBuf,
    /// Root directory for overlay scratch storage.
    pub scratch_root: PathBuf,
}

impl Default for RemountPaths {
    fn default() -> Self {
        Self {
            proc_mounts: PathBuf::from(PROC_MOUNTS),
            mapper_dir: PathBuf::from(LOGICAL_MAPPER_DIR),
            scratch_root: SCRATCH_ROOT.clone(),
        }
    }
}

impl RemountPaths {
    /// Create paths with default locations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create paths with a custom scratch root.
    #[must_use]
    pub fn with_scratch_root(root: impl Into<PathBuf>) -> Self {
        Self {
            scratch_root: root.into(),
            ..Self::default()
        }
    }

    /// Scratch directory for one mount point.
    #[must_use]
    pub fn overlay_dir(&self, mount_point: &str) -> PathBuf {
        self.scratch_root.join(scratch_name(mount_point))
    }

    /// Overlay upper directory for one mount point.
    #[must_use]
    pub fn overlay_upper(&self, mount_point: &str) -> PathBuf {
        self.overlay_dir(mount_point).join("upper")
    }

    /// Overlay work directory for one mount point.
    #[must_use]
    pub fn overlay_work(&self, mount_point: &str) -> PathBuf {
        self.overlay_dir(mount_point).join("work")
    }

    /// Mapper node for a logical partition name.
    #[must_use]
    pub fn mapper_node(&self, name: &str) -> PathBuf {
        let name = Path::new(name)
            .file_name()
            .map_or_else(|| name.to_string(), |n| n.to_string_lossy().into_owned());
        self.mapper_dir.join(name)
    }
}

/// Flatten a mount point into a single directory name.
fn scratch_name(mount_point: &str) -> String {
    let trimmed = mount_point.trim_matches('/');
    if trimmed.is_empty() {
        "system".to_string()
    } else {
        trimmed.replace('/', "_")
    }
}
