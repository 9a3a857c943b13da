//! Partition descriptors and mount table entries.

use std::path::Path;

/// fs_mgr flags relevant to remount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FsMgrFlags {
    /// Mounted and managed by vold (`voldmanaged=`).
    pub vold_managed: bool,
    /// Only mounted in recovery (`recoveryonly`).
    pub recovery_only: bool,
    /// Refers to the inactive slot (`slotselect_other`).
    pub slot_select_other: bool,
    /// Lives on a logical (dynamic) partition (`logical`).
    pub logical: bool,
    /// Uses the active slot suffix (`slotselect`).
    pub slot_select: bool,
    /// Protected by verified boot (`avb`, `avb=...`).
    pub avb: bool,
}

/// One entry of the static partition table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionDescriptor {
    /// Block device (or logical partition name for `logical` entries).
    pub block_device: String,
    /// Mount point.
    pub mount_point: String,
    /// Filesystem type.
    pub fs_type: String,
    /// Declared read-only (`ro` mount flag).
    pub read_only: bool,
    /// Remaining mount options, in table order.
    pub mount_options: Vec<String>,
    /// fs_mgr flags.
    pub fs_mgr_flags: FsMgrFlags,
}

impl PartitionDescriptor {
    /// Create a read-write descriptor with no fs_mgr flags.
    pub fn new(
        block_device: impl Into<String>,
        mount_point: impl Into<String>,
        fs_type: impl Into<String>,
    ) -> Self {
        Self {
            block_device: block_device.into(),
            mount_point: mount_point.into(),
            fs_type: fs_type.into(),
            read_only: false,
            mount_options: Vec::new(),
            fs_mgr_flags: FsMgrFlags::default(),
        }
    }

    /// Mark the descriptor read-only.
    #[must_use]
    pub fn with_read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Replace the fs_mgr flags.
    #[must_use]
    pub fn with_flags(mut self, flags: FsMgrFlags) -> Self {
        self.fs_mgr_flags = flags;
        self
    }

    /// Mount point with system-as-root folded onto `/system`.
    #[must_use]
    pub fn system_mount_point(&self) -> &str {
        system_mount_point(&self.mount_point)
    }

    /// Last path component of [`Self::system_mount_point`].
    #[must_use]
    pub fn name(&self) -> &str {
        let mount_point = self.system_mount_point();
        Path::new(mount_point)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(mount_point)
    }
}

impl From<&MountTableEntry> for PartitionDescriptor {
    fn from(entry: &MountTableEntry) -> Self {
        Self {
            block_device: entry.block_device.clone(),
            mount_point: entry.mount_point.clone(),
            fs_type: entry.fs_type.clone(),
            read_only: entry.is_read_only(),
            mount_options: entry
                .options
                .iter()
                .filter(|o| !matches!(o.as_str(), "ro" | "rw"))
                .cloned()
                .collect(),
            fs_mgr_flags: FsMgrFlags::default(),
        }
    }
}

/// Fold `/` onto `/system`; any other mount point is returned unchanged.
#[must_use]
pub fn system_mount_point(mount_point: &str) -> &str {
    if mount_point == "/" {
        "/system"
    } else {
        mount_point
    }
}

/// One line of the live kernel mount table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountTableEntry {
    /// Mounted device.
    pub block_device: String,
    /// Mount point.
    pub mount_point: String,
    /// Filesystem type.
    pub fs_type: String,
    /// Mount options as reported by the kernel.
    pub options: Vec<String>,
}

impl MountTableEntry {
    /// Create an entry with no options.
    pub fn new(
        block_device: impl Into<String>,
        mount_point: impl Into<String>,
        fs_type: impl Into<String>,
    ) -> Self {
        Self {
            block_device: block_device.into(),
            mount_point: mount_point.into(),
            fs_type: fs_type.into(),
            options: Vec::new(),
        }
    }

    /// Attach kernel options.
    #[must_use]
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the kernel reports this mount read-only.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.options.iter().any(|o| o == "ro")
    }
}
