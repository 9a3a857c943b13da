//! Seams to the platform.
//!
//! Every external collaborator of a remount run sits behind one of these
//! traits: system properties, the partition table source, the kernel mount
//! table, the privileged services (checkpoint, verified boot, overlayfs,
//! dynamic system update) and the block device / reboot syscalls. The
//! device implementations live in [`crate::adapters`]; tests substitute
//! in-memory fakes.

mod retry;

use std::path::Path;

use remount_common::RemountResult;
use remount_fstab::{Fstab, MountTable, PartitionDescriptor};

pub use retry::RetryPolicy;

/// Read-only runtime configuration (system properties).
pub trait PropertySource {
    /// Value of `key`, or `None` when unset or empty.
    fn get(&self, key: &str) -> Option<String>;

    /// Set `key` to `value`.
    fn set(&self, key: &str, value: &str) -> RemountResult<()>;

    /// Boolean value of `key`, `default` when unset or unparsable.
    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key).as_deref() {
            Some("1" | "y" | "yes" | "on" | "true") => true,
            Some("0" | "n" | "no" | "off" | "false") => false,
            _ => default,
        }
    }
}

/// Source of the static partition table.
pub trait FstabSource {
    /// Read the table at an explicit path.
    fn read_file(&self, path: &Path) -> RemountResult<Fstab>;

    /// Read the platform default table.
    fn read_default(&self) -> RemountResult<Fstab>;
}

/// Snapshots the live kernel mount table.
pub trait MountTableReader {
    /// Take a fresh snapshot.
    fn snapshot(&self) -> RemountResult<MountTable>;
}

/// Filesystem checkpoint status service.
pub trait CheckpointService {
    /// Whether a checkpoint is currently in progress.
    fn is_checkpointing(&self) -> RemountResult<bool>;
}

/// Acquires a handle to the checkpoint service.
pub trait CheckpointConnector {
    /// One connection attempt; `None` when the service is not up yet.
    fn connect(&self) -> Option<Box<dyn CheckpointService + '_>>;
}

/// Verified boot control.
pub trait VerityControl {
    /// Whether verified boot currently protects `entry`.
    fn is_verity_enabled(&self, entry: &PartitionDescriptor) -> bool;

    /// Disable verified boot for the slot identified by `slot_suffix`.
    fn disable_verity(&self, slot_suffix: &str) -> RemountResult<()>;
}

/// Overlay filesystem manager.
pub trait OverlayManager {
    /// Entries eligible for overlay fallback. Candidates also wrap every
    /// entry mounted below them.
    fn candidates(&self, fstab: &Fstab) -> Fstab;

    /// Whether `entry` cannot be remounted directly and needs an overlay.
    fn wants_overlay(&self, entry: &PartitionDescriptor) -> bool;

    /// Prepare overlay storage for `mount_point`. Returns whether a reboot
    /// is required before the overlay takes effect.
    fn setup(&self, mount_point: &str, force: bool) -> RemountResult<bool>;

    /// Whether an overlay is already mounted over `mount_point`.
    fn already_mounted(&self, mount_point: &str) -> bool;

    /// Mount overlays for every partition that wants one.
    fn mount_all(&self, partitions: &[PartitionDescriptor]) -> RemountResult<()>;

    /// Remove scratch storage no mounted overlay still uses.
    fn cleanup_scratch(&self) -> RemountResult<()>;
}

/// Resolves logical partitions to their device-mapper nodes.
pub trait LogicalPartitionMapper {
    /// Rewrite `entry.block_device` to the mapped device.
    fn resolve(&self, entry: &mut PartitionDescriptor) -> RemountResult<()>;
}

/// Block device and remount syscalls.
pub trait BlockDevices {
    /// Set or clear the read-only bit of `device`.
    fn set_read_only(&self, device: &str, read_only: bool) -> std::io::Result<()>;

    /// Remount `mount_point` read-write.
    fn remount(&self, device: &str, mount_point: &str, fs_type: &str) -> std::io::Result<()>;
}

/// Dynamic system update service.
pub trait DsuService {
    /// Whether a DSU guest is running.
    fn is_running(&self) -> RemountResult<bool>;

    /// Whether the DSU guest is enabled for the next boot.
    fn is_enabled(&self) -> RemountResult<bool>;

    /// Name of the active DSU slot.
    fn active_slot(&self) -> RemountResult<String>;

    /// Enable the guest in `slot` for one boot. Returns the service's
    /// install status; zero means success.
    fn enable_one_shot(&self, slot: &str) -> RemountResult<i32>;
}

/// Acquires a handle to the DSU service.
pub trait DsuConnector {
    /// `None` when the feature is not present on this device.
    fn connect(&self) -> Option<Box<dyn DsuService + '_>>;
}

/// Reboots the device.
pub trait Rebooter {
    /// Request a reboot with `reason`. Returns only if the request was
    /// accepted without the device going down (tests) or with an error.
    fn reboot(&self, reason: &str) -> RemountResult<()>;
}

/// Every platform seam a remount run uses.
pub struct Platform {
    /// System properties.
    pub properties: Box<dyn PropertySource>,
    /// Static partition table.
    pub fstab: Box<dyn FstabSource>,
    /// Live mount table.
    pub mounts: Box<dyn MountTableReader>,
    /// Checkpoint service.
    pub checkpoint: Box<dyn CheckpointConnector>,
    /// Verified boot control.
    pub verity: Box<dyn VerityControl>,
    /// Overlay filesystem manager.
    pub overlay: Box<dyn OverlayManager>,
    /// Logical partition mapper.
    pub mapper: Box<dyn LogicalPartitionMapper>,
    /// Block device syscalls.
    pub block: Box<dyn BlockDevices>,
    /// DSU service.
    pub dsu: Box<dyn DsuConnector>,
    /// Reboot trigger.
    pub rebooter: Box<dyn Rebooter>,
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform").finish_non_exhaustive()
    }
}
