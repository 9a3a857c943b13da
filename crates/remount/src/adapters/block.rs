//! Kernel block device and remount calls.

use std::path::Path;

use crate::filesystem;
use crate::services::BlockDevices;

/// Talks to the kernel directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceBlocks;

impl BlockDevices for DeviceBlocks {
    fn set_read_only(&self, device: &str, read_only: bool) -> std::io::Result<()> {
        filesystem::set_block_read_only(Path::new(device), read_only)
    }

    fn remount(&self, device: &str, mount_point: &str, fs_type: &str) -> std::io::Result<()> {
        filesystem::remount_read_write(device, mount_point, fs_type)
    }
}
