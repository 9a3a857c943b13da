//! Filesystem operations.
//!
//! This module handles:
//! - Read-write remount of a mounted partition
//! - Clearing the block device read-only bit
//! - OverlayFS over read-only partitions

mod mounts;
mod overlay;

pub use mounts::{mount_overlay, remount_read_write, set_block_read_only};
pub use overlay::OverlayFs;
