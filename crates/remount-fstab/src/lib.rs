//! # remount-fstab
//!
//! Partition table types for remount.
//!
//! This crate provides Rust types for:
//! - Static partition descriptors (fstab entries) and their fs_mgr flags
//! - Snapshots of the live kernel mount table
//! - Parsers for the Android fstab format and `/proc/mounts`

#![warn(missing_docs)]

pub mod entry;
pub mod parse;
pub mod table;

pub use entry::{FsMgrFlags, MountTableEntry, PartitionDescriptor, system_mount_point};
pub use table::{Fstab, MountTable};
