//! Raw read-write remount of one partition.

use remount_common::paths::ROOT_ALIAS_DEVICE;
use remount_common::{RemountError, RemountResult};
use remount_fstab::{Fstab, MountTable, PartitionDescriptor};
use rustix::io::Errno;

use crate::services::{BlockDevices, LogicalPartitionMapper};

/// What happened to a partition handed to [`RemountExecutor::remount`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemountAction {
    /// The partition is now mounted read-write.
    Remounted,
    /// The partition is not mounted; nothing to do.
    NotMounted,
}

/// Issues the remount syscall sequence against the post-overlay mount table.
pub struct RemountExecutor<'a> {
    fstab: &'a Fstab,
    mounts: &'a MountTable,
    mapper: &'a dyn LogicalPartitionMapper,
    block: &'a dyn BlockDevices,
}

impl<'a> RemountExecutor<'a> {
    /// Create an executor. `mounts` must be taken after overlays were mounted.
    pub fn new(
        fstab: &'a Fstab,
        mounts: &'a MountTable,
        mapper: &'a dyn LogicalPartitionMapper,
        block: &'a dyn BlockDevices,
    ) -> Self {
        Self {
            fstab,
            mounts,
            mapper,
            block,
        }
    }

    /// Remount `entry` read-write.
    pub fn remount(&self, entry: &mut PartitionDescriptor) -> RemountResult<RemountAction> {
        if entry.fs_mgr_flags.logical {
            if let Err(e) = self.mapper.resolve(entry) {
                tracing::warn!(mount_point = %entry.mount_point, error = %e, "Could not resolve logical partition");
            }
        }

        let Some((mut device, mut mount_point)) = self.locate(entry) else {
            tracing::info!(
                device = %entry.block_device,
                mount_point = %entry.mount_point,
                "Skip unmounted partition"
            );
            return Ok(RemountAction::NotMounted);
        };

        if device == ROOT_ALIAS_DEVICE {
            if let Some(from_fstab) = self.fstab.entry_for_mount_point(&mount_point) {
                device.clone_from(&from_fstab.block_device);
            }
        }

        if let Err(e) = self.block.set_read_only(&device, false) {
            tracing::warn!(device = %device, error = %e, "Could not clear read-only flag");
        }

        // System-as-root: `/system` lives at `/`.
        if mount_point == "/system" && self.mounts.find("/system").is_none() && self.mounts.find("/").is_some() {
            mount_point = "/".to_string();
        }

        tracing::debug!(device = %device, mount_point = %mount_point, fs_type = %entry.fs_type, "Remounting");
        let result = match self.block.remount(&device, &mount_point, &entry.fs_type) {
            Err(e) if Errno::from_io_error(&e) == Some(Errno::INVAL) && mount_point != entry.mount_point => {
                mount_point.clone_from(&entry.mount_point);
                tracing::debug!(mount_point = %mount_point, "Retrying at fstab mount point");
                self.block.remount(&device, &mount_point, &entry.fs_type)
            }
            other => other,
        };

        match result {
            Ok(()) => {
                tracing::info!(mount_point = %mount_point, "Remounted read-write");
                Ok(RemountAction::Remounted)
            }
            Err(source) => {
                tracing::error!(device = %device, mount_point = %mount_point, error = %source, "Failed to remount partition");
                Err(RemountError::Remount {
                    device,
                    mount_point,
                    source,
                })
            }
        }
    }

    /// Device and mount point of the most recent mount of `entry`.
    fn locate(&self, entry: &PartitionDescriptor) -> Option<(String, String)> {
        let wanted = entry.mount_point.as_str();
        self.mounts.iter().rev().find_map(|mounted| {
            let seen = mounted.mount_point.as_str();
            if seen == wanted {
                Some((mounted.block_device.clone(), entry.mount_point.clone()))
            } else if matches!((wanted, seen), ("/", "/system") | ("/system", "/")) {
                Some((mounted.block_device.clone(), "/system".to_string()))
            } else {
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remount_fstab::{FsMgrFlags, MountTableEntry};
    use std::cell::RefCell;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct Block {
        read_only_cleared: RefCell<Vec<String>>,
        remounts: RefCell<Vec<(String, String)>>,
        results: RefCell<VecDeque<std::io::Result<()>>>,
    }

    impl Block {
        fn with_results(results: Vec<std::io::Result<()>>) -> Self {
            Self {
                results: RefCell::new(results.into()),
                ..Self::default()
            }
        }
    }

    impl BlockDevices for Block {
        fn set_read_only(&self, device: &str, read_only: bool) -> std::io::Result<()> {
            assert!(!read_only);
            self.read_only_cleared.borrow_mut().push(device.to_string());
            Ok(())
        }

        fn remount(&self, device: &str, mount_point: &str, _fs_type: &str) -> std::io::Result<()> {
            self.remounts
                .borrow_mut()
                .push((device.to_string(), mount_point.to_string()));
            self.results.borrow_mut().pop_front().unwrap_or(Ok(()))
        }
    }

    struct Mapper;

    impl LogicalPartitionMapper for Mapper {
        fn resolve(&self, entry: &mut PartitionDescriptor) -> RemountResult<()> {
            entry.block_device = format!("/dev/block/dm-{}", entry.block_device.len());
            Ok(())
        }
    }

    fn mounts(entries: &[(&str, &str, &str)]) -> MountTable {
        entries
            .iter()
            .map(|(dev, mp, fs)| MountTableEntry::new(*dev, *mp, *fs))
            .collect()
    }

    #[test]
    fn remounts_at_live_device() {
        let fstab = Fstab::new();
        let live = mounts(&[("/dev/block/sda5", "/vendor", "ext4")]);
        let block = Block::default();
        let executor = RemountExecutor::new(&fstab, &live, &Mapper, &block);

        let mut entry = PartitionDescriptor::new("/dev/block/by-name/vendor", "/vendor", "ext4");
        assert_eq!(executor.remount(&mut entry).unwrap(), RemountAction::Remounted);
        assert_eq!(*block.read_only_cleared.borrow(), vec!["/dev/block/sda5".to_string()]);
        assert_eq!(
            *block.remounts.borrow(),
            vec![("/dev/block/sda5".to_string(), "/vendor".to_string())]
        );
    }

    #[test]
    fn unmounted_partition_is_skipped() {
        let fstab = Fstab::new();
        let live = mounts(&[("/dev/block/sda5", "/vendor", "ext4")]);
        let block = Block::default();
        let executor = RemountExecutor::new(&fstab, &live, &Mapper, &block);

        let mut entry = PartitionDescriptor::new("/dev/block/odm", "/odm", "ext4");
        assert_eq!(executor.remount(&mut entry).unwrap(), RemountAction::NotMounted);
        assert!(block.remounts.borrow().is_empty());
    }

    #[test]
    fn most_recent_mount_wins() {
        let fstab = Fstab::new();
        let live = mounts(&[("/dev/block/sda5", "/vendor", "ext4"), ("overlay", "/vendor", "overlay")]);
        let block = Block::default();
        let executor = RemountExecutor::new(&fstab, &live, &Mapper, &block);

        let mut entry = PartitionDescriptor::new("/dev/block/sda5", "/vendor", "ext4");
        executor.remount(&mut entry).unwrap();
        assert_eq!(block.remounts.borrow()[0].0, "overlay");
    }

    #[test]
    fn system_as_root_targets_root() {
        let fstab: Fstab = [PartitionDescriptor::new("/dev/block/by-name/system", "/system", "ext4")]
            .into_iter()
            .collect();
        let live = mounts(&[("/dev/root", "/", "ext4")]);
        let block = Block::default();
        let executor = RemountExecutor::new(&fstab, &live, &Mapper, &block);

        let mut entry = fstab.as_slice()[0].clone();
        executor.remount(&mut entry).unwrap();
        // /dev/root is swapped for the fstab device of /system.
        assert_eq!(
            *block.remounts.borrow(),
            vec![("/dev/block/by-name/system".to_string(), "/".to_string())]
        );
    }

    #[test]
    fn einval_retries_at_fstab_mount_point() {
        let fstab = Fstab::new();
        let live = mounts(&[("/dev/block/dm-0", "/system", "ext4")]);
        let block = Block::with_results(vec![Err(Errno::INVAL.into())]);
        let executor = RemountExecutor::new(&fstab, &live, &Mapper, &block);

        let mut entry = PartitionDescriptor::new("/dev/block/dm-0", "/", "ext4");
        assert_eq!(executor.remount(&mut entry).unwrap(), RemountAction::Remounted);
        assert_eq!(
            *block.remounts.borrow(),
            vec![
                ("/dev/block/dm-0".to_string(), "/system".to_string()),
                ("/dev/block/dm-0".to_string(), "/".to_string()),
            ]
        );
    }

    #[test]
    fn other_errors_are_not_retried() {
        let fstab = Fstab::new();
        let live = mounts(&[("/dev/block/dm-0", "/system", "ext4")]);
        let block = Block::with_results(vec![Err(Errno::ACCESS.into())]);
        let executor = RemountExecutor::new(&fstab, &live, &Mapper, &block);

        let mut entry = PartitionDescriptor::new("/dev/block/dm-0", "/", "ext4");
        let err = executor.remount(&mut entry).unwrap_err();
        assert!(matches!(err, RemountError::Remount { .. }));
        assert_eq!(block.remounts.borrow().len(), 1);
    }

    #[test]
    fn logical_partitions_are_resolved_first() {
        let fstab = Fstab::new();
        let live = mounts(&[("/dev/block/dm-6", "/product", "ext4")]);
        let block = Block::default();
        let executor = RemountExecutor::new(&fstab, &live, &Mapper, &block);

        let mut entry = PartitionDescriptor::new("product", "/product", "ext4").with_flags(FsMgrFlags {
            logical: true,
            ..FsMgrFlags::default()
        });
        executor.remount(&mut entry).unwrap();
        assert_eq!(entry.block_device, "/dev/block/dm-7");
    }
}
