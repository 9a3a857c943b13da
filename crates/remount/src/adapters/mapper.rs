//! Logical partition lookup under `/dev/block/mapper`.

use std::path::PathBuf;

use remount_common::{RemountPaths, RemountResult};
use remount_fstab::PartitionDescriptor;

use crate::services::LogicalPartitionMapper;

/// Follows mapper symlinks to their `dm-N` nodes.
#[derive(Debug, Clone)]
pub struct DeviceMapper {
    paths: RemountPaths,
}

impl DeviceMapper {
    /// Mapper rooted at `paths.mapper_dir`.
    #[must_use]
    pub fn new(paths: &RemountPaths) -> Self {
        Self { paths: paths.clone() }
    }

    fn node(&self, entry: &PartitionDescriptor) -> PathBuf {
        self.paths.mapper_node(&entry.block_device)
    }
}

impl LogicalPartitionMapper for DeviceMapper {
    fn resolve(&self, entry: &mut PartitionDescriptor) -> RemountResult<()> {
        let node = self.node(entry);
        let device = std::fs::canonicalize(&node)?;
        tracing::debug!(
            partition = %entry.block_device,
            device = %device.display(),
            "Resolved logical partition"
        );
        entry.block_device = device.to_string_lossy().into_owned();
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn follows_mapper_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let dm = dir.path().join("dm-3");
        std::fs::write(&dm, b"").unwrap();
        let mapper_dir = dir.path().join("mapper");
        std::fs::create_dir(&mapper_dir).unwrap();
        std::os::unix::fs::symlink(&dm, mapper_dir.join("product_a")).unwrap();

        let paths = RemountPaths {
            mapper_dir,
            ..RemountPaths::default()
        };
        let mut entry = PartitionDescriptor::new("product_a", "/product", "erofs");
        DeviceMapper::new(&paths).resolve(&mut entry).unwrap();
        assert_eq!(PathBuf::from(&entry.block_device), std::fs::canonicalize(dm).unwrap());
    }

    #[test]
    fn slotselect_logical_entry_resolves_to_its_slot() {
        let dir = tempfile::tempdir().unwrap();
        let dm = dir.path().join("dm-0");
        std::fs::write(&dm, b"").unwrap();
        let mapper_dir = dir.path().join("mapper");
        std::fs::create_dir(&mapper_dir).unwrap();
        std::os::unix::fs::symlink(&dm, mapper_dir.join("system_a")).unwrap();

        let mut fstab = remount_fstab::parse::parse_fstab("system /system ext4 ro wait,slotselect,logical\n");
        fstab.apply_slot_suffix("_a");
        let mut entry = fstab.as_slice()[0].clone();

        let paths = RemountPaths {
            mapper_dir,
            ..RemountPaths::default()
        };
        DeviceMapper::new(&paths).resolve(&mut entry).unwrap();
        assert_eq!(PathBuf::from(&entry.block_device), std::fs::canonicalize(dm).unwrap());
    }

    #[test]
    fn missing_node_leaves_entry_alone() {
        let dir = tempfile::tempdir().unwrap();
        let paths = RemountPaths {
            mapper_dir: dir.path().to_path_buf(),
            ..RemountPaths::default()
        };
        let mut entry = PartitionDescriptor::new("system_ext_a", "/system_ext", "ext4");
        assert!(DeviceMapper::new(&paths).resolve(&mut entry).is_err());
        assert_eq!(entry.block_device, "system_ext_a");
    }
}
