//! OverlayFS over a read-only partition.

use std::path::{Path, PathBuf};

use remount_common::{RemountPaths, RemountResult};

/// OverlayFS configuration for one partition.
///
/// The partition itself is the lower layer and the overlay is mounted on
/// top of it, so writes land in scratch storage.
#[derive(Debug, Clone)]
pub struct OverlayFs {
    /// Lower directory (the read-only partition).
    pub lower_dir: PathBuf,
    /// Upper directory (writable layer).
    pub upper_dir: PathBuf,
    /// Work directory (required by overlayfs).
    pub work_dir: PathBuf,
    /// Where the overlay is mounted.
    pub merged_dir: PathBuf,
}

impl OverlayFs {
    /// Overlay for `mount_point` backed by scratch storage under `paths`.
    #[must_use]
    pub fn for_partition(paths: &RemountPaths, mount_point: &str) -> Self {
        Self {
            lower_dir: PathBuf::from(mount_point),
            upper_dir: paths.overlay_upper(mount_point),
            work_dir: paths.overlay_work(mount_point),
            merged_dir: PathBuf::from(mount_point),
        }
    }

    /// Create the upper and work directories.
    pub fn create_dirs(&self) -> RemountResult<()> {
        std::fs::create_dir_all(&self.upper_dir)?;
        std::fs::create_dir_all(&self.work_dir)?;
        Ok(())
    }

    /// Whether scratch storage for this overlay already exists.
    #[must_use]
    pub fn is_prepared(&self) -> bool {
        self.upper_dir.is_dir() && self.work_dir.is_dir()
    }

    /// Mount the overlay filesystem.
    pub fn mount(&self) -> RemountResult<()> {
        let options = self.mount_options();
        super::mount_overlay(&self.merged_dir, &options)?;
        tracing::info!(merged = %self.merged_dir.display(), "OverlayFS mounted");
        Ok(())
    }

    /// Get the mount options string.
    #[must_use]
    pub fn mount_options(&self) -> String {
        format!(
            "lowerdir={},upperdir={},workdir={},override_creds=off",
            self.lower_dir.display(),
            self.upper_dir.display(),
            self.work_dir.display()
        )
    }

    /// Scratch directory holding this overlay's upper and work dirs.
    #[must_use]
    pub fn scratch_dir(&self) -> &Path {
        self.upper_dir.parent().unwrap_or(&self.upper_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_mount_options() {
        let paths = RemountPaths::with_scratch_root("/scratch");
        let overlay = OverlayFs::for_partition(&paths, "/vendor");

        let options = overlay.mount_options();
        assert!(options.contains("lowerdir=/vendor"));
        assert!(options.contains("upperdir=/scratch/vendor/upper"));
        assert!(options.contains("workdir=/scratch/vendor/work"));
        assert_eq!(overlay.merged_dir, PathBuf::from("/vendor"));
        assert_eq!(overlay.scratch_dir(), Path::new("/scratch/vendor"));
    }

    #[test]
    fn create_dirs_prepares_scratch() {
        let dir = tempfile::tempdir().unwrap();
        let paths = RemountPaths::with_scratch_root(dir.path());
        let overlay = OverlayFs::for_partition(&paths, "/product");

        assert!(!overlay.is_prepared());
        overlay.create_dirs().unwrap();
        assert!(overlay.is_prepared());
    }
}
