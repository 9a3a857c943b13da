//! Live mount table from procfs.

use std::path::{Path, PathBuf};

use remount_common::RemountResult;
use remount_fstab::MountTable;

use crate::services::MountTableReader;

/// Reads `/proc/mounts` (or a stand-in file).
#[derive(Debug, Clone)]
pub struct ProcMounts {
    path: PathBuf,
}

impl ProcMounts {
    /// Reader for the table at `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl MountTableReader for ProcMounts {
    fn snapshot(&self) -> RemountResult<MountTable> {
        MountTable::from_file(&self.path)
    }
}
