//! Default fstab lookup.

use std::path::{Path, PathBuf};

use remount_common::paths::DEFAULT_FSTAB_DIRS;
use remount_common::{RemountError, RemountResult};
use remount_fstab::Fstab;

use crate::services::FstabSource;

/// Finds `fstab.<hardware>` in the usual image directories.
#[derive(Debug, Clone)]
pub struct DeviceFstab {
    hardware: Option<String>,
    slot_suffix: String,
    search_dirs: Vec<PathBuf>,
}

impl DeviceFstab {
    /// Lookup for the given hardware name.
    #[must_use]
    pub fn new(hardware: Option<String>) -> Self {
        Self {
            hardware,
            slot_suffix: String::new(),
            search_dirs: DEFAULT_FSTAB_DIRS.iter().map(PathBuf::from).collect(),
        }
    }

    /// Resolve `slotselect` entries against `suffix` (`ro.boot.slot_suffix`).
    #[must_use]
    pub fn with_slot_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.slot_suffix = suffix.into();
        self
    }

    /// Search `dirs` instead of the image directories.
    #[must_use]
    pub fn with_search_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.search_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    fn default_path(&self) -> RemountResult<PathBuf> {
        let hardware = self.hardware.as_deref().ok_or_else(|| RemountError::FstabRead {
            path: "default fstab".to_string(),
            reason: "hardware name is unknown".to_string(),
        })?;
        let name = format!("fstab.{hardware}");

        self.search_dirs
            .iter()
            .map(|dir| dir.join(&name))
            .find(|path| path.is_file())
            .ok_or_else(|| RemountError::FstabRead {
                path: name,
                reason: "not found in any image directory".to_string(),
            })
    }
}

impl FstabSource for DeviceFstab {
    fn read_file(&self, path: &Path) -> RemountResult<Fstab> {
        let mut fstab = Fstab::from_file(path)?;
        fstab.apply_slot_suffix(&self.slot_suffix);
        Ok(fstab)
    }

    fn read_default(&self) -> RemountResult<Fstab> {
        let path = self.default_path()?;
        tracing::debug!(path = %path.display(), slot_suffix = %self.slot_suffix, "Using default fstab");
        self.read_file(&path)
    }
}
