//! Run configuration.

use std::path::PathBuf;

use remount_common::RemountPaths;

use crate::services::RetryPolicy;

/// Options for one remount run.
#[derive(Debug, Clone, Default)]
pub struct RemountConfig {
    /// Explicit fstab; the platform default is used when unset.
    pub fstab: Option<PathBuf>,
    /// Reboot automatically when the changes need one.
    pub auto_reboot: bool,
    /// Show library-level log messages.
    pub verbose: bool,
    /// Paths for mount tables and overlay scratch storage.
    pub paths: RemountPaths,
    /// How to wait for the checkpoint service.
    pub checkpoint_retry: RetryPolicy,
}

impl RemountConfig {
    /// Use an explicit fstab.
    #[must_use]
    pub fn with_fstab(mut self, path: impl Into<PathBuf>) -> Self {
        self.fstab = Some(path.into());
        self
    }

    /// Reboot automatically when needed.
    #[must_use]
    pub fn with_auto_reboot(mut self, auto_reboot: bool) -> Self {
        self.auto_reboot = auto_reboot;
        self
    }

    /// Enable verbose logging.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the overlay scratch root.
    #[must_use]
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.paths.scratch_root = root.into();
        self
    }

    /// Set the checkpoint service retry policy.
    #[must_use]
    pub fn with_checkpoint_retry(mut self, policy: RetryPolicy) -> Self {
        self.checkpoint_retry = policy;
        self
    }

    /// `tracing` filter directive for this configuration.
    #[must_use]
    pub const fn log_directive(&self) -> &'static str {
        if self.verbose {
            "remount=debug"
        } else {
            "remount=info"
        }
    }
}
