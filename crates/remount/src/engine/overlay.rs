//! Overlay fallback preparation.

use remount_common::{RemountError, RemountResult};
use remount_fstab::PartitionDescriptor;

use super::OutcomeRecord;
use crate::services::OverlayManager;

/// Requests overlay storage for partitions that cannot be remounted directly.
pub struct OverlaySetup<'a> {
    manager: &'a dyn OverlayManager,
}

impl<'a> OverlaySetup<'a> {
    /// Create the stage.
    pub fn new(manager: &'a dyn OverlayManager) -> Self {
        Self { manager }
    }

    /// Prepare an overlay for `entry` if it wants one.
    ///
    /// Once verity has been disabled in this run, raw writes are unsafe until
    /// reboot, so the overlay is forced.
    pub fn prepare(&self, entry: &PartitionDescriptor, outcome: &mut OutcomeRecord) -> RemountResult<()> {
        if !self.manager.wants_overlay(entry) {
            return Ok(());
        }

        let force = outcome.verity_was_disabled;
        let want_reboot = self
            .manager
            .setup(&entry.mount_point, force)
            .map_err(|e| RemountError::Overlay {
                mount_point: entry.mount_point.clone(),
                reason: e.to_string(),
            })?;

        if want_reboot {
            tracing::info!(mount_point = %entry.mount_point, "Using overlayfs");
            outcome.reboot_required = true;
            outcome.overlay_was_setup = true;
        }
        Ok(())
    }
}
