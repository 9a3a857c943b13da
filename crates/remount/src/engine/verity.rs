//! Verified boot gate.

use remount_common::{RemountError, RemountResult};
use remount_fstab::PartitionDescriptor;

use super::OutcomeRecord;
use crate::services::VerityControl;

/// Disables verified boot for partitions it protects.
pub struct VerityGate<'a> {
    control: &'a dyn VerityControl,
    slot_suffix: String,
}

impl<'a> VerityGate<'a> {
    /// Create a gate acting on the boot slot `slot_suffix`.
    pub fn new(control: &'a dyn VerityControl, slot_suffix: impl Into<String>) -> Self {
        Self {
            control,
            slot_suffix: slot_suffix.into(),
        }
    }

    /// Let `entry` through, disabling verity first if it is enabled.
    pub fn check(&self, entry: &PartitionDescriptor, outcome: &mut OutcomeRecord) -> RemountResult<()> {
        if !self.control.is_verity_enabled(entry) {
            return Ok(());
        }

        self.control
            .disable_verity(&self.slot_suffix)
            .map_err(|e| RemountError::Verity {
                mount_point: entry.mount_point.clone(),
                reason: e.to_string(),
            })?;

        tracing::info!(
            mount_point = %entry.mount_point,
            slot = %self.slot_suffix,
            "Disabled verity"
        );
        outcome.verity_was_disabled = true;
        outcome.reboot_required = true;
        Ok(())
    }
}
