//! Outcome record threaded through every stage of a run.

use remount_common::{RemountError, StatusCode};

/// What a run did, and what went wrong along the way.
///
/// Flags only ever go from `false` to `true`. Failures are appended in the
/// order they happen and the first one decides [`OutcomeRecord::status`];
/// a later success never clears an earlier failure.
#[derive(Debug, Default)]
pub struct OutcomeRecord {
    /// A reboot is needed for the changes to take effect.
    pub reboot_required: bool,
    /// Overlay storage was set up for at least one partition.
    pub overlay_was_setup: bool,
    /// Verified boot was disabled during this run.
    pub verity_was_disabled: bool,
    /// Verified boot could not be disabled for at least one partition.
    pub verity_error: bool,
    /// At least one partition was remounted read-write.
    pub anything_remounted: bool,
    pub(crate) failures: Vec<RemountError>,
}

impl OutcomeRecord {
    /// Record a per-partition or per-stage failure.
    pub fn record_failure(&mut self, error: RemountError) {
        if matches!(error, RemountError::Verity { .. }) {
            self.verity_error = true;
        }
        self.failures.push(error);
    }

    /// Fold another record into this one.
    pub fn merge(&mut self, other: Self) {
        self.reboot_required |= other.reboot_required;
        self.overlay_was_setup |= other.overlay_was_setup;
        self.verity_was_disabled |= other.verity_was_disabled;
        self.verity_error |= other.verity_error;
        self.anything_remounted |= other.anything_remounted;
        self.failures.extend(other.failures);
    }

    /// Status of the first recorded failure, or success.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.failures
            .iter()
            .find_map(RemountError::status)
            .unwrap_or(StatusCode::Success)
    }

    /// Failures in the order they were recorded.
    #[must_use]
    pub fn failures(&self) -> &[RemountError] {
        &self.failures
    }

    /// One-line description of what changed, if anything.
    #[must_use]
    pub const fn summary(&self) -> Option<&'static str> {
        match (self.verity_was_disabled, self.overlay_was_setup) {
            (true, true) => Some("Verity disabled; overlayfs enabled."),
            (true, false) => Some("Verity disabled."),
            (false, true) => Some("Overlayfs enabled."),
            (false, false) => None,
        }
    }
}
