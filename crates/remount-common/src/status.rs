//! Stable status codes reported at the process boundary.

use std::fmt;

/// Outcome of a remount run, as seen by the caller.
///
/// The numeric values are part of the tool's external contract and must not
/// change. Codes 1-4 are left to generic usage and precondition failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StatusCode {
    /// Every requested partition was handled.
    Success = 0,
    /// A requested partition does not match any table entry.
    UnknownPartition = 5,
    /// A requested partition exists but cannot be remounted.
    InvalidPartition = 6,
    /// Verified boot could not be disabled for a partition.
    VerityPartition = 7,
    /// Overlay fallback could not be prepared for a partition.
    BadOverlay = 8,
    /// The live mount table could not be read.
    NoMounts = 9,
    /// The remount syscall failed for a partition.
    RemountFailed = 10,
    /// A platform service could not be reached or returned an error.
    ServiceError = 11,
    /// A filesystem checkpoint is in progress.
    Checkpointing = 12,
    /// The dynamic system update guest could not be enabled.
    DsuError = 13,
}

impl StatusCode {
    /// Numeric exit code for this status.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Returns true for [`StatusCode::Success`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "success",
            Self::UnknownPartition => "unknown partition",
            Self::InvalidPartition => "invalid partition",
            Self::VerityPartition => "verity partition",
            Self::BadOverlay => "bad overlay",
            Self::NoMounts => "no mounts",
            Self::RemountFailed => "remount failed",
            Self::ServiceError => "service error",
            Self::Checkpointing => "checkpointing",
            Self::DsuError => "dsu error",
        };
        write!(f, "{name} ({})", self.code())
    }
}
