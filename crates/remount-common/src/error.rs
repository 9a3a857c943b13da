//! Error types for the remount workspace.

use miette::Diagnostic;
use thiserror::Error;

use crate::StatusCode;

/// Result type alias using [`RemountError`].
pub type RemountResult<T> = Result<T, RemountError>;

/// Errors raised by remount components.
///
/// Variants are grouped by the stage that produces them. Use
/// [`RemountError::status`] to collapse a variant into the numbered
/// [`StatusCode`] reported to the caller.
#[derive(Error, Diagnostic, Debug)]
pub enum RemountError {
    /// The tool is not running as root.
    #[error("Not running as root")]
    #[diagnostic(code(remount::precondition::not_root), help("Try \"adb root\" first"))]
    NotRoot,

    /// The build does not allow verity to be disabled.
    #[error("Device must be userdebug build")]
    #[diagnostic(code(remount::precondition::not_debuggable))]
    NotDebuggable,

    /// The bootloader is locked.
    #[error("Device must be bootloader unlocked")]
    #[diagnostic(
        code(remount::precondition::bootloader_locked),
        help("Unlock the bootloader with \"fastboot flashing unlock\"")
    )]
    BootloaderLocked,

    /// The partition table could not be read or was empty.
    #[error("Failed to read fstab {path}: {reason}")]
    #[diagnostic(code(remount::fstab::read))]
    FstabRead {
        /// Path (or description) of the table that failed.
        path: String,
        /// Why it failed.
        reason: String,
    },

    /// A requested partition matches no table entry.
    #[error("Unknown partition {name}")]
    #[diagnostic(
        code(remount::select::unknown_partition),
        help("Use a mount point (\"/vendor\") or its name (\"vendor\")")
    )]
    UnknownPartition {
        /// The name as given by the caller.
        name: String,
    },

    /// A requested partition exists but is not eligible for remount.
    #[error("Invalid partition {name}")]
    #[diagnostic(code(remount::select::invalid_partition))]
    InvalidPartition {
        /// The name as given by the caller.
        name: String,
    },

    /// Verified boot could not be disabled.
    #[error("Failed to disable verity for {mount_point}: {reason}")]
    #[diagnostic(code(remount::verity::disable))]
    Verity {
        /// Mount point of the protected partition.
        mount_point: String,
        /// Why disablement failed.
        reason: String,
    },

    /// Overlay fallback could not be prepared.
    #[error("Overlayfs setup for {mount_point} failed: {reason}")]
    #[diagnostic(code(remount::overlay::setup))]
    Overlay {
        /// Mount point the overlay was requested for.
        mount_point: String,
        /// Why setup failed.
        reason: String,
    },

    /// The live mount table could not be read.
    #[error("Failed to read mount table: {reason}")]
    #[diagnostic(code(remount::mounts::unreadable))]
    NoMounts {
        /// Why reading failed.
        reason: String,
    },

    /// The remount syscall failed.
    #[error("Failed to remount partition dev:{device} mnt:{mount_point}: {source}")]
    #[diagnostic(code(remount::remount::syscall))]
    Remount {
        /// Block device passed to the syscall.
        device: String,
        /// Mount point passed to the syscall.
        mount_point: String,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// A platform service failed to answer.
    #[error("{service} service error: {reason}")]
    #[diagnostic(code(remount::service))]
    Service {
        /// Service name.
        service: String,
        /// Why the call failed.
        reason: String,
    },

    /// A filesystem checkpoint is in progress.
    #[error("Cannot use remount when a checkpoint is in progress")]
    #[diagnostic(
        code(remount::checkpoint::active),
        help("Wait for the update to be committed or rolled back, then retry")
    )]
    Checkpointing,

    /// The dynamic system update guest could not be enabled.
    #[error("Failed to enable DSU, error code: {code}")]
    #[diagnostic(code(remount::dsu::enable))]
    Dsu {
        /// Install status returned by the DSU service.
        code: i32,
    },

    /// The reboot request did not take effect.
    #[error("Failed to reboot: {reason}")]
    #[diagnostic(code(remount::reboot))]
    Reboot {
        /// Why the reboot did not happen.
        reason: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(remount::io))]
    Io(#[from] std::io::Error),
}

impl RemountError {
    /// Build a [`RemountError::Service`] error.
    pub fn service(service: impl Into<String>, reason: impl ToString) -> Self {
        Self::Service {
            service: service.into(),
            reason: reason.to_string(),
        }
    }

    /// Status code this error maps to, or `None` for precondition and
    /// usage failures which have no numbered status.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::UnknownPartition { .. } => Some(StatusCode::UnknownPartition),
            Self::InvalidPartition { .. } => Some(StatusCode::InvalidPartition),
            Self::Verity { .. } => Some(StatusCode::VerityPartition),
            Self::Overlay { .. } => Some(StatusCode::BadOverlay),
            Self::NoMounts { .. } => Some(StatusCode::NoMounts),
            Self::Remount { .. } => Some(StatusCode::RemountFailed),
            Self::Service { .. } => Some(StatusCode::ServiceError),
            Self::Checkpointing => Some(StatusCode::Checkpointing),
            Self::Dsu { .. } => Some(StatusCode::DsuError),
            Self::NotRoot
            | Self::NotDebuggable
            | Self::BootloaderLocked
            | Self::FstabRead { .. }
            | Self::Reboot { .. }
            | Self::Io(_) => None,
        }
    }

    /// Process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self.status() {
            Some(status) => status.code(),
            None => 1,
        }
    }
}
