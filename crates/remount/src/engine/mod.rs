//! The remount pipeline.
//!
//! A run goes through these stages in order:
//!
//! 1. Device preconditions (debuggable build, unlocked bootloader)
//! 2. [`FstabResolver`] loads the partition table
//! 3. [`CheckpointGuard`] refuses to continue during a checkpoint
//! 4. [`PartitionSelector`] builds the working set
//! 5. [`VerityGate`] and [`OverlaySetup`] per partition
//! 6. One global overlay mount, then a fresh mount table snapshot
//! 7. [`RemountExecutor`] per partition
//!
//! Per-partition failures drop the partition from the working set and are
//! recorded in the [`OutcomeRecord`]; the rest of the set carries on.
//! [`Remounter::conclude`] then reports and, if asked, reboots.

mod checkpoint;
mod dsu;
mod executor;
mod outcome;
mod overlay;
pub mod preflight;
mod resolver;
mod selector;
mod verity;

use remount_common::paths::props;
use remount_common::{RemountError, RemountResult, StatusCode};
use remount_fstab::MountTable;

use crate::config::RemountConfig;
use crate::services::Platform;

pub use checkpoint::CheckpointGuard;
pub use dsu::DsuCoordinator;
pub use executor::{RemountAction, RemountExecutor};
pub use outcome::OutcomeRecord;
pub use overlay::OverlaySetup;
pub use resolver::FstabResolver;
pub use selector::{PartitionSelector, SelectionSet, is_remountable, wrapped_entry};
pub use verity::VerityGate;

/// Drives one remount run against a [`Platform`].
#[derive(Debug)]
pub struct Remounter {
    config: RemountConfig,
    platform: Platform,
}

impl Remounter {
    /// Create a remounter.
    #[must_use]
    pub const fn new(config: RemountConfig, platform: Platform) -> Self {
        Self { config, platform }
    }

    /// Run the pipeline and report, returning the final status.
    ///
    /// Precondition failures are returned as errors; everything else is
    /// folded into the status.
    pub fn run<S: AsRef<str>>(&self, partitions: &[S]) -> RemountResult<StatusCode> {
        let outcome = self.execute(partitions)?;
        self.conclude(&outcome)
    }

    /// Run every stage up to and including the raw remount.
    pub fn execute<S: AsRef<str>>(&self, partitions: &[S]) -> RemountResult<OutcomeRecord> {
        let platform = &self.platform;
        preflight::check_device_state(platform.properties.as_ref())?;

        let live = platform.mounts.snapshot().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not read mount table");
            MountTable::default()
        });
        let fstab = FstabResolver::new(platform.fstab.as_ref()).resolve(self.config.fstab.as_deref(), &live)?;

        CheckpointGuard::new(
            platform.properties.as_ref(),
            platform.checkpoint.as_ref(),
            self.config.checkpoint_retry,
        )
        .verify()?;

        let mut outcome = OutcomeRecord::default();
        let candidates = platform.overlay.candidates(&fstab);
        let selector = PartitionSelector::new(&fstab, &candidates, platform.overlay.as_ref(), &live);
        let mut set = if partitions.is_empty() {
            selector.select_all()
        } else {
            match selector.select_named(partitions) {
                Ok(set) => set,
                Err(e) => {
                    outcome.record_failure(e);
                    return Ok(outcome);
                }
            }
        };
        tracing::debug!(partitions = ?set.mount_points().collect::<Vec<_>>(), "Selected");

        let slot_suffix = platform.properties.get(props::SLOT_SUFFIX).unwrap_or_default();
        let verity = VerityGate::new(platform.verity.as_ref(), slot_suffix);
        let overlay = OverlaySetup::new(platform.overlay.as_ref());
        set.retain(|entry| {
            let checked = verity
                .check(entry, &mut outcome)
                .and_then(|()| overlay.prepare(entry, &mut outcome));
            match checked {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!(mount_point = %entry.mount_point, error = %e, "Skipping partition");
                    outcome.record_failure(e);
                    false
                }
            }
        });

        if set.is_empty() {
            tracing::warn!("No remountable partitions were found.");
            return Ok(outcome);
        }
        if outcome.verity_was_disabled {
            // Raw writes are unsafe until the device reboots with verity off.
            return Ok(outcome);
        }

        if let Err(e) = platform.overlay.mount_all(set.as_slice()) {
            tracing::warn!(error = %e, "Cannot mount overlayfs for some partitions");
        }

        let mounts = match platform.mounts.snapshot() {
            Ok(mounts) if !mounts.is_empty() => mounts,
            Ok(_) => {
                tracing::error!("Mount table is empty");
                outcome.record_failure(RemountError::NoMounts {
                    reason: "mount table is empty".to_string(),
                });
                return Ok(outcome);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to read mount table");
                outcome.record_failure(e);
                return Ok(outcome);
            }
        };

        let executor = RemountExecutor::new(&fstab, &mounts, platform.mapper.as_ref(), platform.block.as_ref());
        outcome.merge(remount_all(&executor, &mut set));
        Ok(outcome)
    }

    /// Report `outcome` and apply the reboot policy.
    pub fn conclude(&self, outcome: &OutcomeRecord) -> RemountResult<StatusCode> {
        if let Some(summary) = outcome.summary() {
            tracing::info!("{summary}");
        }

        let status = outcome.status();
        if status.is_success() {
            tracing::info!("remount succeeded");
        } else {
            tracing::error!(%status, "remount failed");
        }

        if outcome.reboot_required {
            if self.config.auto_reboot {
                DsuCoordinator::new(self.platform.dsu.as_ref())
                    .keep_guest_active()
                    .inspect_err(|_| tracing::error!("Unable to automatically enable DSU"))?;
                self.platform.rebooter.reboot("remount")?;
            } else {
                tracing::info!("Now reboot your device for settings to take effect");
            }
        }
        Ok(status)
    }

    /// Remove overlay scratch storage left behind by earlier runs.
    pub fn clean_scratch(&self) -> RemountResult<()> {
        self.platform.overlay.cleanup_scratch()
    }
}

/// Remount every partition in `set`, collecting failures instead of stopping.
fn remount_all(executor: &RemountExecutor<'_>, set: &mut SelectionSet) -> OutcomeRecord {
    let mut stage = OutcomeRecord::default();
    for entry in set.iter_mut() {
        match executor.remount(entry) {
            Ok(RemountAction::Remounted) => stage.anything_remounted = true,
            Ok(RemountAction::NotMounted) => {}
            Err(e) => stage.record_failure(e),
        }
    }
    stage
}
