//! Refuses to run while a filesystem checkpoint is in progress.

use remount_common::paths::props;
use remount_common::{RemountError, RemountResult};

use crate::services::{CheckpointConnector, PropertySource, RetryPolicy};

/// Blocks the run while a checkpoint is active.
///
/// Virtual A/B devices can use `/data` as backing storage for the update;
/// writes made while a checkpoint is open would be rolled back.
pub struct CheckpointGuard<'a> {
    properties: &'a dyn PropertySource,
    connector: &'a dyn CheckpointConnector,
    retry: RetryPolicy,
}

impl<'a> CheckpointGuard<'a> {
    /// Create a guard.
    pub fn new(
        properties: &'a dyn PropertySource,
        connector: &'a dyn CheckpointConnector,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            properties,
            connector,
            retry,
        }
    }

    /// Whether the device uses virtual A/B and so needs the check.
    #[must_use]
    pub fn applies(&self) -> bool {
        self.properties.get_bool(props::VIRTUAL_AB_ENABLED, false)
            || self.properties.get_bool(props::VIRTUAL_AB_RETROFIT, false)
    }

    /// Fail with [`RemountError::Checkpointing`] if a checkpoint is active.
    pub fn verify(&self) -> RemountResult<()> {
        if !self.applies() {
            return Ok(());
        }

        let service = self.retry.acquire("vold", || self.connector.connect())?;
        let checkpointing = service.is_checkpointing().inspect_err(|e| {
            tracing::error!(error = %e, "Could not determine checkpointing status");
        })?;
        if checkpointing {
            tracing::error!("Cannot use remount when a checkpoint is in progress");
            return Err(RemountError::Checkpointing);
        }
        Ok(())
    }
}
