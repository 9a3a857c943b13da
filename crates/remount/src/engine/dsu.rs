//! Keeps a running DSU guest selected across the reboot.

use remount_common::{RemountError, RemountResult};

use crate::services::DsuConnector;

/// If a DSU guest is running but not enabled, the next boot would land in
/// the host system and the remount would apply to the wrong image.
pub struct DsuCoordinator<'a> {
    connector: &'a dyn DsuConnector,
}

impl<'a> DsuCoordinator<'a> {
    /// Create a coordinator.
    pub fn new(connector: &'a dyn DsuConnector) -> Self {
        Self { connector }
    }

    /// Enable the running guest for one boot when it is not enabled yet.
    pub fn keep_guest_active(&self) -> RemountResult<()> {
        let Some(service) = self.connector.connect() else {
            return Ok(());
        };

        let running = service
            .is_running()
            .inspect_err(|e| tracing::error!(error = %e, "Failed to get DSU running state"))?;
        let enabled = service
            .is_enabled()
            .inspect_err(|e| tracing::error!(error = %e, "Failed to get DSU enabled state"))?;
        if !running || enabled {
            return Ok(());
        }

        let slot = service
            .active_slot()
            .inspect_err(|e| tracing::error!(error = %e, "Failed to get active DSU slot"))?;
        tracing::info!(slot = %slot, "DSU is running but disabled, enabling it so the guest boots next");

        match service.enable_one_shot(&slot)? {
            0 => {
                tracing::info!("Successfully enabled DSU (one-shot mode)");
                Ok(())
            }
            code => {
                tracing::error!(code, "Failed to enable DSU");
                Err(RemountError::Dsu { code })
            }
        }
    }
}
