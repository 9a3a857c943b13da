//! Reboot through init's power control property.

use std::time::Duration;

use remount_common::paths::props;
use remount_common::{RemountError, RemountResult};

use crate::services::{PropertySource, Rebooter};

/// Asks init to reboot and waits for it to happen.
#[derive(Debug, Clone)]
pub struct PowerCtl<P> {
    properties: P,
    grace: Duration,
}

impl<P: PropertySource> PowerCtl<P> {
    /// Reboot through `properties`, waiting up to a minute.
    pub const fn new(properties: P) -> Self {
        Self {
            properties,
            grace: Duration::from_secs(60),
        }
    }

    /// Set how long to wait for init before giving up.
    #[must_use]
    pub const fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }
}

impl<P: PropertySource> Rebooter for PowerCtl<P> {
    fn reboot(&self, reason: &str) -> RemountResult<()> {
        tracing::info!(reason, "Rebooting");
        rustix::fs::sync();
        self.properties
            .set(props::POWERCTL, &format!("reboot,{reason}"))
            .map_err(|e| RemountError::Reboot { reason: e.to_string() })?;

        std::thread::sleep(self.grace);
        Err(RemountError::Reboot {
            reason: format!("still running {}s after request", self.grace.as_secs()),
        })
    }
}
