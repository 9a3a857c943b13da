//! Checks that must pass before anything is touched.

use remount_common::paths::props;
use remount_common::{RemountError, RemountResult};

use crate::services::PropertySource;

/// Fail unless the process runs as root.
pub fn ensure_root() -> RemountResult<()> {
    if rustix::process::getuid().is_root() {
        Ok(())
    } else {
        Err(RemountError::NotRoot)
    }
}

/// Fail on user builds and on devices with a locked bootloader.
pub fn check_device_state(properties: &dyn PropertySource) -> RemountResult<()> {
    if !properties.get_bool(props::DEBUGGABLE, false) {
        return Err(RemountError::NotDebuggable);
    }
    if properties.get(props::VBMETA_DEVICE_STATE).as_deref() == Some("locked") {
        return Err(RemountError::BootloaderLocked);
    }
    Ok(())
}
