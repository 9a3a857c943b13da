//! Device implementations of the [`crate::services`] traits.
//!
//! Properties and the privileged services are reached through the stock
//! command line tools (`getprop`, `vdc`, `avbctl`, `gsi_tool`); mounts and
//! block devices go straight to the kernel.

mod avb;
mod block;
mod fstab;
mod gsi;
mod mapper;
mod mounts;
mod overlayfs;
mod props;
mod reboot;
mod vold;

use std::process::Command;

use remount_common::paths::props as prop_names;
use remount_common::{RemountError, RemountResult};

use crate::config::RemountConfig;
use crate::services::{Platform, PropertySource as _};

pub use avb::Avbctl;
pub use block::DeviceBlocks;
pub use fstab::DeviceFstab;
pub use gsi::GsiTool;
pub use mapper::DeviceMapper;
pub use mounts::ProcMounts;
pub use overlayfs::ScratchOverlay;
pub use props::SystemProperties;
pub use reboot::PowerCtl;
pub use vold::Vold;

/// Run `program` and return its trimmed stdout.
fn run_tool(program: &str, args: &[&str]) -> RemountResult<String> {
    tracing::trace!(program, ?args, "Running tool");

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| RemountError::service(program, format!("failed to execute: {e}")))?;

    if !output.status.success() {
        return Err(RemountError::service(
            program,
            format!(
                "{} ({})",
                String::from_utf8_lossy(&output.stderr).trim(),
                output.status
            ),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

impl Platform {
    /// The real device.
    #[must_use]
    pub fn device(config: &RemountConfig) -> Self {
        let properties = SystemProperties;
        let hardware = properties
            .get(prop_names::BOOT_HARDWARE)
            .or_else(|| properties.get(prop_names::HARDWARE));
        let slot_suffix = properties.get(prop_names::SLOT_SUFFIX).unwrap_or_default();
        let mounts = ProcMounts::new(&config.paths.proc_mounts);

        Self {
            properties: Box::new(properties),
            fstab: Box::new(DeviceFstab::new(hardware).with_slot_suffix(slot_suffix)),
            mounts: Box::new(mounts.clone()),
            checkpoint: Box::new(Vold::new(SystemProperties)),
            verity: Box::new(Avbctl),
            overlay: Box::new(ScratchOverlay::new(config.paths.clone(), mounts)),
            mapper: Box::new(DeviceMapper::new(&config.paths)),
            block: Box::new(DeviceBlocks),
            dsu: Box::new(GsiTool::default()),
            rebooter: Box::new(PowerCtl::new(SystemProperties)),
        }
    }
}
