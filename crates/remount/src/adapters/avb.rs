//! Verified boot control through `avbctl`.

use remount_common::RemountResult;
use remount_fstab::PartitionDescriptor;

use super::run_tool;
use crate::services::VerityControl;

/// `avbctl` front end. It always acts on the running slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct Avbctl;

impl VerityControl for Avbctl {
    fn is_verity_enabled(&self, entry: &PartitionDescriptor) -> bool {
        if !entry.fs_mgr_flags.avb {
            return false;
        }
        match run_tool("avbctl", &["get-verity"]) {
            Ok(answer) => verity_enabled(&answer),
            Err(e) => {
                tracing::warn!(error = %e, "Could not query verity state");
                false
            }
        }
    }

    fn disable_verity(&self, slot_suffix: &str) -> RemountResult<()> {
        // avbctl takes no slot argument; it rewrites the running slot's
        // vbmeta, which is the slot `slot_suffix` names.
        tracing::debug!(slot = slot_suffix, "avbctl disable-verity");
        run_tool("avbctl", &["disable-verity"]).map(drop)
    }
}

/// `avbctl get-verity` prints "verity is enabled on slot _a".
fn verity_enabled(answer: &str) -> bool {
    answer.contains("is enabled")
}
