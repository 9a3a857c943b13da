//! DSU service through `gsi_tool`.

use std::path::PathBuf;
use std::process::Command;

use remount_common::{RemountError, RemountResult};

use super::run_tool;
use crate::services::{DsuConnector, DsuService};

/// Slot name `gsi_tool` uses when none is reported.
const DEFAULT_DSU_SLOT: &str = "dsu";

/// `gsi_tool` front end; absent on devices without DSU support.
#[derive(Debug, Clone)]
pub struct GsiTool {
    binary: PathBuf,
}

impl Default for GsiTool {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("/system/bin/gsi_tool"),
        }
    }
}

impl DsuConnector for GsiTool {
    fn connect(&self) -> Option<Box<dyn DsuService + '_>> {
        if self.binary.exists() {
            Some(Box::new(Gsid { tool: self }))
        } else {
            tracing::debug!(binary = %self.binary.display(), "DSU not supported");
            None
        }
    }
}

struct Gsid<'a> {
    tool: &'a GsiTool,
}

impl Gsid<'_> {
    fn status(&self) -> RemountResult<GsiStatus> {
        run_tool(&self.tool.binary.to_string_lossy(), &["status"]).map(|out| GsiStatus::parse(&out))
    }
}

impl DsuService for Gsid<'_> {
    fn is_running(&self) -> RemountResult<bool> {
        Ok(self.status()?.running)
    }

    fn is_enabled(&self) -> RemountResult<bool> {
        Ok(self.status()?.enabled)
    }

    fn active_slot(&self) -> RemountResult<String> {
        Ok(self
            .status()?
            .active_slot
            .unwrap_or_else(|| DEFAULT_DSU_SLOT.to_string()))
    }

    fn enable_one_shot(&self, slot: &str) -> RemountResult<i32> {
        let status = Command::new(&self.tool.binary)
            .args(["enable", "--single-boot", "--dsuslot", slot])
            .status()
            .map_err(|e| RemountError::service("gsid", format!("failed to execute gsi_tool: {e}")))?;
        Ok(status.code().unwrap_or(-1))
    }
}

/// Parsed `gsi_tool status` output.
#[derive(Debug, Default, PartialEq, Eq)]
struct GsiStatus {
    running: bool,
    enabled: bool,
    active_slot: Option<String>,
}

impl GsiStatus {
    fn parse(output: &str) -> Self {
        let mut status = Self::default();
        for line in output.lines().map(str::trim) {
            match line {
                "running" => status.running = true,
                "enabled" => status.enabled = true,
                _ => {
                    if let Some(slot) = line.strip_prefix("active dsu:") {
                        status.active_slot = Some(slot.trim().to_string());
                    }
                }
            }
        }
        status
    }
}
