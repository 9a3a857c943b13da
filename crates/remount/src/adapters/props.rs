//! System properties through `getprop` / `setprop`.

use remount_common::RemountResult;

use super::run_tool;
use crate::services::PropertySource;

/// Android system properties.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProperties;

impl PropertySource for SystemProperties {
    fn get(&self, key: &str) -> Option<String> {
        match run_tool("getprop", &[key]) {
            Ok(value) if !value.is_empty() => Some(value),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(key, error = %e, "getprop failed");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> RemountResult<()> {
        run_tool("setprop", &[key, value]).map(drop)
    }
}
