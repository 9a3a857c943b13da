//! Checkpoint status through `vdc`.

use remount_common::paths::props;
use remount_common::{RemountError, RemountResult};

use super::run_tool;
use crate::services::{CheckpointConnector, CheckpointService, PropertySource};

/// Connects to vold once init reports it running.
#[derive(Debug, Clone)]
pub struct Vold<P> {
    properties: P,
}

impl<P: PropertySource> Vold<P> {
    /// Connector reading service state from `properties`.
    pub const fn new(properties: P) -> Self {
        Self { properties }
    }
}

impl<P: PropertySource> CheckpointConnector for Vold<P> {
    fn connect(&self) -> Option<Box<dyn CheckpointService + '_>> {
        match self.properties.get(props::VOLD_STATE).as_deref() {
            Some("running") => Some(Box::new(Vdc)),
            state => {
                tracing::debug!(?state, "Waiting for vold");
                None
            }
        }
    }
}

struct Vdc;

impl CheckpointService for Vdc {
    fn is_checkpointing(&self) -> RemountResult<bool> {
        let answer = run_tool("vdc", &["checkpoint", "isCheckpointing"])?;
        parse_answer(&answer)
    }
}

fn parse_answer(answer: &str) -> RemountResult<bool> {
    match answer.lines().last().map(str::trim) {
        Some("1" | "true") => Ok(true),
        Some("0" | "false") => Ok(false),
        _ => Err(RemountError::service("vold", format!("unexpected answer {answer:?}"))),
    }
}
