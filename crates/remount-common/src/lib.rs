//! # remount-common
//!
//! Shared types for the remount workspace.
//!
//! This crate provides:
//! - The stage-tagged error type used by every remount component
//! - The stable, numbered status codes reported as process exit codes
//! - Well-known device paths and system property names

#![warn(missing_docs)]

pub mod error;
pub mod paths;
pub mod status;

pub use error::{RemountError, RemountResult};
pub use paths::RemountPaths;
pub use status::StatusCode;
