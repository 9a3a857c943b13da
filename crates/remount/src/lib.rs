//! # remount
//!
//! Makes read-only device partitions writable on debuggable builds.
//!
//! ## Features
//!
//! - **Verified boot**: disables verity for protected partitions
//! - **Overlay fallback**: overlayfs over partitions that cannot be written in place
//! - **Raw remount**: `MS_REMOUNT` of everything else, system-as-root aware
//! - **Checkpoint safety**: refuses to run while an update checkpoint is open
//!
//! ## Usage
//!
//! ```no_run
//! use remount::{Platform, RemountConfig, Remounter};
//!
//! # fn example() -> remount_common::RemountResult<()> {
//! let config = RemountConfig::default().with_auto_reboot(true);
//! let platform = Platform::device(&config);
//!
//! let status = Remounter::new(config, platform).run(&["/vendor"])?;
//! println!("finished: {status}");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod adapters;
pub mod cli;
pub mod config;
pub mod engine;
pub mod filesystem;
pub mod services;

pub use config::RemountConfig;
pub use engine::{OutcomeRecord, Remounter};
pub use services::Platform;
