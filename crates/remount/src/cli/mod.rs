//! CLI definition and handler.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::RemountConfig;
use crate::engine::{Remounter, preflight};
use crate::services::Platform;

/// Remount partitions read-write, disabling verity or using overlayfs as needed
#[derive(Parser)]
#[command(name = "remount")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Use the fstab at PATH instead of the device default
    #[arg(short = 'T', long, value_name = "PATH")]
    pub fstab: Option<PathBuf>,

    /// Automatically reboot when the changes need a reboot
    #[arg(short = 'R', long)]
    pub reboot: bool,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Root directory for overlay scratch storage
    #[arg(long, global = true, env = "REMOUNT_SCRATCH_DIR", hide = true)]
    pub scratch_root: Option<PathBuf>,

    /// Partitions to remount, by mount point or name; all when omitted
    #[arg(value_name = "PARTITION")]
    pub partitions: Vec<String>,

    /// Helper commands.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Helper commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Remove overlay scratch storage no mounted overlay uses
    CleanScratch,
}

impl Cli {
    /// Run configuration for these arguments.
    #[must_use]
    pub fn config(&self) -> RemountConfig {
        let mut config = RemountConfig::default()
            .with_auto_reboot(self.reboot)
            .with_verbose(self.verbose);
        if let Some(root) = &self.scratch_root {
            config = config.with_scratch_root(root);
        }
        if let Some(path) = &self.fstab {
            config = config.with_fstab(path);
        }
        config
    }

    /// Execute the CLI command, returning the process exit code.
    pub fn execute(self) -> u8 {
        let config = self.config();
        let platform = Platform::device(&config);
        let remounter = Remounter::new(config, platform);

        let result = match self.command {
            Some(Commands::CleanScratch) => remounter.clean_scratch().map(|()| 0),
            None => preflight::ensure_root()
                .and_then(|()| remounter.run(&self.partitions))
                .map(|status| status.code()),
        };

        result.unwrap_or_else(|e| {
            let code = e.exit_code();
            eprintln!("{:?}", miette::Report::new(e));
            code
        })
    }
}
