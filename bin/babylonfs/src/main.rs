//! BabylonFS - mounts an endless, procedurally generated library.
//!
//! Every name and every book is derived from a seed, so two mounts with the
//! same seed show the same library. Notes and baskets written on desks live
//! in memory until the filesystem is unmounted.

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use babylon_core::Cycle;
use babylon_fs::{ops, MountConfig};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::FileConfig;

/// BabylonFS library mounter.
#[derive(Parser, Debug)]
#[command(name = "babylonfs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Mount point path
    mount_point: PathBuf,

    /// Seed the library is generated from (empty when unset)
    #[arg(short, long)]
    seed: Option<String>,

    /// Number of rooms before the corridor loops back (0 or less: endless)
    #[arg(long, allow_negative_numbers = true)]
    cycle: Option<i64>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, default_value = "~/.babylonfs/config.toml")]
    config: PathBuf,

    /// Allow other users to access the mount
    #[arg(long)]
    allow_other: bool,

    /// Keep the mount when the process exits
    #[arg(long)]
    no_auto_unmount: bool,
}

impl Cli {
    /// Merges command line flags over the configuration file.
    fn mount_config(&self, file: FileConfig) -> MountConfig {
        let defaults = MountConfig::default();
        let seed = self.seed.clone().or(file.library.seed).unwrap_or_default();
        let cycle = Cycle::from_size(self.cycle.or(file.library.cycle));

        MountConfig {
            mount_point: self.mount_point.clone(),
            seed,
            cycle,
            allow_other: self.allow_other || file.mount.allow_other.unwrap_or(false),
            auto_unmount: !self.no_auto_unmount
                && file.mount.auto_unmount.unwrap_or(defaults.auto_unmount),
            ttl_secs: file.mount.ttl_secs.unwrap_or(defaults.ttl_secs),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set up logging")?;

    let file = FileConfig::load(&cli.config)?;
    let config = cli.mount_config(file);

    info!(
        seed = %config.seed,
        cycle = %config.cycle,
        mount_point = %config.mount_point.display(),
        "Starting BabylonFS"
    );

    ops::mount(config).context("Failed to mount library")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("babylonfs").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["/mnt/library"]);
        let config = cli.mount_config(FileConfig::default());
        assert_eq!(config.seed, "");
        assert_eq!(config.cycle, Cycle::Unbounded);
        assert!(config.auto_unmount);
        assert!(!config.allow_other);
        assert_eq!(config.mount_point, PathBuf::from("/mnt/library"));
    }

    #[test]
    fn test_flags_override_file() {
        let cli = parse(&["/mnt/library", "--seed", "cli", "--cycle", "7", "--no-auto-unmount"]);
        let file = FileConfig::parse(
            "[library]\nseed = \"file\"\ncycle = 3\n[mount]\nauto_unmount = true\nttl_secs = 9\n",
        )
        .unwrap();

        let config = cli.mount_config(file);
        assert_eq!(config.seed, "cli");
        assert_eq!(config.cycle.ring_size(), Some(7));
        assert!(!config.auto_unmount);
        assert_eq!(config.ttl_secs, 9);
    }

    #[test]
    fn test_file_fills_missing_flags() {
        let cli = parse(&["/mnt/library"]);
        let file = FileConfig::parse("[library]\nseed = \"file\"\ncycle = 3\n").unwrap();

        let config = cli.mount_config(file);
        assert_eq!(config.seed, "file");
        assert_eq!(config.cycle.ring_size(), Some(3));
    }

    #[test]
    fn test_negative_cycle_is_endless() {
        let cli = parse(&["/mnt/library", "--cycle", "-4"]);
        assert_eq!(cli.mount_config(FileConfig::default()).cycle, Cycle::Unbounded);
    }
}
