//! Mount configuration.

use std::path::PathBuf;
use std::time::Duration;

use babylon_core::Cycle;
use fuser::MountOption;

/// Mount configuration.
#[derive(Debug, Clone)]
pub struct MountConfig {
    /// Mount point path
    pub mount_point: PathBuf,
    /// Seed every name and book is derived from
    pub seed: String,
    /// Shape of the room graph
    pub cycle: Cycle,
    /// Allow other users to access
    pub allow_other: bool,
    /// Unmount automatically when the process exits
    pub auto_unmount: bool,
    /// Attribute and entry cache timeout in seconds
    pub ttl_secs: u64,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            mount_point: PathBuf::new(),
            seed: String::new(),
            cycle: Cycle::Unbounded,
            allow_other: false,
            auto_unmount: true,
            ttl_secs: 1,
        }
    }
}

impl MountConfig {
    /// Returns the kernel cache timeout.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Returns the options passed to the FUSE mount.
    pub fn options(&self) -> Vec<MountOption> {
        let mut options = vec![
            MountOption::RW,
            MountOption::FSName("babylonfs".to_string()),
            MountOption::Subtype("babylonfs".to_string()),
        ];
        if self.auto_unmount {
            options.push(MountOption::AutoUnmount);
        }
        if self.allow_other {
            options.push(MountOption::AllowOther);
        }
        options
    }
}
