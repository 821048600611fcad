//! Configuration file support.
//!
//! ```toml
//! [library]
//! seed = "babel"
//! cycle = 64
//!
//! [mount]
//! allow_other = false
//! auto_unmount = true
//! ttl_secs = 1
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

/// Contents of the configuration file. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// `[library]` section
    pub library: LibrarySection,
    /// `[mount]` section
    pub mount: MountSection,
}

/// `[library]` section.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LibrarySection {
    /// Seed the library is generated from
    pub seed: Option<String>,
    /// Ring size; zero or negative means an endless corridor
    pub cycle: Option<i64>,
}

/// `[mount]` section.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MountSection {
    /// Allow other users to access the mount
    pub allow_other: Option<bool>,
    /// Unmount when the process exits
    pub auto_unmount: Option<bool>,
    /// Attribute and entry cache timeout in seconds
    pub ttl_secs: Option<u64>,
}

impl FileConfig {
    /// Parses a configuration document.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Loads the file at `path`, or the defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let path = expand_tilde(path);

        if !path.exists() {
            info!("No config file found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).context("Failed to read config file")?;
        Self::parse(&content)
    }
}

/// Expand ~ to home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
