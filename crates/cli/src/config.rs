//! Application configuration
//!
//! Read from `.hintree.toml` in the tree root when present; `--config`
//! points at another file. Every table is optional.

use anyhow::{Context, Result};
use hintree_core::ExplorerConfig;
use hintree_watcher::{IgnoreConfig, WatcherConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the per-root config file
pub const CONFIG_FILE: &str = ".hintree.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub explorer: ExplorerConfig,

    #[serde(default)]
    pub ignore: IgnoreConfig,

    #[serde(default)]
    pub watcher: WatcherConfig,
}

impl AppConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load `explicit` if given, else `<root>/.hintree.toml`, else defaults
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path: PathBuf = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = root.join(CONFIG_FILE);
                if !path.exists() {
                    debug!(root = %root.display(), "No config file; using defaults");
                    return Ok(Self::default());
                }
                path
            }
        };

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config =
            Self::from_toml(&text).with_context(|| format!("Invalid config: {}", path.display()))?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.explorer.validate()?;
        if !(10..=10_000).contains(&self.watcher.debounce_ms) {
            anyhow::bail!(
                "watcher.debounce_ms must be between 10 and 10000 (got {})",
                self.watcher.debounce_ms
            );
        }
        Ok(())
    }
}
