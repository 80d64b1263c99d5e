//! Explorer configuration
//!
//! Loaded from the `[explorer]` table of the host's TOML config. Every
//! field has a default, so an empty table is a valid configuration.

use crate::hint::{HintUniverse, DEFAULT_ALPHABET};
use crate::label::LetterStyling;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExplorerConfig {
    #[serde(default)]
    pub hints: HintConfig,

    #[serde(default)]
    pub tree: TreeConfig,

    #[serde(default)]
    pub timing: TimingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HintConfig {
    /// Letters hints are spelled with (default: a-z)
    #[serde(default = "default_alphabet")]
    pub alphabet: String,

    /// Longest hint handed out (default: 2, i.e. 702 hints)
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Rendering of hint letters in entry descriptions
    #[serde(default)]
    pub letter_styling: LetterStyling,
}

impl Default for HintConfig {
    fn default() -> Self {
        Self {
            alphabet: default_alphabet(),
            max_length: default_max_length(),
            letter_styling: LetterStyling::default(),
        }
    }
}

impl HintConfig {
    pub fn universe(&self) -> HintUniverse {
        HintUniverse::new(&self.alphabet, self.max_length)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Collapsing a directory with more cached children than this releases
    /// the hints of its whole subtree (default: 100)
    #[serde(default = "default_soft_collapse_threshold")]
    pub soft_collapse_threshold: usize,

    /// List directories before files (default: true)
    #[serde(default = "default_true")]
    pub directories_first: bool,

    /// Names hidden even when ignored files are shown
    #[serde(default = "default_always_hidden")]
    pub always_hidden: Vec<String>,

    /// Start with ignored files visible (default: false)
    #[serde(default)]
    pub show_ignored: bool,

    /// Deleting moves entries to the OS trash; when false they are
    /// removed permanently (default: true)
    #[serde(default = "default_true")]
    pub use_trash: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            soft_collapse_threshold: default_soft_collapse_threshold(),
            directories_first: true,
            always_hidden: default_always_hidden(),
            show_ignored: false,
            use_trash: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Quiet period after the last returned hint before the pool is re-sorted
    #[serde(default = "default_resort_cooldown_ms")]
    pub pool_resort_cooldown_ms: u64,

    /// How long a path lookup waits for an in-flight expansion
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            pool_resort_cooldown_ms: default_resort_cooldown_ms(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
        }
    }
}

impl TimingConfig {
    pub fn pool_resort_cooldown(&self) -> Duration {
        Duration::from_millis(self.pool_resort_cooldown_ms)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

impl ExplorerConfig {
    /// Parse from TOML text and validate
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("Failed to parse explorer config")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate ranges
    pub fn validate(&self) -> Result<()> {
        let letters: Vec<char> = self.hints.alphabet.chars().collect();
        if letters.len() < 2 {
            anyhow::bail!("hints.alphabet must contain at least 2 letters");
        }
        let unique: HashSet<char> = letters.iter().copied().collect();
        if unique.len() != letters.len() {
            anyhow::bail!("hints.alphabet contains repeated letters");
        }
        if letters.iter().any(|c| !c.is_lowercase()) {
            anyhow::bail!("hints.alphabet must be lowercase letters");
        }
        if !(1..=4).contains(&self.hints.max_length) {
            anyhow::bail!(
                "hints.max_length must be between 1 and 4 (got {})",
                self.hints.max_length
            );
        }
        if self.tree.soft_collapse_threshold == 0 {
            anyhow::bail!("tree.soft_collapse_threshold must be positive");
        }
        if !(1..=60_000).contains(&self.timing.lookup_timeout_ms) {
            anyhow::bail!("timing.lookup_timeout_ms must be between 1 and 60000");
        }
        if self.timing.pool_resort_cooldown_ms > 10_000 {
            anyhow::bail!("timing.pool_resort_cooldown_ms must be at most 10000");
        }
        Ok(())
    }
}

fn default_alphabet() -> String {
    DEFAULT_ALPHABET.to_string()
}

fn default_max_length() -> usize {
    2
}

fn default_soft_collapse_threshold() -> usize {
    100
}

fn default_always_hidden() -> Vec<String> {
    vec![".git".to_string()]
}

fn default_resort_cooldown_ms() -> u64 {
    100
}

fn default_lookup_timeout_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}
