//! Shared utilities for CLI commands

use crate::config::AppConfig;
use anyhow::{Context, Result};
use hintree_core::TreeSynchronizer;
use hintree_watcher::{IgnoreRules, LocalFileSystem};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Resolve the tree root: the given path, or the current directory
pub fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf> {
    let root = match root {
        Some(root) => root,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    let root = root
        .canonicalize()
        .with_context(|| format!("No such directory: {}", root.display()))?;
    if !root.is_dir() {
        anyhow::bail!("Not a directory: {}", root.display());
    }
    Ok(root)
}

/// Synchronizer over the local filesystem with ignore rules loaded
pub fn open_tree(
    root: &Path,
    config: &AppConfig,
) -> Result<(Arc<TreeSynchronizer>, Arc<IgnoreRules>)> {
    let rules = Arc::new(
        IgnoreRules::load(root, config.ignore.clone()).context("Failed to load ignore rules")?,
    );
    let sync = Arc::new(TreeSynchronizer::new(
        root,
        Arc::new(LocalFileSystem::new()),
        rules.clone(),
        config.explorer.clone(),
    ));
    Ok((sync, rules))
}
