//! One-shot tree printing

use anyhow::Result;
use hintree_cli::render::render_tree;
use hintree_cli::util::{open_tree, resolve_root};
use hintree_cli::AppConfig;
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

pub async fn run(
    root: Option<PathBuf>,
    config_path: Option<&Path>,
    depth: usize,
    all: bool,
) -> Result<()> {
    let root = resolve_root(root)?;
    let mut config = AppConfig::load(&root, config_path)?;
    if all {
        config.explorer.tree.show_ignored = true;
    }
    let (sync, _rules) = open_tree(&root, &config)?;

    let top = sync.get_children(None).await?;
    if depth > 0 {
        for id in top {
            if sync.entry(id)?.is_dir() {
                sync.expand_to_level(id, depth - 1).await?;
            }
        }
    }

    let color = std::io::stdout().is_terminal();
    if color {
        println!("{}", root.display().bold());
    } else {
        println!("{}", root.display());
    }
    for line in render_tree(&sync, None, color) {
        println!("{}", line);
    }
    Ok(())
}
