//! Interactive explorer over stdin

use anyhow::Result;
use hintree_cli::render::render_tree;
use hintree_cli::shell::{dispatch, ShellCommand, HELP};
use hintree_cli::util::{open_tree, resolve_root};
use hintree_cli::AppConfig;
use hintree_core::{EntryId, Explorer, HostAction, TreeSynchronizer};
use hintree_watcher::Watcher;
use owo_colors::OwoColorize;
use std::fmt::Display;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

pub async fn run(root: Option<PathBuf>, config_path: Option<&Path>, watch: bool) -> Result<()> {
    let root = resolve_root(root)?;
    let config = AppConfig::load(&root, config_path)?;
    let (sync, rules) = open_tree(&root, &config)?;
    let explorer = Explorer::new(sync.clone());

    let watch_task = if watch {
        let watcher = Watcher::start(&root, &config.watcher)?;
        Some(tokio::spawn(watcher.forward(sync.clone(), Some(rules))))
    } else {
        None
    };

    let color = std::io::stdout().is_terminal();
    let mut selected: Option<EntryId> = None;
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    print_tree(&sync, selected, color).await?;

    loop {
        prompt(color)?;
        let Some(line) = input.next_line().await? else {
            break;
        };

        let command = match ShellCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                report(e, color);
                continue;
            }
        };
        debug!(?command, "Shell command");

        match command {
            ShellCommand::Quit => break,
            ShellCommand::Help => {
                println!("{}", HELP);
                continue;
            }
            ShellCommand::Delete(ref hint) => {
                let name = match sync.lookup_by_hint(hint).and_then(|id| sync.entry(id)) {
                    Ok(entry) => entry.name(),
                    Err(e) => {
                        report(e, color);
                        continue;
                    }
                };
                print!("Delete {}? [y/N] ", name);
                std::io::stdout().flush()?;
                let answer = input.next_line().await?.unwrap_or_default();
                if !matches!(answer.trim(), "y" | "Y" | "yes") {
                    println!("Cancelled");
                    continue;
                }
            }
            _ => {}
        }

        match dispatch(&explorer, &command).await {
            Ok(HostAction::Open(path)) => {
                if color {
                    println!("{} {}", "open".green().bold(), path.display());
                } else {
                    println!("open {}", path.display());
                }
            }
            Ok(HostAction::Reveal { entry, .. }) => selected = Some(entry),
            Ok(HostAction::None) => {}
            Err(e) => report(e, color),
        }
        print_tree(&sync, selected, color).await?;
    }

    if let Some(task) = watch_task {
        task.abort();
    }
    Ok(())
}

async fn print_tree(sync: &TreeSynchronizer, selected: Option<EntryId>, color: bool) -> Result<()> {
    // The top level is re-listed after a root collapse
    sync.get_children(None).await?;
    for line in render_tree(sync, selected, color) {
        println!("{}", line);
    }
    Ok(())
}

fn prompt(color: bool) -> Result<()> {
    if color {
        print!("{} ", ">".cyan().bold());
    } else {
        print!("> ");
    }
    std::io::stdout().flush()?;
    Ok(())
}

fn report(error: impl Display, color: bool) {
    if color {
        eprintln!("{} {}", "error:".red().bold(), error);
    } else {
        eprintln!("error: {}", error);
    }
}
