//! Hintree CLI - ht command

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;

/// Hintree - a file tree you drive by typing short letter hints
#[derive(Parser)]
#[command(name = "ht")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: <root>/.hintree.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the hinted tree
    Tree {
        /// Tree root (default: current directory)
        root: Option<PathBuf>,

        /// Directory levels to expand below the top level
        #[arg(long, default_value = "0")]
        depth: usize,

        /// Include ignored files
        #[arg(long)]
        all: bool,
    },
    /// Interactive explorer driven by hint commands on stdin
    Shell {
        /// Tree root (default: current directory)
        root: Option<PathBuf>,

        /// Don't watch the tree for external changes
        #[arg(long)]
        no_watch: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Tree { root, depth, all } => {
            cmd::tree::run(root, cli.config.as_deref(), depth, all).await
        }
        Commands::Shell { root, no_watch } => {
            cmd::shell::run(root, cli.config.as_deref(), !no_watch).await
        }
    }
}
