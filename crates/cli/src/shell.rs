//! Line-oriented command language for the interactive host

use anyhow::Result;
use hintree_core::{Explorer, HostAction};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    ToggleOrOpen(String),
    Open(String),
    Rename { hint: String, name: String },
    Move { from: String, to: Option<String> },
    ExpandToLevel { hint: String, level: usize },
    Create { hint: String, name: String },
    Delete(String),
    Select(String),
    CloseParent(String),
    ToggleIgnored,
    CollapseRoot,
    Reveal(PathBuf),
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown command: '{0}' (try 'help')")]
    UnknownCommand(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Not a level: '{0}'")]
    InvalidLevel(String),
}

pub const HELP: &str = "\
t <hint>            toggle directory / open file
o <hint>            open file
r <hint> <name>     rename
m <from> [to]       move into directory (or beside file, or to root)
x <hint> <level>    expand to level
n <hint> <name>     create file (name ending in / creates a directory)
d <hint>            delete
s <hint>            select
c <hint>            collapse parent
i                   toggle ignored files
root                collapse everything
reveal <path>       reveal a file
q                   quit";

impl ShellCommand {
    /// Parse one input line; blank lines yield `None`
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match (head, args.as_slice()) {
            ("t", [hint]) => Self::ToggleOrOpen(hint.to_string()),
            ("t", _) => return Err(ParseError::Usage("t <hint>")),
            ("o", [hint]) => Self::Open(hint.to_string()),
            ("o", _) => return Err(ParseError::Usage("o <hint>")),
            ("r", [hint, name @ ..]) if !name.is_empty() => Self::Rename {
                hint: hint.to_string(),
                name: name.join(" "),
            },
            ("r", _) => return Err(ParseError::Usage("r <hint> <name>")),
            ("m", [from]) => Self::Move {
                from: from.to_string(),
                to: None,
            },
            ("m", [from, to]) => Self::Move {
                from: from.to_string(),
                to: Some(to.to_string()),
            },
            ("m", _) => return Err(ParseError::Usage("m <from> [to]")),
            ("x", [hint, level]) => Self::ExpandToLevel {
                hint: hint.to_string(),
                level: level
                    .parse()
                    .map_err(|_| ParseError::InvalidLevel(level.to_string()))?,
            },
            ("x", _) => return Err(ParseError::Usage("x <hint> <level>")),
            ("n", [hint, name @ ..]) if !name.is_empty() => Self::Create {
                hint: hint.to_string(),
                name: name.join(" "),
            },
            ("n", _) => return Err(ParseError::Usage("n <hint> <name>")),
            ("d", [hint]) => Self::Delete(hint.to_string()),
            ("d", _) => return Err(ParseError::Usage("d <hint>")),
            ("s", [hint]) => Self::Select(hint.to_string()),
            ("s", _) => return Err(ParseError::Usage("s <hint>")),
            ("c", [hint]) => Self::CloseParent(hint.to_string()),
            ("c", _) => return Err(ParseError::Usage("c <hint>")),
            ("i", []) => Self::ToggleIgnored,
            ("root", []) => Self::CollapseRoot,
            ("reveal", [_, ..]) => Self::Reveal(PathBuf::from(args.join(" "))),
            ("reveal", _) => return Err(ParseError::Usage("reveal <path>")),
            ("help" | "?", _) => Self::Help,
            ("q" | "quit" | "exit", _) => Self::Quit,
            (other, _) => return Err(ParseError::UnknownCommand(other.to_string())),
        };
        Ok(Some(command))
    }

    /// Whether the host should ask before running this command
    pub fn needs_confirmation(&self) -> bool {
        matches!(self, Self::Delete(_))
    }
}

/// Run one command against the explorer
///
/// `Help` and `Quit` are the caller's business and map to `HostAction::None`.
pub async fn dispatch(explorer: &Explorer, command: &ShellCommand) -> Result<HostAction> {
    let action = match command {
        ShellCommand::ToggleOrOpen(hint) => explorer.toggle_or_open(hint).await?,
        ShellCommand::Open(hint) => explorer.open(hint).await?,
        ShellCommand::Rename { hint, name } => explorer.rename(hint, name).await?,
        ShellCommand::Move { from, to } => explorer.move_entry(from, to.as_deref()).await?,
        ShellCommand::ExpandToLevel { hint, level } => {
            explorer.expand_to_level(hint, *level).await?
        }
        ShellCommand::Create { hint, name } => explorer.create_child(hint, name).await?,
        ShellCommand::Delete(hint) => explorer.delete(hint).await?,
        ShellCommand::Select(hint) => explorer.select(hint).await?,
        ShellCommand::CloseParent(hint) => explorer.close_parent(hint).await?,
        ShellCommand::ToggleIgnored => explorer.toggle_ignored_visibility().await?,
        ShellCommand::CollapseRoot => explorer.collapse_root().await?,
        ShellCommand::Reveal(path) => {
            let path = if path.is_absolute() {
                path.clone()
            } else {
                explorer.synchronizer().root_path().join(path)
            };
            explorer.reveal_active(&path).await?
        }
        ShellCommand::Help | ShellCommand::Quit => HostAction::None,
    };
    Ok(action)
}
