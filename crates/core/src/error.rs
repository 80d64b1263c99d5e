//! Error taxonomy for tree operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the tree engine and the host operations
#[derive(Error, Debug)]
pub enum TreeError {
    /// Hint has no live mapping (stale from an earlier generation, or a typo)
    #[error("Unknown hint: '{0}'")]
    UnknownHint(String),

    /// An entry was created for a path that is already registered.
    /// Indicates a diffing bug; never retried.
    #[error("Entry already registered for path: {}", .0.display())]
    DuplicatePath(PathBuf),

    /// Bounded wait for a path expired (or the tree was reset meanwhile)
    #[error("Could not locate entry: {}", .0.display())]
    NotFound(PathBuf),

    /// Move/rename/create target already exists on disk
    #[error("Destination already exists: {}", .0.display())]
    DestinationConflict(PathBuf),

    /// Pool empty at allocation time
    #[error("Hint pool exhausted")]
    HintExhausted,

    #[error("This command expects a directory but you picked a file: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("This command expects a file but you picked a directory: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("Cannot close parent of workspace directory")]
    NoParent,

    /// Rename target is not a single plain file name
    #[error("Not a valid name: '{0}'")]
    InvalidName(String),

    #[error("Path is not a member of the workspace: {}", .0.display())]
    OutsideRoot(PathBuf),

    /// Entry id no longer refers to a live entry
    #[error("Unknown entry id: {0}")]
    UnknownEntry(u64),

    /// Failure reported by a filesystem or ignore collaborator
    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}

impl TreeError {
    /// Whether this error signals a broken internal invariant
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, TreeError::DuplicatePath(_))
    }
}

/// Result type used throughout hintree-core
pub type Result<T> = std::result::Result<T, TreeError>;
