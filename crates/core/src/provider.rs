//! Collaborator contracts consumed by the synchronizer
//!
//! The engine performs no I/O of its own: directory listings, existence
//! checks and mutations go through [`FileSystem`], ignore filtering through
//! [`VisibilityFilter`]. `hintree-watcher` provides the local-disk versions.

use crate::entry::EntryKind;
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// Filesystem access used by the synchronizer and host operations
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Immediate children of `path` as `(name, kind)`, in any order
    async fn list_children(&self, path: &Path) -> Result<Vec<(String, EntryKind)>>;

    async fn path_exists(&self, path: &Path) -> Result<bool>;

    async fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Create an empty file; must not overwrite
    async fn create_file(&self, path: &Path) -> Result<()>;

    async fn create_dir(&self, path: &Path) -> Result<()>;

    /// Remove a file or a directory with its contents, permanently
    async fn remove(&self, path: &Path) -> Result<()>;

    /// Move a file or a directory with its contents to the OS trash
    async fn trash(&self, path: &Path) -> Result<()>;
}

/// Ignore-rule filtering of listed names
#[async_trait]
pub trait VisibilityFilter: Send + Sync {
    /// The subset of `names` (children of `parent`) that should be shown
    async fn filter_visible(&self, parent: &Path, names: Vec<String>) -> Result<Vec<String>>;
}

/// Filter that hides nothing
pub struct ShowAll;

#[async_trait]
impl VisibilityFilter for ShowAll {
    async fn filter_visible(&self, _parent: &Path, names: Vec<String>) -> Result<Vec<String>> {
        Ok(names)
    }
}

/// Kind of an external filesystem change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Deleted,
    Modified,
}
