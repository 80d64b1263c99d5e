//! Tree entries

use crate::hint::Hint;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Process-unique entry identity
///
/// Ids are never reused, so an id from a previous generation can never
/// alias a live entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub(crate) u64);

impl EntryId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Type of tree entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    pub fn is_dir(self) -> bool {
        self == EntryKind::Directory
    }
}

/// Collapsible state as presented to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollapsibleState {
    Expanded,
    Collapsed,
    /// Files; never expandable
    Leaf,
}

/// One filesystem path within the known portion of the tree
#[derive(Debug, Clone)]
pub struct Entry {
    pub(crate) id: EntryId,
    pub(crate) path: PathBuf,
    pub(crate) kind: EntryKind,
    pub(crate) hint: Option<Hint>,
    pub(crate) state: CollapsibleState,
    pub(crate) parent: Option<EntryId>,
    /// Known children in display order (directories only)
    pub(crate) children: Vec<EntryId>,
    /// Whether `children` reflects the most recent listing
    pub(crate) listed: bool,
}

impl Entry {
    pub(crate) fn new(id: EntryId, path: PathBuf, kind: EntryKind, parent: Option<EntryId>) -> Self {
        let state = match kind {
            EntryKind::Directory => CollapsibleState::Collapsed,
            EntryKind::File => CollapsibleState::Leaf,
        };
        Self {
            id,
            path,
            kind,
            hint: None,
            state,
            parent,
            children: Vec::new(),
            listed: false,
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    pub fn hint(&self) -> Option<&Hint> {
        self.hint.as_ref()
    }

    pub fn state(&self) -> CollapsibleState {
        self.state
    }

    pub fn parent(&self) -> Option<EntryId> {
        self.parent
    }

    pub fn children(&self) -> &[EntryId] {
        &self.children
    }

    pub fn is_listed(&self) -> bool {
        self.listed
    }

    /// File name used as the display label
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}
