//! Host-facing view types

use crate::entry::{CollapsibleState, Entry, EntryId};
use crate::label::{format_hint, LetterStyling};

/// What the host draws for one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayItem {
    /// File name
    pub label: String,
    /// Styled hint, empty when the entry has none
    pub description: String,
    pub collapsible_state: CollapsibleState,
    pub is_leaf: bool,
}

impl DisplayItem {
    pub fn for_entry(entry: &Entry, styling: LetterStyling) -> Self {
        Self {
            label: entry.name(),
            description: entry
                .hint()
                .map(|h| format_hint(h, styling))
                .unwrap_or_default(),
            collapsible_state: entry.state(),
            is_leaf: !entry.is_dir(),
        }
    }
}

/// Notification telling the host what to redraw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEvent {
    /// Redraw from this entry down; `None` means the whole tree
    Changed(Option<EntryId>),
}
