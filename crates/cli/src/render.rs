//! Text rendering of the hinted tree

use hintree_core::{CollapsibleState, DisplayItem, EntryId, TreeSynchronizer};
use owo_colors::OwoColorize;

/// Width reserved for the hint column
const HINT_WIDTH: usize = 3;

/// Lines for everything currently shown: the top level plus the cached
/// children of every expanded directory
pub fn render_tree(sync: &TreeSynchronizer, selected: Option<EntryId>, color: bool) -> Vec<String> {
    let styling = sync.config().hints.letter_styling;
    sync.with_session(|session| {
        let mut lines = Vec::new();
        let Some(root) = session.entry(session.root()) else {
            return lines;
        };

        // (entry, depth), popped in display order
        let mut stack: Vec<(EntryId, usize)> =
            root.children().iter().rev().map(|c| (*c, 0)).collect();
        while let Some((id, depth)) = stack.pop() {
            let Some(entry) = session.entry(id) else {
                continue;
            };
            let item = DisplayItem::for_entry(entry, styling);
            lines.push(format_line(&item, depth, selected == Some(id), color));

            if entry.state() == CollapsibleState::Expanded {
                stack.extend(entry.children().iter().rev().map(|c| (*c, depth + 1)));
            }
        }
        lines
    })
}

fn format_line(item: &DisplayItem, depth: usize, selected: bool, color: bool) -> String {
    let indent = "  ".repeat(depth);
    let marker = match item.collapsible_state {
        CollapsibleState::Expanded => "▾ ",
        CollapsibleState::Collapsed => "▸ ",
        CollapsibleState::Leaf => "  ",
    };
    let hint = format!("{:>width$}", item.description, width = HINT_WIDTH);
    let name = if item.is_leaf {
        item.label.clone()
    } else {
        format!("{}/", item.label)
    };

    if !color {
        let cursor = if selected { ">" } else { " " };
        return format!("{}{} {}{}{}", cursor, hint, indent, marker, name);
    }

    let name = match (selected, item.is_leaf) {
        (true, _) => name.reversed().to_string(),
        (false, false) => name.blue().bold().to_string(),
        (false, true) => name,
    };
    format!(" {} {}{}{}", hint.yellow().bold(), indent, marker.dimmed(), name)
}
