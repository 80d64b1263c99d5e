//! Per-path debouncing logic
//!
//! Editors and build tools touch the same path several times in a burst.
//! Events are held per path until the path has been quiet for the window,
//! and the burst is coalesced into one change:
//! - deleted, then created: `Modified` (save-by-replace)
//! - created, then deleted: nothing (a temp file that came and went)
//! - otherwise the most recent kind wins

use ahash::AHashMap;
use hintree_core::ChangeKind;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::Instant;

/// Default debounce window
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

struct Pending {
    kind: ChangeKind,
    deadline: Instant,
}

pub struct Debouncer {
    window: Duration,
    pending: AHashMap<PathBuf, Pending>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: AHashMap::new(),
        }
    }

    /// Record an event, restarting the quiet period for its path
    pub fn push(&mut self, path: PathBuf, kind: ChangeKind) {
        let deadline = Instant::now() + self.window;
        let coalesced = match self.pending.get(&path).map(|p| p.kind) {
            None => Some(kind),
            Some(ChangeKind::Deleted) if kind == ChangeKind::Created => Some(ChangeKind::Modified),
            Some(ChangeKind::Created) if kind == ChangeKind::Deleted => None,
            // Still new as far as the tree is concerned
            Some(ChangeKind::Created) if kind == ChangeKind::Modified => Some(ChangeKind::Created),
            Some(_) => Some(kind),
        };

        match coalesced {
            Some(kind) => {
                self.pending.insert(path, Pending { kind, deadline });
            }
            None => {
                self.pending.remove(&path);
            }
        }
    }

    /// Remove and return every change whose quiet period has elapsed
    pub fn drain_ready(&mut self, now: Instant) -> Vec<(PathBuf, ChangeKind)> {
        let ready: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, p)| p.deadline <= now)
            .map(|(path, _)| path.clone())
            .collect();

        let mut out: Vec<(PathBuf, ChangeKind)> = ready
            .into_iter()
            .filter_map(|path| self.pending.remove(&path).map(|p| (path, p.kind)))
            .collect();
        // Parents before children so created directories exist when their
        // contents arrive
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Remove and return everything pending
    pub fn drain_all(&mut self) -> Vec<(PathBuf, ChangeKind)> {
        let mut out: Vec<(PathBuf, ChangeKind)> =
            self.pending.drain().map(|(path, p)| (path, p.kind)).collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Earliest deadline among pending paths
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|p| p.deadline).min()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}
