//! Hint pool with coalesced re-sorting
//!
//! Unused hints are kept in reverse preference order so the best candidate
//! sits at the tail and `take()` is a pop. Returned hints are appended and
//! the pool is marked dirty; the re-sort runs once no further returns have
//! arrived for the cooldown window, which keeps mass teardown (collapsing a
//! huge directory) from sorting once per returned hint.

use crate::error::{Result, TreeError};
use crate::hint::{preference, Hint, HintUniverse};
use ahash::AHashSet;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Default cooldown before a dirty pool is re-sorted
pub const DEFAULT_RESORT_COOLDOWN: Duration = Duration::from_millis(100);

pub struct HintPool {
    universe: HintUniverse,
    /// Reverse preference order; tail is taken first
    hints: Vec<Hint>,
    members: AHashSet<Hint>,
    cooldown: Duration,
    /// Armed by `give`, cleared when the sort runs
    resort_at: Option<Instant>,
}

impl HintPool {
    /// Create a full pool over `universe`
    pub fn new(universe: HintUniverse, cooldown: Duration) -> Self {
        let mut pool = Self {
            universe,
            hints: Vec::new(),
            members: AHashSet::new(),
            cooldown,
            resort_at: None,
        };
        pool.reset();
        pool
    }

    /// Remove and return the tail hint, if any
    pub fn take(&mut self) -> Option<Hint> {
        self.sort_if_due();
        let hint = self.hints.pop()?;
        self.members.remove(&hint);
        Some(hint)
    }

    /// Like [`take`](Self::take) but reports exhaustion as an error
    pub fn try_take(&mut self) -> Result<Hint> {
        self.take().ok_or(TreeError::HintExhausted)
    }

    /// Return a hint for reuse and (re)arm the coalesced sort
    pub fn give(&mut self, hint: Hint) {
        if !self.universe.contains(&hint) {
            warn!(hint = %hint, "Ignoring return of hint outside the universe");
            return;
        }
        if !self.members.insert(hint.clone()) {
            warn!(hint = %hint, "Ignoring duplicate return of pooled hint");
            return;
        }
        self.hints.push(hint);
        self.resort_at = Some(Instant::now() + self.cooldown);
    }

    /// Restore the full initial contents
    pub fn reset(&mut self) {
        let mut hints = self.universe.hints();
        hints.reverse();
        self.members = hints.iter().cloned().collect();
        self.hints = hints;
        self.resort_at = None;
    }

    /// Run a pending re-sort now, regardless of the cooldown
    pub fn flush(&mut self) {
        if self.resort_at.take().is_some() {
            self.sort();
        }
    }

    /// Whether returned hints are still waiting for the coalesced sort
    pub fn is_dirty(&self) -> bool {
        self.resort_at.is_some()
    }

    pub fn len(&self) -> usize {
        self.hints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }

    pub fn contains(&self, hint: &Hint) -> bool {
        self.members.contains(hint)
    }

    pub fn universe(&self) -> &HintUniverse {
        &self.universe
    }

    /// Iterate the pooled hints (unordered while dirty)
    pub fn iter(&self) -> impl Iterator<Item = &Hint> {
        self.hints.iter()
    }

    fn sort_if_due(&mut self) {
        if matches!(self.resort_at, Some(at) if Instant::now() >= at) {
            self.resort_at = None;
            self.sort();
        }
    }

    fn sort(&mut self) {
        self.hints.sort_unstable_by(|a, b| preference(b, a));
        debug!(pooled = self.hints.len(), "Hint pool re-sorted");
    }
}

impl Default for HintPool {
    fn default() -> Self {
        Self::new(HintUniverse::default(), DEFAULT_RESORT_COOLDOWN)
    }
}
