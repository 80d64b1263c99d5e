//! Per-tree session: entry store, path index, hint index and hint pool
//!
//! One `TreeSession` exists per tree instance. It is the single source of
//! truth for which entries exist and what they are called, and it is the
//! only place where hints move between the pool and the hint index, so
//! the two always partition the hint universe.

use crate::entry::{CollapsibleState, Entry, EntryId, EntryKind};
use crate::error::{Result, TreeError};
use crate::hint::Hint;
use crate::pool::HintPool;
use ahash::AHashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

pub struct TreeSession {
    root: EntryId,
    root_path: PathBuf,
    entries: AHashMap<EntryId, Entry>,
    by_path: AHashMap<PathBuf, EntryId>,
    by_hint: AHashMap<Hint, EntryId>,
    pool: HintPool,
    /// Never rewound, so ids stay unique across generations
    next_id: u64,
    generation: u64,
}

impl TreeSession {
    /// Create a session whose root entry is `root_path` (a directory, no hint)
    pub fn new(root_path: impl Into<PathBuf>, pool: HintPool) -> Self {
        let mut session = Self {
            root: EntryId(0),
            root_path: root_path.into(),
            entries: AHashMap::new(),
            by_path: AHashMap::new(),
            by_hint: AHashMap::new(),
            pool,
            next_id: 0,
            generation: 0,
        };
        session.register_root();
        session
    }

    fn register_root(&mut self) {
        let id = self.next_entry_id();
        let entry = Entry::new(id, self.root_path.clone(), EntryKind::Directory, None);
        self.by_path.insert(self.root_path.clone(), id);
        self.entries.insert(id, entry);
        self.root = id;
    }

    fn next_entry_id(&mut self) -> EntryId {
        self.next_id += 1;
        EntryId(self.next_id)
    }

    pub fn root(&self) -> EntryId {
        self.root
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Incremented by every [`reset`](Self::reset)
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Register a new entry
    ///
    /// Fails with `DuplicatePath` if the path is already known.
    pub fn create(
        &mut self,
        path: PathBuf,
        kind: EntryKind,
        parent: Option<EntryId>,
        hint: Option<Hint>,
    ) -> Result<EntryId> {
        if self.by_path.contains_key(&path) {
            error!(path = %path.display(), "Entry created twice for the same path");
            if let Some(hint) = hint {
                self.pool.give(hint);
            }
            return Err(TreeError::DuplicatePath(path));
        }

        let id = self.next_entry_id();
        let mut entry = Entry::new(id, path.clone(), kind, parent);
        if let Some(hint) = hint {
            self.by_hint.insert(hint.clone(), id);
            entry.hint = Some(hint);
        }
        debug!(id = %id, path = %path.display(), hint = ?entry.hint, "Entry created");
        self.by_path.insert(path, id);
        self.entries.insert(id, entry);
        Ok(id)
    }

    /// Give `id` a hint from the pool if it has none
    ///
    /// Returns false when the pool is exhausted; the entry then stays
    /// addressable by path only.
    pub fn assign_hint(&mut self, id: EntryId) -> Result<bool> {
        let entry = self.entries.get(&id).ok_or(TreeError::UnknownEntry(id.0))?;
        if entry.hint.is_some() {
            return Ok(true);
        }
        match self.pool.try_take() {
            Ok(hint) => {
                self.by_hint.insert(hint.clone(), id);
                if let Some(entry) = self.entries.get_mut(&id) {
                    entry.hint = Some(hint);
                }
                Ok(true)
            }
            Err(TreeError::HintExhausted) => {
                warn!(path = %entry.path.display(), "Hint pool exhausted; entry left without a hint");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Take a hint from the pool, logging exhaustion
    pub fn take_hint(&mut self) -> Option<Hint> {
        match self.pool.try_take() {
            Ok(hint) => Some(hint),
            Err(_) => {
                warn!("Hint pool exhausted; entry left without a hint");
                None
            }
        }
    }

    /// Drop the hint of `id` (if any) back into the pool
    pub fn release_hint(&mut self, id: EntryId) {
        let Some(entry) = self.entries.get_mut(&id) else {
            return;
        };
        if let Some(hint) = entry.hint.take() {
            self.by_hint.remove(&hint);
            self.pool.give(hint);
        }
    }

    pub fn entry(&self, id: EntryId) -> Option<&Entry> {
        self.entries.get(&id)
    }

    /// Like [`entry`](Self::entry) but with an error for stale ids
    pub fn get(&self, id: EntryId) -> Result<&Entry> {
        self.entries.get(&id).ok_or(TreeError::UnknownEntry(id.0))
    }

    pub(crate) fn get_mut(&mut self, id: EntryId) -> Result<&mut Entry> {
        self.entries.get_mut(&id).ok_or(TreeError::UnknownEntry(id.0))
    }

    pub fn lookup_by_hint(&self, hint: &str) -> Result<EntryId> {
        let hint = Hint::parse(hint);
        self.by_hint
            .get(&hint)
            .copied()
            .ok_or_else(|| TreeError::UnknownHint(hint.to_string()))
    }

    /// Immediate path lookup; see `TreeSynchronizer::lookup_by_path` for the waiting form
    pub fn lookup_path(&self, path: &Path) -> Option<EntryId> {
        self.by_path.get(path).copied()
    }

    pub fn set_state(&mut self, id: EntryId, state: CollapsibleState) -> Result<()> {
        let entry = self.get_mut(id)?;
        if entry.kind.is_dir() {
            entry.state = state;
        }
        Ok(())
    }

    /// Replace the cached child list of `parent` and mark it fresh
    pub(crate) fn set_children(&mut self, parent: EntryId, children: Vec<EntryId>) -> Result<()> {
        let entry = self.get_mut(parent)?;
        entry.children = children;
        entry.listed = true;
        Ok(())
    }

    /// Mark the cached listing of `id` stale so the next expansion re-lists
    pub fn mark_stale(&mut self, id: EntryId) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.listed = false;
        }
    }

    /// Whether every ancestor of `id` below the root is expanded
    ///
    /// Entries under a collapsed directory are not on screen and must not
    /// hold hints.
    pub fn is_shown(&self, id: EntryId) -> bool {
        let mut current = self.entries.get(&id).and_then(|e| e.parent);
        while let Some(ancestor) = current {
            if ancestor == self.root {
                return true;
            }
            match self.entries.get(&ancestor) {
                Some(entry) if entry.state == CollapsibleState::Expanded => current = entry.parent,
                _ => return false,
            }
        }
        self.entries.contains_key(&id)
    }

    /// `id` and all known descendants, parents before children
    pub fn subtree(&self, id: EntryId) -> Vec<EntryId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(entry) = self.entries.get(&current) {
                out.push(current);
                stack.extend(entry.children.iter().rev().copied());
            }
        }
        out
    }

    /// Tear down `id` and its known descendants
    ///
    /// Hard removal (`reclaim_hint = true`) drops the entries from every
    /// index and detaches `id` from its parent. Soft removal keeps the path
    /// registrations and collapsible states and only gives the hints back,
    /// marking directory listings stale so they are re-hinted on the next
    /// expansion. The root entry itself is never hard-removed.
    pub fn remove(&mut self, id: EntryId, reclaim_hint: bool) -> Result<usize> {
        self.get(id)?;
        let subtree = self.subtree(id);

        if !reclaim_hint {
            for &member in &subtree {
                self.release_hint(member);
                self.mark_stale(member);
            }
            return Ok(subtree.len());
        }

        if id == self.root {
            warn!("Refusing to remove the root entry; clearing its children instead");
            let children = self.entries[&id].children.clone();
            let mut removed = 0;
            for child in children {
                removed += self.remove(child, true)?;
            }
            self.mark_stale(id);
            return Ok(removed);
        }

        if let Some(parent) = self.entries[&id].parent {
            if let Some(parent) = self.entries.get_mut(&parent) {
                parent.children.retain(|c| *c != id);
            }
        }
        for &member in &subtree {
            self.release_hint(member);
            if let Some(entry) = self.entries.remove(&member) {
                self.by_path.remove(&entry.path);
            }
        }
        debug!(id = %id, removed = subtree.len(), "Entries torn down");
        Ok(subtree.len())
    }

    /// Discard every entry and allocation and start a new generation
    pub fn reset(&mut self) {
        self.entries.clear();
        self.by_path.clear();
        self.by_hint.clear();
        self.pool.reset();
        self.generation += 1;
        self.register_root();
        info!(generation = self.generation, "Tree session reset");
    }

    pub fn pool(&self) -> &HintPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut HintPool {
        &mut self.pool
    }

    /// Number of live entries, the root included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn live_hint_count(&self) -> usize {
        self.by_hint.len()
    }

    /// Iterate `(hint, entry)` pairs currently allocated
    pub fn hints(&self) -> impl Iterator<Item = (&Hint, EntryId)> {
        self.by_hint.iter().map(|(h, id)| (h, *id))
    }

    /// Verify the index invariants
    ///
    /// Checks the hint bijection, the pool/index partition of the hint
    /// universe, path index consistency and parent/child links. Returns a
    /// description of the first violation found.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        for (hint, id) in &self.by_hint {
            let entry = self
                .entries
                .get(id)
                .ok_or_else(|| format!("hint '{}' maps to dead entry {}", hint, id))?;
            if entry.hint.as_ref() != Some(hint) {
                return Err(format!("hint '{}' maps to {} which holds {:?}", hint, id, entry.hint));
            }
            if self.pool.contains(hint) {
                return Err(format!("hint '{}' is both allocated and pooled", hint));
            }
        }
        for entry in self.entries.values() {
            if let Some(hint) = &entry.hint {
                if self.by_hint.get(hint) != Some(&entry.id) {
                    return Err(format!("{} holds '{}' without an index mapping", entry.id, hint));
                }
            }
            if self.by_path.get(&entry.path) != Some(&entry.id) {
                return Err(format!("{} missing from path index", entry.id));
            }
            for child in &entry.children {
                let child = self
                    .entries
                    .get(child)
                    .ok_or_else(|| format!("{} lists dead child {}", entry.id, child))?;
                if child.parent != Some(entry.id) {
                    return Err(format!("{} does not point back to {}", child.id, entry.id));
                }
            }
        }
        if self.by_path.len() != self.entries.len() {
            return Err("path index and entry store disagree".to_string());
        }
        let total = (self.pool.len() + self.by_hint.len()) as u64;
        if total != self.pool.universe().size() {
            return Err(format!(
                "pool ({}) and index ({}) do not cover the universe ({})",
                self.pool.len(),
                self.by_hint.len(),
                self.pool.universe().size()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> TreeSession {
        TreeSession::new("/ws", HintPool::default())
    }

    fn add(s: &mut TreeSession, path: &str, kind: EntryKind, parent: EntryId) -> EntryId {
        let hint = s.take_hint();
        let id = s.create(PathBuf::from(path), kind, Some(parent), hint).unwrap();
        let mut children = s.entry(parent).unwrap().children.clone();
        children.push(id);
        s.set_children(parent, children).unwrap();
        id
    }

    #[test]
    fn test_create_and_lookup() {
        let mut s = session();
        let root = s.root();
        let id = add(&mut s, "/ws/a.txt", EntryKind::File, root);

        assert_eq!(s.lookup_by_hint("a").unwrap(), id);
        assert_eq!(s.lookup_by_hint("A").unwrap(), id);
        assert_eq!(s.lookup_path(Path::new("/ws/a.txt")), Some(id));
        assert!(s.entry(root).unwrap().hint().is_none());
        s.check_invariants().unwrap();
    }

    #[test]
    fn test_duplicate_path_is_rejected_and_hint_kept_in_pool() {
        let mut s = session();
        let root = s.root();
        add(&mut s, "/ws/a.txt", EntryKind::File, root);
        let pooled = s.pool().len();

        let hint = s.take_hint();
        let err = s
            .create(PathBuf::from("/ws/a.txt"), EntryKind::File, Some(root), hint)
            .unwrap_err();
        assert!(err.is_invariant_violation());
        assert_eq!(s.pool().len(), pooled);
        s.check_invariants().unwrap();
    }

    #[test]
    fn test_unknown_hint() {
        let s = session();
        assert!(matches!(s.lookup_by_hint("zz"), Err(TreeError::UnknownHint(h)) if h == "zz"));
    }

    #[test]
    fn test_hard_remove_recurses_and_detaches() {
        let mut s = session();
        let root = s.root();
        let dir = add(&mut s, "/ws/b", EntryKind::Directory, root);
        add(&mut s, "/ws/b/c.txt", EntryKind::File, dir);
        let pooled = s.pool().len();

        assert_eq!(s.remove(dir, true).unwrap(), 2);
        assert!(s.lookup_path(Path::new("/ws/b/c.txt")).is_none());
        assert!(s.entry(root).unwrap().children().is_empty());
        assert_eq!(s.pool().len(), pooled + 2);
        s.check_invariants().unwrap();
    }

    #[test]
    fn test_soft_remove_keeps_paths() {
        let mut s = session();
        let root = s.root();
        let dir = add(&mut s, "/ws/b", EntryKind::Directory, root);
        let file = add(&mut s, "/ws/b/c.txt", EntryKind::File, dir);
        s.set_state(dir, CollapsibleState::Expanded).unwrap();

        s.remove(dir, false).unwrap();
        assert_eq!(s.live_hint_count(), 0);
        assert_eq!(s.lookup_path(Path::new("/ws/b/c.txt")), Some(file));
        assert_eq!(s.entry(dir).unwrap().state(), CollapsibleState::Expanded);
        assert!(!s.entry(dir).unwrap().is_listed());
        s.check_invariants().unwrap();
    }

    #[test]
    fn test_reset_starts_new_generation() {
        let mut s = session();
        let root = s.root();
        add(&mut s, "/ws/a.txt", EntryKind::File, root);

        s.reset();
        assert_eq!(s.generation(), 1);
        assert_eq!(s.len(), 1);
        assert_ne!(s.root(), root);
        assert!(s.lookup_by_hint("a").is_err());
        assert_eq!(s.pool().len(), 702);
        s.check_invariants().unwrap();
    }

    #[test]
    fn test_root_is_never_removed() {
        let mut s = session();
        let root = s.root();
        add(&mut s, "/ws/a.txt", EntryKind::File, root);
        assert_eq!(s.remove(root, true).unwrap(), 1);
        assert!(s.entry(root).is_some());
        s.check_invariants().unwrap();
    }
}
