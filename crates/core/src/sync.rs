//! Tree synchronization
//!
//! `TreeSynchronizer` owns the session behind a mutex and drives it from
//! directory listings. Listing and filtering are awaited with the lock
//! released; the resulting diff is applied in one critical section, so a
//! directory's children are always replaced atomically.
//!
//! Diffing rule: a listed child whose path is already registered keeps its
//! entry (same id, same hint, same collapsible state). Only new paths take
//! hints from the pool and only vanished paths give theirs back.

use crate::config::ExplorerConfig;
use crate::entry::{CollapsibleState, Entry, EntryId, EntryKind};
use crate::error::{Result, TreeError};
use crate::hint::Hint;
use crate::pool::HintPool;
use crate::provider::{ChangeKind, FileSystem, VisibilityFilter};
use crate::session::TreeSession;
use crate::view::{DisplayItem, TreeEvent};
use ahash::AHashSet;
use anyhow::Context;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Notify};
use tokio::time::Instant;
use tracing::{debug, info, warn};

const EVENT_BUFFER: usize = 256;

pub struct TreeSynchronizer {
    session: Mutex<TreeSession>,
    fs: Arc<dyn FileSystem>,
    filter: Arc<dyn VisibilityFilter>,
    config: ExplorerConfig,
    show_ignored: AtomicBool,
    /// Woken whenever entries are registered or the session is reset
    registered: Notify,
    events: broadcast::Sender<TreeEvent>,
}

impl TreeSynchronizer {
    pub fn new(
        root: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
        filter: Arc<dyn VisibilityFilter>,
        config: ExplorerConfig,
    ) -> Self {
        let pool = HintPool::new(config.hints.universe(), config.timing.pool_resort_cooldown());
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            session: Mutex::new(TreeSession::new(root, pool)),
            fs,
            filter,
            show_ignored: AtomicBool::new(config.tree.show_ignored),
            config,
            registered: Notify::new(),
            events,
        }
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    /// Read access to the session
    pub fn with_session<R>(&self, f: impl FnOnce(&TreeSession) -> R) -> R {
        f(&self.session.lock())
    }

    pub fn root(&self) -> EntryId {
        self.session.lock().root()
    }

    pub fn root_path(&self) -> PathBuf {
        self.session.lock().root_path().to_path_buf()
    }

    /// Snapshot of a live entry
    pub fn entry(&self, id: EntryId) -> Result<Entry> {
        self.session.lock().get(id).cloned()
    }

    pub fn lookup_by_hint(&self, hint: &str) -> Result<EntryId> {
        self.session.lock().lookup_by_hint(hint)
    }

    /// Resolve a path, waiting for an in-flight expansion to register it
    ///
    /// Resolves to `NotFound` once the configured timeout passes, or at
    /// once if the tree is reset while waiting.
    pub async fn lookup_by_path(&self, path: &Path) -> Result<EntryId> {
        let deadline = Instant::now() + self.config.timing.lookup_timeout();
        let generation = self.session.lock().generation();

        loop {
            let notified = self.registered.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let session = self.session.lock();
                if session.generation() != generation {
                    return Err(TreeError::NotFound(path.to_path_buf()));
                }
                if let Some(id) = session.lookup_path(path) {
                    return Ok(id);
                }
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = tokio::time::sleep_until(deadline) => {
                    debug!(path = %path.display(), "Path lookup timed out");
                    return Err(TreeError::NotFound(path.to_path_buf()));
                }
            }
        }
    }

    /// Expand a directory, returning its children in display order
    ///
    /// An expanded directory with a fresh listing returns its cached
    /// children without touching the filesystem.
    pub async fn expand(&self, id: EntryId) -> Result<Vec<EntryId>> {
        let (path, generation) = {
            let session = self.session.lock();
            let entry = session.get(id)?;
            if !entry.is_dir() {
                return Err(TreeError::NotADirectory(entry.path.clone()));
            }
            if entry.state == CollapsibleState::Expanded && entry.listed {
                return Ok(entry.children.clone());
            }
            (entry.path.clone(), session.generation())
        };

        let listing = self.list_visible(&path).await?;

        let children = {
            let mut session = self.session.lock();
            if session.generation() != generation || session.entry(id).is_none() {
                debug!(path = %path.display(), "Dropping listing for an entry torn down meanwhile");
                return Err(TreeError::UnknownEntry(id.get()));
            }
            let children = apply_listing(&mut session, id, &path, listing)?;
            session.set_state(id, CollapsibleState::Expanded)?;
            children
        };
        self.registered.notify_waiters();
        Ok(children)
    }

    /// Collapse a directory
    ///
    /// Past the soft-collapse threshold every descendant gives its hint
    /// back while keeping its path registration and collapsible state.
    pub fn collapse(&self, id: EntryId) -> Result<()> {
        let mut session = self.session.lock();
        let entry = session.get(id)?;
        if !entry.is_dir() {
            return Err(TreeError::NotADirectory(entry.path.clone()));
        }
        let children = entry.children.clone();
        session.set_state(id, CollapsibleState::Collapsed)?;

        if children.len() > self.config.tree.soft_collapse_threshold {
            let mut released = 0;
            for child in children {
                released += session.remove(child, false)?;
            }
            session.mark_stale(id);
            debug!(id = %id, released, "Soft collapse released subtree hints");
        }
        Ok(())
    }

    /// Collapse `id` and every known directory below it
    pub fn collapse_subtree(&self, id: EntryId) -> Result<()> {
        let dirs: Vec<EntryId> = self.with_session(|s| {
            s.subtree(id)
                .into_iter()
                .filter(|d| s.entry(*d).is_some_and(|e| e.is_dir()))
                .collect()
        });
        for dir in dirs.into_iter().rev() {
            self.collapse(dir)?;
        }
        Ok(())
    }

    /// Expand `id`; descendant directories shallower than `level` are
    /// expanded too, deeper ones collapsed (direct children have depth 0)
    pub async fn expand_to_level(&self, id: EntryId, level: usize) -> Result<()> {
        self.expand(id).await?;
        let mut frontier = vec![(id, 0usize)];
        while let Some((dir, depth)) = frontier.pop() {
            let children = self.entry(dir)?.children;
            for child in children {
                if !self.entry(child)?.is_dir() {
                    continue;
                }
                if depth < level {
                    self.expand(child).await?;
                    frontier.push((child, depth + 1));
                } else {
                    self.collapse_subtree(child)?;
                }
            }
        }
        Ok(())
    }

    /// Re-list `id` if it is expanded and on screen, otherwise mark its
    /// listing stale
    ///
    /// A directory under a collapsed ancestor keeps its state but is only
    /// re-listed once that ancestor is expanded again.
    pub async fn refresh(&self, id: EntryId) -> Result<()> {
        let expanded = {
            let mut session = self.session.lock();
            let entry = session.get(id)?;
            if !entry.is_dir() {
                return Ok(());
            }
            let expanded = entry.state == CollapsibleState::Expanded && session.is_shown(id);
            session.mark_stale(id);
            expanded
        };
        if expanded {
            self.expand(id).await?;
        }
        Ok(())
    }

    /// Re-list every expanded directory on screen, top-down
    pub async fn refresh_all(&self) -> Result<()> {
        let root = self.root();
        self.refresh(root).await?;
        let expanded: Vec<EntryId> = self.with_session(|s| {
            s.subtree(root)
                .into_iter()
                .filter(|id| *id != root)
                .filter(|id| s.entry(*id).is_some_and(|e| e.state == CollapsibleState::Expanded))
                .filter(|id| s.is_shown(*id))
                .collect()
        });
        for id in expanded {
            match self.refresh(id).await {
                // Vanished while a parent was being re-listed
                Err(TreeError::UnknownEntry(_)) => continue,
                other => other?,
            }
        }
        self.notify(None);
        Ok(())
    }

    /// React to an external filesystem change
    pub async fn handle_change(&self, path: &Path, kind: ChangeKind) -> Result<()> {
        debug!(path = %path.display(), ?kind, "Filesystem change");
        match kind {
            ChangeKind::Deleted => {
                let parent = {
                    let mut session = self.session.lock();
                    let Some(id) = session.lookup_path(path) else {
                        return Ok(());
                    };
                    if id == session.root() {
                        warn!(path = %path.display(), "Workspace root deleted");
                    }
                    let parent = session.get(id)?.parent;
                    session.remove(id, true)?;
                    parent
                };
                self.notify(parent);
            }
            ChangeKind::Created => {
                let Some(parent_path) = path.parent() else {
                    return Ok(());
                };
                let parent = self.session.lock().lookup_path(parent_path);
                if let Some(parent) = parent {
                    self.refresh(parent).await?;
                    self.notify(Some(parent));
                }
            }
            ChangeKind::Modified => {
                let id = self.session.lock().lookup_path(path);
                if let Some(id) = id {
                    self.refresh(id).await?;
                    self.notify(Some(id));
                }
            }
        }
        Ok(())
    }

    /// Root reset: discard every entry and hint and start a new generation
    pub fn reset(&self) {
        self.session.lock().reset();
        self.registered.notify_waiters();
        self.notify(None);
    }

    /// Flip ignored-file visibility and re-list everything shown
    pub async fn toggle_show_ignored(&self) -> Result<bool> {
        let show = !self.show_ignored.fetch_xor(true, Ordering::SeqCst);
        info!(show_ignored = show, "Toggled ignored file visibility");
        self.refresh_all().await?;
        Ok(show)
    }

    pub fn show_ignored(&self) -> bool {
        self.show_ignored.load(Ordering::SeqCst)
    }

    /// Children for the host tree view; `None` asks for the top level
    ///
    /// The top level is always listed; other directories only while expanded.
    pub async fn get_children(&self, parent: Option<EntryId>) -> Result<Vec<EntryId>> {
        let root = self.root();
        let id = parent.unwrap_or(root);
        if id == root {
            return self.expand(root).await;
        }
        let state = self.entry(id)?.state;
        match state {
            CollapsibleState::Expanded => self.expand(id).await,
            CollapsibleState::Collapsed | CollapsibleState::Leaf => Ok(Vec::new()),
        }
    }

    /// Parent for the host tree view; top-level entries have none
    pub fn get_parent(&self, id: EntryId) -> Option<EntryId> {
        let session = self.session.lock();
        session
            .entry(id)
            .and_then(|e| e.parent)
            .filter(|p| *p != session.root())
    }

    pub fn display_item(&self, id: EntryId) -> Result<DisplayItem> {
        let session = self.session.lock();
        let entry = session.get(id)?;
        Ok(DisplayItem::for_entry(entry, self.config.hints.letter_styling))
    }

    /// The host expanded a node itself (mouse click)
    pub async fn host_expanded(&self, id: EntryId) -> Result<()> {
        self.expand(id).await.map(|_| ())
    }

    /// The host collapsed a node itself
    pub fn host_collapsed(&self, id: EntryId) -> Result<()> {
        self.collapse(id)
    }

    /// Ask the host to redraw `id` without changing its identity
    pub fn invalidate_display(&self, id: EntryId) {
        self.notify(Some(id));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TreeEvent> {
        self.events.subscribe()
    }

    pub(crate) fn notify(&self, id: Option<EntryId>) {
        let root = self.root();
        let target = id.filter(|i| *i != root);
        // No receivers is fine
        let _ = self.events.send(TreeEvent::Changed(target));
    }

    /// Expand every ancestor of `path` from the root down and resolve it
    pub async fn reveal_path(&self, path: &Path) -> Result<EntryId> {
        let root_path = self.root_path();
        let relative = path
            .strip_prefix(&root_path)
            .map_err(|_| TreeError::OutsideRoot(path.to_path_buf()))?;
        let components: Vec<_> = relative.components().collect();
        if components.is_empty() {
            return Err(TreeError::OutsideRoot(path.to_path_buf()));
        }

        let mut current = root_path;
        self.expand(self.root()).await?;
        for component in &components[..components.len() - 1] {
            current.push(component);
            let id = self.lookup_by_path(&current).await?;
            self.expand(id).await?;
        }
        let id = self.lookup_by_path(path).await?;
        self.notify(None);
        Ok(id)
    }

    /// Hint currently held by `id`
    pub fn hint_of(&self, id: EntryId) -> Option<Hint> {
        self.session.lock().entry(id).and_then(|e| e.hint.clone())
    }

    pub fn path_of(&self, id: EntryId) -> Option<PathBuf> {
        self.session.lock().entry(id).map(|e| e.path.clone())
    }

    /// Hints currently available for allocation
    pub fn pool_len(&self) -> usize {
        self.session.lock().pool().len()
    }

    async fn list_visible(&self, path: &Path) -> Result<Vec<(String, EntryKind)>> {
        let raw = self
            .fs
            .list_children(path)
            .await
            .with_context(|| format!("Failed to list {}", path.display()))?;

        let hidden = &self.config.tree.always_hidden;
        let mut listing: Vec<(String, EntryKind)> = raw
            .into_iter()
            .filter(|(name, _)| !hidden.iter().any(|h| h == name))
            .collect();

        if !self.show_ignored() {
            let names = listing.iter().map(|(n, _)| n.clone()).collect();
            let visible: AHashSet<String> = self
                .filter
                .filter_visible(path, names)
                .await
                .with_context(|| format!("Failed to filter {}", path.display()))?
                .into_iter()
                .collect();
            listing.retain(|(name, _)| visible.contains(name));
        }

        let directories_first = self.config.tree.directories_first;
        listing.sort_by(|(a, a_kind), (b, b_kind)| {
            let by_kind = if directories_first {
                b_kind.is_dir().cmp(&a_kind.is_dir())
            } else {
                std::cmp::Ordering::Equal
            };
            by_kind
                .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
                .then_with(|| a.cmp(b))
        });
        Ok(listing)
    }
}

/// Diff a fresh listing of `parent` against what the session knows
fn apply_listing(
    session: &mut TreeSession,
    parent: EntryId,
    parent_path: &Path,
    listing: Vec<(String, EntryKind)>,
) -> Result<Vec<EntryId>> {
    let previous = session.get(parent)?.children.clone();
    let mut children = Vec::with_capacity(listing.len());
    let mut created = 0usize;

    for (name, kind) in listing {
        let path = parent_path.join(&name);
        let existing = match session.lookup_path(&path) {
            Some(id) => Some((id, session.get(id)?.kind)),
            None => None,
        };
        let id = match existing {
            Some((id, known)) if known == kind => {
                // Soft-collapsed entries come back without a hint
                session.assign_hint(id)?;
                id
            }
            Some((id, _)) => {
                debug!(path = %path.display(), "Entry changed kind; recreating");
                session.remove(id, true)?;
                created += 1;
                let hint = session.take_hint();
                session.create(path, kind, Some(parent), hint)?
            }
            None => {
                created += 1;
                let hint = session.take_hint();
                session.create(path, kind, Some(parent), hint)?
            }
        };
        children.push(id);
    }

    let kept: AHashSet<EntryId> = children.iter().copied().collect();
    let mut vanished = 0usize;
    for old in previous {
        if !kept.contains(&old) && session.entry(old).is_some() {
            session.remove(old, true)?;
            vanished += 1;
        }
    }

    debug!(
        parent = %parent_path.display(),
        children = children.len(),
        created,
        vanished,
        "Applied listing"
    );
    session.set_children(parent, children.clone())?;
    Ok(children)
}
