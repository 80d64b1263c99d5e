//! File system collaborators for hintree
//!
//! This crate provides:
//! - `LocalFileSystem`, directory listing and mutations over `tokio::fs`
//! - `IgnoreRules`, .gitignore/.treeignore aware visibility filtering
//! - `Watcher`, recursive change notification with per-path debouncing,
//!   forwarding coalesced changes into a `TreeSynchronizer`

pub mod debounce;
pub mod fs;
pub mod ignore;

pub use crate::fs::LocalFileSystem;
pub use crate::ignore::{IgnoreConfig, IgnoreRules};
pub use debounce::Debouncer;

use hintree_core::{ChangeKind, TreeSynchronizer};
use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher as _};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Capacity of the debounced batch channel
const BATCH_BUFFER: usize = 64;

#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("Watch root does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Failed to watch {}: {source}", .path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error(transparent)]
    Notify(#[from] notify::Error),
}

/// Watcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Quiet period per path before a change is delivered (default: 200ms)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl WatcherConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_debounce_ms() -> u64 {
    debounce::DEFAULT_DEBOUNCE.as_millis() as u64
}

/// File system event after debouncing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    /// Path that changed
    pub path: PathBuf,
    /// Type of change
    pub kind: ChangeKind,
}

/// Recursive watcher on a tree root
///
/// Must be started inside a tokio runtime; the debounce loop runs as a task
/// and stops when the watcher is dropped.
pub struct Watcher {
    root: PathBuf,
    _inner: RecommendedWatcher,
    batches: mpsc::Receiver<Vec<WatchEvent>>,
    task: JoinHandle<()>,
}

impl Watcher {
    /// Start watching `root` recursively
    pub fn start(root: &Path, config: &WatcherConfig) -> Result<Self, WatcherError> {
        if !root.is_dir() {
            return Err(WatcherError::RootNotFound(root.to_path_buf()));
        }

        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let mut inner = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for change in map_event(&event) {
                    // Receiver gone means the watcher is shutting down
                    let _ = raw_tx.send(change);
                }
            }
            Err(e) => warn!(error = %e, "File watcher error"),
        })?;
        inner
            .watch(root, RecursiveMode::Recursive)
            .map_err(|source| WatcherError::Watch {
                path: root.to_path_buf(),
                source,
            })?;

        let (batch_tx, batches) = mpsc::channel(BATCH_BUFFER);
        let task = tokio::spawn(debounce_loop(
            raw_rx,
            batch_tx,
            Debouncer::new(config.debounce()),
        ));

        info!(root = %root.display(), debounce_ms = config.debounce_ms, "Watching for changes");
        Ok(Self {
            root: root.to_path_buf(),
            _inner: inner,
            batches,
            task,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Next batch of debounced changes
    pub async fn recv(&mut self) -> Option<Vec<WatchEvent>> {
        self.batches.recv().await
    }

    /// Feed every change into `sync` until the watcher stops
    ///
    /// A change to one of the ignore files reloads `rules` and re-lists the
    /// whole tree instead.
    pub async fn forward(mut self, sync: Arc<TreeSynchronizer>, rules: Option<Arc<IgnoreRules>>) {
        while let Some(batch) = self.recv().await {
            apply_batch(&sync, rules.as_deref(), batch).await;
        }
    }
}

/// Apply one debounced batch to `sync`
///
/// The tree is re-listed after an ignore-file change even when the rules
/// fail to reload, so the ignore file itself still shows up.
pub async fn apply_batch(sync: &TreeSynchronizer, rules: Option<&IgnoreRules>, batch: Vec<WatchEvent>) {
    debug!(changes = batch.len(), "Applying watched changes");
    let mut reload = false;
    for event in batch {
        if rules.is_some_and(|r| r.is_ignore_file(&event.path)) {
            reload = true;
            continue;
        }
        if let Err(e) = sync.handle_change(&event.path, event.kind).await {
            warn!(path = %event.path.display(), error = %e, "Failed to apply change");
        }
    }

    if let (true, Some(rules)) = (reload, rules) {
        match rules.reload() {
            Ok(()) => info!("Ignore rules changed; refreshing tree"),
            Err(e) => warn!(error = %e, "Failed to reload ignore rules; refreshing tree"),
        }
        if let Err(e) = sync.refresh_all().await {
            warn!(error = %e, "Failed to refresh tree");
        }
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn debounce_loop(
    mut raw: mpsc::UnboundedReceiver<(PathBuf, ChangeKind)>,
    batches: mpsc::Sender<Vec<WatchEvent>>,
    mut debouncer: Debouncer,
) {
    loop {
        let deadline = debouncer.next_deadline();
        tokio::select! {
            change = raw.recv() => match change {
                Some((path, kind)) => debouncer.push(path, kind),
                None => {
                    let rest = debouncer.drain_all();
                    if !rest.is_empty() {
                        let _ = batches.send(into_events(rest)).await;
                    }
                    return;
                }
            },
            _ = sleep_until_some(deadline) => {
                let ready = debouncer.drain_ready(tokio::time::Instant::now());
                if !ready.is_empty() && batches.send(into_events(ready)).await.is_err() {
                    return;
                }
            }
        }
    }
}

async fn sleep_until_some(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn into_events(changes: Vec<(PathBuf, ChangeKind)>) -> Vec<WatchEvent> {
    changes
        .into_iter()
        .map(|(path, kind)| WatchEvent { path, kind })
        .collect()
}

/// Translate a raw notify event into tree changes
pub fn map_event(event: &Event) -> Vec<(PathBuf, ChangeKind)> {
    let all = |kind: ChangeKind| -> Vec<(PathBuf, ChangeKind)> {
        event.paths.iter().map(|p| (p.clone(), kind)).collect()
    };
    match event.kind {
        EventKind::Create(_) => all(ChangeKind::Created),
        EventKind::Remove(_) => all(ChangeKind::Deleted),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => all(ChangeKind::Deleted),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => all(ChangeKind::Created),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if event.paths.len() == 2 => vec![
            (event.paths[0].clone(), ChangeKind::Deleted),
            (event.paths[1].clone(), ChangeKind::Created),
        ],
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .map(|p| {
                // Backends that cannot tell which side of a rename they saw
                let kind = if p.exists() {
                    ChangeKind::Created
                } else {
                    ChangeKind::Deleted
                };
                (p.clone(), kind)
            })
            .collect(),
        EventKind::Modify(_) | EventKind::Any | EventKind::Other => all(ChangeKind::Modified),
        EventKind::Access(_) => Vec::new(),
    }
}
