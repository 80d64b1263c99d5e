//! In-memory collaborators for tests and benchmarks

use crate::entry::EntryKind;
use crate::provider::{FileSystem, VisibilityFilter};
use anyhow::{bail, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A filesystem held in a map of path → kind
pub struct FakeFileSystem {
    nodes: Mutex<BTreeMap<PathBuf, EntryKind>>,
    list_calls: AtomicUsize,
    delay: Mutex<Option<Duration>>,
    trashed: Mutex<Vec<PathBuf>>,
}

impl FakeFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(root.into(), EntryKind::Directory);
        Self {
            nodes: Mutex::new(nodes),
            list_calls: AtomicUsize::new(0),
            delay: Mutex::new(None),
            trashed: Mutex::new(Vec::new()),
        }
    }

    pub fn add_file(&self, path: impl Into<PathBuf>) {
        self.nodes.lock().insert(path.into(), EntryKind::File);
    }

    pub fn add_dir(&self, path: impl Into<PathBuf>) {
        self.nodes.lock().insert(path.into(), EntryKind::Directory);
    }

    /// Remove `path` and everything below it
    pub fn remove_path(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        self.nodes.lock().retain(|p, _| !p.starts_with(path));
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.nodes.lock().contains_key(path.as_ref())
    }

    pub fn kind(&self, path: impl AsRef<Path>) -> Option<EntryKind> {
        self.nodes.lock().get(path.as_ref()).copied()
    }

    /// Number of `list_children` calls so far
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Paths sent to the trash, oldest first
    pub fn trashed(&self) -> Vec<PathBuf> {
        self.trashed.lock().clone()
    }

    /// Make every listing take `delay` (tokio time)
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }
}

#[async_trait]
impl FileSystem for FakeFileSystem {
    async fn list_children(&self, path: &Path) -> Result<Vec<(String, EntryKind)>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let nodes = self.nodes.lock();
        if nodes.get(path) != Some(&EntryKind::Directory) {
            bail!("No such directory: {}", path.display());
        }
        Ok(nodes
            .iter()
            .filter(|(p, _)| p.parent() == Some(path))
            .filter_map(|(p, kind)| {
                p.file_name()
                    .map(|n| (n.to_string_lossy().into_owned(), *kind))
            })
            .collect())
    }

    async fn path_exists(&self, path: &Path) -> Result<bool> {
        Ok(self.contains(path))
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let mut nodes = self.nodes.lock();
        if !nodes.contains_key(from) {
            bail!("No such path: {}", from.display());
        }
        let moved: Vec<(PathBuf, EntryKind)> = nodes
            .iter()
            .filter(|(p, _)| p.starts_with(from))
            .map(|(p, k)| (p.clone(), *k))
            .collect();
        for (old, kind) in moved {
            nodes.remove(&old);
            let suffix = old.strip_prefix(from).unwrap_or(Path::new(""));
            let new = if suffix.as_os_str().is_empty() {
                to.to_path_buf()
            } else {
                to.join(suffix)
            };
            nodes.insert(new, kind);
        }
        Ok(())
    }

    async fn create_file(&self, path: &Path) -> Result<()> {
        let mut nodes = self.nodes.lock();
        if nodes.contains_key(path) {
            bail!("Already exists: {}", path.display());
        }
        nodes.insert(path.to_path_buf(), EntryKind::File);
        Ok(())
    }

    async fn create_dir(&self, path: &Path) -> Result<()> {
        let mut nodes = self.nodes.lock();
        if nodes.contains_key(path) {
            bail!("Already exists: {}", path.display());
        }
        nodes.insert(path.to_path_buf(), EntryKind::Directory);
        Ok(())
    }

    async fn remove(&self, path: &Path) -> Result<()> {
        if !self.contains(path) {
            bail!("No such path: {}", path.display());
        }
        self.remove_path(path);
        Ok(())
    }

    async fn trash(&self, path: &Path) -> Result<()> {
        self.remove(path).await?;
        self.trashed.lock().push(path.to_path_buf());
        Ok(())
    }
}

/// Filter hiding a fixed set of names
pub struct HideNames(Vec<String>);

impl HideNames {
    pub fn new(names: &[&str]) -> Self {
        Self(names.iter().map(|n| n.to_string()).collect())
    }
}

#[async_trait]
impl VisibilityFilter for HideNames {
    async fn filter_visible(&self, _parent: &Path, names: Vec<String>) -> Result<Vec<String>> {
        Ok(names.into_iter().filter(|n| !self.0.contains(n)).collect())
    }
}
