//! Host operations keyed by hint
//!
//! Every operation resolves its hint arguments before touching anything,
//! so a stale or mistyped hint aborts with `UnknownHint` and no partial
//! mutation. Destination checks likewise run before the filesystem is
//! asked to change.

use crate::entry::{CollapsibleState, EntryId, EntryKind};
use crate::error::{Result, TreeError};
use crate::provider::ChangeKind;
use crate::sync::TreeSynchronizer;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// What the host should do after an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostAction {
    /// Nothing beyond redrawing
    None,
    /// Open the file in an editor
    Open(PathBuf),
    /// Scroll to / select the entry
    Reveal { entry: EntryId, focus: bool },
}

pub struct Explorer {
    sync: Arc<TreeSynchronizer>,
}

impl Explorer {
    pub fn new(sync: Arc<TreeSynchronizer>) -> Self {
        Self { sync }
    }

    pub fn synchronizer(&self) -> &Arc<TreeSynchronizer> {
        &self.sync
    }

    /// Toggle a directory or open a file
    pub async fn toggle_or_open(&self, hint: &str) -> Result<HostAction> {
        let id = self.sync.lookup_by_hint(hint)?;
        let entry = self.sync.entry(id)?;
        match entry.kind() {
            EntryKind::File => Ok(HostAction::Open(entry.path().to_path_buf())),
            EntryKind::Directory => {
                if entry.state() == CollapsibleState::Collapsed {
                    self.sync.expand(id).await?;
                } else {
                    self.sync.collapse(id)?;
                }
                self.sync.notify(Some(id));
                Ok(HostAction::None)
            }
        }
    }

    pub async fn open(&self, hint: &str) -> Result<HostAction> {
        let id = self.sync.lookup_by_hint(hint)?;
        let entry = self.sync.entry(id)?;
        if entry.is_dir() {
            return Err(TreeError::NotAFile(entry.path().to_path_buf()));
        }
        Ok(HostAction::Open(entry.path().to_path_buf()))
    }

    /// Rename an entry within its directory
    pub async fn rename(&self, hint: &str, new_name: &str) -> Result<HostAction> {
        let id = self.sync.lookup_by_hint(hint)?;
        let from = self.sync.entry(id)?.path().to_path_buf();
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Ok(HostAction::None);
        }
        let mut components = Path::new(new_name).components();
        if !matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        ) {
            return Err(TreeError::InvalidName(new_name.to_string()));
        }
        let target = parent_dir(&from).join(new_name);
        self.relocate(&from, &target).await?;
        Ok(HostAction::None)
    }

    /// Move `from` into directory `to`, next to file `to`, or to the root
    pub async fn move_entry(&self, from: &str, to: Option<&str>) -> Result<HostAction> {
        let from_id = self.sync.lookup_by_hint(from)?;
        let to_id = to.map(|t| self.sync.lookup_by_hint(t)).transpose()?;

        let source = self.sync.entry(from_id)?.path().to_path_buf();
        let destination_dir = match to_id {
            None => self.sync.root_path(),
            Some(to_id) => {
                let to_entry = self.sync.entry(to_id)?;
                if to_entry.is_dir() {
                    to_entry.path().to_path_buf()
                } else {
                    parent_dir(to_entry.path())
                }
            }
        };
        let Some(file_name) = source.file_name() else {
            return Err(TreeError::DestinationConflict(destination_dir));
        };
        let target = destination_dir.join(file_name);
        if target.starts_with(&source) {
            // Covers moving onto itself and into its own subtree
            return Err(TreeError::DestinationConflict(target));
        }
        self.relocate(&source, &target).await?;
        Ok(HostAction::None)
    }

    /// Expand a directory down to `level`
    pub async fn expand_to_level(&self, hint: &str, level: usize) -> Result<HostAction> {
        let id = self.sync.lookup_by_hint(hint)?;
        let entry = self.sync.entry(id)?;
        if !entry.is_dir() {
            return Err(TreeError::NotADirectory(entry.path().to_path_buf()));
        }
        self.sync.expand_to_level(id, level).await?;
        self.sync.notify(Some(id));
        Ok(HostAction::None)
    }

    /// Create a file or (with a trailing `/`) a directory
    ///
    /// The new item goes inside the hinted directory, or next to the hinted
    /// file. New files are opened; new directories are shown expanded.
    pub async fn create_child(&self, hint: &str, name: &str) -> Result<HostAction> {
        let id = self.sync.lookup_by_hint(hint)?;
        let entry = self.sync.entry(id)?;
        let (container, container_path) = if entry.is_dir() {
            (id, entry.path().to_path_buf())
        } else {
            let parent = entry.parent().unwrap_or_else(|| self.sync.root());
            (parent, parent_dir(entry.path()))
        };

        let name = name.trim();
        let (name, is_dir) = match name.strip_suffix('/') {
            Some(stripped) => (stripped, true),
            None => (name, false),
        };
        if name.is_empty() {
            return Ok(HostAction::None);
        }
        let target = container_path.join(name);
        if self.sync.fs().path_exists(&target).await? {
            return Err(TreeError::DestinationConflict(target));
        }

        if is_dir {
            self.sync.fs().create_dir(&target).await?;
        } else {
            self.sync.fs().create_file(&target).await?;
        }
        info!(path = %target.display(), is_dir, "Created");

        self.sync.expand(container).await?;
        self.sync.handle_change(&target, ChangeKind::Created).await?;
        if is_dir {
            let created = self.sync.lookup_by_path(&target).await?;
            self.sync.expand(created).await?;
            self.sync.notify(Some(container));
            Ok(HostAction::None)
        } else {
            Ok(HostAction::Open(target))
        }
    }

    /// Delete on disk, then tear the entry down
    ///
    /// Asking the user for confirmation is the host's job.
    pub async fn delete(&self, hint: &str) -> Result<HostAction> {
        let id = self.sync.lookup_by_hint(hint)?;
        let path = self.sync.entry(id)?.path().to_path_buf();
        if self.sync.config().tree.use_trash {
            self.sync.fs().trash(&path).await?;
            info!(path = %path.display(), "Moved to trash");
        } else {
            self.sync.fs().remove(&path).await?;
            info!(path = %path.display(), "Deleted");
        }
        self.sync.handle_change(&path, ChangeKind::Deleted).await?;
        Ok(HostAction::None)
    }

    pub async fn select(&self, hint: &str) -> Result<HostAction> {
        let id = self.sync.lookup_by_hint(hint)?;
        Ok(HostAction::Reveal { entry: id, focus: true })
    }

    /// Collapse the directory containing the hinted entry
    pub async fn close_parent(&self, hint: &str) -> Result<HostAction> {
        let id = self.sync.lookup_by_hint(hint)?;
        let parent = self.sync.get_parent(id).ok_or(TreeError::NoParent)?;
        self.sync.collapse(parent)?;
        self.sync.notify(Some(parent));
        Ok(HostAction::None)
    }

    pub async fn toggle_ignored_visibility(&self) -> Result<HostAction> {
        self.sync.toggle_show_ignored().await?;
        Ok(HostAction::None)
    }

    /// Collapse everything and start a new hint generation
    pub async fn collapse_root(&self) -> Result<HostAction> {
        self.sync.reset();
        Ok(HostAction::None)
    }

    /// Reveal the file currently open in the host's editor
    pub async fn reveal_active(&self, path: &Path) -> Result<HostAction> {
        let id = self.sync.reveal_path(path).await?;
        Ok(HostAction::Reveal { entry: id, focus: true })
    }

    async fn relocate(&self, from: &Path, to: &Path) -> Result<()> {
        if self.sync.fs().path_exists(to).await? {
            return Err(TreeError::DestinationConflict(to.to_path_buf()));
        }
        self.sync.fs().rename(from, to).await?;
        info!(from = %from.display(), to = %to.display(), "Moved");
        self.sync.handle_change(from, ChangeKind::Deleted).await?;
        self.sync.handle_change(to, ChangeKind::Created).await?;
        Ok(())
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExplorerConfig;
    use crate::provider::ShowAll;
    use crate::testing::FakeFileSystem;

    async fn explorer(fs: FakeFileSystem) -> (Arc<FakeFileSystem>, Explorer) {
        explorer_with(fs, ExplorerConfig::default()).await
    }

    async fn explorer_with(fs: FakeFileSystem, config: ExplorerConfig) -> (Arc<FakeFileSystem>, Explorer) {
        let fs = Arc::new(fs);
        let sync = Arc::new(TreeSynchronizer::new("/ws", fs.clone(), Arc::new(ShowAll), config));
        sync.get_children(None).await.unwrap();
        (fs, Explorer::new(sync))
    }

    fn sample() -> FakeFileSystem {
        // Listed as: a (dir, hint a), b (dir, hint b), notes.txt (hint c)
        let fs = FakeFileSystem::new("/ws");
        fs.add_dir("/ws/a");
        fs.add_file("/ws/a/inner.txt");
        fs.add_dir("/ws/b");
        fs.add_file("/ws/notes.txt");
        fs
    }

    #[tokio::test]
    async fn test_toggle_or_open() {
        let (_, ex) = explorer(sample()).await;
        assert_eq!(
            ex.toggle_or_open("c").await.unwrap(),
            HostAction::Open(PathBuf::from("/ws/notes.txt"))
        );

        ex.toggle_or_open("a").await.unwrap();
        let a = ex.synchronizer().lookup_by_hint("a").unwrap();
        assert_eq!(ex.synchronizer().entry(a).unwrap().state(), CollapsibleState::Expanded);
        assert_eq!(ex.synchronizer().hint_of(ex.synchronizer().entry(a).unwrap().children()[0]).unwrap().as_str(), "d");

        ex.toggle_or_open("a").await.unwrap();
        assert_eq!(ex.synchronizer().entry(a).unwrap().state(), CollapsibleState::Collapsed);
    }

    #[tokio::test]
    async fn test_unknown_hint_aborts() {
        let (fs, ex) = explorer(sample()).await;
        assert!(matches!(ex.open("zz").await, Err(TreeError::UnknownHint(_))));
        assert!(matches!(ex.move_entry("c", Some("zz")).await, Err(TreeError::UnknownHint(_))));
        assert!(fs.contains("/ws/notes.txt"));
    }

    #[tokio::test]
    async fn test_open_rejects_directory() {
        let (_, ex) = explorer(sample()).await;
        assert!(matches!(ex.open("a").await, Err(TreeError::NotAFile(_))));
    }

    #[tokio::test]
    async fn test_move_into_directory_and_conflict() {
        let (fs, ex) = explorer(sample()).await;
        ex.move_entry("c", Some("b")).await.unwrap();
        assert!(fs.contains("/ws/b/notes.txt"));
        assert!(matches!(ex.select("c").await, Err(TreeError::UnknownHint(_))));

        fs.add_file("/ws/b/dup.txt");
        fs.add_file("/ws/dup.txt");
        ex.synchronizer().refresh(ex.synchronizer().root()).await.unwrap();
        let dup = ex
            .synchronizer()
            .lookup_by_path(Path::new("/ws/dup.txt"))
            .await
            .unwrap();
        let dup_hint = ex.synchronizer().hint_of(dup).unwrap();
        let err = ex.move_entry(dup_hint.as_str(), Some("b")).await.unwrap_err();
        assert!(matches!(err, TreeError::DestinationConflict(_)));
        assert!(fs.contains("/ws/dup.txt"));
    }

    #[tokio::test]
    async fn test_move_into_itself_is_rejected() {
        let (fs, ex) = explorer(sample()).await;
        let err = ex.move_entry("a", Some("a")).await.unwrap_err();
        assert!(matches!(err, TreeError::DestinationConflict(_)));
        assert!(fs.contains("/ws/a/inner.txt"));
    }

    #[tokio::test]
    async fn test_rename_keeps_siblings() {
        let (fs, ex) = explorer(sample()).await;
        ex.rename("c", "readme.md").await.unwrap();
        assert!(fs.contains("/ws/readme.md"));
        let sync = ex.synchronizer();
        assert_eq!(sync.lookup_by_hint("a").unwrap(), sync.lookup_by_path(Path::new("/ws/a")).await.unwrap());
        let renamed = sync.lookup_by_path(Path::new("/ws/readme.md")).await.unwrap();
        assert!(sync.hint_of(renamed).is_some());
        sync.with_session(|s| s.check_invariants()).unwrap();
    }

    #[tokio::test]
    async fn test_rename_rejects_paths() {
        let (fs, ex) = explorer(sample()).await;
        for name in ["../../x", "a/x.txt", "..", "/etc/x", "./x"] {
            assert!(
                matches!(ex.rename("c", name).await, Err(TreeError::InvalidName(_))),
                "{name}"
            );
        }
        assert!(fs.contains("/ws/notes.txt"));
        assert!(ex.open("c").await.is_ok());
    }

    #[tokio::test]
    async fn test_create_child_file_and_directory() {
        let (fs, ex) = explorer(sample()).await;
        assert_eq!(
            ex.create_child("b", "new.rs").await.unwrap(),
            HostAction::Open(PathBuf::from("/ws/b/new.rs"))
        );
        assert!(fs.contains("/ws/b/new.rs"));

        // Beside a file means in the file's directory
        ex.create_child("c", "sub/").await.unwrap();
        assert!(fs.contains("/ws/sub"));
        let sync = ex.synchronizer();
        let sub = sync.lookup_by_path(Path::new("/ws/sub")).await.unwrap();
        assert_eq!(sync.entry(sub).unwrap().state(), CollapsibleState::Expanded);

        assert!(matches!(
            ex.create_child("b", "new.rs").await,
            Err(TreeError::DestinationConflict(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_reclaims_hint() {
        let (fs, ex) = explorer(sample()).await;
        ex.delete("c").await.unwrap();
        assert!(!fs.contains("/ws/notes.txt"));
        assert_eq!(fs.trashed(), vec![PathBuf::from("/ws/notes.txt")]);
        assert!(matches!(ex.open("c").await, Err(TreeError::UnknownHint(_))));
        ex.synchronizer()
            .with_session(|s| s.check_invariants())
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_without_trash_removes_permanently() {
        let mut config = ExplorerConfig::default();
        config.tree.use_trash = false;
        let (fs, ex) = explorer_with(sample(), config).await;
        ex.delete("a").await.unwrap();
        assert!(!fs.contains("/ws/a/inner.txt"));
        assert!(fs.trashed().is_empty());
        assert!(matches!(ex.open("a").await, Err(TreeError::UnknownHint(_))));
    }

    #[tokio::test]
    async fn test_close_parent() {
        let (_, ex) = explorer(sample()).await;
        ex.toggle_or_open("a").await.unwrap();
        ex.close_parent("d").await.unwrap();
        let a = ex.synchronizer().lookup_by_hint("a").unwrap();
        assert_eq!(ex.synchronizer().entry(a).unwrap().state(), CollapsibleState::Collapsed);
        assert!(matches!(ex.close_parent("a").await, Err(TreeError::NoParent)));
    }

    #[tokio::test]
    async fn test_collapse_root_invalidates_hints() {
        let (_, ex) = explorer(sample()).await;
        ex.toggle_or_open("a").await.unwrap();
        ex.collapse_root().await.unwrap();
        assert!(matches!(ex.open("d").await, Err(TreeError::UnknownHint(_))));
        ex.synchronizer().get_children(None).await.unwrap();
        assert!(ex.open("c").await.is_ok());
    }

    #[tokio::test]
    async fn test_select_and_reveal_active() {
        let (_, ex) = explorer(sample()).await;
        let a = ex.synchronizer().lookup_by_hint("a").unwrap();
        assert_eq!(ex.select("A").await.unwrap(), HostAction::Reveal { entry: a, focus: true });

        let action = ex.reveal_active(Path::new("/ws/a/inner.txt")).await.unwrap();
        let HostAction::Reveal { entry, .. } = action else {
            panic!("expected reveal");
        };
        assert_eq!(ex.synchronizer().entry(entry).unwrap().name(), "inner.txt");
    }
}
