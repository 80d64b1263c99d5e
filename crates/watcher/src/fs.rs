//! Local-disk filesystem collaborator

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use hintree_core::{EntryKind, FileSystem};
use std::path::Path;
use tokio::fs;
use tracing::{debug, warn};

/// [`FileSystem`] backed by `tokio::fs`
///
/// Symlinks are followed; a link whose target cannot be read is skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileSystem for LocalFileSystem {
    async fn list_children(&self, path: &Path) -> Result<Vec<(String, EntryKind)>> {
        let mut dir = fs::read_dir(path)
            .await
            .with_context(|| format!("Failed to read directory {}", path.display()))?;

        let mut children = Vec::new();
        while let Some(item) = dir.next_entry().await? {
            let name = item.file_name().to_string_lossy().into_owned();
            let kind = match fs::metadata(item.path()).await {
                Ok(meta) if meta.is_dir() => EntryKind::Directory,
                Ok(_) => EntryKind::File,
                Err(e) => {
                    warn!(path = %item.path().display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            children.push((name, kind));
        }
        debug!(path = %path.display(), count = children.len(), "Listed directory");
        Ok(children)
    }

    async fn path_exists(&self, path: &Path) -> Result<bool> {
        // symlink_metadata so a dangling link still counts as taken
        match fs::symlink_metadata(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to stat {}", path.display())),
        }
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        fs::rename(from, to)
            .await
            .with_context(|| format!("Failed to move {} to {}", from.display(), to.display()))
    }

    async fn create_file(&self, path: &Path) -> Result<()> {
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
            .with_context(|| format!("Failed to create file {}", path.display()))?;
        Ok(())
    }

    async fn create_dir(&self, path: &Path) -> Result<()> {
        if self.path_exists(path).await? {
            bail!("Path already exists: {}", path.display());
        }
        fs::create_dir_all(path)
            .await
            .with_context(|| format!("Failed to create directory {}", path.display()))
    }

    async fn remove(&self, path: &Path) -> Result<()> {
        let meta = fs::symlink_metadata(path)
            .await
            .with_context(|| format!("Failed to stat {}", path.display()))?;
        let removed = if meta.is_dir() {
            fs::remove_dir_all(path).await
        } else {
            fs::remove_file(path).await
        };
        removed.with_context(|| format!("Failed to delete {}", path.display()))
    }

    async fn trash(&self, path: &Path) -> Result<()> {
        let target = path.to_path_buf();
        tokio::task::spawn_blocking(move || trash::delete(&target))
            .await
            .context("Trash task failed")?
            .with_context(|| format!("Failed to move {} to the trash", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as stdfs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_list_children_reports_kinds() -> Result<()> {
        let temp_dir = TempDir::new()?;
        stdfs::create_dir(temp_dir.path().join("src"))?;
        stdfs::write(temp_dir.path().join("Cargo.toml"), b"[package]")?;

        let mut children = LocalFileSystem.list_children(temp_dir.path()).await?;
        children.sort();
        assert_eq!(
            children,
            vec![
                ("Cargo.toml".to_string(), EntryKind::File),
                ("src".to_string(), EntryKind::Directory),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_create_and_remove() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let fs = LocalFileSystem::new();
        let file = temp_dir.path().join("new.txt");
        let dir = temp_dir.path().join("nested/dir");

        fs.create_file(&file).await?;
        assert!(fs.create_file(&file).await.is_err());
        fs.create_dir(&dir).await?;
        assert!(fs.path_exists(&dir).await?);

        fs.remove(&temp_dir.path().join("nested")).await?;
        fs.remove(&file).await?;
        assert!(!fs.path_exists(&dir).await?);
        assert!(!fs.path_exists(&file).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_rename_moves_directory() -> Result<()> {
        let temp_dir = TempDir::new()?;
        stdfs::create_dir(temp_dir.path().join("a"))?;
        stdfs::write(temp_dir.path().join("a/inner.txt"), b"x")?;

        LocalFileSystem
            .rename(&temp_dir.path().join("a"), &temp_dir.path().join("b"))
            .await?;
        assert!(temp_dir.path().join("b/inner.txt").exists());
        Ok(())
    }
}
