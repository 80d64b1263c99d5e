//! On-disk trees for CLI tests

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary directory tree, removed on drop
pub struct TestTree {
    _temp: TempDir,
    root: PathBuf,
}

impl TestTree {
    pub fn new() -> Result<Self> {
        let temp = TempDir::new()?;
        let root = temp.path().canonicalize()?;
        Ok(Self { _temp: temp, root })
    }

    /// Small project: src/{lib.rs, main.rs}, docs/, README.md, an ignored log
    pub fn project() -> Result<Self> {
        let tree = Self::new()?;
        tree.dir("src")?
            .file("src/lib.rs")?
            .file("src/main.rs")?
            .dir("docs")?
            .file("README.md")?;
        fs::write(tree.root.join(".gitignore"), "*.log\n")?;
        tree.file("debug.log")?;
        Ok(tree)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn file(&self, relative: &str) -> Result<&Self> {
        fs::write(self.root.join(relative), "")?;
        Ok(self)
    }

    pub fn dir(&self, relative: &str) -> Result<&Self> {
        fs::create_dir_all(self.root.join(relative))?;
        Ok(self)
    }
}
