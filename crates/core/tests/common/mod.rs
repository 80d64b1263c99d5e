//! Common utilities for integration tests

use hintree_core::testing::FakeFileSystem;
use hintree_core::{EntryId, ExplorerConfig, ShowAll, TreeSynchronizer};
use std::sync::Arc;

pub const ROOT: &str = "/ws";

/// Synchronizer over an in-memory tree rooted at [`ROOT`]
pub struct Workspace {
    pub fs: Arc<FakeFileSystem>,
    pub sync: Arc<TreeSynchronizer>,
}

impl Workspace {
    pub fn new(config: ExplorerConfig) -> Self {
        let fs = Arc::new(FakeFileSystem::new(ROOT));
        let sync = Arc::new(TreeSynchronizer::new(
            ROOT,
            fs.clone(),
            Arc::new(ShowAll),
            config,
        ));
        Self { fs, sync }
    }

    /// Default config but with files and directories interleaved by name
    pub fn by_name() -> Self {
        let mut config = ExplorerConfig::default();
        config.tree.directories_first = false;
        Self::new(config)
    }

    pub fn file(&self, relative: &str) -> &Self {
        self.fs.add_file(format!("{}/{}", ROOT, relative));
        self
    }

    pub fn dir(&self, relative: &str) -> &Self {
        self.fs.add_dir(format!("{}/{}", ROOT, relative));
        self
    }

    pub fn hint(&self, id: EntryId) -> String {
        self.sync
            .hint_of(id)
            .map(|h| h.to_string())
            .unwrap_or_default()
    }

    pub fn hints(&self, ids: &[EntryId]) -> Vec<String> {
        ids.iter().map(|id| self.hint(*id)).collect()
    }

    pub fn names(&self, ids: &[EntryId]) -> Vec<String> {
        ids.iter()
            .map(|id| self.sync.entry(*id).map(|e| e.name()).unwrap_or_default())
            .collect()
    }

    pub fn assert_invariants(&self) {
        if let Err(violation) = self.sync.with_session(|s| s.check_invariants()) {
            panic!("invariant violated: {}", violation);
        }
    }
}
