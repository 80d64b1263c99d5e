//! Ignore pattern management for hintree
//!
//! Supports multiple sources of ignore patterns:
//! 1. Built-in patterns (.git/, .jj/, editor temp files - always active)
//! 2. .gitignore patterns (optional, enabled by default)
//! 3. .treeignore patterns (explorer-specific, optional)
//! 4. Config-based patterns (gitignore syntax)

use anyhow::{Context, Result};
use async_trait::async_trait;
use hintree_core::VisibilityFilter;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::Match;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Names of the ignore files read from the root
pub const IGNORE_FILES: [&str; 2] = [".gitignore", ".treeignore"];

/// Ignore rule manager
///
/// Precedence, highest first: built-ins, .treeignore (whose `!` lines can
/// re-include what .gitignore hides), .gitignore, additional patterns.
pub struct IgnoreRules {
    root: PathBuf,
    config: IgnoreConfig,
    matchers: RwLock<Matchers>,
}

#[derive(Default)]
struct Matchers {
    gitignore: Option<Gitignore>,
    treeignore: Option<Gitignore>,
    additional: Option<Gitignore>,
}

impl IgnoreRules {
    /// Load ignore rules for the tree rooted at `root`
    pub fn load(root: &Path, config: IgnoreConfig) -> Result<Self> {
        let rules = Self {
            root: root.to_path_buf(),
            config,
            matchers: RwLock::new(Matchers::default()),
        };
        rules.reload()?;
        Ok(rules)
    }

    /// Re-read .gitignore/.treeignore from disk
    pub fn reload(&self) -> Result<()> {
        let gitignore = if self.config.use_gitignore {
            self.build_from_file(".gitignore")?
        } else {
            None
        };
        let treeignore = if self.config.use_treeignore {
            self.build_from_file(".treeignore")?
        } else {
            None
        };
        let additional = if self.config.additional_patterns.is_empty() {
            None
        } else {
            let mut builder = GitignoreBuilder::new(&self.root);
            for pattern in &self.config.additional_patterns {
                builder
                    .add_line(None, pattern)
                    .with_context(|| format!("Invalid ignore pattern: {}", pattern))?;
            }
            Some(builder.build()?)
        };

        *self.matchers.write() = Matchers {
            gitignore,
            treeignore,
            additional,
        };
        debug!(root = %self.root.display(), sources = self.active_sources(), "Ignore rules loaded");
        Ok(())
    }

    fn build_from_file(&self, name: &str) -> Result<Option<Gitignore>> {
        let path = self.root.join(name);
        if !path.exists() {
            return Ok(None);
        }
        let mut builder = GitignoreBuilder::new(&self.root);
        if let Some(err) = builder.add(&path) {
            return Err(err).with_context(|| format!("Failed to parse {}", path.display()));
        }
        Ok(Some(builder.build()?))
    }

    /// Check if `path` (absolute, or relative to the root) should be hidden
    pub fn should_ignore(&self, path: &Path, is_dir: bool) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        if relative.is_absolute() {
            // Outside the tree
            return false;
        }

        if is_builtin_ignored(relative) {
            return true;
        }

        let matchers = self.matchers.read();
        if let Some(ref treeignore) = matchers.treeignore {
            match treeignore.matched_path_or_any_parents(relative, is_dir) {
                Match::Ignore(_) => return true,
                Match::Whitelist(_) => return false,
                Match::None => {}
            }
        }

        if let Some(ref gitignore) = matchers.gitignore {
            if gitignore
                .matched_path_or_any_parents(relative, is_dir)
                .is_ignore()
            {
                return true;
            }
        }

        if let Some(ref additional) = matchers.additional {
            if additional
                .matched_path_or_any_parents(relative, is_dir)
                .is_ignore()
            {
                return true;
            }
        }

        false
    }

    /// Get number of active ignore sources
    pub fn active_sources(&self) -> usize {
        let matchers = self.matchers.read();
        1 + [
            matchers.gitignore.is_some(),
            matchers.treeignore.is_some(),
            matchers.additional.is_some(),
        ]
        .iter()
        .filter(|active| **active)
        .count()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `path` is one of the ignore files this rule set reads
    pub fn is_ignore_file(&self, path: &Path) -> bool {
        path.parent() == Some(self.root.as_path())
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| IGNORE_FILES.contains(&n))
    }
}

#[async_trait]
impl VisibilityFilter for IgnoreRules {
    async fn filter_visible(&self, parent: &Path, names: Vec<String>) -> Result<Vec<String>> {
        let mut visible = Vec::with_capacity(names.len());
        for name in names {
            let path = parent.join(&name);
            let is_dir = tokio::fs::metadata(&path)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false);
            if !self.should_ignore(&path, is_dir) {
                visible.push(name);
            }
        }
        Ok(visible)
    }
}

/// Patterns enforced regardless of configuration
fn is_builtin_ignored(relative: &Path) -> bool {
    if relative
        .components()
        .any(|c| matches!(c.as_os_str().to_str(), Some(".git" | ".jj")))
    {
        return true;
    }

    let filename = relative
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    is_editor_temp(filename)
}

/// Editor swap/backup files and OS metadata files
fn is_editor_temp(filename: &str) -> bool {
    // Vim swap files
    [".swp", ".swo", ".swn", ".swm"]
        .iter()
        .any(|ext| filename.ends_with(ext))
        // Vim/Emacs backups
        || filename.ends_with('~')
        // Emacs auto-save and lock files
        || (filename.len() > 1 && filename.starts_with('#') && filename.ends_with('#'))
        || filename.starts_with(".#")
        || filename == ".DS_Store"
        || filename.starts_with("._")
        || filename == "Thumbs.db"
        || filename == "desktop.ini"
}

/// Ignore configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IgnoreConfig {
    /// Use .gitignore patterns (default: true)
    #[serde(default = "default_true")]
    pub use_gitignore: bool,

    /// Use .treeignore patterns (default: true)
    #[serde(default = "default_true")]
    pub use_treeignore: bool,

    /// Additional gitignore-syntax patterns
    #[serde(default)]
    pub additional_patterns: Vec<String>,
}

impl Default for IgnoreConfig {
    fn default() -> Self {
        Self {
            use_gitignore: true,
            use_treeignore: true,
            additional_patterns: vec![],
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_patterns_always_enforced() {
        let temp_dir = TempDir::new().unwrap();
        let rules = IgnoreRules::load(temp_dir.path(), IgnoreConfig::default()).unwrap();

        assert!(rules.should_ignore(Path::new(".git"), true));
        assert!(rules.should_ignore(Path::new("src/.git/config"), false));
        assert!(rules.should_ignore(Path::new(".jj/op_store"), true));
        assert!(rules.should_ignore(Path::new("main.rs.swp"), false));
        assert!(rules.should_ignore(Path::new("notes.txt~"), false));
        assert!(rules.should_ignore(Path::new("#draft#"), false));
        assert!(rules.should_ignore(Path::new(".DS_Store"), false));

        assert!(!rules.should_ignore(Path::new("src/main.rs"), false));
        assert!(!rules.should_ignore(Path::new("README.md"), false));
        assert!(!rules.should_ignore(Path::new("#"), false));
    }

    #[test]
    fn test_gitignore_parsing() -> Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join(".gitignore"), "*.log\ntarget/\n")?;

        let rules = IgnoreRules::load(
            temp_dir.path(),
            IgnoreConfig {
                use_gitignore: true,
                use_treeignore: false,
                additional_patterns: vec![],
            },
        )?;

        assert!(rules.should_ignore(Path::new("test.log"), false));
        assert!(rules.should_ignore(Path::new("target"), true));
        assert!(rules.should_ignore(Path::new("target/debug/app"), false));
        // Directory-only pattern
        assert!(!rules.should_ignore(Path::new("target"), false));
        assert!(!rules.should_ignore(Path::new("src/main.rs"), false));

        // Absolute paths under the root work too
        assert!(rules.should_ignore(&temp_dir.path().join("sub/x.log"), false));
        Ok(())
    }

    #[test]
    fn test_treeignore_can_reinclude() -> Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join(".gitignore"), "*.log\n")?;
        fs::write(temp_dir.path().join(".treeignore"), "!important.log\nscratch/\n")?;

        let rules = IgnoreRules::load(temp_dir.path(), IgnoreConfig::default())?;

        assert!(rules.should_ignore(Path::new("debug.log"), false));
        assert!(!rules.should_ignore(Path::new("important.log"), false));
        assert!(rules.should_ignore(Path::new("scratch"), true));
        assert_eq!(rules.active_sources(), 3);
        Ok(())
    }

    #[test]
    fn test_additional_patterns() {
        let temp_dir = TempDir::new().unwrap();
        let rules = IgnoreRules::load(
            temp_dir.path(),
            IgnoreConfig {
                use_gitignore: false,
                use_treeignore: false,
                additional_patterns: vec!["*.tmp".to_string(), "build/".to_string()],
            },
        )
        .unwrap();

        assert!(rules.should_ignore(Path::new("file.tmp"), false));
        assert!(rules.should_ignore(Path::new("build"), true));
        assert!(rules.should_ignore(Path::new("build/output.txt"), false));
        assert!(!rules.should_ignore(Path::new("src/main.rs"), false));
        assert_eq!(rules.active_sources(), 2);
    }

    #[test]
    fn test_gitignore_disabled() -> Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join(".gitignore"), "*.log\n")?;

        let rules = IgnoreRules::load(
            temp_dir.path(),
            IgnoreConfig {
                use_gitignore: false,
                use_treeignore: false,
                additional_patterns: vec![],
            },
        )?;

        assert!(!rules.should_ignore(Path::new("test.log"), false));
        assert!(rules.should_ignore(Path::new(".git"), true));
        assert_eq!(rules.active_sources(), 1);
        Ok(())
    }

    #[test]
    fn test_reload_picks_up_new_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let rules = IgnoreRules::load(temp_dir.path(), IgnoreConfig::default())?;
        assert!(!rules.should_ignore(Path::new("test.log"), false));

        fs::write(temp_dir.path().join(".gitignore"), "*.log\n")?;
        assert!(rules.is_ignore_file(&temp_dir.path().join(".gitignore")));
        rules.reload()?;

        assert!(rules.should_ignore(Path::new("test.log"), false));
        Ok(())
    }

    #[tokio::test]
    async fn test_filter_visible_checks_directories() -> Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join(".gitignore"), "out/\n")?;
        fs::create_dir(temp_dir.path().join("out"))?;
        fs::create_dir(temp_dir.path().join("sub"))?;
        fs::write(temp_dir.path().join("sub/out"), b"file named out")?;

        let rules = IgnoreRules::load(temp_dir.path(), IgnoreConfig::default())?;
        let top = rules
            .filter_visible(temp_dir.path(), vec!["out".into(), "sub".into()])
            .await?;
        assert_eq!(top, vec!["sub".to_string()]);

        let nested = rules
            .filter_visible(&temp_dir.path().join("sub"), vec!["out".into()])
            .await?;
        assert_eq!(nested, vec!["out".to_string()]);
        Ok(())
    }
}
