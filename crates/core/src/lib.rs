//! Hintree Core - hint allocation and tree identity for a keyboard-driven file explorer
//!
//! This crate provides:
//! - Short letter hints drawn from a bounded universe (`hint`, `pool`)
//! - A per-tree session holding entries, path and hint indexes (`session`)
//! - Directory-listing synchronization with stable identities (`sync`)
//! - Hint-keyed host operations such as open, move and delete (`explorer`)
//!
//! Filesystem access and ignore filtering are injected through the traits
//! in `provider`; see `hintree-watcher` for the local-disk versions.

pub mod config;
pub mod entry;
pub mod error;
pub mod explorer;
pub mod hint;
pub mod label;
pub mod pool;
pub mod provider;
pub mod session;
pub mod sync;
pub mod view;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-exports
pub use config::{ExplorerConfig, HintConfig, TimingConfig, TreeConfig};
pub use entry::{CollapsibleState, Entry, EntryId, EntryKind};
pub use error::{Result, TreeError};
pub use explorer::{Explorer, HostAction};
pub use hint::{Hint, HintUniverse};
pub use label::{format_hint, LetterStyling};
pub use pool::HintPool;
pub use provider::{ChangeKind, FileSystem, ShowAll, VisibilityFilter};
pub use session::TreeSession;
pub use sync::TreeSynchronizer;
pub use view::{DisplayItem, TreeEvent};
