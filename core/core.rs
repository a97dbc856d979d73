pub mod config;
pub mod error;
pub mod exclusion;
pub mod extensions;
pub mod merge;
pub mod selection;
pub mod session;
pub mod tree;

pub use config::{Config, OutputTarget};
pub use error::{AppError, Result};
pub use exclusion::{DEFAULT_IGNORED_FOLDERS, ExclusionMatcher};
pub use extensions::{ExtensionSet, parse_extensions};
pub use merge::{CopyrightStripper, MergeEngine};
pub use selection::{Selection, SelectionEvent};
pub use session::{MergeOutcome, Session};
pub use tree::{
    DirectoryAnnotation, DirectoryNode, FileNode, FileSystemEntry, TreeBuilder, TreeStats,
    build_tree,
};
