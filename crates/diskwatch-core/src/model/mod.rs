/// Data model for the DiskWatch directory tree.
///
/// Re-exports the arena-allocated tree, its path keys, and the aggregate
/// statistics every directory carries.
pub mod aggregate;
pub mod arena;
pub mod dir_node;
pub mod dir_tree;
pub mod file_node;
pub mod path;

pub use aggregate::{DirStats, StatsDelta};
pub use arena::DirArena;
pub use dir_node::{DirNode, NodeIndex};
pub use dir_tree::DirectoryTree;
pub use file_node::{FileInfo, FileNode};
pub use path::NormalizedPath;
