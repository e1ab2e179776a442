/// A single directory in the arena-allocated tree.
///
/// Directories are stored in a slab (see [`DirArena`](super::arena::DirArena))
/// and refer to each other by [`NodeIndex`]. The parent index is a
/// navigational back-reference used only for upward propagation; ownership
/// runs strictly downward through the `directories` map.
use super::aggregate::DirStats;
use super::file_node::FileNode;
use compact_str::CompactString;
use std::collections::BTreeMap;

/// Lightweight index into the directory arena.
///
/// Uses `u32` to keep nodes small; four billion directories is far beyond
/// any real filesystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    /// Create a new `NodeIndex` from a `usize`.
    #[inline]
    pub fn new(index: usize) -> Self {
        debug_assert!(index <= u32::MAX as usize, "NodeIndex overflow");
        Self(index as u32)
    }

    /// Return the index as a `usize` for slab indexing.
    #[inline]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

/// One directory: its own name, subtree totals, and direct children.
///
/// Files and directories live in separate maps, so a file and a directory
/// may share a name within the same parent. Maps are ordered by name so
/// traversals are deterministic.
#[derive(Debug, Clone)]
pub struct DirNode {
    /// Directory name only. The tree head uses the empty string.
    pub(crate) name: CompactString,

    /// Parent directory. `None` for the head and for detached subtrees.
    pub(crate) parent: Option<NodeIndex>,

    /// Totals for the entire subtree below this directory.
    pub(crate) stats: DirStats,

    pub(crate) directories: BTreeMap<CompactString, NodeIndex>,
    pub(crate) files: BTreeMap<CompactString, FileNode>,
}

impl DirNode {
    pub(crate) fn new(name: CompactString, parent: Option<NodeIndex>) -> Self {
        Self {
            name,
            parent,
            stats: DirStats::default(),
            directories: BTreeMap::new(),
            files: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    pub fn stats(&self) -> DirStats {
        self.stats
    }

    /// Total bytes of every file in the subtree.
    #[inline]
    pub fn size(&self) -> u64 {
        self.stats.size
    }

    /// Number of files anywhere in the subtree.
    #[inline]
    pub fn file_count(&self) -> u64 {
        self.stats.file_count
    }

    /// Number of directories below this one (itself excluded).
    #[inline]
    pub fn dir_count(&self) -> u64 {
        self.stats.dir_count
    }

    pub fn file(&self, name: &str) -> Option<&FileNode> {
        self.files.get(name)
    }

    pub fn directory(&self, name: &str) -> Option<NodeIndex> {
        self.directories.get(name).copied()
    }

    pub fn has_directory(&self, name: &str) -> bool {
        self.directories.contains_key(name)
    }

    pub fn has_directories(&self) -> bool {
        !self.directories.is_empty()
    }

    /// Direct child file count.
    pub fn num_files(&self) -> usize {
        self.files.len()
    }

    /// Direct child directory count.
    pub fn num_directories(&self) -> usize {
        self.directories.len()
    }

    pub fn files(&self) -> impl Iterator<Item = &FileNode> {
        self.files.values()
    }

    /// Child directories as `(name, index)` pairs, ordered by name.
    pub fn directories(&self) -> impl Iterator<Item = (&str, NodeIndex)> {
        self.directories.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
