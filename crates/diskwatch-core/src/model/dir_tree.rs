/// Path-keyed directory tree with incrementally maintained totals.
///
/// Wraps a [`DirArena`] and a fixed root path. Absolute paths are checked
/// against the root, stripped of it, and resolved segment by segment from the
/// head directory. Paths under a different root are rejected with `None`
/// rather than routed somewhere wrong.
use super::aggregate::DirStats;
use super::arena::DirArena;
use super::dir_node::{DirNode, NodeIndex};
use super::file_node::{FileInfo, FileNode};
use super::path::NormalizedPath;
use crate::error::ConsistencyError;

#[derive(Debug, Clone)]
pub struct DirectoryTree {
    arena: DirArena,
    head: NodeIndex,
    root_path: NormalizedPath,
}

impl DirectoryTree {
    pub fn new(root_path: NormalizedPath) -> Self {
        let mut arena = DirArena::new();
        let head = arena.new_detached("");
        Self {
            arena,
            head,
            root_path,
        }
    }

    pub fn root_path(&self) -> &NormalizedPath {
        &self.root_path
    }

    /// Index of the head directory, which stands for the root path itself.
    #[inline]
    pub fn head(&self) -> NodeIndex {
        self.head
    }

    #[inline]
    pub fn head_node(&self) -> &DirNode {
        self.arena.node(self.head)
    }

    /// Totals for the whole scanned subtree.
    pub fn stats(&self) -> DirStats {
        self.head_node().stats()
    }

    /// The directory at `index`, attached or detached. `None` once released.
    #[inline]
    pub fn node(&self, index: NodeIndex) -> Option<&DirNode> {
        self.arena.get(index)
    }

    pub fn arena(&self) -> &DirArena {
        &self.arena
    }

    /// Create a parentless directory to fill with
    /// [`add_file_at`](DirectoryTree::add_file_at) /
    /// [`add_directory_at`](DirectoryTree::add_directory_at) and attach later
    /// with [`set_directory`](DirectoryTree::set_directory).
    pub fn new_detached(&mut self, name: &str) -> NodeIndex {
        self.arena.new_detached(name)
    }

    /// Add an empty child to the directory at `dir` (idempotent).
    ///
    /// `None` for a released index or an empty name.
    pub fn add_directory_at(&mut self, dir: NodeIndex, name: &str) -> Option<NodeIndex> {
        if name.is_empty() {
            return None;
        }
        self.arena.get(dir)?;
        Some(self.arena.add_empty_directory(dir, name))
    }

    /// Insert-if-absent a file into the directory at `dir`.
    ///
    /// `None` for a released index or an empty name.
    pub fn add_file_at(&mut self, dir: NodeIndex, name: &str, info: FileInfo) -> Option<&FileNode> {
        if name.is_empty() {
            return None;
        }
        self.arena.get(dir)?;
        Some(self.arena.add_file(dir, name, info))
    }

    pub fn has_same_root(&self, path: &NormalizedPath) -> bool {
        path.starts_with(&self.root_path)
    }

    /// `path` relative to the root, or `None` for a foreign path.
    pub fn relative(&self, path: &NormalizedPath) -> Option<NormalizedPath> {
        self.has_same_root(path)
            .then(|| path.remove_root(&self.root_path))
    }

    /// Make sure every directory along `path` exists and return the last one.
    pub fn add_empty_directory(&mut self, path: &NormalizedPath) -> Option<NodeIndex> {
        let relative = self.relative(path)?;
        Some(self.create_directory_chain(relative.segments().iter().map(|s| s.as_str())))
    }

    /// Insert a file, creating missing intermediate directories.
    ///
    /// Insert-if-absent: an existing file keeps its data and is returned.
    pub fn add_file(&mut self, path: &NormalizedPath, info: FileInfo) -> Option<&FileNode> {
        let relative = self.relative(path)?;
        let (name, dirs) = relative.segments().split_last()?;
        let dir = self.create_directory_chain(dirs.iter().map(|s| s.as_str()));
        Some(self.arena.add_file(dir, name, info))
    }

    /// Replace an existing file's data.
    ///
    /// `None` when the file is unknown or `info` equals the stored data, so
    /// callers can skip redundant downstream work. The size delta propagates
    /// from the file's own directory upward.
    pub fn update_file(&mut self, path: &NormalizedPath, info: FileInfo) -> Option<&FileNode> {
        let (dir, name) = self.locate_parent(path)?;
        self.arena.update_file(dir, &name, info)
    }

    /// Detach the directory at `path`. The returned subtree stays readable
    /// until passed to [`release`](DirectoryTree::release).
    pub fn remove_directory(&mut self, path: &NormalizedPath) -> Option<NodeIndex> {
        let (dir, name) = self.locate_parent(path)?;
        self.arena.remove_directory(dir, &name)
    }

    pub fn remove_file(&mut self, path: &NormalizedPath) -> Option<FileNode> {
        let (dir, name) = self.locate_parent(path)?;
        self.arena.remove_file(dir, &name)
    }

    /// Free a subtree returned by [`remove_directory`](DirectoryTree::remove_directory).
    pub fn release(&mut self, index: NodeIndex) -> bool {
        index != self.head && self.arena.release(index)
    }

    /// Attach a detached directory at `path`, replacing any directory there.
    ///
    /// The parent chain is created on demand. `Ok(None)` for a foreign path
    /// or the root itself.
    pub fn set_directory(
        &mut self,
        path: &NormalizedPath,
        new: NodeIndex,
    ) -> Result<Option<NodeIndex>, ConsistencyError> {
        let Some(relative) = self.relative(path) else {
            return Ok(None);
        };
        let Some((name, dirs)) = relative.segments().split_last() else {
            return Ok(None);
        };
        // Validate before creating any intermediate directory.
        self.check_attachable(name, new)?;
        let dir = self.create_directory_chain(dirs.iter().map(|s| s.as_str()));
        self.arena.set_directory(dir, name, new).map(Some)
    }

    /// Resolve `path` to a directory, walking from the head. The root path
    /// resolves to the head.
    pub fn find_directory(&self, path: &NormalizedPath) -> Option<NodeIndex> {
        let relative = self.relative(path)?;
        self.walk(relative.segments().iter().map(|s| s.as_str()))
    }

    /// Resolve the directory that would contain `path`.
    ///
    /// `None` for the root path itself, which has no parent inside the tree.
    pub fn find_parent_directory(&self, path: &NormalizedPath) -> Option<NodeIndex> {
        self.locate_parent(path).map(|(dir, _)| dir)
    }

    pub fn find_file(&self, path: &NormalizedPath) -> Option<&FileNode> {
        let (dir, name) = self.locate_parent(path)?;
        self.arena.node(dir).file(&name)
    }

    /// Every file in the tree, child directories before a directory's own
    /// files.
    pub fn files(&self) -> Vec<&FileInfo> {
        self.arena.files_in_order(self.head)
    }

    fn check_attachable(&self, name: &str, new: NodeIndex) -> Result<(), ConsistencyError> {
        let node = self
            .arena
            .get(new)
            .ok_or(ConsistencyError::StaleIndex(new))?;
        if node.name() != name {
            return Err(ConsistencyError::NameMismatch {
                expected: name.to_owned(),
                found: node.name().to_owned(),
            });
        }
        if node.parent().is_some() || new == self.head {
            return Err(ConsistencyError::AlreadyAttached(new));
        }
        Ok(())
    }

    /// Parent directory index plus final segment for `path`.
    fn locate_parent(&self, path: &NormalizedPath) -> Option<(NodeIndex, String)> {
        let relative = self.relative(path)?;
        let (name, dirs) = relative.segments().split_last()?;
        let dir = self.walk(dirs.iter().map(|s| s.as_str()))?;
        Some((dir, name.to_string()))
    }

    fn walk<'a>(&self, segments: impl Iterator<Item = &'a str>) -> Option<NodeIndex> {
        let mut current = self.head;
        for seg in segments {
            current = self.arena.node(current).directory(seg)?;
        }
        Some(current)
    }

    fn create_directory_chain<'a>(&mut self, segments: impl Iterator<Item = &'a str>) -> NodeIndex {
        let mut current = self.head;
        for seg in segments {
            current = self.arena.add_empty_directory(current, seg);
        }
        current
    }
}
