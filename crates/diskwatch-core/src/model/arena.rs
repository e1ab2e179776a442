/// Slab arena holding every directory of a tree, plus the node-level
/// mutations that keep subtree totals exact.
///
/// Each mutation touches one directory, computes a single [`StatsDelta`] and
/// hands it to [`propagate`], which walks the parent chain. Nothing here
/// performs I/O.
///
/// Slots freed by [`DirArena::release`] are recycled through a free list, so
/// a long-running watch session does not grow without bound as directories
/// come and go.
///
/// Mutations are crate-internal: outside code reaches them through
/// [`DirectoryTree`](super::DirectoryTree), which owns the head directory and
/// never hands out an index it has not checked.
use super::aggregate::{propagate, DirStats, StatsDelta};
use super::dir_node::{DirNode, NodeIndex};
use super::file_node::{FileInfo, FileNode};
use crate::error::ConsistencyError;
use compact_str::CompactString;

#[derive(Debug, Clone, Default)]
pub struct DirArena {
    slots: Vec<Option<DirNode>>,
    free: Vec<NodeIndex>,
    live: usize,
}

impl DirArena {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, node: DirNode) -> NodeIndex {
        self.live += 1;
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx.idx()] = Some(node);
                idx
            }
            None => {
                let idx = NodeIndex::new(self.slots.len());
                self.slots.push(Some(node));
                idx
            }
        }
    }

    /// Create a standalone directory with no parent.
    ///
    /// Populate it with the usual operations, then attach it with
    /// [`set_directory`](DirArena::set_directory).
    pub(crate) fn new_detached(&mut self, name: &str) -> NodeIndex {
        self.alloc(DirNode::new(CompactString::new(name), None))
    }

    pub fn get(&self, index: NodeIndex) -> Option<&DirNode> {
        self.slots.get(index.idx()).and_then(Option::as_ref)
    }

    /// Get the directory at `index`.
    ///
    /// Panics on an index whose slot has been released. Only called with
    /// indices the crate has just resolved.
    #[inline]
    pub(crate) fn node(&self, index: NodeIndex) -> &DirNode {
        match self.get(index) {
            Some(node) => node,
            None => panic!("stale directory index {index:?}"),
        }
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, index: NodeIndex) -> &mut DirNode {
        match self.slots.get_mut(index.idx()).and_then(Option::as_mut) {
            Some(node) => node,
            None => panic!("stale directory index {index:?}"),
        }
    }

    /// Number of live directories, attached or detached.
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Add an empty child directory, or return the existing one unchanged.
    pub(crate) fn add_empty_directory(&mut self, dir: NodeIndex, name: &str) -> NodeIndex {
        if let Some(existing) = self.node(dir).directory(name) {
            return existing;
        }
        let child = self.alloc(DirNode::new(CompactString::new(name), Some(dir)));
        self.node_mut(dir)
            .directories
            .insert(CompactString::new(name), child);
        propagate(self, dir, StatsDelta::add_directory());
        child
    }

    /// Put the detached directory `new` into slot `name` of `dir`, replacing
    /// whatever directory was there.
    ///
    /// `new` must be a live, detached node whose name equals `name`, and must
    /// not be an ancestor of `dir`. On any violation nothing changes. A
    /// replaced directory is released.
    pub(crate) fn set_directory(
        &mut self,
        dir: NodeIndex,
        name: &str,
        new: NodeIndex,
    ) -> Result<NodeIndex, ConsistencyError> {
        let new_node = self.get(new).ok_or(ConsistencyError::StaleIndex(new))?;
        if new_node.name.as_str() != name {
            return Err(ConsistencyError::NameMismatch {
                expected: name.to_owned(),
                found: new_node.name.to_string(),
            });
        }
        if new_node.parent.is_some() {
            return Err(ConsistencyError::AlreadyAttached(new));
        }
        if self.get(dir).is_none() {
            return Err(ConsistencyError::StaleIndex(dir));
        }
        if self.ancestors(dir).any(|a| a == new) {
            return Err(ConsistencyError::Cycle(new));
        }

        let new_stats = self.node(new).stats;
        let old = self.node(dir).directory(name);
        let old_stats = old.map(|o| self.node(o).stats);

        self.node_mut(dir)
            .directories
            .insert(CompactString::new(name), new);
        self.node_mut(new).parent = Some(dir);
        if let Some(old) = old {
            self.node_mut(old).parent = None;
            self.release(old);
        }

        propagate(
            self,
            dir,
            StatsDelta::replace_directory(&new_stats, old_stats.as_ref()),
        );
        Ok(new)
    }

    /// Insert a file if no file of that name exists.
    ///
    /// Re-adding an existing name is a no-op that returns the current record;
    /// metadata changes must go through [`update_file`](DirArena::update_file).
    pub(crate) fn add_file(&mut self, dir: NodeIndex, name: &str, info: FileInfo) -> &FileNode {
        if !self.node(dir).files.contains_key(name) {
            let size = info.size;
            let key = CompactString::new(name);
            self.node_mut(dir)
                .files
                .insert(key.clone(), FileNode::new(key, info));
            propagate(self, dir, StatsDelta::add_file(size));
        }
        &self.node(dir).files[name]
    }

    /// Replace a file's data in place.
    ///
    /// Returns `None` when there is no such file or the data is structurally
    /// identical; neither case propagates anything.
    pub(crate) fn update_file(&mut self, dir: NodeIndex, name: &str, info: FileInfo) -> Option<&FileNode> {
        let file = self.node_mut(dir).files.get_mut(name)?;
        if file.info == info {
            return None;
        }
        let delta = StatsDelta::resize_file(file.info.size, info.size);
        file.info = info;
        propagate(self, dir, delta);
        self.node(dir).files.get(name)
    }

    pub(crate) fn remove_file(&mut self, dir: NodeIndex, name: &str) -> Option<FileNode> {
        let removed = self.node_mut(dir).files.remove(name)?;
        propagate(self, dir, StatsDelta::remove_file(removed.size()));
        Some(removed)
    }

    /// Detach child directory `name` from `dir`.
    ///
    /// The detached subtree keeps its own totals and stays readable until
    /// [`release`](DirArena::release) is called on it.
    pub(crate) fn remove_directory(&mut self, dir: NodeIndex, name: &str) -> Option<NodeIndex> {
        let child = self.node_mut(dir).directories.remove(name)?;
        let removed = self.node(child).stats;
        self.node_mut(child).parent = None;
        propagate(self, dir, StatsDelta::remove_directory(&removed));
        Some(child)
    }

    /// Free every slot of a detached subtree.
    ///
    /// Returns `false` (and frees nothing) when `index` is stale or still
    /// attached to a parent.
    pub(crate) fn release(&mut self, index: NodeIndex) -> bool {
        match self.get(index) {
            Some(node) if node.parent.is_none() => {}
            _ => return false,
        }
        let mut stack = vec![index];
        while let Some(idx) = stack.pop() {
            if let Some(node) = self.slots[idx.idx()].take() {
                stack.extend(node.directories.values().copied());
                self.free.push(idx);
                self.live -= 1;
            }
        }
        true
    }

    /// `index` followed by each of its ancestors up to the topmost node.
    pub fn ancestors(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        std::iter::successors(Some(index), move |&idx| {
            self.get(idx).and_then(|node| node.parent)
        })
    }

    /// Every file below `start`, in traversal order: each child directory's
    /// files (recursively, names ascending) come before the directory's own.
    ///
    /// A stale `start` yields nothing.
    pub fn files_in_order(&self, start: NodeIndex) -> Vec<&FileInfo> {
        let capacity = self.get(start).map_or(0, |node| node.file_count() as usize);
        let mut out = Vec::with_capacity(capacity);
        let mut stack = vec![(start, false)];
        while let Some((idx, expanded)) = stack.pop() {
            let Some(node) = self.get(idx) else {
                continue;
            };
            if expanded {
                out.extend(node.files.values().map(|f| &f.info));
            } else {
                stack.push((idx, true));
                stack.extend(node.directories.values().rev().map(|&c| (c, false)));
            }
        }
        out
    }

    /// Recompute a subtree's totals from scratch by full traversal.
    ///
    /// The maintained [`DirStats`] must always equal this; it exists to
    /// check that claim, never to repair it.
    /// A stale `start` counts as empty.
    pub fn recount(&self, start: NodeIndex) -> DirStats {
        let mut stats = DirStats::default();
        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            let Some(node) = self.get(idx) else {
                continue;
            };
            if idx != start {
                stats.dir_count += 1;
            }
            stats.file_count += node.files.len() as u64;
            stats.size += node.files.values().map(FileNode::size).sum::<u64>();
            stack.extend(node.directories.values().copied());
        }
        stats
    }
}
