/// Aggregate statistics and upward delta propagation.
///
/// Every directory carries a [`DirStats`] for its whole subtree. Mutations
/// never re-sum children: each one computes a single [`StatsDelta`] and
/// [`propagate`] applies it to the mutated directory and then to every
/// ancestor, following parent indices until the root. Cost is O(depth).
use super::arena::DirArena;
use super::dir_node::NodeIndex;
use serde::{Deserialize, Serialize};

/// Rolled-up totals for a directory subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirStats {
    /// Sum of all file sizes in the subtree, in bytes.
    pub size: u64,
    /// Number of files in the subtree.
    pub file_count: u64,
    /// Number of descendant directories, not counting the directory itself.
    pub dir_count: u64,
}

impl DirStats {
    /// Apply a signed delta.
    ///
    /// A result below zero means the tree's bookkeeping is already broken;
    /// that is asserted in debug builds and saturates at zero in release.
    #[inline]
    pub fn apply(&mut self, delta: StatsDelta) {
        self.size = apply_one(self.size, delta.size);
        self.file_count = apply_one(self.file_count, delta.files);
        self.dir_count = apply_one(self.dir_count, delta.dirs);
    }
}

#[inline]
fn apply_one(value: u64, delta: i64) -> u64 {
    debug_assert!(
        value.checked_add_signed(delta).is_some(),
        "aggregate out of range: {value} + {delta}"
    );
    value.saturating_add_signed(delta)
}

/// Signed change to a [`DirStats`]. Any component may be zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsDelta {
    pub size: i64,
    pub files: i64,
    pub dirs: i64,
}

impl StatsDelta {
    pub const ZERO: StatsDelta = StatsDelta {
        size: 0,
        files: 0,
        dirs: 0,
    };

    /// A brand-new empty child directory.
    pub fn add_directory() -> Self {
        Self {
            dirs: 1,
            ..Self::ZERO
        }
    }

    pub fn add_file(size: u64) -> Self {
        Self {
            size: to_signed(size),
            files: 1,
            dirs: 0,
        }
    }

    pub fn remove_file(size: u64) -> Self {
        Self {
            size: -to_signed(size),
            files: -1,
            dirs: 0,
        }
    }

    /// A file whose size changed from `old` to `new`.
    pub fn resize_file(old: u64, new: u64) -> Self {
        Self {
            size: to_signed(new) - to_signed(old),
            ..Self::ZERO
        }
    }

    /// Detaching a whole subtree: its totals plus the subtree root itself.
    pub fn remove_directory(removed: &DirStats) -> Self {
        Self {
            size: -to_signed(removed.size),
            files: -to_signed(removed.file_count),
            dirs: -to_signed(removed.dir_count) - 1,
        }
    }

    /// Replacing the child slot holding `old` (or nothing) with `new`.
    ///
    /// When the slot was empty the new subtree root itself adds one directory.
    pub fn replace_directory(new: &DirStats, old: Option<&DirStats>) -> Self {
        let old_stats = old.copied().unwrap_or_default();
        let plus_one = if old.is_some() { 0 } else { 1 };
        Self {
            size: to_signed(new.size) - to_signed(old_stats.size),
            files: to_signed(new.file_count) - to_signed(old_stats.file_count),
            dirs: to_signed(new.dir_count) - to_signed(old_stats.dir_count) + plus_one,
        }
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

#[inline]
fn to_signed(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

/// Apply `delta` to `start` and each of its ancestors.
///
/// A zero delta is skipped entirely. Walking stops at the first node without
/// a parent, so a detached subtree only updates itself and its own ancestors.
pub(crate) fn propagate(arena: &mut DirArena, start: NodeIndex, delta: StatsDelta) {
    if delta.is_zero() {
        return;
    }
    let mut current = Some(start);
    while let Some(idx) = current {
        let node = arena.node_mut(idx);
        node.stats.apply(delta);
        current = node.parent;
    }
}
