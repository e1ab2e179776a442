/// Top-N largest files, kept sorted as files come and go.
///
/// Unlike a one-shot "sort everything after the scan" pass, this list is
/// patched by every add/remove/update from the change feed. The sequence is
/// ordered by size descending, equal sizes in arrival order, and a
/// path → position index answers "where is this file" in O(1).
///
/// Insertion finds its slot by binary search, but the splice shifts every
/// later entry, which is O(n) re-indexing in the worst case.
use crate::model::{FileInfo, NormalizedPath};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct RankedFileList {
    list: Vec<FileInfo>,
    index: HashMap<NormalizedPath, usize>,
}

impl RankedFileList {
    /// Build from an initial set of files.
    ///
    /// The sort is stable, so equal sizes keep their input order. Pass
    /// `already_sorted` to skip it when the input is known to be ordered by
    /// size descending. Later duplicates of a path are dropped.
    pub fn new(mut records: Vec<FileInfo>, already_sorted: bool) -> Self {
        if !already_sorted {
            records.sort_by(|a, b| b.size.cmp(&a.size));
        }
        let mut ranked = Self {
            list: Vec::with_capacity(records.len()),
            index: HashMap::with_capacity(records.len()),
        };
        for record in records {
            if ranked.index.contains_key(&record.path) {
                continue;
            }
            ranked.index.insert(record.path.clone(), ranked.list.len());
            ranked.list.push(record);
        }
        ranked
    }

    /// Insert a file. No-op if its path is already ranked.
    pub fn add(&mut self, record: FileInfo) {
        if self.index.contains_key(&record.path) {
            return;
        }
        // First position whose size is strictly smaller: equal sizes stay
        // ahead of the newcomer.
        let pos = self.list.partition_point(|f| f.size >= record.size);
        self.list.insert(pos, record);
        self.reindex_from(pos);
    }

    /// Remove the file with `record`'s path. Returns the ranked entry.
    pub fn remove(&mut self, record: &FileInfo) -> Option<FileInfo> {
        self.remove_path(&record.path)
    }

    pub fn remove_path(&mut self, path: &NormalizedPath) -> Option<FileInfo> {
        let pos = self.index.remove(path)?;
        let removed = self.list.remove(pos);
        self.reindex_from(pos);
        Some(removed)
    }

    /// Replace a file's data, moving it if its size changed.
    pub fn update(&mut self, record: FileInfo) {
        self.remove_path(&record.path);
        self.add(record);
    }

    /// The `limit` largest files, largest first.
    pub fn get_range(&self, limit: usize) -> &[FileInfo] {
        &self.list[..limit.min(self.list.len())]
    }

    pub fn position(&self, path: &NormalizedPath) -> Option<usize> {
        self.index.get(path).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileInfo> {
        self.list.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    fn reindex_from(&mut self, start: usize) {
        for (i, file) in self.list.iter().enumerate().skip(start) {
            if let Some(slot) = self.index.get_mut(&file.path) {
                *slot = i;
            } else {
                self.index.insert(file.path.clone(), i);
            }
        }
    }

    /// Check that the order and the index agree. Used by tests.
    #[cfg(test)]
    fn assert_consistent(&self) {
        assert_eq!(self.list.len(), self.index.len());
        for (i, file) in self.list.iter().enumerate() {
            assert_eq!(self.index.get(&file.path), Some(&i), "{}", file.path);
        }
        assert!(self.list.windows(2).all(|w| w[0].size >= w[1].size));
    }
}
