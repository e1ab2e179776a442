/// File records stored in the directory tree.
///
/// A [`FileNode`] is owned by exactly one directory, keyed by its final path
/// segment. Its [`FileInfo`] carries the file's identity (the normalised
/// absolute path) plus the metadata that feeds aggregation. The top-files
/// ranker keeps its own copies of `FileInfo`, keyed by that same path.
use super::path::NormalizedPath;
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Metadata for one file. Equality is structural, which is what
/// `update_file` uses to suppress redundant updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Normalised absolute path; the file's identity.
    pub path: NormalizedPath,

    /// Logical size in bytes.
    pub size: u64,

    /// Last-modified timestamp, when the platform reports one.
    pub last_modified: Option<DateTime<Utc>>,
}

impl FileInfo {
    pub fn new(path: NormalizedPath, size: u64) -> Self {
        Self {
            path,
            size,
            last_modified: None,
        }
    }

    /// Attach a modification time taken from filesystem metadata.
    pub fn with_modified(mut self, modified: Option<SystemTime>) -> Self {
        self.last_modified = modified.map(DateTime::<Utc>::from);
        self
    }
}

/// A file in the tree: its name within the parent and its current data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    pub name: CompactString,
    pub info: FileInfo,
}

impl FileNode {
    pub fn new(name: CompactString, info: FileInfo) -> Self {
        Self { name, info }
    }

    #[inline]
    pub fn size(&self) -> u64 {
        self.info.size
    }
}
