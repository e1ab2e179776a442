/// Directory entry enumeration: the one place the initial scan touches the
/// filesystem.
///
/// An enumerator answers two questions: "what is at this path" (used by the
/// live watcher to classify new paths) and "what is below this path" (used by
/// the walk). Anything it cannot read is reported as an [`EnumerateError`]
/// and simply produces no node.
use super::event::FileMeta;
use crate::error::EnumerateError;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// What an enumerator found at a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    File(FileMeta),
    Directory,
}

/// One item of a recursive enumeration.
pub type WalkEntry = Result<(PathBuf, Entry), EnumerateError>;

pub trait Enumerator: Send + Sync {
    fn stat(&self, path: &Path) -> Result<Entry, EnumerateError>;

    /// `start` itself, then everything below it, depth first with children
    /// in name order. A failed entry is yielded as an error and the
    /// enumeration moves on to its siblings.
    fn walk(&self, start: &Path) -> Box<dyn Iterator<Item = WalkEntry> + '_>;
}

/// Enumerator backed by `walkdir`.
///
/// Symbolic links are not followed: a link is reported as a file with the
/// link's own size, so link cycles cannot make the walk loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsEnumerator;

impl Enumerator for FsEnumerator {
    fn stat(&self, path: &Path) -> Result<Entry, EnumerateError> {
        let meta = fs::symlink_metadata(path).map_err(|source| EnumerateError::Metadata {
            path: path.to_path_buf(),
            source,
        })?;
        if meta.is_dir() {
            Ok(Entry::Directory)
        } else {
            Ok(Entry::File(FileMeta::from(&meta)))
        }
    }

    fn walk(&self, start: &Path) -> Box<dyn Iterator<Item = WalkEntry> + '_> {
        let fallback = start.to_path_buf();
        let walker = WalkDir::new(start)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .map(move |result| -> WalkEntry {
                let entry = result.map_err(|err| EnumerateError::walk(err, &fallback))?;
                if entry.file_type().is_dir() {
                    return Ok((entry.into_path(), Entry::Directory));
                }
                let meta = entry
                    .metadata()
                    .map_err(|err| EnumerateError::walk(err, entry.path()))?;
                Ok((entry.into_path(), Entry::File(FileMeta::from(&meta))))
            });
        Box::new(walker)
    }
}
