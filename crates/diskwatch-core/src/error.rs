/// Error types for the DiskWatch core.
///
/// Navigational misses (unknown path, path outside the scanned root) are not
/// errors: the tree reports them as `None`. Only caller mistakes and
/// session start-up failures are represented here.
use crate::model::NodeIndex;
use std::path::PathBuf;
use thiserror::Error;

/// A directory could not be placed into the requested slot.
///
/// Returned by `set_directory`; the tree is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyError {
    #[error("directory named '{found}' cannot be placed in slot '{expected}'")]
    NameMismatch { expected: String, found: String },

    #[error("directory {0:?} is still attached to a parent")]
    AlreadyAttached(NodeIndex),

    #[error("placing directory {0:?} here would make it its own ancestor")]
    Cycle(NodeIndex),

    #[error("directory {0:?} does not exist")]
    StaleIndex(NodeIndex),
}

/// The enumerator could not stat or list a path.
#[derive(Error, Debug)]
pub enum EnumerateError {
    #[error("cannot read metadata for '{path}': {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read '{path}': {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

impl EnumerateError {
    /// Wrap a traversal error; `fallback` names the entry when walkdir has
    /// no path for it.
    pub fn walk(source: walkdir::Error, fallback: &std::path::Path) -> Self {
        let path = source.path().unwrap_or(fallback).to_path_buf();
        Self::Walk { path, source }
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Metadata { path, .. } | Self::Walk { path, .. } => path,
        }
    }
}

/// Failures while starting or configuring a scan session.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("scan root '{0}' is not a readable directory")]
    InvalidRoot(PathBuf),

    #[error("failed to start filesystem watcher: {0}")]
    Watch(#[from] notify::Error),

    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read config file '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consistency_error_names_both_sides() {
        let err = ConsistencyError::NameMismatch {
            expected: "folder1".into(),
            found: "folder2".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("folder1") && msg.contains("folder2"));
    }

    #[test]
    fn enumerate_error_exposes_path() {
        let err = EnumerateError::Metadata {
            path: PathBuf::from("/nope"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.path(), std::path::Path::new("/nope"));
    }
}
