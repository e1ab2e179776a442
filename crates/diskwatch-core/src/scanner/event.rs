/// Change-feed events: the single input language of a scan session.
///
/// Both the initial enumeration and the live watcher speak it, so the tree is
/// always driven by one ordered stream. Paths are absolute and raw; the
/// session normalises them.
use std::fs::Metadata;
use std::path::PathBuf;
use std::time::SystemTime;

/// Metadata read by the producer of an event. The core never stats files
/// itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMeta {
    pub size: u64,
    pub modified: Option<SystemTime>,
}

impl FileMeta {
    pub fn new(size: u64, modified: Option<SystemTime>) -> Self {
        Self { size, modified }
    }
}

impl From<&Metadata> for FileMeta {
    fn from(meta: &Metadata) -> Self {
        Self {
            size: meta.len(),
            modified: meta.modified().ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsEvent {
    /// A file appeared. `meta` is `None` when it could not be read.
    FileAdded {
        path: PathBuf,
        meta: Option<FileMeta>,
    },
    /// A file's contents or metadata changed.
    FileChanged {
        path: PathBuf,
        meta: Option<FileMeta>,
    },
    FileRemoved {
        path: PathBuf,
    },
    DirAdded {
        path: PathBuf,
    },
    DirRemoved {
        path: PathBuf,
    },
    /// The initial enumeration is complete.
    Ready,
    /// The producer hit a problem. Never mutates the tree.
    Error {
        path: Option<PathBuf>,
        message: String,
    },
}

impl FsEvent {
    /// Short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FileAdded { .. } => "file-added",
            Self::FileChanged { .. } => "file-changed",
            Self::FileRemoved { .. } => "file-removed",
            Self::DirAdded { .. } => "dir-added",
            Self::DirRemoved { .. } => "dir-removed",
            Self::Ready => "ready",
            Self::Error { .. } => "error",
        }
    }
}
