/// Messages crossing the session boundary.
///
/// Consumers never see the tree itself: every message carries owned copies
/// (totals, a bounded top-file page, a directory listing) taken on the
/// session worker.
use crate::analysis::DirListItem;
use crate::model::{DirStats, FileInfo, NormalizedPath};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Point-in-time totals for the scanned root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSnapshot {
    pub total_size: u64,
    pub total_files: u64,
    pub total_directories: u64,
    /// Largest files, largest first. `None` until the initial walk is done.
    pub top_files: Option<Vec<FileInfo>>,
}

impl ScanSnapshot {
    pub fn from_stats(stats: DirStats, top_files: Option<Vec<FileInfo>>) -> Self {
        Self {
            total_size: stats.size,
            total_files: stats.file_count,
            total_directories: stats.dir_count,
            top_files,
        }
    }
}

/// Which command, if any, an `Updated` message answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateRequest {
    ShowMore,
}

/// Session to consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanMessage {
    /// The session accepted its root and began the initial walk.
    Started { root: NormalizedPath },
    /// The tree changed (debounced), or a command asked for a fresh page.
    Updated {
        snapshot: ScanSnapshot,
        request: Option<UpdateRequest>,
    },
    /// The initial walk is complete.
    Finished { snapshot: ScanSnapshot },
    /// A non-fatal problem, e.g. an unreadable directory.
    Error {
        path: Option<String>,
        message: String,
    },
    DirectoryListing {
        path: NormalizedPath,
        items: Vec<DirListItem>,
    },
    /// The worker exited; nothing follows.
    Stopped,
}

/// Consumer to session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Grow the reported top-file page by one step.
    ShowMore,
    /// List the immediate contents of a directory under the root.
    GetDirectoryListing(PathBuf),
    Stop,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_tagged_by_type() {
        let msg = ScanMessage::Updated {
            snapshot: ScanSnapshot {
                total_size: 10,
                total_files: 1,
                total_directories: 0,
                top_files: None,
            },
            request: Some(UpdateRequest::ShowMore),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "updated");
        assert_eq!(json["request"], "show_more");
        assert_eq!(json["snapshot"]["total_size"], 10);

        let stopped = serde_json::to_value(ScanMessage::Stopped).unwrap();
        assert_eq!(stopped, serde_json::json!({ "type": "stopped" }));
    }

    #[test]
    fn started_root_serializes_as_segments() {
        let msg = ScanMessage::Started {
            root: NormalizedPath::new("/home/me"),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"started","root":["home","me"]}"#);
        assert_eq!(serde_json::from_str::<ScanMessage>(&json).unwrap(), msg);
    }
}
