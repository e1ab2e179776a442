/// Initial enumeration of a scan root, expressed as change-feed events.
///
/// The walk produces the same `DirAdded` / `FileAdded` events a watcher would
/// emit for a freshly created tree, then a single `Ready`. The consumer does
/// not need to know whether an event came from the walk or from the live
/// watcher.
///
/// Traversal order comes from the [`Enumerator`]: depth first, children in
/// name order. An unreadable entry yields an `FsEvent::Error` and no node;
/// the walk moves on to its siblings.
use super::enumerator::{Entry, Enumerator};
use super::event::FsEvent;
use crossbeam_channel::Sender;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Entries between cancellation checks.
const CANCEL_CHECK_INTERVAL: u64 = 1_000;

/// Counters reported when a walk ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    pub files: u64,
    /// Directories below the root.
    pub dirs: u64,
    pub errors: u64,
    /// The walk stopped early (cancel flag or closed channel) and no `Ready`
    /// was sent.
    pub cancelled: bool,
}

/// Walk `root` and send one event per entry, followed by `Ready`.
///
/// The root itself produces no `DirAdded`: it is the tree's head. If the root
/// cannot be read an `Error` is sent and the walk still finishes with `Ready`,
/// leaving an empty tree.
pub fn walk(
    root: &Path,
    enumerator: &dyn Enumerator,
    tx: &Sender<FsEvent>,
    cancel: &AtomicBool,
) -> WalkSummary {
    let start = Instant::now();
    let mut summary = WalkSummary::default();

    if !emit_entries(root, false, enumerator, tx, cancel, &mut summary) {
        summary.cancelled = true;
        return summary;
    }
    if cancel.load(Ordering::Relaxed) || tx.send(FsEvent::Ready).is_err() {
        summary.cancelled = true;
        return summary;
    }

    info!(
        "walk of {} finished in {:.2?}: {} files, {} dirs, {} errors",
        root.display(),
        start.elapsed(),
        summary.files,
        summary.dirs,
        summary.errors
    );
    summary
}

/// Emit `path` itself and everything below it, without a trailing `Ready`.
///
/// Used for directories that appear after the initial walk: most watchers
/// report only the new directory, not what was moved in with it.
pub fn walk_subtree(
    path: &Path,
    enumerator: &dyn Enumerator,
    tx: &Sender<FsEvent>,
    cancel: &AtomicBool,
) -> WalkSummary {
    let mut summary = WalkSummary::default();
    if !emit_entries(path, true, enumerator, tx, cancel, &mut summary) {
        summary.cancelled = true;
    }
    summary
}

/// Forward the enumerator's walk from `start`. Returns `false` when stopped
/// early.
fn emit_entries(
    start: &Path,
    announce_start: bool,
    enumerator: &dyn Enumerator,
    tx: &Sender<FsEvent>,
    cancel: &AtomicBool,
    summary: &mut WalkSummary,
) -> bool {
    for (visited, item) in (1u64..).zip(enumerator.walk(start)) {
        if visited.is_multiple_of(CANCEL_CHECK_INTERVAL) && cancel.load(Ordering::Relaxed) {
            debug!("walk of {} cancelled after {visited} entries", start.display());
            return false;
        }

        let event = match item {
            Ok((path, Entry::File(meta))) => {
                summary.files += 1;
                FsEvent::FileAdded {
                    path,
                    meta: Some(meta),
                }
            }
            Ok((path, Entry::Directory)) => {
                if path == start && !announce_start {
                    continue;
                }
                summary.dirs += 1;
                FsEvent::DirAdded { path }
            }
            Err(err) => {
                summary.errors += 1;
                debug!("walk: {err}");
                FsEvent::Error {
                    path: Some(err.path().to_path_buf()),
                    message: err.to_string(),
                }
            }
        };

        if tx.send(event).is_err() {
            return false;
        }
    }
    true
}
