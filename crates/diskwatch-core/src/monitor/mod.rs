/// Live change feed: watches a scan root and forwards changes as `FsEvent`s.
///
/// Uses the platform's recommended `notify` backend (inotify, FSEvents,
/// ReadDirectoryChangesW) in recursive mode. Raw notifications are translated
/// into the same vocabulary the initial walk speaks and pushed into the
/// session's event channel.
///
/// # Translation
///
/// - Creates are classified with [`Enumerator::stat`]. A new directory is
///   walked, so content moved in with it is reported too.
/// - Content and metadata changes on files become `FileChanged`.
/// - A removal the backend cannot classify (and the source side of a rename)
///   is sent as both `FileRemoved` and `DirRemoved`; the receiver ignores
///   whichever does not match.
///
/// # Cancellation
///
/// [`MonitorHandle::stop`] drops the watcher, which ends the backend thread,
/// and raises a flag that aborts any subtree walk still in progress.
use crate::error::CoreError;
use crate::scanner::{walk_subtree, Entry, Enumerator, FileMeta, FsEvent};
use crossbeam_channel::Sender;
use notify::event::{AccessKind, AccessMode, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Handle to a running watcher. Dropping it stops the watcher.
pub struct MonitorHandle {
    watcher: Option<RecommendedWatcher>,
    cancel: Arc<AtomicBool>,
    root: PathBuf,
}

impl MonitorHandle {
    /// Stop watching. Idempotent; no event is sent once this returns, apart
    /// from one the backend was already delivering.
    pub fn stop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        if self.watcher.take().is_some() {
            debug!("monitor: stopped for {}", self.root.display());
        }
    }

    pub fn is_running(&self) -> bool {
        self.watcher.is_some()
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Start watching `root` recursively, sending translated events into `tx`.
///
/// `enumerator` walks directories that appear while watching.
pub fn start_monitor(
    root: &Path,
    enumerator: Arc<dyn Enumerator>,
    tx: Sender<FsEvent>,
) -> Result<MonitorHandle, CoreError> {
    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_cb = Arc::clone(&cancel);

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        if cancel_cb.load(Ordering::Relaxed) {
            return;
        }
        match res {
            Ok(event) => dispatch(event, enumerator.as_ref(), &tx, &cancel_cb),
            Err(err) => {
                warn!("monitor: watch error: {err}");
                let _ = tx.send(FsEvent::Error {
                    path: err.paths.first().cloned(),
                    message: err.to_string(),
                });
            }
        }
    })?;
    watcher.watch(root, RecursiveMode::Recursive)?;
    info!("monitor: watching {}", root.display());

    Ok(MonitorHandle {
        watcher: Some(watcher),
        cancel,
        root: root.to_path_buf(),
    })
}

/// What a path turned out to be when it was looked at.
enum Found {
    File(FileMeta),
    Directory,
    Gone,
}

fn look(path: &Path, enumerator: &dyn Enumerator) -> Found {
    match enumerator.stat(path) {
        Ok(Entry::Directory) => Found::Directory,
        Ok(Entry::File(meta)) => Found::File(meta),
        Err(_) => Found::Gone,
    }
}

/// Translate one backend notification and send the result.
fn dispatch(event: Event, enumerator: &dyn Enumerator, tx: &Sender<FsEvent>, cancel: &AtomicBool) {
    match event.kind {
        EventKind::Create(_) => {
            for path in &event.paths {
                appeared(path, enumerator, tx, cancel);
            }
        }
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => {
                for path in event.paths {
                    send_removed(path, RemoveKind::Any, tx);
                }
            }
            RenameMode::To => {
                for path in &event.paths {
                    appeared(path, enumerator, tx, cancel);
                }
            }
            // inotify also reports both halves separately; nothing new here.
            RenameMode::Both => {}
            RenameMode::Any | RenameMode::Other => {
                for path in event.paths {
                    match look(&path, enumerator) {
                        Found::Gone => send_removed(path, RemoveKind::Any, tx),
                        _ => appeared(&path, enumerator, tx, cancel),
                    }
                }
            }
        },
        EventKind::Modify(_) | EventKind::Access(AccessKind::Close(AccessMode::Write)) => {
            for path in event.paths {
                if let Found::File(meta) = look(&path, enumerator) {
                    let _ = tx.send(FsEvent::FileChanged {
                        path,
                        meta: Some(meta),
                    });
                }
            }
        }
        EventKind::Remove(kind) => {
            for path in event.paths {
                send_removed(path, kind, tx);
            }
        }
        EventKind::Access(_) | EventKind::Any | EventKind::Other => {}
    }
}

/// Report a path that was created or moved in.
fn appeared(path: &Path, enumerator: &dyn Enumerator, tx: &Sender<FsEvent>, cancel: &AtomicBool) {
    match look(path, enumerator) {
        Found::File(meta) => {
            let _ = tx.send(FsEvent::FileAdded {
                path: path.to_path_buf(),
                meta: Some(meta),
            });
        }
        Found::Directory => {
            walk_subtree(path, enumerator, tx, cancel);
        }
        // Already gone again; a removal event follows.
        Found::Gone => {
            debug!("monitor: {} vanished before it could be read", path.display());
        }
    }
}

fn send_removed(path: PathBuf, kind: RemoveKind, tx: &Sender<FsEvent>) {
    match kind {
        RemoveKind::File => {
            let _ = tx.send(FsEvent::FileRemoved { path });
        }
        RemoveKind::Folder => {
            let _ = tx.send(FsEvent::DirRemoved { path });
        }
        RemoveKind::Any | RemoveKind::Other => {
            let _ = tx.send(FsEvent::FileRemoved { path: path.clone() });
            let _ = tx.send(FsEvent::DirRemoved { path });
        }
    }
}
