/// Scan sessions: one root, one tree, one worker thread.
///
/// Two producers feed a single event channel: the initial walk (on the
/// `diskwatch-walker` thread, ending with `Ready`) and, when enabled, the
/// live watcher. Consumer commands arrive on a separate channel.
///
/// The `diskwatch-session` worker owns the [`ChangeFeedAdapter`] and is the
/// only thread that touches the tree. It reports through a bounded
/// [`ScanMessage`] channel and keeps a copy of the latest snapshot for
/// consumers that prefer polling.
pub mod adapter;
pub mod debounce;
pub mod messages;

pub use adapter::{ChangeFeedAdapter, Outcome};
pub use debounce::Debouncer;
pub use messages::{ScanMessage, ScanSnapshot, SessionCommand, UpdateRequest};

use crate::config::SessionConfig;
use crate::error::CoreError;
use crate::model::NormalizedPath;
use crate::monitor::{start_monitor, MonitorHandle};
use crate::scanner::{walk, Enumerator, FsEnumerator, FsEvent, WalkSummary};
use crossbeam_channel::{at, never, select, Receiver, SendTimeoutError, Sender};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How often a worker blocked on a full message channel re-checks for stop.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Most recent snapshot, shared with polling readers.
pub type LatestSnapshot = Arc<Mutex<Option<ScanSnapshot>>>;

/// Handle to a running session. Dropping it stops the session.
pub struct SessionHandle {
    root: PathBuf,
    messages: Receiver<ScanMessage>,
    commands: Sender<SessionCommand>,
    latest: LatestSnapshot,
    cancel: Arc<AtomicBool>,
    monitor: Option<MonitorHandle>,
    worker: Option<JoinHandle<()>>,
    walker: Option<JoinHandle<WalkSummary>>,
}

impl SessionHandle {
    /// The absolute root being scanned.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn messages(&self) -> &Receiver<ScanMessage> {
        &self.messages
    }

    /// A sender for commands; may be cloned to other threads.
    pub fn commands(&self) -> Sender<SessionCommand> {
        self.commands.clone()
    }

    /// Send a command. `false` once the worker has exited.
    pub fn send(&self, command: SessionCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn show_more(&self) -> bool {
        self.send(SessionCommand::ShowMore)
    }

    pub fn request_listing(&self, path: impl Into<PathBuf>) -> bool {
        self.send(SessionCommand::GetDirectoryListing(path.into()))
    }

    /// Copy of the last snapshot the worker published.
    pub fn latest_snapshot(&self) -> Option<ScanSnapshot> {
        self.latest.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Stop the session and wait for its threads.
    ///
    /// The watcher goes first so no new events arrive, then the walk and the
    /// worker are signalled and joined. Idempotent.
    pub fn stop(&mut self) {
        if let Some(mut monitor) = self.monitor.take() {
            monitor.stop();
        }
        self.cancel.store(true, Ordering::Relaxed);
        let _ = self.commands.send(SessionCommand::Stop);

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("session worker for {} panicked", self.root.display());
            }
        }
        // The worker dropped the event receiver, so a walk blocked on a full
        // channel has already been released.
        if let Some(walker) = self.walker.take() {
            match walker.join() {
                Ok(summary) => debug!("walker joined: {summary:?}"),
                Err(_) => warn!("walker for {} panicked", self.root.display()),
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Start scanning `root` in the background.
///
/// Fails only when the root is not a directory, the watcher cannot be
/// started, or a thread cannot be spawned. Everything that goes wrong later
/// is reported as a [`ScanMessage::Error`].
pub fn start_session(
    root: &Path,
    config: &SessionConfig,
    enumerator: Arc<dyn Enumerator>,
) -> Result<SessionHandle, CoreError> {
    let root = std::path::absolute(root).map_err(|_| CoreError::InvalidRoot(root.to_path_buf()))?;
    if !root.is_dir() {
        return Err(CoreError::InvalidRoot(root));
    }
    let key = NormalizedPath::from_path(&root);
    let capacity = config.channel_capacity.max(1);

    let (event_tx, event_rx) = crossbeam_channel::bounded::<FsEvent>(capacity);
    let (msg_tx, msg_rx) = crossbeam_channel::bounded::<ScanMessage>(capacity);
    let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded::<SessionCommand>();
    let cancel = Arc::new(AtomicBool::new(false));
    let latest: LatestSnapshot = Arc::new(Mutex::new(None));

    info!("starting session on {}", root.display());
    // The channel is empty and has room: this cannot block.
    let _ = msg_tx.send(ScanMessage::Started { root: key.clone() });

    let worker = Worker {
        adapter: ChangeFeedAdapter::new(key, config.top_files_page),
        debouncer: Debouncer::new(config.debounce(), config.max_wait()),
        messages: msg_tx,
        latest: Arc::clone(&latest),
        cancel: Arc::clone(&cancel),
    };
    let worker = thread::Builder::new()
        .name("diskwatch-session".into())
        .spawn(move || worker.run(event_rx, cmd_rx))
        .map_err(|source| CoreError::Spawn {
            name: "session",
            source,
        })?;

    let mut handle = SessionHandle {
        root: root.clone(),
        messages: msg_rx,
        commands: cmd_tx,
        latest,
        cancel: Arc::clone(&cancel),
        monitor: None,
        worker: Some(worker),
        walker: None,
    };

    // Watch before walking so nothing created during the walk is missed;
    // duplicates are absorbed by the adapter.
    if config.watch {
        handle.monitor = Some(start_monitor(
            &root,
            Arc::clone(&enumerator),
            event_tx.clone(),
        )?);
    }

    let walker = thread::Builder::new()
        .name("diskwatch-walker".into())
        .spawn(move || walk(&root, enumerator.as_ref(), &event_tx, &cancel))
        .map_err(|source| CoreError::Spawn {
            name: "walker",
            source,
        })?;
    handle.walker = Some(walker);

    Ok(handle)
}

/// Session state confined to the worker thread.
struct Worker {
    adapter: ChangeFeedAdapter,
    debouncer: Debouncer,
    messages: Sender<ScanMessage>,
    latest: LatestSnapshot,
    cancel: Arc<AtomicBool>,
}

impl Worker {
    fn run(mut self, mut events: Receiver<FsEvent>, commands: Receiver<SessionCommand>) {
        loop {
            let timer = self.debouncer.deadline().map_or_else(never, at);
            let mut feed_closed = false;
            let keep_going = select! {
                recv(events) -> event => match event {
                    Ok(event) => self.on_event(event),
                    Err(_) => {
                        feed_closed = true;
                        true
                    }
                },
                recv(commands) -> command => match command {
                    Ok(SessionCommand::Stop) | Err(_) => false,
                    Ok(command) => self.on_command(command),
                },
                recv(timer) -> _ => true,
            };
            if !keep_going || self.cancel.load(Ordering::Relaxed) {
                break;
            }
            if feed_closed {
                // Walk finished and no watcher: only commands remain.
                debug!("event feed closed");
                events = never();
            }
            if self.debouncer.fire_if_due(Instant::now()) {
                let snapshot = self.publish();
                if !self.emit(ScanMessage::Updated {
                    snapshot,
                    request: None,
                }) {
                    break;
                }
            }
        }
        let _ = self.messages.try_send(ScanMessage::Stopped);
        debug!("session worker exiting");
    }

    fn on_event(&mut self, event: FsEvent) -> bool {
        match self.adapter.handle(event) {
            Outcome::Unchanged => true,
            Outcome::Updated => {
                self.debouncer.arm(Instant::now());
                true
            }
            Outcome::Finished(snapshot) => {
                self.debouncer.cancel();
                *self.latest.lock() = Some(snapshot.clone());
                info!(
                    "scan finished: {} files, {} dirs, {} bytes",
                    snapshot.total_files, snapshot.total_directories, snapshot.total_size
                );
                self.emit(ScanMessage::Finished { snapshot })
            }
            Outcome::Failed { path, message } => self.emit(ScanMessage::Error { path, message }),
        }
    }

    fn on_command(&mut self, command: SessionCommand) -> bool {
        match command {
            SessionCommand::ShowMore => {
                self.adapter.show_more();
                let snapshot = self.publish();
                self.emit(ScanMessage::Updated {
                    snapshot,
                    request: Some(UpdateRequest::ShowMore),
                })
            }
            SessionCommand::GetDirectoryListing(path) => {
                let path = NormalizedPath::from_path(&path);
                let items = self.adapter.listing(&path);
                self.emit(ScanMessage::DirectoryListing { path, items })
            }
            SessionCommand::Stop => false,
        }
    }

    /// Take a snapshot and store it for polling readers.
    fn publish(&self) -> ScanSnapshot {
        let snapshot = self.adapter.snapshot();
        *self.latest.lock() = Some(snapshot.clone());
        snapshot
    }

    /// Send to the consumer, waiting while the channel is full. `false` when
    /// the consumer is gone or the session is stopping.
    fn emit(&self, mut message: ScanMessage) -> bool {
        loop {
            match self.messages.send_timeout(message, STOP_POLL_INTERVAL) {
                Ok(()) => return true,
                Err(SendTimeoutError::Disconnected(_)) => return false,
                Err(SendTimeoutError::Timeout(returned)) => {
                    if self.cancel.load(Ordering::Relaxed) {
                        return false;
                    }
                    message = returned;
                }
            }
        }
    }
}

/// Owns at most one session; starting a new root fully stops the old one.
pub struct ScanController {
    config: SessionConfig,
    enumerator: Arc<dyn Enumerator>,
    session: Option<SessionHandle>,
}

impl Default for ScanController {
    fn default() -> Self {
        Self::new(SessionConfig::default(), Arc::new(FsEnumerator))
    }
}

impl ScanController {
    pub fn new(config: SessionConfig, enumerator: Arc<dyn Enumerator>) -> Self {
        Self {
            config,
            enumerator,
            session: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Stop the current session (watcher included), then start on `root`.
    pub fn start(&mut self, root: &Path) -> Result<&SessionHandle, CoreError> {
        self.stop();
        let session = start_session(root, &self.config, Arc::clone(&self.enumerator))?;
        Ok(self.session.insert(session))
    }

    pub fn stop(&mut self) {
        if let Some(mut session) = self.session.take() {
            info!("stopping session on {}", session.root().display());
            session.stop();
        }
    }

    pub fn session(&self) -> Option<&SessionHandle> {
        self.session.as_ref()
    }
}
