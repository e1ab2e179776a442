/// End-to-end session tests.
///
/// These run real sessions (walker thread, worker thread and, where noted, a
/// live `notify` watcher) against a temporary directory, and check what a
/// consumer sees on the message channel.
use diskwatch_core::error::CoreError;
use diskwatch_core::model::NormalizedPath;
use diskwatch_core::scanner::{walk, FsEnumerator};
use diskwatch_core::session::{
    start_session, ChangeFeedAdapter, Outcome, ScanController, ScanMessage, ScanSnapshot,
    SessionHandle, UpdateRequest,
};
use diskwatch_core::SessionConfig;
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Create a reproducible directory tree:
///
/// ```text
/// root/
///   alpha/
///     a.txt   (100 bytes)
///     b.rs    (200 bytes)
///   beta/
///     c.png   (300 bytes)
///   d.zip     (400 bytes)
/// ```
///
/// Total file bytes: 1 000.
fn build_test_tree(root: &Path) {
    fs::create_dir_all(root.join("alpha")).unwrap();
    fs::create_dir_all(root.join("beta")).unwrap();
    write_bytes(&root.join("alpha/a.txt"), 100);
    write_bytes(&root.join("alpha/b.rs"), 200);
    write_bytes(&root.join("beta/c.png"), 300);
    write_bytes(&root.join("d.zip"), 400);
}

fn write_bytes(path: &Path, n: usize) {
    fs::write(path, vec![0u8; n]).unwrap();
}

fn one_shot() -> SessionConfig {
    SessionConfig {
        watch: false,
        ..SessionConfig::default()
    }
}

fn watching() -> SessionConfig {
    SessionConfig {
        debounce_ms: 50,
        max_wait_ms: 200,
        ..SessionConfig::default()
    }
}

/// Generous timeout for anything involving real threads or a watcher.
const TIMEOUT: Duration = Duration::from_secs(30);

/// Receive until `pick` returns `Some`, or panic after [`TIMEOUT`].
fn wait_for<T>(session: &SessionHandle, mut pick: impl FnMut(&ScanMessage) -> Option<T>) -> T {
    let deadline = Instant::now() + TIMEOUT;
    loop {
        let left = deadline.saturating_duration_since(Instant::now());
        match session.messages().recv_timeout(left) {
            Ok(message) => {
                if let Some(found) = pick(&message) {
                    return found;
                }
            }
            Err(err) => panic!("no matching message before timeout: {err}"),
        }
    }
}

fn wait_finished(session: &SessionHandle) -> ScanSnapshot {
    wait_for(session, |m| match m {
        ScanMessage::Finished { snapshot } => Some(snapshot.clone()),
        _ => None,
    })
}

fn top_sizes(snapshot: &ScanSnapshot) -> Vec<u64> {
    snapshot
        .top_files
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|f| f.size)
        .collect()
}

// ── Initial scan ─────────────────────────────────────────────────────────────

#[test]
fn initial_scan_reports_started_then_finished_totals() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());

    let session = start_session(tmp.path(), &one_shot(), Arc::new(FsEnumerator)).unwrap();

    let first = session.messages().recv_timeout(TIMEOUT).unwrap();
    let ScanMessage::Started { root } = first else {
        panic!("first message must be Started, got {first:?}");
    };
    assert_eq!(root, NormalizedPath::from_path(session.root()));

    let snapshot = wait_finished(&session);
    assert_eq!(snapshot.total_size, 1_000);
    assert_eq!(snapshot.total_files, 4);
    assert_eq!(snapshot.total_directories, 2);
    assert_eq!(top_sizes(&snapshot), vec![400, 300, 200, 100]);
    assert_eq!(session.latest_snapshot(), Some(snapshot));
}

#[test]
fn empty_root_finishes_with_zero_totals() {
    let tmp = TempDir::new().unwrap();
    let session = start_session(tmp.path(), &one_shot(), Arc::new(FsEnumerator)).unwrap();
    let snapshot = wait_finished(&session);
    assert_eq!(snapshot.total_size, 0);
    assert_eq!(snapshot.total_files, 0);
    assert_eq!(snapshot.total_directories, 0);
    assert_eq!(snapshot.top_files, Some(vec![]));
}

#[test]
fn missing_root_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let result = start_session(&tmp.path().join("nope"), &one_shot(), Arc::new(FsEnumerator));
    assert!(matches!(result, Err(CoreError::InvalidRoot(_))));

    let file = tmp.path().join("file.txt");
    write_bytes(&file, 1);
    let result = start_session(&file, &one_shot(), Arc::new(FsEnumerator));
    assert!(matches!(result, Err(CoreError::InvalidRoot(_))));
}

// ── Commands ─────────────────────────────────────────────────────────────────

#[test]
fn show_more_replies_with_a_larger_page() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());
    let config = SessionConfig {
        top_files_page: 2,
        ..one_shot()
    };
    let session = start_session(tmp.path(), &config, Arc::new(FsEnumerator)).unwrap();
    assert_eq!(top_sizes(&wait_finished(&session)), vec![400, 300]);

    assert!(session.show_more());
    let snapshot = wait_for(&session, |m| match m {
        ScanMessage::Updated {
            snapshot,
            request: Some(UpdateRequest::ShowMore),
        } => Some(snapshot.clone()),
        _ => None,
    });
    assert_eq!(top_sizes(&snapshot), vec![400, 300, 200, 100]);
}

#[test]
fn directory_listing_is_served_from_the_tree() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());
    let session = start_session(tmp.path(), &one_shot(), Arc::new(FsEnumerator)).unwrap();
    wait_finished(&session);

    assert!(session.request_listing(session.root().to_path_buf()));
    let items = wait_for(&session, |m| match m {
        ScanMessage::DirectoryListing { items, .. } => Some(items.clone()),
        _ => None,
    });
    let rows: Vec<(&str, u64)> = items.iter().map(|i| (i.name.as_str(), i.size)).collect();
    assert_eq!(rows, vec![("d.zip", 400), ("alpha", 300), ("beta", 300)]);

    assert!(session.request_listing(session.root().join("alpha")));
    let items = wait_for(&session, |m| match m {
        ScanMessage::DirectoryListing { items, .. } => Some(items.clone()),
        _ => None,
    });
    let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["b.rs", "a.txt"]);
}

// ── Lifecycle ────────────────────────────────────────────────────────────────

#[test]
fn stop_ends_the_message_stream() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());
    let mut session = start_session(tmp.path(), &watching(), Arc::new(FsEnumerator)).unwrap();
    wait_finished(&session);

    session.stop();
    assert!(!session.is_running());
    let rest: Vec<ScanMessage> = session.messages().try_iter().collect();
    assert_eq!(rest.last(), Some(&ScanMessage::Stopped));
    assert!(!session.show_more());

    // A second stop is harmless.
    session.stop();
}

#[test]
fn controller_replaces_the_previous_session() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    build_test_tree(first.path());
    write_bytes(&second.path().join("only.bin"), 42);

    let mut controller = ScanController::new(one_shot(), Arc::new(FsEnumerator));
    let session = controller.start(first.path()).unwrap();
    assert_eq!(wait_finished(session).total_size, 1_000);

    let session = controller.start(second.path()).unwrap();
    let snapshot = wait_finished(session);
    assert_eq!(snapshot.total_size, 42);
    assert_eq!(snapshot.total_files, 1);

    controller.stop();
    assert!(controller.session().is_none());
}

#[test]
fn controller_keeps_nothing_after_a_failed_start() {
    let tmp = TempDir::new().unwrap();
    let mut controller = ScanController::new(one_shot(), Arc::new(FsEnumerator));
    controller.start(tmp.path()).unwrap();
    assert!(controller.start(&tmp.path().join("missing")).is_err());
    assert!(controller.session().is_none());
}

// ── Live changes ─────────────────────────────────────────────────────────────

/// Wait for a debounced update whose totals satisfy `done`.
fn wait_update(session: &SessionHandle, done: impl Fn(&ScanSnapshot) -> bool) -> ScanSnapshot {
    wait_for(session, |m| match m {
        ScanMessage::Updated {
            snapshot,
            request: None,
        } if done(snapshot) => Some(snapshot.clone()),
        _ => None,
    })
}

#[test]
fn live_file_changes_update_totals() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());
    let session = start_session(tmp.path(), &watching(), Arc::new(FsEnumerator)).unwrap();
    wait_finished(&session);

    write_bytes(&tmp.path().join("beta/new.iso"), 5_000);
    let snapshot = wait_update(&session, |s| s.total_size == 6_000);
    assert_eq!(snapshot.total_files, 5);
    assert_eq!(top_sizes(&snapshot)[0], 5_000);

    fs::remove_file(tmp.path().join("d.zip")).unwrap();
    let snapshot = wait_update(&session, |s| s.total_size == 5_600);
    assert_eq!(snapshot.total_files, 4);
    assert!(!top_sizes(&snapshot).contains(&400));
}

#[test]
fn live_directory_removal_drops_the_subtree() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());
    let session = start_session(tmp.path(), &watching(), Arc::new(FsEnumerator)).unwrap();
    wait_finished(&session);

    fs::remove_dir_all(tmp.path().join("alpha")).unwrap();
    let snapshot = wait_update(&session, |s| s.total_directories == 1 && s.total_size == 700);
    assert_eq!(snapshot.total_files, 2);
    assert_eq!(top_sizes(&snapshot), vec![400, 300]);
}

#[test]
fn live_directory_moved_in_is_counted_with_its_contents() {
    let tmp = TempDir::new().unwrap();
    let outside = TempDir::new().unwrap();
    build_test_tree(tmp.path());

    let staged = outside.path().join("gamma");
    fs::create_dir_all(staged.join("deep")).unwrap();
    write_bytes(&staged.join("deep/x.bin"), 2_000);

    let session = start_session(tmp.path(), &watching(), Arc::new(FsEnumerator)).unwrap();
    wait_finished(&session);

    // Same filesystem, so this is a rename, not a copy.
    if fs::rename(&staged, tmp.path().join("gamma")).is_err() {
        return;
    }
    let snapshot = wait_update(&session, |s| s.total_size == 3_000);
    assert_eq!(snapshot.total_directories, 4);
    assert_eq!(snapshot.total_files, 5);
}

// ── Walk replayed through the adapter ────────────────────────────────────────

#[test]
fn walk_events_build_the_same_totals_as_the_filesystem() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());
    fs::create_dir_all(tmp.path().join("alpha/empty")).unwrap();

    let (tx, rx) = crossbeam_channel::unbounded();
    let summary = walk(tmp.path(), &FsEnumerator, &tx, &AtomicBool::new(false));
    drop(tx);
    assert_eq!(summary.files, 4);
    assert_eq!(summary.dirs, 3);

    let mut adapter = ChangeFeedAdapter::new(NormalizedPath::from_path(tmp.path()), 10);
    let mut finished = None;
    for event in rx {
        if let Outcome::Finished(snapshot) = adapter.handle(event) {
            finished = Some(snapshot);
        }
    }
    let snapshot = finished.expect("walk ends with Ready");
    assert_eq!(snapshot.total_size, 1_000);
    assert_eq!(snapshot.total_directories, 3);

    let tree = adapter.tree();
    assert_eq!(tree.arena().recount(tree.head()), tree.stats());
    let alpha = tree
        .find_directory(&NormalizedPath::from_path(&tmp.path().join("alpha")))
        .unwrap();
    let alpha = tree.node(alpha).unwrap();
    assert_eq!(alpha.size(), 300);
    assert_eq!(alpha.dir_count(), 1);
}
