/// Change feed adapter: applies `FsEvent`s to the tree and the top-files
/// ranker, one at a time, in arrival order.
///
/// The adapter is the only mutator of a session's data. Before `Ready` it
/// silently builds the tree; the ranker does not exist yet. `Ready` builds
/// the ranker from every file in the tree and reports `Finished`. After
/// that, each event that actually changes something reports `Updated`, and
/// the caller decides how often to tell the outside world.
use super::messages::ScanSnapshot;
use crate::analysis::{dir_listing, DirListItem, RankedFileList};
use crate::model::{DirectoryTree, FileInfo, NormalizedPath};
use crate::scanner::{FileMeta, FsEvent};
use std::path::Path;
use tracing::{debug, warn};

/// Result of handling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing observable changed, or the initial walk is still running.
    Unchanged,
    /// The settled tree changed.
    Updated,
    /// `Ready` arrived; the snapshot includes the first top-files page.
    Finished(ScanSnapshot),
    /// The producer reported a problem. The tree is untouched.
    Failed {
        path: Option<String>,
        message: String,
    },
}

#[derive(Debug)]
pub struct ChangeFeedAdapter {
    tree: DirectoryTree,
    ranker: Option<RankedFileList>,
    settled: bool,
    page: usize,
    page_step: usize,
}

impl ChangeFeedAdapter {
    /// `page_step` is both the initial top-files page and the growth per
    /// [`show_more`](ChangeFeedAdapter::show_more).
    pub fn new(root: NormalizedPath, page_step: usize) -> Self {
        Self {
            tree: DirectoryTree::new(root),
            ranker: None,
            settled: false,
            page: page_step,
            page_step,
        }
    }

    pub fn handle(&mut self, event: FsEvent) -> Outcome {
        let changed = match event {
            FsEvent::FileAdded { path, meta } => self.file_added(&path, meta),
            FsEvent::FileChanged { path, meta } => self.file_changed(&path, meta),
            FsEvent::FileRemoved { path } => self.file_removed(&path),
            FsEvent::DirAdded { path } => self.dir_added(&path),
            FsEvent::DirRemoved { path } => self.dir_removed(&path),
            FsEvent::Ready => return Outcome::Finished(self.settle()),
            FsEvent::Error { path, message } => {
                let path = path.map(|p| p.display().to_string());
                warn!(
                    "scan error at {}: {message}",
                    path.as_deref().unwrap_or("<unknown>")
                );
                return Outcome::Failed { path, message };
            }
        };
        if changed && self.settled {
            Outcome::Updated
        } else {
            Outcome::Unchanged
        }
    }

    /// Grow the reported top-files page by one step.
    pub fn show_more(&mut self) {
        self.page = self.page.saturating_add(self.page_step);
    }

    pub fn listing(&self, path: &NormalizedPath) -> Vec<DirListItem> {
        dir_listing(&self.tree, path)
    }

    pub fn snapshot(&self) -> ScanSnapshot {
        ScanSnapshot::from_stats(
            self.tree.stats(),
            self.ranker
                .as_ref()
                .map(|ranked| ranked.get_range(self.page).to_vec()),
        )
    }

    pub fn tree(&self) -> &DirectoryTree {
        &self.tree
    }

    pub fn ranker(&self) -> Option<&RankedFileList> {
        self.ranker.as_ref()
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Mark the initial walk complete and (re)build the ranker.
    fn settle(&mut self) -> ScanSnapshot {
        self.settled = true;
        let files: Vec<FileInfo> = self.tree.files().into_iter().cloned().collect();
        debug!("ready: ranking {} files", files.len());
        self.ranker = Some(RankedFileList::new(files, false));
        self.snapshot()
    }

    fn file_added(&mut self, path: &Path, meta: Option<FileMeta>) -> bool {
        let Some(meta) = meta else {
            debug!("file-added without metadata ignored: {}", path.display());
            return false;
        };
        let key = NormalizedPath::from_path(path);
        let info = FileInfo::new(key.clone(), meta.size).with_modified(meta.modified);

        // A watcher may report a create for a file the walk already saw.
        let differs = self.tree.find_file(&key).map(|existing| existing.info != info);
        if let Some(differs) = differs {
            return differs && self.apply_update(&key, info);
        }

        if self.tree.add_file(&key, info.clone()).is_none() {
            return false;
        }
        if let Some(ranker) = &mut self.ranker {
            ranker.add(info);
        }
        true
    }

    fn file_changed(&mut self, path: &Path, meta: Option<FileMeta>) -> bool {
        let Some(meta) = meta else {
            return false;
        };
        let key = NormalizedPath::from_path(path);
        let info = FileInfo::new(key.clone(), meta.size).with_modified(meta.modified);
        self.apply_update(&key, info)
    }

    fn apply_update(&mut self, key: &NormalizedPath, info: FileInfo) -> bool {
        if self.tree.update_file(key, info.clone()).is_none() {
            return false;
        }
        if let Some(ranker) = &mut self.ranker {
            ranker.update(info);
        }
        true
    }

    fn file_removed(&mut self, path: &Path) -> bool {
        let key = NormalizedPath::from_path(path);
        let Some(removed) = self.tree.remove_file(&key) else {
            return false;
        };
        if let Some(ranker) = &mut self.ranker {
            ranker.remove(&removed.info);
        }
        true
    }

    fn dir_added(&mut self, path: &Path) -> bool {
        let key = NormalizedPath::from_path(path);
        if self.tree.find_directory(&key).is_some() {
            return false;
        }
        self.tree.add_empty_directory(&key).is_some()
    }

    /// Detach the subtree, drop its files from the ranker, then free it.
    fn dir_removed(&mut self, path: &Path) -> bool {
        let key = NormalizedPath::from_path(path);
        let Some(detached) = self.tree.remove_directory(&key) else {
            return false;
        };
        if let Some(ranker) = &mut self.ranker {
            for info in self.tree.arena().files_in_order(detached) {
                ranker.remove_path(&info.path);
            }
        }
        self.tree.release(detached);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime};

    fn added(path: &str, size: u64) -> FsEvent {
        FsEvent::FileAdded {
            path: PathBuf::from(path),
            meta: Some(FileMeta::new(size, None)),
        }
    }

    fn changed(path: &str, size: u64) -> FsEvent {
        FsEvent::FileChanged {
            path: PathBuf::from(path),
            meta: Some(FileMeta::new(size, None)),
        }
    }

    fn adapter() -> ChangeFeedAdapter {
        ChangeFeedAdapter::new(NormalizedPath::new("/r"), 2)
    }

    fn top_sizes(adapter: &ChangeFeedAdapter) -> Vec<u64> {
        adapter
            .snapshot()
            .top_files
            .unwrap_or_default()
            .iter()
            .map(|f| f.size)
            .collect()
    }

    #[test]
    fn initial_walk_is_silent_until_ready() {
        let mut a = adapter();
        assert_eq!(a.handle(FsEvent::DirAdded { path: "/r/d".into() }), Outcome::Unchanged);
        assert_eq!(a.handle(added("/r/d/x", 10)), Outcome::Unchanged);
        assert_eq!(a.handle(added("/r/y", 30)), Outcome::Unchanged);
        assert!(a.ranker().is_none());
        assert_eq!(a.snapshot().top_files, None);

        let Outcome::Finished(snapshot) = a.handle(FsEvent::Ready) else {
            panic!("ready must finish the scan");
        };
        assert_eq!(snapshot.total_size, 40);
        assert_eq!(snapshot.total_files, 2);
        assert_eq!(snapshot.total_directories, 1);
        assert_eq!(top_sizes(&a), vec![30, 10]);
    }

    #[test]
    fn settled_changes_report_updates_and_keep_ranker_in_step() {
        let mut a = adapter();
        a.handle(added("/r/a", 10));
        a.handle(added("/r/b", 20));
        a.handle(FsEvent::Ready);

        assert_eq!(a.handle(added("/r/c", 50)), Outcome::Updated);
        assert_eq!(top_sizes(&a), vec![50, 20]);

        assert_eq!(a.handle(changed("/r/a", 70)), Outcome::Updated);
        assert_eq!(top_sizes(&a), vec![70, 50]);

        assert_eq!(
            a.handle(FsEvent::FileRemoved { path: "/r/a".into() }),
            Outcome::Updated
        );
        assert_eq!(top_sizes(&a), vec![50, 20]);
        assert_eq!(a.snapshot().total_size, 70);
    }

    #[test]
    fn redundant_events_are_unchanged() {
        let mut a = adapter();
        a.handle(added("/r/a", 10));
        a.handle(FsEvent::Ready);

        assert_eq!(a.handle(added("/r/a", 10)), Outcome::Unchanged);
        assert_eq!(a.handle(changed("/r/a", 10)), Outcome::Unchanged);
        assert_eq!(a.handle(changed("/r/unknown", 10)), Outcome::Unchanged);
        assert_eq!(
            a.handle(FsEvent::FileRemoved { path: "/r/unknown".into() }),
            Outcome::Unchanged
        );
        assert_eq!(
            a.handle(FsEvent::DirRemoved { path: "/r/a".into() }),
            Outcome::Unchanged
        );
        assert_eq!(a.handle(FsEvent::DirAdded { path: "/r".into() }), Outcome::Unchanged);
    }

    #[test]
    fn readded_file_with_new_metadata_is_an_update() {
        let mut a = adapter();
        a.handle(added("/r/a", 10));
        a.handle(FsEvent::Ready);

        assert_eq!(a.handle(added("/r/a", 15)), Outcome::Updated);
        assert_eq!(a.snapshot().total_size, 15);
        assert_eq!(a.snapshot().total_files, 1);
        assert_eq!(top_sizes(&a), vec![15]);
    }

    #[test]
    fn modification_time_is_kept() {
        let mut a = adapter();
        let when = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        a.handle(FsEvent::FileAdded {
            path: "/r/a".into(),
            meta: Some(FileMeta::new(1, Some(when))),
        });
        let file = a.tree().find_file(&NormalizedPath::new("/r/a")).unwrap();
        assert_eq!(file.info.last_modified.map(|t| t.timestamp()), Some(1_700_000_000));
    }

    #[test]
    fn missing_metadata_and_foreign_paths_are_ignored() {
        let mut a = adapter();
        a.handle(FsEvent::Ready);
        assert_eq!(
            a.handle(FsEvent::FileAdded {
                path: "/r/a".into(),
                meta: None
            }),
            Outcome::Unchanged
        );
        assert_eq!(a.handle(added("/elsewhere/a", 5)), Outcome::Unchanged);
        assert_eq!(
            a.handle(FsEvent::DirAdded { path: "/elsewhere/d".into() }),
            Outcome::Unchanged
        );
        assert_eq!(a.snapshot().total_files, 0);
        assert_eq!(a.tree().stats().dir_count, 0);
    }

    #[test]
    fn removing_a_directory_drops_its_files_from_the_ranking() {
        let mut a = adapter();
        a.handle(added("/r/keep", 1));
        a.handle(added("/r/d/big", 100));
        a.handle(added("/r/d/e/bigger", 200));
        a.handle(FsEvent::Ready);
        assert_eq!(top_sizes(&a), vec![200, 100]);

        assert_eq!(a.handle(FsEvent::DirRemoved { path: "/r/d".into() }), Outcome::Updated);
        assert_eq!(top_sizes(&a), vec![1]);
        let snapshot = a.snapshot();
        assert_eq!(snapshot.total_size, 1);
        assert_eq!(snapshot.total_directories, 0);
        assert_eq!(a.tree().arena().len(), 1);
    }

    #[test]
    fn errors_fail_without_touching_the_tree() {
        let mut a = adapter();
        a.handle(added("/r/a", 3));
        let outcome = a.handle(FsEvent::Error {
            path: Some("/r/locked".into()),
            message: "permission denied".into(),
        });
        assert_eq!(
            outcome,
            Outcome::Failed {
                path: Some("/r/locked".into()),
                message: "permission denied".into()
            }
        );
        assert_eq!(a.snapshot().total_size, 3);
    }

    #[test]
    fn show_more_grows_the_page() {
        let mut a = adapter();
        for (i, size) in [5u64, 4, 3, 2, 1].into_iter().enumerate() {
            a.handle(added(&format!("/r/f{i}"), size));
        }
        a.handle(FsEvent::Ready);
        assert_eq!(top_sizes(&a), vec![5, 4]);
        a.show_more();
        assert_eq!(a.page(), 4);
        assert_eq!(top_sizes(&a), vec![5, 4, 3, 2]);
    }

    #[test]
    fn repeated_ready_rebuilds_the_ranking() {
        let mut a = adapter();
        a.handle(added("/r/a", 1));
        a.handle(FsEvent::Ready);
        a.handle(added("/r/b", 2));
        let Outcome::Finished(snapshot) = a.handle(FsEvent::Ready) else {
            panic!("ready must finish the scan");
        };
        assert_eq!(snapshot.top_files.map(|f| f.len()), Some(2));
        assert_eq!(a.ranker().map(RankedFileList::len), Some(2));
    }

    #[test]
    fn listing_reflects_the_live_tree() {
        let mut a = adapter();
        a.handle(added("/r/d/x", 7));
        a.handle(added("/r/y", 2));
        let items = a.listing(&NormalizedPath::new("/r"));
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["d", "y"]);
    }

    #[cfg(unix)]
    #[test]
    fn backslash_in_a_file_name_is_not_a_directory() {
        let mut a = adapter();
        a.handle(added("/r/report\\2024.txt", 5));
        let Outcome::Finished(snapshot) = a.handle(FsEvent::Ready) else {
            panic!("ready must finish");
        };
        assert_eq!((snapshot.total_files, snapshot.total_directories), (1, 0));

        let items = a.listing(&NormalizedPath::new("/r"));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, crate::analysis::ItemKind::File);
        assert_eq!(items[0].name, "report\\2024.txt");
    }
}
