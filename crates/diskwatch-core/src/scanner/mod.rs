/// Scanner module: the input side of a scan session.
///
/// - `event`: the `FsEvent` change-feed vocabulary shared by the walk and
///   the live watcher.
/// - `enumerator`: the `Enumerator` trait and its `walkdir` implementation.
/// - `walk`: depth-first enumeration emitted as synthetic events, for the
///   initial scan and for directories that appear later.
pub mod enumerator;
pub mod event;
pub mod walk;

pub use enumerator::{Entry, Enumerator, FsEnumerator, WalkEntry};
pub use event::{FileMeta, FsEvent};
pub use walk::{walk, walk_subtree, WalkSummary};
