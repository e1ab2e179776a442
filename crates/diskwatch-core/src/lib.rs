/// DiskWatch Core: live directory-size tracking, analysis, and data model.
///
/// This crate contains all business logic with zero UI dependencies. A scan
/// session walks a root once, then keeps following filesystem changes, and
/// the totals for every directory stay correct after each change without
/// re-scanning.
///
/// # Modules
///
/// - [`model`]: arena-allocated directory tree with incrementally
///   maintained totals.
/// - [`analysis`]: the live top-files ranking and directory listings.
/// - [`scanner`]: change-feed events, the entry enumerator, and the initial walk.
/// - [`monitor`]: live change feed backed by `notify`.
/// - [`session`]: the worker that applies events and reports snapshots.
/// - [`config`]: session settings and their JSON loader.
/// - [`error`]: error types.
pub mod analysis;
pub mod config;
pub mod error;
pub mod model;
pub mod monitor;
pub mod scanner;
pub mod session;

pub use config::SessionConfig;
pub use error::{ConsistencyError, CoreError, EnumerateError};
pub use session::{
    start_session, ScanController, ScanMessage, ScanSnapshot, SessionCommand, SessionHandle,
};
