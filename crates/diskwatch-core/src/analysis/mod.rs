/// Analysis modules: views derived from the live directory tree.
pub mod dir_listing;
pub mod top_files;

pub use dir_listing::{dir_listing, DirListItem, ItemKind};
pub use top_files::RankedFileList;
