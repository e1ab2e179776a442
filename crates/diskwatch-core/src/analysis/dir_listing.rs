/// Immediate contents of one directory, largest first.
///
/// Feeds a drill-down explorer: each row is a direct child, folders carry
/// their rolled-up size plus how many direct children they hold.
use crate::model::{DirectoryTree, NormalizedPath};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Folder,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirListItem {
    pub kind: ItemKind,
    pub name: String,
    /// File size, or the folder's whole-subtree size.
    pub size: u64,
    /// Direct children (files + folders) for folders; `None` for files.
    pub item_count: Option<u64>,
}

/// List the directory at `path`. Unknown or foreign paths give an empty
/// list.
///
/// Sorted by size descending; ties keep files ahead of folders, then name
/// order.
pub fn dir_listing(tree: &DirectoryTree, path: &NormalizedPath) -> Vec<DirListItem> {
    let Some(dir) = tree.find_directory(path).and_then(|index| tree.node(index)) else {
        return Vec::new();
    };

    let mut items: Vec<DirListItem> =
        Vec::with_capacity(dir.num_files() + dir.num_directories());

    items.extend(dir.files().map(|f| DirListItem {
        kind: ItemKind::File,
        name: f.name.to_string(),
        size: f.size(),
        item_count: None,
    }));

    items.extend(dir.directories().filter_map(|(name, child)| {
        let child = tree.node(child)?;
        Some(DirListItem {
            kind: ItemKind::Folder,
            name: name.to_owned(),
            size: child.size(),
            item_count: Some((child.num_files() + child.num_directories()) as u64),
        })
    }));

    // Stable: equal sizes keep the files-then-folders insertion order.
    items.sort_by(|a, b| b.size.cmp(&a.size));
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileInfo;

    fn p(raw: &str) -> NormalizedPath {
        NormalizedPath::new(raw)
    }

    fn add(tree: &mut DirectoryTree, path: &str, size: u64) {
        tree.add_file(&p(path), FileInfo::new(p(path), size));
    }

    #[test]
    fn lists_children_largest_first() {
        let mut tree = DirectoryTree::new(p("/r"));
        add(&mut tree, "/r/small.txt", 10);
        add(&mut tree, "/r/big.iso", 5_000);
        add(&mut tree, "/r/photos/a.jpg", 300);
        add(&mut tree, "/r/photos/b.jpg", 400);
        tree.add_empty_directory(&p("/r/photos/raw"));

        let items = dir_listing(&tree, &p("/r"));
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["big.iso", "photos", "small.txt"]);

        let photos = &items[1];
        assert_eq!(photos.kind, ItemKind::Folder);
        assert_eq!(photos.size, 700);
        assert_eq!(photos.item_count, Some(3));
        assert_eq!(items[0].item_count, None);
    }

    #[test]
    fn unknown_directory_is_empty() {
        let tree = DirectoryTree::new(p("/r"));
        assert!(dir_listing(&tree, &p("/r/missing")).is_empty());
        assert!(dir_listing(&tree, &p("/elsewhere")).is_empty());
    }
}
