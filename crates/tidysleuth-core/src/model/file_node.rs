/// A single node in the arena-allocated file tree.
///
/// Nodes live in a flat `Vec<FileNode>` and refer to each other by index,
/// so the tree can be shared across threads behind one lock and cloned
/// cheaply into analysis passes.
use compact_str::CompactString;
use std::time::SystemTime;

/// Lightweight index into the arena `Vec<FileNode>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    /// Create a new `NodeIndex` from a `usize`.
    #[inline]
    pub fn new(index: usize) -> Self {
        debug_assert!(index <= u32::MAX as usize, "NodeIndex overflow");
        Self(index as u32)
    }

    /// Return the index as a `usize` for Vec indexing.
    #[inline]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

/// A single file or directory discovered by the scanner.
#[derive(Debug, Clone)]
pub struct FileNode {
    /// Entry name only. Roots carry a display name; their absolute path
    /// lives in [`FileTree::root_paths`](super::FileTree::root_paths).
    pub name: CompactString,

    /// Logical size in bytes. For directories this is the sum of all
    /// descendant file sizes after [`aggregate_sizes`](super::FileTree::aggregate_sizes).
    pub size: u64,

    pub is_dir: bool,

    /// `None` for scan roots.
    pub parent: Option<NodeIndex>,

    /// Head of the child list (directories only).
    pub first_child: Option<NodeIndex>,

    pub next_sibling: Option<NodeIndex>,

    /// Number of descendant *files* (directories excluded).
    pub descendant_count: u64,

    /// Last-modified timestamp, used when ranking duplicate copies.
    pub modified: Option<SystemTime>,

    /// `true` if this entry could not be read. The node stays in the tree
    /// so reports can show where errors occurred, but it is never hashed,
    /// categorised, or moved.
    pub is_error: bool,
}

impl FileNode {
    pub fn new_file(name: CompactString, size: u64, parent: Option<NodeIndex>) -> Self {
        Self {
            name,
            size,
            is_dir: false,
            parent,
            first_child: None,
            next_sibling: None,
            descendant_count: 0,
            modified: None,
            is_error: false,
        }
    }

    pub fn new_dir(name: CompactString, parent: Option<NodeIndex>) -> Self {
        Self {
            is_dir: true,
            ..Self::new_file(name, 0, parent)
        }
    }

    /// Create an error placeholder node (e.g. access denied directory).
    pub fn new_error(name: CompactString, is_dir: bool, parent: Option<NodeIndex>) -> Self {
        Self {
            is_dir,
            is_error: true,
            ..Self::new_file(name, 0, parent)
        }
    }

    /// `true` for regular files that were read successfully.
    #[inline]
    pub fn is_readable_file(&self) -> bool {
        !self.is_dir && !self.is_error
    }

    /// Lowercased extension without the dot, or `""`.
    pub fn extension(&self) -> String {
        extension_of(&self.name)
    }
}

/// Lowercased extension of a file name without the dot, or `""`.
///
/// Dotfiles such as `.bashrc` have no extension.
pub fn extension_of(name: &str) -> String {
    match name.rfind('.') {
        Some(0) | None => String::new(),
        Some(pos) => name[pos + 1..].to_ascii_lowercase(),
    }
}
