/// Arena-backed file tree with O(n) bottom-up size aggregation.
///
/// All nodes live in a single `Vec<FileNode>`. Relationships between nodes
/// use `NodeIndex` rather than heap pointers. A tree may hold several roots
/// when more than one directory is scanned in a single run, which is what
/// lets duplicates be found *across* directories.
use super::file_node::{FileNode, NodeIndex};
use compact_str::CompactString;
use std::path::{Path, PathBuf};

/// The complete file tree produced by a scan.
#[derive(Debug, Clone, Default)]
pub struct FileTree {
    /// Arena: every node in a flat vector.
    pub nodes: Vec<FileNode>,

    /// Root node indices, one per scanned directory.
    pub roots: Vec<NodeIndex>,

    /// Absolute path of each root, parallel to `roots`.
    pub root_paths: Vec<PathBuf>,

    /// Total size of all readable files across all roots.
    pub total_size: u64,
}

impl FileTree {
    /// Create an empty tree with pre-allocated capacity.
    pub fn with_capacity(estimated_nodes: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(estimated_nodes),
            ..Self::default()
        }
    }

    /// Allocate a new node in the arena and return its index.
    pub fn add_node(&mut self, node: FileNode) -> NodeIndex {
        let idx = NodeIndex::new(self.nodes.len());
        self.nodes.push(node);
        idx
    }

    /// Add a scan root. The node is named after the last path component
    /// (or the whole path for filesystem roots like `/`).
    pub fn add_root(&mut self, path: &Path) -> NodeIndex {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        let idx = self.add_node(FileNode::new_dir(CompactString::new(&name), None));
        self.roots.push(idx);
        self.root_paths.push(path.to_path_buf());
        idx
    }

    /// Attach `child` as a child of `parent`, prepending to the sibling list.
    pub fn add_child(&mut self, parent: NodeIndex, child: NodeIndex) {
        let old_first = self.nodes[parent.idx()].first_child;
        self.nodes[child.idx()].next_sibling = old_first;
        self.nodes[child.idx()].parent = Some(parent);
        self.nodes[parent.idx()].first_child = Some(child);
    }

    /// Compute directory sizes and descendant file counts in one reverse pass.
    ///
    /// Children are always inserted after their parent, so iterating in
    /// reverse visits every child before its parent. Directory totals are
    /// reset first, so repeated calls do not accumulate.
    pub fn aggregate_sizes(&mut self) {
        for node in self.nodes.iter_mut().filter(|n| n.is_dir) {
            node.size = 0;
            node.descendant_count = 0;
        }

        for i in (0..self.nodes.len()).rev() {
            let node = &self.nodes[i];
            let (size, count) = if node.is_dir {
                (node.size, node.descendant_count)
            } else if node.is_error {
                (0, 0)
            } else {
                (node.size, 1)
            };
            if let Some(parent) = node.parent {
                let p = &mut self.nodes[parent.idx()];
                p.size += size;
                p.descendant_count += count;
            }
        }

        self.total_size = self.roots.iter().map(|r| self.nodes[r.idx()].size).sum();
    }

    /// Walk up from `index` to its scan root.
    pub fn root_of(&self, index: NodeIndex) -> NodeIndex {
        let mut current = index;
        while let Some(parent) = self.nodes[current.idx()].parent {
            current = parent;
        }
        current
    }

    /// Absolute path of the root that owns `index`.
    pub fn root_path_of(&self, index: NodeIndex) -> &Path {
        let root = self.root_of(index);
        let pos = self
            .roots
            .iter()
            .position(|&r| r == root)
            .unwrap_or_default();
        &self.root_paths[pos]
    }

    /// Display name of the root that owns `index`.
    pub fn root_name(&self, index: NodeIndex) -> &str {
        self.nodes[self.root_of(index).idx()].name.as_str()
    }

    /// Names from just below the root down to `index` (inclusive).
    fn segments_below_root(&self, index: NodeIndex) -> Vec<&str> {
        let mut segments = Vec::new();
        let mut current = index;
        while let Some(parent) = self.nodes[current.idx()].parent {
            segments.push(self.nodes[current.idx()].name.as_str());
            current = parent;
        }
        segments.reverse();
        segments
    }

    /// Path of `index` relative to its root. Empty for a root itself.
    pub fn relative_path(&self, index: NodeIndex) -> PathBuf {
        self.segments_below_root(index).iter().collect()
    }

    /// Reconstruct the absolute path of a node.
    pub fn full_path(&self, index: NodeIndex) -> PathBuf {
        self.root_path_of(index).join(self.relative_path(index))
    }

    /// Number of directory levels between the root and `index`.
    ///
    /// A file directly inside a root has depth 0, as does the root itself.
    pub fn depth(&self, index: NodeIndex) -> usize {
        self.segments_below_root(index).len().saturating_sub(1)
    }

    /// Iterate over every readable regular file.
    pub fn files(&self) -> impl Iterator<Item = (NodeIndex, &FileNode)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_readable_file())
            .map(|(i, n)| (NodeIndex::new(i), n))
    }

    /// Number of readable files.
    pub fn file_count(&self) -> u64 {
        self.files().count() as u64
    }

    /// Number of directories, roots included.
    pub fn dir_count(&self) -> u64 {
        self.nodes.iter().filter(|n| n.is_dir && !n.is_error).count() as u64
    }

    /// Number of error placeholder nodes.
    pub fn error_count(&self) -> u64 {
        self.nodes.iter().filter(|n| n.is_error).count() as u64
    }

    /// Direct children of a node (unsorted).
    pub fn children(&self, parent: NodeIndex) -> Vec<NodeIndex> {
        let mut children = Vec::new();
        let mut child = self.nodes[parent.idx()].first_child;
        while let Some(idx) = child {
            children.push(idx);
            child = self.nodes[idx.idx()].next_sibling;
        }
        children
    }

    #[inline]
    pub fn node(&self, index: NodeIndex) -> &FileNode {
        &self.nodes[index.idx()]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
