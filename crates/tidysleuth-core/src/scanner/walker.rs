/// Parallel directory walker using `jwalk`.
///
/// Uses `jwalk`'s rayon-backed traversal to walk each root and writes nodes
/// into a shared `LiveTree`.
///
/// # Lock-contention mitigation
///
/// Nodes are accumulated in a local `Vec<PendingEntry>` and flushed to the
/// shared tree under a **single write lock per batch** of `BATCH_SIZE`.
///
/// **NodeIndex pre-computation**: `FileTree::add_node` merely appends to a
/// `Vec`, so the index of a pending entry is always
/// `arena_base + position_in_pending_vec`. Directories are registered in
/// `dir_map` with that index immediately so children in the same batch can
/// find their parent without touching the lock.
use crate::model::{FileNode, NodeIndex};
use crate::scanner::progress::ScanProgress;
use crate::scanner::{LiveTree, ScanOptions};
use compact_str::CompactString;
use crossbeam_channel::Sender;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

const BATCH_SIZE: usize = 2_000;

/// Entries between cancellation checks.
const CANCEL_CHECK_INTERVAL: u64 = 1_000;

/// Entries between `ScanProgress::Update` messages.
const PROGRESS_INTERVAL: u64 = 5_000;

/// A node buffered locally before being flushed under one lock.
struct PendingEntry {
    node: FileNode,
    parent_idx: NodeIndex,
    pre_idx: NodeIndex,
}

/// Running counters shared across every root of one scan.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct WalkTotals {
    pub files: u64,
    pub dirs: u64,
    pub bytes: u64,
    pub errors: u64,
    pub symlinks: u64,
    pub entries: u64,
}

/// Drain `pending` into the shared tree under a single write-lock acquisition.
///
/// Returns the number of entries flushed so the caller can advance `arena_base`.
#[inline]
fn flush_pending(live_tree: &LiveTree, pending: &mut Vec<PendingEntry>) -> usize {
    let count = pending.len();
    if count == 0 {
        return 0;
    }
    let mut tree = live_tree.write();
    for pe in pending.drain(..) {
        let idx = tree.add_node(pe.node);
        debug_assert_eq!(idx, pe.pre_idx, "NodeIndex pre-computation drift");
        tree.add_child(pe.parent_idx, idx);
    }
    count
}

/// `true` if a single path component matches one of the exclusion patterns.
///
/// Patterns match a whole component exactly, or as a prefix when they end
/// with `*` (`tidysleuth-quarantine*`).
pub fn is_excluded(component: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| match pattern.strip_suffix('*') {
        Some(prefix) => component.starts_with(prefix),
        None => component == pattern,
    })
}

/// Walk one root, appending its nodes to `live_tree`.
///
/// Returns `false` if the walk stopped because `cancel_flag` was raised.
pub(crate) fn walk_root(
    root_path: &Path,
    options: &ScanOptions,
    progress_tx: &Sender<ScanProgress>,
    cancel_flag: &AtomicBool,
    live_tree: &LiveTree,
    totals: &mut WalkTotals,
) -> bool {
    let root_idx = live_tree.write().add_root(root_path);
    totals.dirs += 1;

    // Scan-lifetime map from directory path to its arena index.
    let mut dir_map: HashMap<PathBuf, NodeIndex> = HashMap::with_capacity(10_000);
    dir_map.insert(root_path.to_path_buf(), root_idx);

    let mut pending: Vec<PendingEntry> = Vec::with_capacity(BATCH_SIZE + 64);
    let mut arena_base: usize = root_idx.idx() + 1;

    let exclude = Arc::new(options.exclude.clone());
    let mut walker = jwalk::WalkDir::new(root_path)
        .skip_hidden(!options.include_hidden)
        .follow_links(false)
        .parallelism(jwalk::Parallelism::RayonNewPool(num_cpus::get()))
        .process_read_dir(move |_depth, _path, _state, children| {
            children.retain(|child| match child {
                Ok(entry) => !is_excluded(&entry.file_name().to_string_lossy(), &exclude),
                Err(_) => true,
            });
        });
    if let Some(depth) = options.max_depth {
        walker = walker.max_depth(depth);
    }

    for entry_result in walker {
        totals.entries += 1;
        if totals.entries % CANCEL_CHECK_INTERVAL == 0 && cancel_flag.load(Ordering::Relaxed) {
            flush_pending(live_tree, &mut pending);
            return false;
        }

        let entry = match entry_result {
            Ok(e) => e,
            Err(err) => {
                arena_base += flush_pending(live_tree, &mut pending);
                totals.errors += 1;

                // jwalk errors are typically unreadable directories; keep a
                // placeholder so reports can show where the hole is.
                if let Some(entry_path) = err.path() {
                    let parent_idx = entry_path
                        .parent()
                        .and_then(|p| dir_map.get(p).copied());
                    if let (Some(pidx), Some(name)) = (parent_idx, entry_path.file_name()) {
                        let error_node = FileNode::new_error(
                            CompactString::new(name.to_string_lossy()),
                            true,
                            Some(pidx),
                        );
                        let mut tree = live_tree.write();
                        let idx = tree.add_node(error_node);
                        tree.add_child(pidx, idx);
                        arena_base += 1;
                    }
                }

                let _ = progress_tx.send(ScanProgress::Error {
                    path: err
                        .path()
                        .map(|p| p.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    message: err.to_string(),
                });
                continue;
            }
        };

        let path = entry.path();
        if path == root_path {
            continue;
        }

        let file_type = entry.file_type();
        if file_type.is_symlink() {
            totals.symlinks += 1;
            continue;
        }

        let Some(parent_path) = path.parent() else {
            continue;
        };

        let parent_idx = match dir_map.get(parent_path) {
            Some(&idx) => idx,
            None => {
                arena_base += flush_pending(live_tree, &mut pending);
                ensure_ancestors(
                    live_tree,
                    &mut dir_map,
                    parent_path,
                    root_path,
                    root_idx,
                    &mut arena_base,
                )
            }
        };

        let pre_idx = NodeIndex::new(arena_base + pending.len());
        let file_name = entry.file_name().to_string_lossy();

        if file_type.is_dir() {
            let dir_node = FileNode::new_dir(CompactString::new(&file_name), Some(parent_idx));
            dir_map.insert(path.clone(), pre_idx);
            pending.push(PendingEntry {
                node: dir_node,
                parent_idx,
                pre_idx,
            });
            totals.dirs += 1;
        } else {
            // Stat outside the lock; this is the expensive syscall.
            let node = match std::fs::symlink_metadata(&path) {
                Ok(meta) => {
                    totals.files += 1;
                    totals.bytes += meta.len();
                    let mut node =
                        FileNode::new_file(CompactString::new(&file_name), meta.len(), Some(parent_idx));
                    node.modified = meta.modified().ok();
                    node
                }
                Err(err) => {
                    totals.errors += 1;
                    let _ = progress_tx.send(ScanProgress::Error {
                        path: path.to_string_lossy().into_owned(),
                        message: err.to_string(),
                    });
                    FileNode::new_error(CompactString::new(&file_name), false, Some(parent_idx))
                }
            };
            pending.push(PendingEntry {
                node,
                parent_idx,
                pre_idx,
            });
        }

        if pending.len() >= BATCH_SIZE {
            arena_base += flush_pending(live_tree, &mut pending);
        }

        if totals.entries % PROGRESS_INTERVAL == 0 {
            arena_base += flush_pending(live_tree, &mut pending);
            let _ = progress_tx.send(ScanProgress::Update {
                files_found: totals.files,
                dirs_found: totals.dirs,
                total_size: totals.bytes,
                current_path: path.to_string_lossy().into_owned(),
            });
        }
    }

    flush_pending(live_tree, &mut pending);
    debug!(
        root = %root_path.display(),
        files = totals.files,
        dirs = totals.dirs,
        "walk finished"
    );
    true
}

/// Ensure all ancestor directories of `target` exist in the tree and `dir_map`.
///
/// Only reached when jwalk yields an entry before its parent directory,
/// which can happen on very wide trees. `arena_base` is advanced for every
/// inserted node so the caller's index pre-computation stays exact.
fn ensure_ancestors(
    live_tree: &LiveTree,
    dir_map: &mut HashMap<PathBuf, NodeIndex>,
    target: &Path,
    root_path: &Path,
    root_idx: NodeIndex,
    arena_base: &mut usize,
) -> NodeIndex {
    let mut missing: Vec<PathBuf> = Vec::new();
    let mut current = target.to_path_buf();

    while !dir_map.contains_key(&current) && current != root_path {
        missing.push(current.clone());
        match current.parent() {
            Some(p) => current = p.to_path_buf(),
            None => break,
        }
    }

    let mut parent_idx = dir_map.get(&current).copied().unwrap_or(root_idx);

    for ancestor in missing.into_iter().rev() {
        let name = ancestor
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir_node = FileNode::new_dir(CompactString::new(&name), Some(parent_idx));
        let idx = {
            let mut tree = live_tree.write();
            let idx = tree.add_node(dir_node);
            tree.add_child(parent_idx, idx);
            idx
        };
        *arena_base += 1;
        dir_map.insert(ancestor, idx);
        parent_idx = idx;
    }

    parent_idx
}
