/// Duplicate file detection (size first, then prefix hash, then full hash).
///
/// 1. Group files by exact size. Files with a unique size cannot be
///    duplicates and are never opened.
/// 2. For sizes larger than `partial_bytes`, hash only the first
///    `partial_bytes` and drop buckets that become singletons.
/// 3. Hash the full content of the survivors. Every (size, digest) bucket
///    with two or more members is a duplicate group.
///
/// Hashing runs on the rayon pool. A file that cannot be read is reported
/// in [`DuplicateScan::hash_failures`] and never joins a group.
use crate::error::{Error, Result};
use crate::hashing::{hash_file, hash_prefix, HashAlgorithm};
use crate::model::{FileTree, NodeIndex};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// Tunables for [`find_duplicates`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicateOptions {
    pub algorithm: HashAlgorithm,
    /// Files smaller than this are ignored. The default of 1 skips empty
    /// files, which are all trivially identical.
    pub min_size: u64,
    /// Prefix length for the stage-2 hash. `0` disables the stage.
    pub partial_bytes: u64,
}

impl Default for DuplicateOptions {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::Md5,
            min_size: 1,
            partial_bytes: 4096,
        }
    }
}

/// One member of a duplicate group.
#[derive(Debug, Clone)]
pub struct DuplicateFile {
    pub index: NodeIndex,
    pub path: PathBuf,
    /// Path below the scan root.
    pub relative: PathBuf,
    /// Display name of the scan root the file was found under.
    pub root: String,
    pub depth: usize,
    pub modified: Option<SystemTime>,
    /// Keeper score, filled in by [`rank_group`](super::keeper::rank_group).
    pub score: i64,
    pub reasons: Vec<String>,
}

/// A set of files with identical size and content digest.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub hash: String,
    pub size: u64,
    /// Members. After ranking, `files[0]` is the copy to keep.
    pub files: Vec<DuplicateFile>,
}

impl DuplicateGroup {
    /// Bytes reclaimable by keeping a single copy.
    pub fn wasted_bytes(&self) -> u64 {
        self.size * (self.files.len() as u64).saturating_sub(1)
    }

    pub fn keeper(&self) -> &DuplicateFile {
        &self.files[0]
    }

    pub fn redundant(&self) -> &[DuplicateFile] {
        &self.files[1..]
    }
}

/// A file that could not be hashed.
#[derive(Debug, Clone, Serialize)]
pub struct HashFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Result of a duplicate search.
#[derive(Debug, Clone)]
pub struct DuplicateScan {
    pub algorithm: HashAlgorithm,
    /// Files at or above `min_size`.
    pub files_considered: u64,
    /// Files whose full content was hashed.
    pub files_hashed: u64,
    pub groups: Vec<DuplicateGroup>,
    pub hash_failures: Vec<HashFailure>,
}

impl DuplicateScan {
    pub fn wasted_bytes(&self) -> u64 {
        self.groups.iter().map(DuplicateGroup::wasted_bytes).sum()
    }

    pub fn redundant_files(&self) -> u64 {
        self.groups.iter().map(|g| g.files.len() as u64 - 1).sum()
    }
}

#[derive(Clone)]
struct Candidate {
    index: NodeIndex,
    size: u64,
    path: PathBuf,
}

/// Find duplicate files in the tree.
///
/// Returns `Error::Cancelled` if `cancel` is raised while hashing.
pub fn find_duplicates(
    tree: &FileTree,
    options: &DuplicateOptions,
    cancel: &AtomicBool,
) -> Result<DuplicateScan> {
    let algorithm = options.algorithm;
    let mut failures = Vec::new();

    // Stage 1: size buckets.
    let mut by_size: HashMap<u64, Vec<NodeIndex>> = HashMap::new();
    let mut files_considered = 0u64;
    for (idx, node) in tree.files() {
        if node.size < options.min_size {
            continue;
        }
        files_considered += 1;
        by_size.entry(node.size).or_default().push(idx);
    }
    let candidates: Vec<Candidate> = by_size
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .flat_map(|(size, members)| {
            members.into_iter().map(move |index| (size, index))
        })
        .map(|(size, index)| Candidate {
            index,
            size,
            path: tree.full_path(index),
        })
        .collect();
    debug!(
        considered = files_considered,
        candidates = candidates.len(),
        "size grouping done"
    );

    // Stage 2: prefix hash for files big enough for it to matter.
    let partial = options.partial_bytes;
    let (large, small): (Vec<Candidate>, Vec<Candidate>) = candidates
        .into_iter()
        .partition(|c| partial > 0 && c.size > partial);

    let prefixed = hash_all(&large, cancel, |path| hash_prefix(path, algorithm, partial))?;
    let mut survivors = small;
    survivors.extend(keep_shared_buckets(prefixed, &mut failures));

    // Stage 3: full content hash.
    let hashed = hash_all(&survivors, cancel, |path| hash_file(path, algorithm))?;
    let files_hashed = hashed.iter().filter(|(_, r)| r.is_ok()).count() as u64;

    let mut buckets: HashMap<(u64, String), Vec<Candidate>> = HashMap::new();
    for (candidate, result) in hashed {
        match result {
            Ok(digest) => buckets
                .entry((candidate.size, digest))
                .or_default()
                .push(candidate),
            Err(message) => failures.push(HashFailure {
                path: candidate.path,
                message,
            }),
        }
    }

    let mut groups: Vec<DuplicateGroup> = buckets
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|((size, hash), members)| {
            let mut files: Vec<DuplicateFile> = members
                .into_iter()
                .map(|c| DuplicateFile {
                    index: c.index,
                    relative: tree.relative_path(c.index),
                    root: tree.root_name(c.index).to_owned(),
                    depth: tree.depth(c.index),
                    modified: tree.node(c.index).modified,
                    path: c.path,
                    score: 0,
                    reasons: Vec::new(),
                })
                .collect();
            files.sort_by(|a, b| a.path.cmp(&b.path));
            DuplicateGroup { hash, size, files }
        })
        .collect();

    groups.sort_by(|a, b| {
        b.wasted_bytes()
            .cmp(&a.wasted_bytes())
            .then_with(|| a.hash.cmp(&b.hash))
    });
    failures.sort_by(|a, b| a.path.cmp(&b.path));

    info!(
        groups = groups.len(),
        hashed = files_hashed,
        failures = failures.len(),
        "duplicate search complete"
    );

    Ok(DuplicateScan {
        algorithm,
        files_considered,
        files_hashed,
        groups,
        hash_failures: failures,
    })
}

/// Hash every candidate in parallel, honouring the cancel flag between files.
fn hash_all<F>(
    candidates: &[Candidate],
    cancel: &AtomicBool,
    hasher: F,
) -> Result<Vec<(Candidate, std::result::Result<String, String>)>>
where
    F: Fn(&Path) -> std::io::Result<String> + Sync,
{
    let results: Vec<Option<(Candidate, std::result::Result<String, String>)>> = candidates
        .par_iter()
        .map(|c| {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            let outcome = hasher(&c.path).map_err(|e| {
                warn!("cannot hash {}: {e}", c.path.display());
                e.to_string()
            });
            Some((c.clone(), outcome))
        })
        .collect();

    if cancel.load(Ordering::Relaxed) {
        return Err(Error::Cancelled);
    }
    Ok(results.into_iter().flatten().collect())
}

/// Keep candidates whose (size, prefix digest) bucket has more than one member.
fn keep_shared_buckets(
    hashed: Vec<(Candidate, std::result::Result<String, String>)>,
    failures: &mut Vec<HashFailure>,
) -> Vec<Candidate> {
    let mut buckets: HashMap<(u64, String), Vec<Candidate>> = HashMap::new();
    for (candidate, result) in hashed {
        match result {
            Ok(digest) => buckets
                .entry((candidate.size, digest))
                .or_default()
                .push(candidate),
            Err(message) => failures.push(HashFailure {
                path: candidate.path,
                message,
            }),
        }
    }
    buckets
        .into_values()
        .filter(|members| members.len() > 1)
        .flatten()
        .collect()
}
