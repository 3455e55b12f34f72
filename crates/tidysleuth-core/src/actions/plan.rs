/// Planners that turn analysis results into [`Plan`]s.
use super::{Action, ActionKind, Plan};
use crate::analysis::categorize::CategorizedFile;
use crate::analysis::duplicates::DuplicateGroup;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganizeMode {
    Move,
    Copy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupeMode {
    /// Move redundant copies under this directory.
    Quarantine(PathBuf),
    Delete,
}

/// Pick a destination that neither exists on disk nor is already claimed,
/// appending `_1`, `_2`, … to the stem as needed.
fn unique_destination(candidate: PathBuf, claimed: &mut HashSet<PathBuf>) -> PathBuf {
    let taken = |p: &Path, claimed: &HashSet<PathBuf>| {
        claimed.contains(p) || p.symlink_metadata().is_ok()
    };
    if !taken(&candidate, claimed) {
        claimed.insert(candidate.clone());
        return candidate;
    }

    let parent = candidate.parent().map(Path::to_path_buf).unwrap_or_default();
    let stem = candidate
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = candidate
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut n = 1u32;
    loop {
        let next = parent.join(format!("{stem}_{n}{ext}"));
        if !taken(&next, claimed) {
            claimed.insert(next.clone());
            return next;
        }
        n += 1;
    }
}

/// Sort categorised files into `dest/<category>/<file name>`.
///
/// Files already inside `dest` are left alone, so organising the same
/// directory twice is a no-op.
pub fn plan_organize(files: &[CategorizedFile], dest: &Path, mode: OrganizeMode) -> Plan {
    let dest = dest.canonicalize().unwrap_or_else(|_| dest.to_path_buf());
    let kind = match mode {
        OrganizeMode::Move => ActionKind::Move,
        OrganizeMode::Copy => ActionKind::Copy,
    };

    let mut claimed = HashSet::new();
    let mut actions = Vec::new();
    for file in files {
        if file.path.starts_with(&dest) {
            continue;
        }
        let Some(name) = file.path.file_name() else { continue };
        let target = unique_destination(dest.join(&file.category).join(name), &mut claimed);
        actions.push(Action {
            kind,
            source: file.path.clone(),
            destination: Some(target),
            keeper: None,
            size: file.size,
        });
    }

    debug!(actions = actions.len(), "organize plan built");
    Plan { actions }
}

/// One action per redundant member of each (ranked) group.
///
/// Groups must already be ranked: `files[0]` is kept and recorded as the
/// keeper of every other member. A member whose path is any group's keeper,
/// or that is already planned, is never acted on.
pub fn plan_dedupe(groups: &[DuplicateGroup], mode: &DedupeMode) -> Plan {
    let keepers: HashSet<&Path> = groups.iter().map(|g| g.keeper().path.as_path()).collect();
    let mut claimed = HashSet::new();
    let mut planned: HashSet<&Path> = HashSet::new();
    let mut actions = Vec::new();

    for group in groups {
        let keeper = group.keeper().path.clone();
        for file in group.redundant() {
            if keepers.contains(file.path.as_path()) || !planned.insert(file.path.as_path()) {
                warn!(path = %file.path.display(), "same file listed twice, skipping");
                continue;
            }
            let (kind, destination) = match mode {
                DedupeMode::Quarantine(dir) => {
                    let target = dir.join(&file.root).join(&file.relative);
                    (
                        ActionKind::Quarantine,
                        Some(unique_destination(target, &mut claimed)),
                    )
                }
                DedupeMode::Delete => (ActionKind::Delete, None),
            };
            actions.push(Action {
                kind,
                source: file.path.clone(),
                destination,
                keeper: Some(keeper.clone()),
                size: group.size,
            });
        }
    }

    debug!(actions = actions.len(), "dedupe plan built");
    Plan { actions }
}
