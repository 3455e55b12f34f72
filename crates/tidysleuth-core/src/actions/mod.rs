/// File operations: plan first, then execute into a journal.
///
/// Nothing here touches the filesystem until [`execute`] runs with
/// `dry_run == false`. Every executed action is recorded in a
/// [`Journal`] so moves and quarantines can be reversed with [`undo`].
pub mod journal;
pub mod plan;

pub use journal::{prune_empty_dirs, undo, EntryStatus, Journal, JournalEntry};
pub use plan::{plan_dedupe, plan_organize, DedupeMode, OrganizeMode};

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Move,
    Copy,
    Quarantine,
    Delete,
    /// An emptied source directory removed after the files left it.
    #[serde(rename = "rmdir")]
    RemoveDir,
    /// A pruned directory recreated by undo.
    #[serde(rename = "mkdir")]
    CreateDir,
}

impl ActionKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Copy => "copy",
            Self::Quarantine => "quarantine",
            Self::Delete => "delete",
            Self::RemoveDir => "rmdir",
            Self::CreateDir => "mkdir",
        }
    }
}

/// A single planned file operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    pub source: PathBuf,
    /// `None` for deletions and directory actions.
    pub destination: Option<PathBuf>,
    /// For duplicate removal: the copy that must still exist.
    pub keeper: Option<PathBuf>,
    pub size: u64,
}

/// An ordered list of actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub actions: Vec<Action>,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.actions.iter().map(|a| a.size).sum()
    }
}

/// Run every action in `plan`, recording the outcome of each.
///
/// A failing action is logged and recorded; the remaining actions still run.
/// With `dry_run`, nothing is touched and every entry is `Planned`.
pub fn execute(plan: &Plan, dry_run: bool) -> Journal {
    let mut journal = Journal::new(dry_run);

    for action in &plan.actions {
        let status = if dry_run {
            EntryStatus::Planned
        } else {
            match apply(action) {
                Ok(()) => {
                    debug!(kind = action.kind.label(), "{}", action.source.display());
                    EntryStatus::Done
                }
                Err(message) => {
                    warn!(
                        "{} {} failed: {message}",
                        action.kind.label(),
                        action.source.display()
                    );
                    EntryStatus::Failed { message }
                }
            }
        };
        journal.entries.push(JournalEntry {
            action: action.clone(),
            status,
        });
    }

    info!(
        dry_run,
        done = journal.count(|s| matches!(s, EntryStatus::Done)),
        failed = journal.count(|s| matches!(s, EntryStatus::Failed { .. })),
        "plan executed"
    );
    journal
}

pub(crate) fn apply(action: &Action) -> std::result::Result<(), String> {
    if let Some(keeper) = &action.keeper {
        if !keeper.exists() {
            return Err(format!("keeper {} no longer exists", keeper.display()));
        }
    }

    match (action.kind, &action.destination) {
        (ActionKind::Delete, _) => {
            fs::remove_file(&action.source).map_err(|e| e.to_string())
        }
        // `remove_dir` refuses non-empty directories.
        (ActionKind::RemoveDir, _) => fs::remove_dir(&action.source).map_err(|e| e.to_string()),
        (ActionKind::CreateDir, _) => {
            fs::create_dir_all(&action.source).map_err(|e| e.to_string())
        }
        (ActionKind::Copy, Some(dest)) => {
            prepare_destination(dest)?;
            fs::copy(&action.source, dest)
                .map(|_| ())
                .map_err(|e| e.to_string())
        }
        (ActionKind::Move | ActionKind::Quarantine, Some(dest)) => {
            prepare_destination(dest)?;
            move_file(&action.source, dest).map_err(|e| e.to_string())
        }
        (_, None) => Err("action has no destination".to_owned()),
    }
}

/// Refuse to overwrite and make sure the parent directory exists.
pub(crate) fn prepare_destination(dest: &Path) -> std::result::Result<(), String> {
    if dest.symlink_metadata().is_ok() {
        return Err(format!("destination {} already exists", dest.display()));
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| format!("{}: {e}", parent.display()))?;
    }
    Ok(())
}

/// Rename, falling back to copy + remove across filesystems.
pub(crate) fn move_file(source: &Path, dest: &Path) -> io::Result<()> {
    if fs::rename(source, dest).is_ok() {
        return Ok(());
    }
    fs::copy(source, dest)?;
    if let Err(e) = fs::remove_file(source) {
        // Leave the source intact rather than holding two copies.
        let _ = fs::remove_file(dest);
        return Err(e);
    }
    Ok(())
}
