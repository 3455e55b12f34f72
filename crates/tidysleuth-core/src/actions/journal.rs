/// Execution journal: what was done, persisted as JSON, and how to reverse it.
use super::{apply, move_file, prepare_destination, Action, ActionKind};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum EntryStatus {
    /// Dry run: the action would have been attempted.
    Planned,
    Done,
    Failed { message: String },
    Skipped { reason: String },
}

impl EntryStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Done => "done",
            Self::Failed { .. } => "failed",
            Self::Skipped { .. } => "skipped",
        }
    }

    /// Failure message or skip reason, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Failed { message } => Some(message.as_str()),
            Self::Skipped { reason } => Some(reason.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    #[serde(flatten)]
    pub action: Action,
    #[serde(flatten)]
    pub status: EntryStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    pub created_at: DateTime<Utc>,
    pub dry_run: bool,
    pub entries: Vec<JournalEntry>,
}

impl Journal {
    pub fn new(dry_run: bool) -> Self {
        Self {
            created_at: Utc::now(),
            dry_run,
            entries: Vec::new(),
        }
    }

    pub fn count(&self, pred: impl Fn(&EntryStatus) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.status)).count()
    }

    /// Bytes moved, copied or removed by entries that completed.
    pub fn bytes_done(&self) -> u64 {
        self.entries
            .iter()
            .filter(|e| e.status == EntryStatus::Done)
            .map(|e| e.action.size)
            .sum()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush().map_err(|e| Error::io(path, e))?;
        info!("journal written to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

/// Remove directories left empty by the completed moves, quarantines and
/// deletions in `journal`, recording each removal as an `rmdir` entry.
///
/// Only directories strictly below one of `roots` are touched; the roots
/// themselves always stay. A dry-run journal is left alone. Returns the
/// number of directories removed.
pub fn prune_empty_dirs(journal: &mut Journal, roots: &[PathBuf]) -> usize {
    if journal.dry_run {
        return 0;
    }

    let mut candidates = BTreeSet::new();
    for entry in &journal.entries {
        let emptied = matches!(
            entry.action.kind,
            ActionKind::Move | ActionKind::Quarantine | ActionKind::Delete
        );
        if !emptied || entry.status != EntryStatus::Done {
            continue;
        }
        let source = &entry.action.source;
        let Some(root) = roots.iter().find(|r| source.starts_with(r)) else {
            continue;
        };
        let mut dir = source.parent();
        while let Some(d) = dir.filter(|d| *d != root.as_path() && d.starts_with(root)) {
            candidates.insert(d.to_path_buf());
            dir = d.parent();
        }
    }

    // Children before parents.
    let mut ordered: Vec<PathBuf> = candidates.into_iter().collect();
    ordered.sort_by_key(|d| Reverse(d.components().count()));

    let mut removed = 0;
    for dir in ordered {
        let empty = fs::read_dir(&dir)
            .map(|mut it| it.next().is_none())
            .unwrap_or(false);
        if !empty {
            continue;
        }
        let action = Action {
            kind: ActionKind::RemoveDir,
            source: dir,
            destination: None,
            keeper: None,
            size: 0,
        };
        match apply(&action) {
            Ok(()) => {
                debug!("removed empty directory {}", action.source.display());
                journal.entries.push(JournalEntry {
                    action,
                    status: EntryStatus::Done,
                });
                removed += 1;
            }
            Err(message) => warn!("cannot remove {}: {message}", action.source.display()),
        }
    }

    info!(removed, "empty directories pruned");
    removed
}

/// Reverse the completed entries of `journal`, newest first.
///
/// Moves and quarantines are moved back (never over an existing file),
/// copies are removed and pruned directories recreated. Deletions cannot be reversed and are reported as
/// skipped. Entries that did not complete are ignored. With `dry_run` the
/// reversal is only described.
pub fn undo(journal: &Journal, dry_run: bool) -> Result<Journal> {
    if journal.dry_run {
        return Err(Error::JournalConflict(
            "journal is from a dry run; nothing to undo".to_owned(),
        ));
    }

    let mut out = Journal::new(dry_run);
    for entry in journal.entries.iter().rev() {
        if entry.status != EntryStatus::Done {
            continue;
        }
        let original = &entry.action;
        let reversed = match (original.kind, &original.destination) {
            (ActionKind::Move | ActionKind::Quarantine, Some(dest)) => Action {
                kind: ActionKind::Move,
                source: dest.clone(),
                destination: Some(original.source.clone()),
                keeper: None,
                size: original.size,
            },
            (ActionKind::Copy, Some(dest)) => Action {
                kind: ActionKind::Delete,
                source: dest.clone(),
                destination: None,
                keeper: Some(original.source.clone()),
                size: original.size,
            },
            (ActionKind::RemoveDir, _) => Action {
                kind: ActionKind::CreateDir,
                source: original.source.clone(),
                destination: None,
                keeper: None,
                size: 0,
            },
            (ActionKind::CreateDir, _) => Action {
                kind: ActionKind::RemoveDir,
                source: original.source.clone(),
                destination: None,
                keeper: None,
                size: 0,
            },
            _ => {
                out.entries.push(JournalEntry {
                    action: original.clone(),
                    status: EntryStatus::Skipped {
                        reason: "deletion cannot be undone".to_owned(),
                    },
                });
                continue;
            }
        };

        let status = if dry_run {
            EntryStatus::Planned
        } else {
            match reverse(&reversed) {
                Ok(()) => EntryStatus::Done,
                Err(message) => {
                    warn!("undo of {} failed: {message}", reversed.source.display());
                    EntryStatus::Failed { message }
                }
            }
        };
        out.entries.push(JournalEntry {
            action: reversed,
            status,
        });
    }

    info!(
        dry_run,
        restored = out.count(|s| matches!(s, EntryStatus::Done)),
        failed = out.count(|s| matches!(s, EntryStatus::Failed { .. })),
        "undo complete"
    );
    Ok(out)
}

fn reverse(action: &Action) -> std::result::Result<(), String> {
    if matches!(action.kind, ActionKind::RemoveDir | ActionKind::CreateDir) {
        return apply(action);
    }
    match &action.destination {
        Some(dest) => {
            prepare_destination(dest)?;
            move_file(&action.source, dest).map_err(|e| e.to_string())
        }
        None => {
            // Removing a copy: the original must still be there.
            if let Some(original) = action.keeper.as_deref().filter(|k| !k.exists()) {
                return Err(format!("original {} is gone", original.display()));
            }
            fs::remove_file(&action.source).map_err(|e| e.to_string())
        }
    }
}
