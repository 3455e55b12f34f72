//! Plain-text rendering for `--format text` (the default).
//!
//! Structured formats go through `tidysleuth_core::report`; this is the
//! terminal-friendly view of the same report structs.

use std::io::{self, Write};
use tidysleuth_core::actions::{EntryStatus, Journal};
use tidysleuth_core::model::size::{format_count, format_size};
use tidysleuth_core::report::{CategoryReport, DuplicateReport, ScanReport, VariantReport};

pub fn scan(out: &mut dyn Write, report: &ScanReport) -> io::Result<()> {
    for root in &report.roots {
        writeln!(out, "Root: {}", root.display())?;
    }
    writeln!(out, "  Files:        {}", format_count(report.files))?;
    writeln!(out, "  Directories:  {}", format_count(report.directories))?;
    writeln!(out, "  Total size:   {}", format_size(report.total_size))?;
    writeln!(out, "  Errors:       {}", format_count(report.errors))?;
    if report.symlinks_skipped > 0 {
        writeln!(out, "  Symlinks:     {} skipped", report.symlinks_skipped)?;
    }
    writeln!(out, "  Duration:     {} ms", report.duration_ms)?;
    if !report.types.is_empty() {
        writeln!(out)?;
        writeln!(out, "{:<14}{:>10}{:>12}", "Type", "Files", "Size")?;
        for t in &report.types {
            writeln!(
                out,
                "{:<14}{:>10}{:>12}",
                t.category.label(),
                format_count(t.file_count),
                format_size(t.total_size)
            )?;
        }
    }
    Ok(())
}

pub fn duplicates(out: &mut dyn Write, report: &DuplicateReport) -> io::Result<()> {
    for (i, group) in report.groups.iter().enumerate() {
        let short = group.hash.get(..12).unwrap_or(&group.hash);
        writeln!(
            out,
            "Group {}: {} copies of {} ({} {short})",
            i + 1,
            group.members.len(),
            format_size(group.size),
            report.algorithm
        )?;
        for m in &group.members {
            let tag = if m.keep { "keep" } else { "dupe" };
            if m.reasons.is_empty() {
                writeln!(out, "  {tag}  {}  (score {})", m.path.display(), m.score)?;
            } else {
                writeln!(
                    out,
                    "  {tag}  {}  (score {}: {})",
                    m.path.display(),
                    m.score,
                    m.reasons.join(", ")
                )?;
            }
        }
        writeln!(out)?;
    }
    for f in &report.hash_failures {
        writeln!(out, "unreadable: {}: {}", f.path.display(), f.message)?;
    }
    writeln!(
        out,
        "{} duplicate groups, {} redundant files, {} reclaimable",
        format_count(report.group_count as u64),
        format_count(report.redundant_files),
        format_size(report.wasted_bytes)
    )
}

pub fn variants(out: &mut dyn Write, report: &VariantReport) -> io::Result<()> {
    for group in &report.groups {
        writeln!(out, "{} ({})", group.base, group.directory.display())?;
        for f in &group.files {
            let mark = if f.marked { "*" } else { " " };
            writeln!(out, "  {mark} {}  {}", f.path.display(), format_size(f.size))?;
        }
    }
    writeln!(out, "{} variant groups", format_count(report.groups.len() as u64))
}

pub fn categories(out: &mut dyn Write, report: &CategoryReport) -> io::Result<()> {
    for f in &report.files {
        writeln!(out, "{:<20} {}", f.category, f.path.display())?;
    }
    writeln!(out)?;
    for s in &report.summary {
        writeln!(
            out,
            "{:<20}{:>10}{:>12}",
            s.category,
            format_count(s.file_count),
            format_size(s.total_size)
        )?;
    }
    Ok(())
}

pub fn journal(out: &mut dyn Write, journal: &Journal) -> io::Result<()> {
    for e in &journal.entries {
        let target = e
            .action
            .destination
            .as_ref()
            .map(|d| format!(" -> {}", d.display()))
            .unwrap_or_default();
        let detail = e
            .status
            .detail()
            .map(|d| format!(" ({d})"))
            .unwrap_or_default();
        writeln!(
            out,
            "[{}] {} {}{target}{detail}",
            e.status.label(),
            e.action.kind.label(),
            e.action.source.display()
        )?;
    }

    let count = |pred: fn(&EntryStatus) -> bool| journal.count(pred);
    if journal.dry_run {
        writeln!(
            out,
            "{} actions planned ({}); re-run with --apply to perform them",
            count(|s| *s == EntryStatus::Planned),
            format_size(journal.entries.iter().map(|e| e.action.size).sum())
        )
    } else {
        writeln!(
            out,
            "{} done, {} failed, {} skipped",
            count(|s| *s == EntryStatus::Done),
            count(|s| matches!(s, EntryStatus::Failed { .. })),
            count(|s| matches!(s, EntryStatus::Skipped { .. }))
        )
    }
}
