/// Markdown output: a heading, a short summary list and pipe tables.
use super::{CategoryReport, DuplicateReport, ScanReport, VariantReport};
use crate::actions::Journal;
use crate::error::Result;
use crate::model::size::{format_count, format_size};
use std::io::Write;
use std::path::Path;

/// Escape characters that would break a table cell.
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn path_cell(path: &Path) -> String {
    format!("`{}`", cell(&path.to_string_lossy()))
}

pub fn write_scan<W: Write>(mut out: W, report: &ScanReport) -> Result<()> {
    writeln!(out, "# Scan report")?;
    writeln!(out)?;
    writeln!(out, "Generated {}", report.generated_at.to_rfc3339())?;
    writeln!(out)?;
    for root in &report.roots {
        writeln!(out, "- Root: {}", path_cell(root))?;
    }
    writeln!(out, "- Files: {}", format_count(report.files))?;
    writeln!(out, "- Directories: {}", format_count(report.directories))?;
    writeln!(out, "- Total size: {}", format_size(report.total_size))?;
    writeln!(out, "- Errors: {}", report.errors)?;
    writeln!(out, "- Symlinks skipped: {}", report.symlinks_skipped)?;
    writeln!(out)?;
    writeln!(out, "| Type | Files | Size |")?;
    writeln!(out, "|------|------:|-----:|")?;
    for t in &report.types {
        writeln!(
            out,
            "| {} | {} | {} |",
            t.category.label(),
            format_count(t.file_count),
            format_size(t.total_size)
        )?;
    }
    Ok(())
}

pub fn write_duplicates<W: Write>(mut out: W, report: &DuplicateReport) -> Result<()> {
    writeln!(out, "# Duplicate report")?;
    writeln!(out)?;
    writeln!(out, "Generated {}", report.generated_at.to_rfc3339())?;
    writeln!(out)?;
    writeln!(out, "- Algorithm: {}", report.algorithm)?;
    writeln!(out, "- Files considered: {}", format_count(report.files_considered))?;
    writeln!(out, "- Duplicate groups: {}", format_count(report.group_count as u64))?;
    writeln!(out, "- Redundant files: {}", format_count(report.redundant_files))?;
    writeln!(out, "- Reclaimable: {}", format_size(report.wasted_bytes))?;

    for (i, group) in report.groups.iter().enumerate() {
        writeln!(out)?;
        writeln!(
            out,
            "## Group {} ({} x {}, `{}`)",
            i + 1,
            group.members.len(),
            format_size(group.size),
            group.hash
        )?;
        writeln!(out)?;
        writeln!(out, "| Keep | Path | Score | Reasons |")?;
        writeln!(out, "|:----:|------|------:|---------|")?;
        for m in &group.members {
            writeln!(
                out,
                "| {} | {} | {} | {} |",
                if m.keep { "yes" } else { "" },
                path_cell(&m.path),
                m.score,
                cell(&m.reasons.join("; "))
            )?;
        }
    }

    if !report.hash_failures.is_empty() {
        writeln!(out)?;
        writeln!(out, "## Unreadable files")?;
        writeln!(out)?;
        for f in &report.hash_failures {
            writeln!(out, "- {}: {}", path_cell(&f.path), cell(&f.message))?;
        }
    }
    Ok(())
}

pub fn write_categories<W: Write>(mut out: W, report: &CategoryReport) -> Result<()> {
    writeln!(out, "# Category report")?;
    writeln!(out)?;
    writeln!(out, "| Category | Files | Size |")?;
    writeln!(out, "|----------|------:|-----:|")?;
    for s in &report.summary {
        writeln!(
            out,
            "| {} | {} | {} |",
            cell(&s.category),
            format_count(s.file_count),
            format_size(s.total_size)
        )?;
    }
    writeln!(out)?;
    writeln!(out, "| Path | Category | Score |")?;
    writeln!(out, "|------|----------|------:|")?;
    for f in &report.files {
        writeln!(
            out,
            "| {} | {} | {} |",
            path_cell(&f.path),
            cell(&f.category),
            f.score
        )?;
    }
    Ok(())
}

pub fn write_variants<W: Write>(mut out: W, report: &VariantReport) -> Result<()> {
    writeln!(out, "# Name variants")?;
    for group in &report.groups {
        writeln!(out)?;
        let ext = if group.extension.is_empty() {
            String::new()
        } else {
            format!(".{}", group.extension)
        };
        writeln!(
            out,
            "## {}{} in {}",
            cell(&group.base),
            ext,
            path_cell(&group.directory)
        )?;
        writeln!(out)?;
        for f in &group.files {
            let marker = if f.marked { " (copy marker)" } else { "" };
            writeln!(out, "- {} {}{marker}", path_cell(&f.path), format_size(f.size))?;
        }
    }
    Ok(())
}

pub fn write_journal<W: Write>(mut out: W, journal: &Journal) -> Result<()> {
    let title = if journal.dry_run { "Planned actions (dry run)" } else { "Actions" };
    writeln!(out, "# {title}")?;
    writeln!(out)?;
    writeln!(out, "| Action | Source | Destination | Status |")?;
    writeln!(out, "|--------|--------|-------------|--------|")?;
    for e in &journal.entries {
        let dest = e
            .action
            .destination
            .as_deref()
            .map(path_cell)
            .unwrap_or_default();
        let status = match e.status.detail() {
            Some(detail) => format!("{}: {}", e.status.label(), cell(detail)),
            None => e.status.label().to_owned(),
        };
        writeln!(
            out,
            "| {} | {} | {} | {} |",
            e.action.kind.label(),
            path_cell(&e.action.source),
            dest,
            status
        )?;
    }
    Ok(())
}
