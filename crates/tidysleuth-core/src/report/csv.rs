/// CSV output: one flat row type per report.
///
/// Nested data is flattened (one row per duplicate member, per categorised
/// file, per variant member, per journal entry); list fields such as keeper
/// reasons are joined with `"; "`.
use super::{CategoryReport, DuplicateReport, ScanReport, VariantReport};
use crate::actions::Journal;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

fn write_rows<W: Write, R: Serialize>(out: W, rows: impl IntoIterator<Item = R>) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn path_str(path: &std::path::Path) -> String {
    path.to_string_lossy().into_owned()
}

#[derive(Serialize)]
struct TypeRow<'a> {
    category: &'a str,
    files: u64,
    bytes: u64,
}

pub fn write_scan<W: Write>(out: W, report: &ScanReport) -> Result<()> {
    write_rows(
        out,
        report.types.iter().map(|t| TypeRow {
            category: t.category.slug(),
            files: t.file_count,
            bytes: t.total_size,
        }),
    )
}

#[derive(Serialize)]
struct DuplicateRow<'a> {
    group: usize,
    hash: &'a str,
    size: u64,
    path: String,
    keep: bool,
    score: i64,
    reasons: String,
}

pub fn write_duplicates<W: Write>(out: W, report: &DuplicateReport) -> Result<()> {
    write_rows(
        out,
        report.groups.iter().enumerate().flat_map(|(i, g)| {
            g.members.iter().map(move |m| DuplicateRow {
                group: i + 1,
                hash: &g.hash,
                size: g.size,
                path: path_str(&m.path),
                keep: m.keep,
                score: m.score,
                reasons: m.reasons.join("; "),
            })
        }),
    )
}

#[derive(Serialize)]
struct CategoryRow<'a> {
    path: String,
    category: &'a str,
    source: &'static str,
    score: u32,
    size: u64,
}

pub fn write_categories<W: Write>(out: W, report: &CategoryReport) -> Result<()> {
    use crate::analysis::categorize::CategorySource;
    write_rows(
        out,
        report.files.iter().map(|f| CategoryRow {
            path: path_str(&f.path),
            category: &f.category,
            source: match f.source {
                CategorySource::Keyword => "keyword",
                CategorySource::Extension => "extension",
            },
            score: f.score,
            size: f.size,
        }),
    )
}

#[derive(Serialize)]
struct VariantRow<'a> {
    group: usize,
    directory: String,
    base: &'a str,
    extension: &'a str,
    path: String,
    size: u64,
    marked: bool,
}

pub fn write_variants<W: Write>(out: W, report: &VariantReport) -> Result<()> {
    write_rows(
        out,
        report.groups.iter().enumerate().flat_map(|(i, g)| {
            g.files.iter().map(move |f| VariantRow {
                group: i + 1,
                directory: path_str(&g.directory),
                base: &g.base,
                extension: &g.extension,
                path: path_str(&f.path),
                size: f.size,
                marked: f.marked,
            })
        }),
    )
}

#[derive(Serialize)]
struct JournalRow<'a> {
    kind: &'static str,
    source: String,
    destination: String,
    keeper: String,
    size: u64,
    status: &'static str,
    detail: &'a str,
}

pub fn write_journal<W: Write>(out: W, journal: &Journal) -> Result<()> {
    let opt = |p: &Option<std::path::PathBuf>| p.as_deref().map(path_str).unwrap_or_default();
    write_rows(
        out,
        journal.entries.iter().map(|e| JournalRow {
            kind: e.action.kind.label(),
            source: path_str(&e.action.source),
            destination: opt(&e.action.destination),
            keeper: opt(&e.action.keeper),
            size: e.action.size,
            status: e.status.label(),
            detail: e.status.detail().unwrap_or(""),
        }),
    )
}
