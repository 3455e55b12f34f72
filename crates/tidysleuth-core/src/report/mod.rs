/// Reports: one serialisable schema per result type, rendered as JSON,
/// CSV or Markdown.
///
/// The report structs are plain data built from analysis results; the
/// per-format modules only decide layout. CSV output flattens each report
/// into one row type so every file has a fixed header.
pub mod csv;
pub mod json;
pub mod markdown;

use crate::actions::Journal;
use crate::analysis::categorize::{summarize, CategorizedFile, CategorySource, CategorySummary};
use crate::analysis::duplicates::{DuplicateScan, HashFailure};
use crate::analysis::file_types::{analyse_file_types, CategoryStats};
use crate::analysis::variants::VariantGroup;
use crate::error::{Error, Result};
use crate::hashing::HashAlgorithm;
use crate::scanner::ScanSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Json,
    Csv,
    Markdown,
}

impl FromStr for ReportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "md" | "markdown" => Ok(Self::Markdown),
            other => Err(Error::Config(format!("unknown report format {other:?}"))),
        }
    }
}

fn timestamp(t: Option<SystemTime>) -> Option<DateTime<Utc>> {
    t.map(DateTime::<Utc>::from)
}

// ── Scan ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub generated_at: DateTime<Utc>,
    pub roots: Vec<PathBuf>,
    pub files: u64,
    pub directories: u64,
    pub total_size: u64,
    pub errors: u64,
    pub symlinks_skipped: u64,
    pub duration_ms: u64,
    pub types: Vec<CategoryStats>,
}

impl ScanReport {
    pub fn new(summary: &ScanSummary) -> Self {
        let tree = &summary.tree;
        Self {
            generated_at: Utc::now(),
            roots: tree.root_paths.clone(),
            files: tree.file_count(),
            directories: tree.dir_count(),
            total_size: tree.total_size,
            errors: summary.error_count,
            symlinks_skipped: summary.symlinks_skipped,
            duration_ms: summary.duration.as_millis() as u64,
            types: analyse_file_types(tree),
        }
    }
}

// ── Duplicates ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct MemberRecord {
    pub path: PathBuf,
    pub keep: bool,
    pub score: i64,
    pub reasons: Vec<String>,
    pub modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupRecord {
    pub hash: String,
    pub size: u64,
    pub wasted_bytes: u64,
    pub keeper: PathBuf,
    pub members: Vec<MemberRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DuplicateReport {
    pub generated_at: DateTime<Utc>,
    pub algorithm: HashAlgorithm,
    pub files_considered: u64,
    pub files_hashed: u64,
    pub group_count: usize,
    pub redundant_files: u64,
    pub wasted_bytes: u64,
    pub groups: Vec<GroupRecord>,
    pub hash_failures: Vec<HashFailure>,
}

impl DuplicateReport {
    /// Build from a scan whose groups have already been ranked.
    pub fn new(scan: &DuplicateScan) -> Self {
        let groups = scan
            .groups
            .iter()
            .map(|g| GroupRecord {
                hash: g.hash.clone(),
                size: g.size,
                wasted_bytes: g.wasted_bytes(),
                keeper: g.keeper().path.clone(),
                members: g
                    .files
                    .iter()
                    .enumerate()
                    .map(|(i, f)| MemberRecord {
                        path: f.path.clone(),
                        keep: i == 0,
                        score: f.score,
                        reasons: f.reasons.clone(),
                        modified: timestamp(f.modified),
                    })
                    .collect(),
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            algorithm: scan.algorithm,
            files_considered: scan.files_considered,
            files_hashed: scan.files_hashed,
            group_count: scan.groups.len(),
            redundant_files: scan.redundant_files(),
            wasted_bytes: scan.wasted_bytes(),
            groups,
            hash_failures: scan.hash_failures.clone(),
        }
    }
}

// ── Categories ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CategoryRecord {
    pub path: PathBuf,
    pub category: String,
    pub source: CategorySource,
    pub score: u32,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryReport {
    pub generated_at: DateTime<Utc>,
    pub summary: Vec<CategorySummary>,
    pub files: Vec<CategoryRecord>,
}

impl CategoryReport {
    pub fn new(files: &[CategorizedFile]) -> Self {
        Self {
            generated_at: Utc::now(),
            summary: summarize(files),
            files: files
                .iter()
                .map(|f| CategoryRecord {
                    path: f.path.clone(),
                    category: f.category.clone(),
                    source: f.source,
                    score: f.score,
                    size: f.size,
                })
                .collect(),
        }
    }
}

// ── Name variants ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct VariantMember {
    pub path: PathBuf,
    pub size: u64,
    pub marked: bool,
    pub modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariantRecord {
    pub directory: PathBuf,
    pub base: String,
    pub extension: String,
    pub files: Vec<VariantMember>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariantReport {
    pub generated_at: DateTime<Utc>,
    pub groups: Vec<VariantRecord>,
}

impl VariantReport {
    pub fn new(groups: &[VariantGroup]) -> Self {
        Self {
            generated_at: Utc::now(),
            groups: groups
                .iter()
                .map(|g| VariantRecord {
                    directory: g.directory.clone(),
                    base: g.base.clone(),
                    extension: g.extension.clone(),
                    files: g
                        .files
                        .iter()
                        .map(|f| VariantMember {
                            path: f.path.clone(),
                            size: f.size,
                            marked: f.marked,
                            modified: timestamp(f.modified),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

// ── Writers ──────────────────────────────────────────────────────

pub fn write_scan<W: Write>(out: W, report: &ScanReport, format: ReportFormat) -> Result<()> {
    match format {
        ReportFormat::Json => json::write(out, report),
        ReportFormat::Csv => csv::write_scan(out, report),
        ReportFormat::Markdown => markdown::write_scan(out, report),
    }
}

pub fn write_duplicates<W: Write>(
    out: W,
    report: &DuplicateReport,
    format: ReportFormat,
) -> Result<()> {
    match format {
        ReportFormat::Json => json::write(out, report),
        ReportFormat::Csv => csv::write_duplicates(out, report),
        ReportFormat::Markdown => markdown::write_duplicates(out, report),
    }
}

pub fn write_categories<W: Write>(
    out: W,
    report: &CategoryReport,
    format: ReportFormat,
) -> Result<()> {
    match format {
        ReportFormat::Json => json::write(out, report),
        ReportFormat::Csv => csv::write_categories(out, report),
        ReportFormat::Markdown => markdown::write_categories(out, report),
    }
}

pub fn write_variants<W: Write>(
    out: W,
    report: &VariantReport,
    format: ReportFormat,
) -> Result<()> {
    match format {
        ReportFormat::Json => json::write(out, report),
        ReportFormat::Csv => csv::write_variants(out, report),
        ReportFormat::Markdown => markdown::write_variants(out, report),
    }
}

pub fn write_journal<W: Write>(out: W, journal: &Journal, format: ReportFormat) -> Result<()> {
    match format {
        ReportFormat::Json => json::write(out, journal),
        ReportFormat::Csv => csv::write_journal(out, journal),
        ReportFormat::Markdown => markdown::write_journal(out, journal),
    }
}
