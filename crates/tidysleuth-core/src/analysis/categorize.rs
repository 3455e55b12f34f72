/// Keyword-table file classifier.
///
/// Each [`CategoryRule`] lists keywords and extensions. A file scores +2
/// for every keyword in its name, +1 for every keyword in its (text)
/// content and +3 when its extension is listed. The best-scoring rule wins
/// if it reaches [`KeywordTable::min_score`]; otherwise the file falls back
/// to its extension category from [`file_types`](super::file_types).
use super::file_types::category_of;
use crate::model::{extension_of, FileTree, NodeIndex};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const CONTENT_HIT: u32 = 1;
const NAME_HIT: u32 = 2;
const EXTENSION_HIT: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Category label, also used as the directory name when organising.
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl CategoryRule {
    fn new(name: &str, keywords: &[&str], extensions: &[&str], description: &str) -> Self {
        Self {
            name: name.to_owned(),
            keywords: keywords.iter().map(|k| (*k).to_owned()).collect(),
            extensions: extensions.iter().map(|e| (*e).to_owned()).collect(),
            description: description.to_owned(),
        }
    }
}

/// Ordered rule list. Earlier rules win ties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordTable {
    pub rules: Vec<CategoryRule>,
    pub min_score: u32,
    /// Extensions whose content is read and searched for keywords.
    pub content_extensions: Vec<String>,
    pub max_content_bytes: u64,
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self {
            rules: vec![
                CategoryRule::new(
                    "transcription",
                    &["transcribe", "transcript", "whisper", "speech_to_text", "subtitle", "srt"],
                    &["srt", "vtt"],
                    "Speech-to-text and subtitle handling",
                ),
                CategoryRule::new(
                    "image-processing",
                    &["upscale", "thumbnail", "resize", "convert_image", "webp", "exif"],
                    &[],
                    "Image conversion, resizing and upscaling",
                ),
                CategoryRule::new(
                    "video-processing",
                    &["ffmpeg", "moviepy", "transcode", "convert_video", "trim_video"],
                    &[],
                    "Video editing and conversion",
                ),
                CategoryRule::new(
                    "audio-processing",
                    &["pydub", "mp3_to_wav", "convert_audio", "normalize_audio", "tts"],
                    &[],
                    "Audio conversion and synthesis",
                ),
                CategoryRule::new(
                    "web-scraping",
                    &["scrape", "scraper", "crawl", "beautifulsoup", "bs4", "selenium"],
                    &[],
                    "Web scraping and data extraction",
                ),
                CategoryRule::new(
                    "file-organization",
                    &["dedupe", "dedup", "duplicate", "organize", "rename", "sort_files"],
                    &[],
                    "File deduplication, renaming and sorting",
                ),
                CategoryRule::new(
                    "data-analysis",
                    &["pandas", "numpy", "dataframe", "analyze", "analysis", "matplotlib"],
                    &["ipynb", "parquet"],
                    "Data analysis and visualisation",
                ),
                CategoryRule::new(
                    "documentation",
                    &["readme", "changelog", "guide", "docs", "license"],
                    &["md", "rst"],
                    "Project documentation",
                ),
                CategoryRule::new(
                    "configuration",
                    &["config", "settings", "requirements", "dotenv"],
                    &["toml", "ini", "cfg", "env"],
                    "Configuration and environment files",
                ),
                CategoryRule::new(
                    "testing",
                    &["test_", "_test", "pytest", "unittest", "spec"],
                    &[],
                    "Tests and fixtures",
                ),
            ],
            min_score: 2,
            content_extensions: ["py", "js", "ts", "sh", "rb", "md", "txt", "rs", "go", "ipynb"]
                .iter()
                .map(|e| (*e).to_owned())
                .collect(),
            max_content_bytes: 64 * 1024,
        }
    }
}

/// The winning rule for a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordMatch {
    pub category: String,
    pub score: u32,
}

impl KeywordTable {
    /// Score `file_name` (and `content`, if supplied) against every rule.
    pub fn classify(&self, file_name: &str, content: Option<&str>) -> Option<KeywordMatch> {
        let name = file_name.to_lowercase();
        let extension = extension_of(file_name);
        let content = content.map(str::to_lowercase);

        let mut best: Option<(usize, u32)> = None;
        for (i, rule) in self.rules.iter().enumerate() {
            let mut score = 0;
            for keyword in &rule.keywords {
                let keyword = keyword.to_lowercase();
                if keyword.is_empty() {
                    continue;
                }
                if name.contains(&keyword) {
                    score += NAME_HIT;
                }
                if content.as_deref().is_some_and(|c| c.contains(&keyword)) {
                    score += CONTENT_HIT;
                }
            }
            if !extension.is_empty()
                && rule.extensions.iter().any(|e| e.eq_ignore_ascii_case(&extension))
            {
                score += EXTENSION_HIT;
            }
            // Strictly greater, so the earlier rule keeps a tie.
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((i, score));
            }
        }

        best.filter(|&(_, score)| score >= self.min_score && score > 0)
            .map(|(i, score)| KeywordMatch {
                category: self.rules[i].name.clone(),
                score,
            })
    }

    fn reads_content(&self, extension: &str) -> bool {
        !extension.is_empty()
            && self
                .content_extensions
                .iter()
                .any(|e| e.eq_ignore_ascii_case(extension))
    }
}

/// Where a file's category came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CategorySource {
    Keyword,
    Extension,
}

#[derive(Debug, Clone)]
pub struct CategorizedFile {
    pub index: NodeIndex,
    pub path: PathBuf,
    pub size: u64,
    pub category: String,
    /// Keyword score; `0` for extension fallbacks.
    pub score: u32,
    pub source: CategorySource,
}

/// Read up to `limit` bytes of `path` as lossy UTF-8.
fn read_prefix(path: &Path, limit: u64) -> std::io::Result<String> {
    let mut buf = Vec::new();
    File::open(path)?.take(limit).read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Classify every readable file in the tree. Sorted by path.
pub fn categorize_tree(tree: &FileTree, table: &KeywordTable) -> Vec<CategorizedFile> {
    let files: Vec<(NodeIndex, PathBuf)> = tree
        .files()
        .map(|(idx, _)| (idx, tree.full_path(idx)))
        .collect();

    let mut results: Vec<CategorizedFile> = files
        .into_par_iter()
        .map(|(index, path)| {
            let node = tree.node(index);
            let extension = extension_of(&node.name);
            let content = if table.reads_content(&extension) {
                match read_prefix(&path, table.max_content_bytes) {
                    Ok(text) => Some(text),
                    Err(e) => {
                        warn!("cannot read {}: {e}", path.display());
                        None
                    }
                }
            } else {
                None
            };

            match table.classify(&node.name, content.as_deref()) {
                Some(m) => CategorizedFile {
                    index,
                    path,
                    size: node.size,
                    category: m.category,
                    score: m.score,
                    source: CategorySource::Keyword,
                },
                None => CategorizedFile {
                    index,
                    path,
                    size: node.size,
                    category: category_of(&node.name).slug().to_owned(),
                    score: 0,
                    source: CategorySource::Extension,
                },
            }
        })
        .collect();

    results.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(files = results.len(), "categorisation complete");
    results
}

/// Per-category totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub file_count: u64,
    pub total_size: u64,
}

/// Totals per category, sorted by size descending then name.
pub fn summarize(files: &[CategorizedFile]) -> Vec<CategorySummary> {
    let mut map: HashMap<&str, (u64, u64)> = HashMap::new();
    for file in files {
        let entry = map.entry(file.category.as_str()).or_default();
        entry.0 += 1;
        entry.1 += file.size;
    }
    let mut out: Vec<CategorySummary> = map
        .into_iter()
        .map(|(category, (file_count, total_size))| CategorySummary {
            category: category.to_owned(),
            file_count,
            total_size,
        })
        .collect();
    out.sort_by(|a, b| {
        b.total_size
            .cmp(&a.total_size)
            .then_with(|| a.category.cmp(&b.category))
    });
    out
}
