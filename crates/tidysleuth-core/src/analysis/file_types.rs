/// File type categorisation based on file extensions.
///
/// This is the fallback bucket for files the keyword table does not
/// recognise, and the per-type breakdown in scan summaries.
use crate::model::{extension_of, FileTree};
use serde::Serialize;
use std::collections::HashMap;

/// Broad file type categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Documents,
    Images,
    Video,
    Audio,
    Archives,
    Code,
    Executables,
    System,
    Other,
}

/// Extension table, one row per category. Lookups are lowercase.
const EXTENSION_TABLE: &[(FileCategory, &[&str])] = &[
    (
        FileCategory::Documents,
        &[
            "doc", "docx", "pdf", "txt", "rtf", "odt", "xls", "xlsx", "ppt", "pptx", "csv", "md",
            "epub", "pages", "numbers", "key",
        ],
    ),
    (
        FileCategory::Images,
        &[
            "jpg", "jpeg", "png", "gif", "bmp", "svg", "webp", "ico", "tiff", "tif", "psd", "raw",
            "cr2", "nef", "heic", "heif",
        ],
    ),
    (
        FileCategory::Video,
        &["mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "3gp"],
    ),
    (
        FileCategory::Audio,
        &["mp3", "wav", "flac", "aac", "ogg", "wma", "m4a", "opus", "aiff"],
    ),
    (
        FileCategory::Archives,
        &["zip", "rar", "7z", "tar", "gz", "bz2", "xz", "zst", "cab", "iso", "dmg"],
    ),
    (
        FileCategory::Code,
        &[
            "rs", "py", "js", "ts", "jsx", "tsx", "c", "cpp", "h", "hpp", "cs", "java", "go",
            "rb", "php", "swift", "kt", "scala", "html", "htm", "css", "scss", "json", "xml",
            "yaml", "yml", "toml", "sql", "sh", "bat", "ps1", "ipynb",
        ],
    ),
    (
        FileCategory::Executables,
        &["exe", "msi", "dll", "so", "dylib", "app", "com", "scr", "pkg", "deb", "rpm"],
    ),
    (
        FileCategory::System,
        &["sys", "drv", "inf", "cat", "log", "etl", "dat", "reg", "tmp", "bak", "ini", "plist"],
    ),
];

impl FileCategory {
    /// Human-readable label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Documents => "Documents",
            Self::Images => "Images",
            Self::Video => "Video",
            Self::Audio => "Audio",
            Self::Archives => "Archives",
            Self::Code => "Code",
            Self::Executables => "Executables",
            Self::System => "System",
            Self::Other => "Other",
        }
    }

    /// Lowercase name, used as a directory name when organising.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Documents => "documents",
            Self::Images => "images",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Archives => "archives",
            Self::Code => "code",
            Self::Executables => "executables",
            Self::System => "system",
            Self::Other => "other",
        }
    }
}

/// Size and count totals for a single file category.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryStats {
    pub category: FileCategory,
    pub total_size: u64,
    pub file_count: u64,
}

/// Categorise an extension (without the dot), case-insensitively.
pub fn categorise_extension(ext: &str) -> FileCategory {
    if ext.is_empty() || ext.len() > 16 {
        return FileCategory::Other;
    }
    let lower = ext.to_ascii_lowercase();
    EXTENSION_TABLE
        .iter()
        .find(|(_, exts)| exts.contains(&lower.as_str()))
        .map(|(cat, _)| *cat)
        .unwrap_or(FileCategory::Other)
}

/// Categorise a file by name.
pub fn category_of(file_name: &str) -> FileCategory {
    categorise_extension(&extension_of(file_name))
}

/// Compute per-category size and count stats for the entire tree,
/// sorted by total size descending.
pub fn analyse_file_types(tree: &FileTree) -> Vec<CategoryStats> {
    let mut map: HashMap<FileCategory, CategoryStats> = HashMap::with_capacity(9);

    for (_, node) in tree.files() {
        let category = category_of(&node.name);
        let entry = map.entry(category).or_insert(CategoryStats {
            category,
            total_size: 0,
            file_count: 0,
        });
        entry.total_size += node.size;
        entry.file_count += 1;
    }

    let mut results: Vec<CategoryStats> = map.into_values().collect();
    results.sort_by(|a, b| {
        b.total_size
            .cmp(&a.total_size)
            .then_with(|| a.category.cmp(&b.category))
    });
    results
}
