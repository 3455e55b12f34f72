/// Name-based near-duplicate detection.
///
/// Finds files sitting next to each other whose names differ only by a
/// copy marker: `notes.txt`, `notes_old.txt`, `notes (2).txt`. Content is
/// not compared; these groups are candidates for a human to review, unlike
/// the hash-verified groups from [`duplicates`](super::duplicates).
use crate::model::{extension_of, FileTree, NodeIndex};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::SystemTime;

/// Suffixes recognised as copy markers (matched case-insensitively).
const COPY_SUFFIXES: &[&str] = &[
    " - copy",
    " copy",
    "-copy",
    "_copy",
    "_duplicate",
    "_backup",
    "_old",
    "_new",
    "_temp",
    "_tmp",
    "_final",
    "_draft",
];

/// Strip the extension and one trailing copy marker from `file_name`.
///
/// Returns the remaining base name and whether a marker was removed.
/// A marker is never stripped if nothing would be left.
pub fn base_name(file_name: &str) -> (String, bool) {
    let stem = match file_name.rfind('.') {
        Some(pos) if pos > 0 => &file_name[..pos],
        _ => file_name,
    };
    let lower = stem.to_ascii_lowercase();

    let cut = strip_numbered_paren(&lower)
        .or_else(|| strip_copy_number(&lower))
        .or_else(|| {
            COPY_SUFFIXES
                .iter()
                .find(|suffix| lower.ends_with(*suffix))
                .map(|suffix| lower.len() - suffix.len())
        })
        .or_else(|| strip_underscore_digit(&lower));

    match cut {
        Some(len) if len > 0 => (stem[..len].trim_end().to_owned(), true),
        _ => (stem.to_owned(), false),
    }
}

/// ` (12)` → byte length of the stem before it.
fn strip_numbered_paren(lower: &str) -> Option<usize> {
    let inner = lower.strip_suffix(')')?;
    let open = inner.rfind(" (")?;
    let digits = &inner[open + 2..];
    (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())).then_some(open)
}

/// ` copy 3` (macOS Finder style).
fn strip_copy_number(lower: &str) -> Option<usize> {
    let trimmed = lower.trim_end_matches(|c: char| c.is_ascii_digit());
    if trimmed.len() == lower.len() {
        return None;
    }
    trimmed.strip_suffix(" copy ").map(str::len)
}

/// `_2`: a single trailing digit after an underscore.
fn strip_underscore_digit(lower: &str) -> Option<usize> {
    let bytes = lower.as_bytes();
    let n = bytes.len();
    (n >= 3 && bytes[n - 2] == b'_' && bytes[n - 1].is_ascii_digit() && !bytes[n - 3].is_ascii_digit())
        .then(|| n - 2)
}

#[derive(Debug, Clone)]
pub struct VariantFile {
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<SystemTime>,
    /// `true` if this name carried a copy marker.
    pub marked: bool,
}

/// Files in one directory sharing a base name and extension.
#[derive(Debug, Clone)]
pub struct VariantGroup {
    pub directory: PathBuf,
    pub base: String,
    pub extension: String,
    pub files: Vec<VariantFile>,
}

/// Group same-directory files whose names differ only by a copy marker.
///
/// A group needs at least two files and at least one marked name, so two
/// unrelated `README.md` files in different directories never match.
pub fn find_name_variants(tree: &FileTree) -> Vec<VariantGroup> {
    let mut buckets: HashMap<(NodeIndex, String, String), Vec<(NodeIndex, bool)>> = HashMap::new();

    for (idx, node) in tree.files() {
        let Some(parent) = node.parent else { continue };
        let (base, marked) = base_name(&node.name);
        let key = (parent, base.to_lowercase(), extension_of(&node.name));
        buckets.entry(key).or_default().push((idx, marked));
    }

    let mut groups: Vec<VariantGroup> = buckets
        .into_iter()
        .filter(|(_, members)| members.len() > 1 && members.iter().any(|(_, m)| *m))
        .map(|((parent, _, extension), members)| {
            let mut files: Vec<VariantFile> = members
                .iter()
                .map(|&(idx, marked)| VariantFile {
                    path: tree.full_path(idx),
                    size: tree.node(idx).size,
                    modified: tree.node(idx).modified,
                    marked,
                })
                .collect();
            files.sort_by(|a, b| a.path.cmp(&b.path));
            // Prefer an unmarked name as the display base.
            let display = members
                .iter()
                .find(|(_, m)| !*m)
                .unwrap_or(&members[0])
                .0;
            VariantGroup {
                directory: tree.full_path(parent),
                base: base_name(&tree.node(display).name).0,
                extension,
                files,
            }
        })
        .collect();

    groups.sort_by(|a, b| {
        a.directory
            .cmp(&b.directory)
            .then_with(|| a.base.cmp(&b.base))
            .then_with(|| a.extension.cmp(&b.extension))
    });
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileNode;
    use compact_str::CompactString;
    use std::path::Path;

    #[test]
    fn strips_common_markers() {
        assert_eq!(base_name("report_copy.pdf"), ("report".into(), true));
        assert_eq!(base_name("report_OLD.pdf"), ("report".into(), true));
        assert_eq!(base_name("report (2).pdf"), ("report".into(), true));
        assert_eq!(base_name("report - Copy.pdf"), ("report".into(), true));
        assert_eq!(base_name("report copy 3.pdf"), ("report".into(), true));
        assert_eq!(base_name("script_1.py"), ("script".into(), true));
    }

    #[test]
    fn leaves_plain_names_alone() {
        assert_eq!(base_name("report.pdf"), ("report".into(), false));
        assert_eq!(base_name("chapter_12.md"), ("chapter_12".into(), false));
        assert_eq!(base_name("Makefile"), ("Makefile".into(), false));
        assert_eq!(base_name("(1).txt"), ("(1)".into(), false));
    }

    #[test]
    fn marker_only_names_are_not_stripped_to_nothing() {
        assert_eq!(base_name("_old.txt"), ("_old".into(), false));
    }

    #[test]
    fn only_one_marker_is_removed() {
        assert_eq!(base_name("notes_old_copy.txt"), ("notes_old".into(), true));
    }

    fn tree_with(dirs: &[(&str, &[&str])]) -> FileTree {
        let mut tree = FileTree::with_capacity(16);
        let root = tree.add_root(Path::new("/r"));
        for (dir, files) in dirs {
            let d = tree.add_node(FileNode::new_dir(CompactString::new(dir), Some(root)));
            tree.add_child(root, d);
            for f in *files {
                let idx = tree.add_node(FileNode::new_file(CompactString::new(f), 1, Some(d)));
                tree.add_child(d, idx);
            }
        }
        tree
    }

    #[test]
    fn groups_same_directory_variants() {
        let tree = tree_with(&[("docs", &["plan.md", "plan_old.md", "plan (1).md", "other.md"])]);
        let groups = find_name_variants(&tree);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].base, "plan");
        assert_eq!(groups[0].extension, "md");
        assert_eq!(groups[0].files.len(), 3);
        assert_eq!(groups[0].directory, PathBuf::from("/r/docs"));
    }

    #[test]
    fn different_directories_do_not_mix() {
        let tree = tree_with(&[("a", &["plan.md"]), ("b", &["plan_copy.md"])]);
        assert!(find_name_variants(&tree).is_empty());
    }

    #[test]
    fn unmarked_same_names_with_different_extensions_are_ignored() {
        let tree = tree_with(&[("a", &["plan.md", "plan.txt"])]);
        assert!(find_name_variants(&tree).is_empty());
    }

    #[test]
    fn one_character_names() {
        assert_eq!(base_name("a.txt"), ("a".into(), false));
        assert_eq!(base_name("1.jpg"), ("1".into(), false));
        assert_eq!(base_name("x"), ("x".into(), false));
        assert_eq!(base_name("a_1.txt"), ("a".into(), true));

        let tree = tree_with(&[("d", &["a.txt", "a_1.txt", "b.py"])]);
        let groups = find_name_variants(&tree);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].base, "a");
    }
}
