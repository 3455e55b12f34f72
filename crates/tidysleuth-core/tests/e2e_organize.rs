/// End-to-end organise pipeline: scan → categorise → plan → execute → undo.
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tidysleuth_core::actions::{execute, plan_organize, undo, EntryStatus, OrganizeMode};
use tidysleuth_core::analysis::categorize::CategorySource;
use tidysleuth_core::analysis::{categorize_tree, find_name_variants, KeywordTable};
use tidysleuth_core::scanner::{start_scan, ScanOptions};

fn build(root: &Path) {
    fs::create_dir_all(root.join("inbox/nested")).unwrap();
    fs::write(
        root.join("inbox/grab.py"),
        "import bs4\n# scrape the listing page, then crawl each link\n",
    )
    .unwrap();
    fs::write(root.join("inbox/holiday.jpg"), [0xffu8, 0xd8, 0xff]).unwrap();
    fs::write(root.join("inbox/nested/holiday.jpg"), [1u8, 2, 3, 4]).unwrap();
    fs::write(root.join("inbox/README.md"), "# Inbox\n").unwrap();
}

fn scan(root: &Path) -> tidysleuth_core::model::FileTree {
    start_scan(vec![root.to_path_buf()], ScanOptions::default())
        .unwrap()
        .wait()
        .unwrap()
        .tree
}

#[test]
fn default_table_categorises_by_keyword_then_extension() {
    let tmp = TempDir::new().unwrap();
    build(tmp.path());
    let files = categorize_tree(&scan(tmp.path()), &KeywordTable::default());
    assert_eq!(files.len(), 4);

    let find = |name: &str| {
        files
            .iter()
            .find(|f| f.path.ends_with(name))
            .unwrap_or_else(|| panic!("{name} missing"))
    };
    assert_eq!(find("grab.py").category, "web-scraping");
    assert_eq!(find("grab.py").source, CategorySource::Keyword);
    assert_eq!(find("README.md").category, "documentation");
    assert_eq!(find("inbox/holiday.jpg").category, "images");
    assert_eq!(find("inbox/holiday.jpg").source, CategorySource::Extension);
}

#[test]
fn organize_moves_into_category_folders_and_undo_reverses() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().canonicalize().unwrap();
    build(&root);
    let dest = root.join("sorted");

    let files = categorize_tree(&scan(&root), &KeywordTable::default());
    let plan = plan_organize(&files, &dest, OrganizeMode::Move);
    assert_eq!(plan.len(), 4);

    let journal = execute(&plan, false);
    assert_eq!(journal.count(|s| *s == EntryStatus::Done), 4);
    assert!(dest.join("web-scraping/grab.py").exists());
    assert!(dest.join("documentation/README.md").exists());
    // Two files named holiday.jpg: the second gets a numbered name.
    assert!(dest.join("images/holiday.jpg").exists());
    assert!(dest.join("images/holiday_1.jpg").exists());
    assert!(!root.join("inbox/grab.py").exists());

    // Re-running over the same root plans nothing: everything is in `dest`.
    let again = categorize_tree(&scan(&root), &KeywordTable::default());
    assert!(plan_organize(&again, &dest, OrganizeMode::Move).is_empty());

    let reversed = undo(&journal, false).unwrap();
    assert_eq!(reversed.count(|s| *s == EntryStatus::Done), 4);
    assert!(root.join("inbox/grab.py").exists());
    assert!(root.join("inbox/nested/holiday.jpg").exists());
    assert!(!dest.join("images/holiday_1.jpg").exists());
}

#[test]
fn copy_mode_leaves_sources_in_place() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("src");
    fs::create_dir_all(&root).unwrap();
    build(&root);
    let dest = tmp.path().join("out");

    let files = categorize_tree(&scan(&root), &KeywordTable::default());
    let journal = execute(&plan_organize(&files, &dest, OrganizeMode::Copy), false);
    assert_eq!(journal.count(|s| *s == EntryStatus::Done), 4);
    assert!(root.join("inbox/grab.py").exists());
    assert!(dest.join("web-scraping/grab.py").exists());
}

#[test]
fn name_variants_found_on_disk() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("notes.txt"), "a").unwrap();
    fs::write(tmp.path().join("notes_old.txt"), "b").unwrap();
    fs::write(tmp.path().join("notes (2).txt"), "c").unwrap();
    fs::write(tmp.path().join("todo.txt"), "d").unwrap();

    let groups = find_name_variants(&scan(tmp.path()));
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].base, "notes");
    assert_eq!(groups[0].files.len(), 3);
    assert_eq!(groups[0].files.iter().filter(|f| f.marked).count(), 2);
}
