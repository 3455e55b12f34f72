/// End-to-end duplicate pipeline: scan → find → rank → plan → execute → undo,
/// against a real temporary directory.
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use tempfile::TempDir;
use tidysleuth_core::actions::{execute, plan_dedupe, undo, DedupeMode, EntryStatus, Journal};
use tidysleuth_core::analysis::{find_duplicates, rank_groups, DuplicateOptions, KeeperRules};
use tidysleuth_core::hashing::hash_file;
use tidysleuth_core::scanner::{start_scan, ScanOptions};

/// ```text
/// root/
///   docs/report.pdf          "quarterly numbers"   (keeper)
///   backup/report.pdf        "quarterly numbers"
///   docs/report (1).pdf      "quarterly numbers"
///   media/clip.mp4           16 KiB of 0x07        (keeper: +10 media)
///   archive/old/clip.mp4     16 KiB of 0x07
///   docs/unique.txt          "only one"
/// ```
fn build(root: &Path) {
    for dir in ["docs", "backup", "media", "archive/old"] {
        fs::create_dir_all(root.join(dir)).unwrap();
    }
    let report = b"quarterly numbers";
    fs::write(root.join("docs/report.pdf"), report).unwrap();
    fs::write(root.join("backup/report.pdf"), report).unwrap();
    fs::write(root.join("docs/report (1).pdf"), report).unwrap();
    let clip = vec![7u8; 16 * 1024];
    fs::write(root.join("media/clip.mp4"), &clip).unwrap();
    fs::write(root.join("archive/old/clip.mp4"), &clip).unwrap();
    fs::write(root.join("docs/unique.txt"), b"only one").unwrap();
}

fn scan_and_rank(root: &Path) -> tidysleuth_core::analysis::DuplicateScan {
    let summary = start_scan(vec![root.to_path_buf()], ScanOptions::default())
        .unwrap()
        .wait()
        .unwrap();
    let mut dupes =
        find_duplicates(&summary.tree, &DuplicateOptions::default(), &AtomicBool::new(false))
            .unwrap();
    rank_groups(&mut dupes.groups, &KeeperRules::default());
    dupes
}

fn rel(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap().to_path_buf()
}

#[test]
fn finds_groups_and_picks_working_copies() {
    let tmp = TempDir::new().unwrap();
    build(tmp.path());
    let root = tmp.path().canonicalize().unwrap();

    let dupes = scan_and_rank(&root);
    assert_eq!(dupes.groups.len(), 2);
    assert!(dupes.hash_failures.is_empty());

    // Sorted by wasted bytes: the 16 KiB clip group first.
    let clip = &dupes.groups[0];
    assert_eq!(clip.size, 16 * 1024);
    assert_eq!(rel(&root, &clip.keeper().path), PathBuf::from("media/clip.mp4"));

    let report = &dupes.groups[1];
    assert_eq!(report.files.len(), 3);
    assert_eq!(rel(&root, &report.keeper().path), PathBuf::from("docs/report.pdf"));
    assert_eq!(dupes.redundant_files(), 3);
    assert_eq!(dupes.wasted_bytes(), 16 * 1024 + 2 * 17);
}

#[test]
fn quarantine_then_undo_restores_everything() {
    let tmp = TempDir::new().unwrap();
    let data = tmp.path().join("data");
    fs::create_dir_all(&data).unwrap();
    build(&data);
    let data = data.canonicalize().unwrap();
    let quarantine = tmp.path().canonicalize().unwrap().join("q");

    let dupes = scan_and_rank(&data);
    let plan = plan_dedupe(&dupes.groups, &DedupeMode::Quarantine(quarantine.clone()));
    assert_eq!(plan.len(), 3);

    // Dry run first: nothing moves.
    let preview = execute(&plan, true);
    assert!(preview.entries.iter().all(|e| e.status == EntryStatus::Planned));
    assert!(data.join("backup/report.pdf").exists());
    assert!(!quarantine.exists());

    let journal = execute(&plan, false);
    assert_eq!(journal.count(|s| *s == EntryStatus::Done), 3);
    assert!(!data.join("backup/report.pdf").exists());
    assert!(quarantine.join("data/backup/report.pdf").exists());
    assert!(quarantine.join("data/archive/old/clip.mp4").exists());
    assert!(data.join("docs/report.pdf").exists());
    assert!(data.join("media/clip.mp4").exists());

    // A second scan finds nothing left to dedupe.
    assert!(scan_and_rank(&data).groups.is_empty());

    let journal_path = quarantine.join("journal.json");
    journal.save(&journal_path).unwrap();
    let reversed = undo(&Journal::load(&journal_path).unwrap(), false).unwrap();
    assert_eq!(reversed.count(|s| *s == EntryStatus::Done), 3);
    assert!(data.join("backup/report.pdf").exists());
    assert!(data.join("docs/report (1).pdf").exists());
    assert!(data.join("archive/old/clip.mp4").exists());
    assert_eq!(scan_and_rank(&data).groups.len(), 2);
}

#[test]
fn delete_mode_keeps_exactly_one_copy() {
    let tmp = TempDir::new().unwrap();
    build(tmp.path());
    let root = tmp.path().canonicalize().unwrap();

    let dupes = scan_and_rank(&root);
    let journal = execute(&plan_dedupe(&dupes.groups, &DedupeMode::Delete), false);
    assert_eq!(journal.count(|s| *s == EntryStatus::Done), 3);
    assert!(root.join("docs/report.pdf").exists());
    assert!(!root.join("docs/report (1).pdf").exists());
    assert!(root.join("docs/unique.txt").exists());

    let reversed = undo(&journal, false).unwrap();
    assert_eq!(reversed.count(|s| matches!(s, EntryStatus::Skipped { .. })), 3);
}

#[test]
fn cross_root_duplicates_are_found() {
    let a = TempDir::new().unwrap();
    let b = TempDir::new().unwrap();
    fs::write(a.path().join("photo.jpg"), b"pixels").unwrap();
    fs::write(b.path().join("photo.jpg"), b"pixels").unwrap();

    let summary = start_scan(
        vec![a.path().to_path_buf(), b.path().to_path_buf()],
        ScanOptions::default(),
    )
    .unwrap()
    .wait()
    .unwrap();
    let dupes =
        find_duplicates(&summary.tree, &DuplicateOptions::default(), &AtomicBool::new(false))
            .unwrap();
    assert_eq!(dupes.groups.len(), 1);
    let roots: Vec<&str> = dupes.groups[0].files.iter().map(|f| f.root.as_str()).collect();
    assert_ne!(roots[0], roots[1]);
}

#[test]
fn nested_roots_never_pair_a_file_with_itself() {
    let tmp = TempDir::new().unwrap();
    build(tmp.path());
    let root = tmp.path().canonicalize().unwrap();
    fs::create_dir_all(root.join("sub")).unwrap();
    fs::write(root.join("sub/only.txt"), b"one of a kind").unwrap();

    let summary = start_scan(
        vec![root.clone(), root.join("sub"), root.join("docs")],
        ScanOptions::default(),
    )
    .unwrap()
    .wait()
    .unwrap();
    let options = DuplicateOptions::default();
    let mut dupes = find_duplicates(&summary.tree, &options, &AtomicBool::new(false)).unwrap();
    rank_groups(&mut dupes.groups, &KeeperRules::default());
    assert_eq!(dupes.groups.len(), 2);

    // Every member shares the group's size and digest, and no path shows
    // up twice across groups.
    let mut seen = HashSet::new();
    for group in &dupes.groups {
        assert!(group.files.len() >= 2);
        for file in &group.files {
            assert!(seen.insert(file.path.clone()), "{} listed twice", file.path.display());
            assert_eq!(fs::metadata(&file.path).unwrap().len(), group.size);
            assert_eq!(hash_file(&file.path, options.algorithm).unwrap(), group.hash);
        }
    }

    let keepers: HashSet<&Path> = dupes.groups.iter().map(|g| g.keeper().path.as_path()).collect();
    let plan = plan_dedupe(&dupes.groups, &DedupeMode::Delete);
    assert!(plan.actions.iter().all(|a| !keepers.contains(a.source.as_path())));

    let journal = execute(&plan, false);
    assert_eq!(journal.count(|s| *s == EntryStatus::Done), 3);
    assert!(root.join("sub/only.txt").exists());
    assert!(keepers.iter().all(|k| k.exists()));
}
