use tidysleuth_core::scanner::progress::ScanProgress;
/// End-to-end scanner integration tests.
///
/// These exercise the real `jwalk` walker against a temporary filesystem:
/// thread spawning, exclusion pruning, arena insertion across several roots,
/// aggregation, and the progress channel.
use tidysleuth_core::scanner::{
    start_scan, ScanHandle, ScanOptions, PROGRESS_CHANNEL_CAPACITY,
};
use tidysleuth_core::Error;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

// ── Helpers ──────────────────────────────────────────────────────────────────

/// ```text
/// root/
///   alpha/
///     a.txt   (100 bytes)
///     b.rs    (200 bytes)
///   beta/
///     c.png   (300 bytes)
///   .git/
///     HEAD    (50 bytes, excluded by default)
///   d.zip     (400 bytes)
/// ```
fn build_test_tree(root: &Path) {
    let alpha = root.join("alpha");
    let beta = root.join("beta");
    let git = root.join(".git");
    fs::create_dir_all(&alpha).unwrap();
    fs::create_dir_all(&beta).unwrap();
    fs::create_dir_all(&git).unwrap();

    write_bytes(&alpha.join("a.txt"), 100);
    write_bytes(&alpha.join("b.rs"), 200);
    write_bytes(&beta.join("c.png"), 300);
    write_bytes(&git.join("HEAD"), 50);
    write_bytes(&root.join("d.zip"), 400);
}

fn write_bytes(path: &Path, n: usize) {
    let mut f = fs::File::create(path).unwrap();
    f.write_all(&vec![0u8; n]).unwrap();
}

fn scan(roots: &[&Path], options: ScanOptions) -> tidysleuth_core::scanner::ScanSummary {
    let roots: Vec<PathBuf> = roots.iter().map(|p| p.to_path_buf()).collect();
    start_scan(roots, options).unwrap().wait().unwrap()
}

/// Drain progress messages until `Complete`, panicking after 30 seconds.
fn drain_to_completion(handle: &ScanHandle) -> Duration {
    let deadline = std::time::Instant::now() + Duration::from_secs(30);
    loop {
        assert!(
            std::time::Instant::now() < deadline,
            "scanner did not complete within 30 seconds"
        );
        match handle.progress_rx.try_recv() {
            Ok(ScanProgress::Complete { duration, .. }) => return duration,
            Ok(ScanProgress::Cancelled) => panic!("scan was unexpectedly cancelled"),
            Ok(_) => continue,
            Err(crossbeam_channel::TryRecvError::Empty) => {
                std::thread::sleep(Duration::from_millis(10));
            }
            Err(crossbeam_channel::TryRecvError::Disconnected) => {
                panic!("scanner channel disconnected before Complete was sent");
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn scan_discovers_all_files() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());

    let summary = scan(&[tmp.path()], ScanOptions::default());
    let tree = &summary.tree;

    assert_eq!(tree.file_count(), 4);
    assert_eq!(tree.total_size, 1_000);
    assert_eq!(summary.error_count, 0);

    let mut names: Vec<PathBuf> = tree.files().map(|(i, _)| tree.relative_path(i)).collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            PathBuf::from("alpha/a.txt"),
            PathBuf::from("alpha/b.rs"),
            PathBuf::from("beta/c.png"),
            PathBuf::from("d.zip"),
        ]
    );
}

#[test]
fn full_paths_point_at_real_files() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());
    let summary = scan(&[tmp.path()], ScanOptions::default());
    for (idx, node) in summary.tree.files() {
        let path = summary.tree.full_path(idx);
        assert_eq!(fs::metadata(&path).unwrap().len(), node.size, "{path:?}");
    }
}

#[test]
fn scan_empty_directory() {
    let tmp = TempDir::new().unwrap();
    let summary = scan(&[tmp.path()], ScanOptions::default());
    assert_eq!(summary.tree.len(), 1, "only the root node");
    assert_eq!(summary.tree.total_size, 0);
}

#[test]
fn hidden_entries_are_opt_in() {
    let tmp = TempDir::new().unwrap();
    write_bytes(&tmp.path().join(".env"), 10);
    write_bytes(&tmp.path().join("visible"), 10);

    assert_eq!(scan(&[tmp.path()], ScanOptions::default()).tree.file_count(), 1);

    let options = ScanOptions {
        include_hidden: true,
        ..ScanOptions::default()
    };
    assert_eq!(scan(&[tmp.path()], options).tree.file_count(), 2);
}

#[test]
fn excluded_directories_are_pruned() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());

    // `.git` is excluded by default even when hidden entries are included.
    let options = ScanOptions {
        include_hidden: true,
        ..ScanOptions::default()
    };
    assert_eq!(scan(&[tmp.path()], options).tree.file_count(), 4);

    let mut options = ScanOptions::default();
    options.exclude.push("alph*".into());
    let summary = scan(&[tmp.path()], options);
    assert_eq!(summary.tree.file_count(), 2);
    assert_eq!(summary.tree.total_size, 700);
}

#[test]
fn max_depth_limits_the_walk() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());
    let options = ScanOptions {
        max_depth: Some(1),
        ..ScanOptions::default()
    };
    let summary = scan(&[tmp.path()], options);
    assert_eq!(summary.tree.file_count(), 1, "only d.zip sits at depth 1");
}

#[test]
fn multiple_roots_share_one_tree() {
    let a = TempDir::new().unwrap();
    let b = TempDir::new().unwrap();
    write_bytes(&a.path().join("one.bin"), 10);
    write_bytes(&b.path().join("two.bin"), 20);

    // The same root twice is scanned once.
    let summary = scan(&[a.path(), b.path(), a.path()], ScanOptions::default());
    let tree = &summary.tree;
    assert_eq!(tree.roots.len(), 2);
    assert_eq!(tree.file_count(), 2);
    assert_eq!(tree.total_size, 30);

    for (idx, node) in tree.files() {
        let expected_root = if node.name == "one.bin" { a.path() } else { b.path() };
        assert_eq!(
            tree.root_path_of(idx),
            expected_root.canonicalize().unwrap().as_path()
        );
    }
}

#[test]
fn nested_roots_are_walked_once() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());
    let alpha = tmp.path().join("alpha");

    // Inner root given before and after the outer one.
    for roots in [[alpha.as_path(), tmp.path()], [tmp.path(), alpha.as_path()]] {
        let summary = scan(&roots, ScanOptions::default());
        let tree = &summary.tree;
        assert_eq!(tree.roots.len(), 1);
        assert_eq!(tree.root_paths[0], tmp.path().canonicalize().unwrap());
        assert_eq!(tree.file_count(), 4);
        assert_eq!(tree.total_size, 1_000);
    }
}

#[cfg(unix)]
#[test]
fn symlinks_are_skipped_and_counted() {
    let tmp = TempDir::new().unwrap();
    write_bytes(&tmp.path().join("real.txt"), 10);
    std::os::unix::fs::symlink(tmp.path().join("real.txt"), tmp.path().join("link.txt")).unwrap();

    let summary = scan(&[tmp.path()], ScanOptions::default());
    assert_eq!(summary.tree.file_count(), 1);
    assert_eq!(summary.symlinks_skipped, 1);
}

#[test]
fn missing_root_fails_fast() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope");
    assert!(matches!(
        start_scan(vec![missing], ScanOptions::default()),
        Err(Error::RootNotFound(_))
    ));

    let file = tmp.path().join("file.txt");
    write_bytes(&file, 1);
    assert!(matches!(
        start_scan(vec![file], ScanOptions::default()),
        Err(Error::NotADirectory(_))
    ));
}

/// Cancellation must stop the scan gracefully; the scanner may already be
/// done by the time it reads the flag, so either terminal message is fine.
#[test]
fn scan_cancellation_sends_terminal_message() {
    let tmp = TempDir::new().unwrap();
    build_test_tree(tmp.path());

    let handle = start_scan(vec![tmp.path().to_path_buf()], ScanOptions::default()).unwrap();
    handle.cancel();
    assert!(handle.is_cancelled());

    let deadline = std::time::Instant::now() + Duration::from_secs(30);
    let mut received_terminal = false;
    while std::time::Instant::now() < deadline {
        match handle.progress_rx.try_recv() {
            Ok(ScanProgress::Cancelled) | Ok(ScanProgress::Complete { .. }) => {
                received_terminal = true;
                break;
            }
            Ok(_) => continue,
            Err(crossbeam_channel::TryRecvError::Empty) => {
                std::thread::sleep(Duration::from_millis(5));
            }
            Err(crossbeam_channel::TryRecvError::Disconnected) => break,
        }
    }
    assert!(received_terminal, "scanner must send Cancelled or Complete within 30 s");
}

#[test]
fn live_tree_is_complete_after_the_channel_reports_completion() {
    let tmp = TempDir::new().unwrap();
    for i in 0..50 {
        write_bytes(&tmp.path().join(format!("file{i:03}.bin")), 1024);
    }

    let handle = start_scan(vec![tmp.path().to_path_buf()], ScanOptions::default()).unwrap();
    let tree_ref = handle.live_tree.clone();
    drain_to_completion(&handle);

    let tree = tree_ref.read();
    assert_eq!(tree.file_count(), 50);
    assert_eq!(tree.total_size, 50 * 1024);
}

/// A zero-capacity channel would make every `send()` block immediately.
const _: () = assert!(
    PROGRESS_CHANNEL_CAPACITY > 0,
    "PROGRESS_CHANNEL_CAPACITY must be > 0"
);
