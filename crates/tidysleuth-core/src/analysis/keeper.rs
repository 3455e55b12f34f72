/// Heuristic "best copy" selection for duplicate groups.
///
/// Each member is scored from its location and name. Copies living under
/// archive / backup / temp directories, or carrying copy markers such as
/// `report (1).pdf`, score lower; copies in preferred working directories
/// score higher; every directory level costs `depth_penalty`.
use super::duplicates::{DuplicateFile, DuplicateGroup};
use super::variants::base_name;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Component, Path};

/// A path-token rule: any directory component containing a token that
/// starts with `pattern` adds `weight` to the score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRule {
    pub pattern: String,
    pub weight: i64,
}

impl PathRule {
    pub fn new(pattern: &str, weight: i64) -> Self {
        Self {
            pattern: pattern.to_ascii_lowercase(),
            weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeeperRules {
    pub path_rules: Vec<PathRule>,
    /// Added when the file name carries a copy marker (`_copy`, ` (2)`, …).
    pub copy_suffix_penalty: i64,
    /// Subtracted once per directory level below the scan root.
    pub depth_penalty: i64,
    /// Break score ties in favour of the most recently modified copy.
    pub prefer_newer: bool,
}

impl Default for KeeperRules {
    fn default() -> Self {
        Self {
            path_rules: vec![
                PathRule::new("archive", -20),
                PathRule::new("old", -20),
                PathRule::new("backup", -15),
                PathRule::new("tmp", -10),
                PathRule::new("temp", -10),
                PathRule::new("test", -5),
                PathRule::new("core", 10),
                PathRule::new("automation", 10),
                PathRule::new("media", 10),
            ],
            copy_suffix_penalty: -10,
            depth_penalty: 1,
            prefer_newer: true,
        }
    }
}

/// Lowercase alphanumeric tokens of every directory component of `relative`
/// (the file name itself is excluded).
fn directory_tokens(relative: &Path) -> Vec<String> {
    let mut components: Vec<&std::ffi::OsStr> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name),
            _ => None,
        })
        .collect();
    components.pop();

    components
        .iter()
        .flat_map(|name| {
            name.to_string_lossy()
                .to_ascii_lowercase()
                .split(|c: char| !c.is_ascii_alphanumeric())
                .filter(|t| !t.is_empty())
                .map(str::to_owned)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Score a single file. Returns the score and the reasons that moved it.
pub fn score_file(file: &DuplicateFile, rules: &KeeperRules) -> (i64, Vec<String>) {
    let mut score = 0i64;
    let mut reasons = Vec::new();

    let tokens = directory_tokens(&file.relative);
    for rule in &rules.path_rules {
        let pattern = rule.pattern.to_ascii_lowercase();
        if tokens.iter().any(|t| t.starts_with(&pattern)) {
            score += rule.weight;
            reasons.push(format!("{:+} in '{}' directory", rule.weight, rule.pattern));
        }
    }

    let file_name = file
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if base_name(&file_name).1 && rules.copy_suffix_penalty != 0 {
        score += rules.copy_suffix_penalty;
        reasons.push(format!("{:+} copy-style name", rules.copy_suffix_penalty));
    }

    if file.depth > 0 && rules.depth_penalty != 0 {
        let penalty = rules.depth_penalty * file.depth as i64;
        score -= penalty;
        reasons.push(format!("-{penalty} depth {}", file.depth));
    }

    (score, reasons)
}

/// Order the members of `group` so that `files[0]` is the copy to keep.
///
/// Order: score descending, then newest modification time (when
/// `prefer_newer`), then shorter path, then lexicographic path. The result
/// is deterministic for a given group and rule set.
pub fn rank_group(group: &mut DuplicateGroup, rules: &KeeperRules) {
    for file in &mut group.files {
        let (score, reasons) = score_file(file, rules);
        file.score = score;
        file.reasons = reasons;
    }

    group.files.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| {
                if rules.prefer_newer {
                    b.modified.cmp(&a.modified)
                } else {
                    Ordering::Equal
                }
            })
            .then_with(|| a.path.as_os_str().len().cmp(&b.path.as_os_str().len()))
            .then_with(|| a.path.cmp(&b.path))
    });
}

/// Rank every group in place.
pub fn rank_groups(groups: &mut [DuplicateGroup], rules: &KeeperRules) {
    for group in groups {
        rank_group(group, rules);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeIndex;
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime};

    fn file(relative: &str, modified_secs: u64) -> DuplicateFile {
        let relative = PathBuf::from(relative);
        DuplicateFile {
            index: NodeIndex(0),
            path: PathBuf::from("/root").join(&relative),
            depth: relative.components().count().saturating_sub(1),
            relative,
            root: "root".into(),
            modified: Some(SystemTime::UNIX_EPOCH + Duration::from_secs(modified_secs)),
            score: 0,
            reasons: Vec::new(),
        }
    }

    fn group(files: Vec<DuplicateFile>) -> DuplicateGroup {
        DuplicateGroup {
            hash: "h".into(),
            size: 10,
            files,
        }
    }

    #[test]
    fn backup_copies_lose_to_working_copies() {
        let mut g = group(vec![
            file("backup/report.pdf", 100),
            file("docs/report.pdf", 100),
        ]);
        rank_group(&mut g, &KeeperRules::default());
        assert_eq!(g.keeper().relative, PathBuf::from("docs/report.pdf"));
        assert!(g.files[1].score < g.files[0].score);
        assert!(g.files[1].reasons.iter().any(|r| r.contains("backup")));
    }

    #[test]
    fn tokens_match_by_prefix_within_components() {
        let rules = KeeperRules::default();
        let (score, _) = score_file(&file("Old_Stuff/a.txt", 0), &rules);
        assert_eq!(score, -20 - 1);
        // "folder" contains "old" but no token starts with it.
        let (score, _) = score_file(&file("folder/a.txt", 0), &rules);
        assert_eq!(score, -1);
    }

    #[test]
    fn file_name_does_not_trigger_path_rules() {
        let (score, _) = score_file(&file("backup_notes.txt", 0), &KeeperRules::default());
        assert_eq!(score, 0);
    }

    #[test]
    fn copy_markers_are_penalised() {
        let mut g = group(vec![file("photo (1).jpg", 100), file("photo.jpg", 100)]);
        rank_group(&mut g, &KeeperRules::default());
        assert_eq!(g.keeper().relative, PathBuf::from("photo.jpg"));
    }

    #[test]
    fn shallower_copy_wins_on_depth() {
        let mut g = group(vec![file("a/b/c/x.txt", 0), file("a/x.txt", 0)]);
        rank_group(&mut g, &KeeperRules::default());
        assert_eq!(g.keeper().relative, PathBuf::from("a/x.txt"));
    }

    #[test]
    fn newer_copy_breaks_ties() {
        let mut g = group(vec![file("a/x.txt", 100), file("b/x.txt", 200)]);
        rank_group(&mut g, &KeeperRules::default());
        assert_eq!(g.keeper().relative, PathBuf::from("b/x.txt"));

        let rules = KeeperRules {
            prefer_newer: false,
            ..KeeperRules::default()
        };
        rank_group(&mut g, &rules);
        assert_eq!(g.keeper().relative, PathBuf::from("a/x.txt"));
    }

    #[test]
    fn preferred_directories_gain_points() {
        let mut g = group(vec![file("misc/clip.mp4", 0), file("media/clip.mp4", 0)]);
        rank_group(&mut g, &KeeperRules::default());
        assert_eq!(g.keeper().relative, PathBuf::from("media/clip.mp4"));
        assert_eq!(g.keeper().score, 10 - 1);
    }

    #[test]
    fn ranking_is_deterministic() {
        let files = vec![file("b/x", 0), file("a/x", 0), file("c/x", 0)];
        let mut g1 = group(files.clone());
        let mut reversed = files;
        reversed.reverse();
        let mut g2 = group(reversed);
        rank_group(&mut g1, &KeeperRules::default());
        rank_group(&mut g2, &KeeperRules::default());
        let order1: Vec<_> = g1.files.iter().map(|f| f.path.clone()).collect();
        let order2: Vec<_> = g2.files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(order1, order2);
        assert_eq!(g1.keeper().relative, PathBuf::from("a/x"));
    }

    #[test]
    fn short_file_names_rank() {
        let mut g = group(vec![file("backup/a", 0), file("a", 0)]);
        rank_group(&mut g, &KeeperRules::default());
        assert_eq!(g.keeper().relative, PathBuf::from("a"));
    }

    #[test]
    fn patterns_match_regardless_of_case() {
        let rules = KeeperRules {
            path_rules: vec![PathRule {
                pattern: "Backup".into(),
                weight: -15,
            }],
            ..KeeperRules::default()
        };
        let (score, _) = score_file(&file("Backup/report.txt", 0), &rules);
        assert_eq!(score, -15 - 1);
    }
}
