/// Analysis modules: post-scan algorithms over a finished [`FileTree`](crate::model::FileTree).

pub mod categorize;
pub mod duplicates;
pub mod file_types;
pub mod keeper;
pub mod variants;

pub use categorize::{categorize_tree, summarize, CategorizedFile, CategoryRule, KeywordTable};
pub use duplicates::{find_duplicates, DuplicateGroup, DuplicateOptions, DuplicateScan};
pub use file_types::{analyse_file_types, categorise_extension, CategoryStats, FileCategory};
pub use keeper::{rank_groups, KeeperRules, PathRule};
pub use variants::{find_name_variants, VariantGroup};
