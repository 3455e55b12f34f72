use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tidysleuth_core::hashing::HashAlgorithm;
use tidysleuth_core::model::size::parse_size;

#[derive(Parser, Debug)]
#[command(
    name = "tidysleuth",
    version,
    about = "Find duplicate files, spot copy-named variants and sort directories by category"
)]
pub struct Cli {
    /// Config file (otherwise ./tidysleuth.toml).
    #[arg(long, global = true, value_name = "PATH", env = "TIDYSLEUTH_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write the report here instead of stdout.
    #[arg(long, short = 'o', global = true, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// More logging (-v debug, -vv trace).
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors.
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
    Markdown,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmArg {
    Md5,
    Sha256,
}

impl From<AlgorithmArg> for HashAlgorithm {
    fn from(value: AlgorithmArg) -> Self {
        match value {
            AlgorithmArg::Md5 => HashAlgorithm::Md5,
            AlgorithmArg::Sha256 => HashAlgorithm::Sha256,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Directories to scan.
    #[arg(required = true, value_name = "DIR")]
    pub roots: Vec<PathBuf>,

    /// Extra path component to skip (repeatable; a trailing `*` matches a prefix).
    #[arg(long, value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Include dotfiles and dot-directories.
    #[arg(long)]
    pub hidden: bool,

    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct HashArgs {
    #[arg(long, value_enum)]
    pub algorithm: Option<AlgorithmArg>,

    /// Ignore files smaller than this (e.g. `1KB`, `2.5 MB`).
    #[arg(long, value_name = "SIZE", value_parser = parse_size_arg)]
    pub min_size: Option<u64>,
}

/// Shared by the commands that change files.
#[derive(Args, Debug, Clone, Default)]
pub struct ApplyArgs {
    /// Perform the actions; without this only the plan is shown.
    #[arg(long)]
    pub apply: bool,

    /// Where to write the journal when applying.
    #[arg(long, value_name = "PATH")]
    pub journal: Option<PathBuf>,

    /// Remove source directories the files left empty (below the scan roots).
    #[arg(long)]
    pub prune_empty: bool,
}

fn parse_size_arg(input: &str) -> Result<u64, String> {
    parse_size(input).map_err(|e| e.to_string())
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Walk directories and summarise what is there.
    Scan(ScanArgs),

    /// List duplicate groups and the copy that would be kept.
    Dupes {
        #[command(flatten)]
        scan: ScanArgs,
        #[command(flatten)]
        hash: HashArgs,
    },

    /// Quarantine (default) or delete redundant duplicate copies.
    Dedupe {
        #[command(flatten)]
        scan: ScanArgs,
        #[command(flatten)]
        hash: HashArgs,
        /// Directory to move redundant copies into.
        #[arg(long, value_name = "DIR", conflicts_with = "delete")]
        quarantine: Option<PathBuf>,
        /// Delete redundant copies instead of quarantining them.
        #[arg(long)]
        delete: bool,
        #[command(flatten)]
        apply: ApplyArgs,
    },

    /// List files whose names differ only by a copy marker (`_old`, ` (2)`, …).
    Variants(ScanArgs),

    /// Classify files using the keyword table.
    Categorize(ScanArgs),

    /// Move or copy files into `<dest>/<category>/`.
    Organize {
        #[command(flatten)]
        scan: ScanArgs,
        #[arg(long, short = 'd', value_name = "DIR")]
        dest: PathBuf,
        /// Copy instead of move.
        #[arg(long)]
        copy: bool,
        #[command(flatten)]
        apply: ApplyArgs,
    },

    /// Reverse the actions recorded in a journal.
    Undo {
        #[arg(value_name = "JOURNAL")]
        journal: PathBuf,
        #[arg(long)]
        apply: bool,
    },

    /// Print the effective configuration as TOML.
    Config,
}
