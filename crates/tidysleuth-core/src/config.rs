/// TOML configuration.
///
/// Every section has a `Default` and `#[serde(default)]`, so a config file
/// only needs the keys it wants to change. Lookup order:
///
/// 1. an explicit path (`--config` or `$TIDYSLEUTH_CONFIG`), which must exist;
/// 2. `./tidysleuth.toml`, if present;
/// 3. built-in defaults.
use crate::analysis::categorize::KeywordTable;
use crate::analysis::duplicates::DuplicateOptions;
use crate::analysis::keeper::KeeperRules;
use crate::error::{Error, Result};
use crate::scanner::ScanOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Config file looked for in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "tidysleuth.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanOptions,
    pub duplicates: DuplicateOptions,
    pub keeper: KeeperRules,
    pub categories: KeywordTable,
}

impl Config {
    /// Parse a config file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml(&contents)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load configuration following the lookup order above.
    ///
    /// Returns the config and the file it came from (`None` for defaults).
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        Self::resolve(explicit, Path::new(LOCAL_CONFIG_FILE))
    }

    fn resolve(explicit: Option<&Path>, local: &Path) -> Result<(Self, Option<PathBuf>)> {
        let source = match explicit.map(Path::to_path_buf) {
            Some(path) if !path.is_file() => {
                return Err(Error::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            Some(path) => Some(path),
            None => local.is_file().then(|| local.to_path_buf()),
        };

        match source {
            Some(path) => {
                debug!("loading config from {}", path.display());
                Ok((Self::load_from_file(&path)?, Some(path)))
            }
            None => Ok((Self::default(), None)),
        }
    }
}
