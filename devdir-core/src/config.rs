//! Run configuration.
//!
//! A [`FileConfig`] is the on-disk YAML document; a [`RunConfig`] is the
//! fully resolved object built once at process start (fork mode detected,
//! dry-run flag applied) and passed by reference into every component.
//! No component reads ambient global state.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::RepoSlug;

/// Partner repository inclusion/exclusion lists.
///
/// Entries are either an org name (`"acme"`) or an explicit slug
/// (`"acme/widgets"`). Org entries expand to every repository of the org;
/// excluded orgs suppress that expansion but never remove explicitly
/// included slugs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PartnerFilter {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// On-disk YAML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    /// The directory repository, as an `owner/repo` slug.
    pub directory: String,
    #[serde(default)]
    pub partners: PartnerFilter,
    /// Where per-run snapshots (tasks, pulls, avatars, statistics) land.
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from("snapshots")
}

/// Fully resolved per-run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub directory: RepoSlug,
    pub partners: PartnerFilter,
    pub snapshot_dir: PathBuf,
    /// Whether the directory repository itself is a fork.
    pub is_directory_repo_forked: bool,
    /// Upstream parent of the directory repository when forked.
    pub upstream: Option<RepoSlug>,
    /// Log would-be mutations without issuing any remote writes.
    pub dry_run: bool,
}

impl FileConfig {
    /// Build the resolved run configuration. Fork detection is the caller's
    /// concern (it requires a remote lookup); the result is threaded in here
    /// once and never re-derived per call.
    pub fn into_run_config(
        self,
        is_directory_repo_forked: bool,
        upstream: Option<RepoSlug>,
        dry_run: bool,
    ) -> Result<RunConfig, ConfigError> {
        let directory: RepoSlug = self.directory.parse()?;
        Ok(RunConfig {
            directory,
            partners: self.partners,
            snapshot_dir: self.snapshot_dir,
            is_directory_repo_forked,
            upstream,
            dry_run,
        })
    }
}

/// `<home>/.devdir/config.yaml`
pub fn default_path() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
    Ok(home.join(".devdir").join("config.yaml"))
}

/// Load the file config from an explicit path.
///
/// Returns `ConfigError::ConfigNotFound` if absent, `ConfigError::Parse`
/// (with path and line context) if malformed YAML.
pub fn load_at(path: &Path) -> Result<FileConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}
