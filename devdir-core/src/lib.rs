//! Devdir core library — domain types, configuration, errors.
//!
//! Public API surface:
//! - [`types`] — issue/repository records and statistics shapes
//! - [`config`] — file config load + resolved [`config::RunConfig`]
//! - [`error`] — [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{FileConfig, PartnerFilter, RunConfig};
pub use error::ConfigError;
pub use types::{
    Issue, IssueState, Label, OrgAvatar, PullRequest, PullRequestRef, RepoSlug, RewardTotals,
    Statistics, TaskCounts, UserRef,
};
