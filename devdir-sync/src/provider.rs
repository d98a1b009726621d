//! Collaborator interfaces the reconciliation engine is written against.
//!
//! One trait per external system: the issue host (GitHub or a test fake),
//! the social feed, and the snapshot store. Implementations live in their
//! own crates; the engine only ever sees these seams.

use serde_json::Value;
use thiserror::Error;

use devdir_core::types::{Issue, IssueState, OrgAvatar, PullRequest, RepoSlug};

/// Failure surfaced by any collaborator call.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The remote rejected or failed the operation.
    #[error("{operation} failed: {message}")]
    Remote { operation: String, message: String },

    /// The remote answered with a payload we could not decode.
    #[error("unexpected payload from {operation}: {message}")]
    Decode { operation: String, message: String },
}

impl ProviderError {
    pub fn remote(operation: impl Into<String>, message: impl ToString) -> Self {
        Self::Remote {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    pub fn decode(operation: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            operation: operation.into(),
            message: message.to_string(),
        }
    }
}

/// Partial issue update. Unset fields are left untouched by the host.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct IssuePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<IssueState>,
}

impl IssuePatch {
    pub fn state(state: IssueState) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }
}

/// The issue-hosting service (issues, pull requests, labels, org metadata,
/// partner repository resolution).
///
/// Pagination, authentication and rate limiting are implementation
/// concerns; the engine sees complete lists.
pub trait IssueHost {
    /// Full issue list for a repository, open and closed.
    fn fetch_all_issues(&self, repo: &RepoSlug) -> Result<Vec<Issue>, ProviderError>;

    /// Full pull-request list, used for the per-run snapshot only.
    fn fetch_all_pull_requests(&self, repo: &RepoSlug) -> Result<Vec<PullRequest>, ProviderError>;

    fn create_issue(
        &self,
        repo: &RepoSlug,
        title: &str,
        body: &str,
        labels: &[String],
    ) -> Result<Issue, ProviderError>;

    fn update_issue(
        &self,
        repo: &RepoSlug,
        number: u64,
        patch: &IssuePatch,
    ) -> Result<Issue, ProviderError>;

    fn add_label(&self, repo: &RepoSlug, number: u64, label: &str) -> Result<(), ProviderError>;

    fn remove_label(&self, repo: &RepoSlug, number: u64, label: &str)
        -> Result<(), ProviderError>;

    /// Avatar lookup for a partner organization.
    fn fetch_org_avatar(&self, owner: &str) -> Result<OrgAvatar, ProviderError>;

    /// Resolve configured include/exclude lists into partner repositories.
    fn list_partner_repos(
        &self,
        filter: &devdir_core::PartnerFilter,
    ) -> Result<Vec<RepoSlug>, ProviderError>;
}

/// The social feed new postings are announced to.
pub trait SocialFeed {
    /// Post an update; returns the post id when the feed produces one.
    fn post_update(&self, text: &str) -> Result<Option<String>, ProviderError>;

    fn delete_update(&self, id: &str) -> Result<(), ProviderError>;
}

/// A feed that swallows everything. Used when no credentials are
/// configured and in dry runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFeed;

impl SocialFeed for NullFeed {
    fn post_update(&self, _text: &str) -> Result<Option<String>, ProviderError> {
        Ok(None)
    }

    fn delete_update(&self, _id: &str) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// What a persisted snapshot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKind {
    /// Qualifying partner issues seen this run.
    Tasks,
    /// Pull requests across all partner repositories.
    PullRequests,
    /// Partner org avatar lookups.
    Avatars,
    /// Aggregated reward/task statistics.
    Statistics,
    /// Mapping partner node id -> social post id.
    SocialMap,
}

impl SnapshotKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            SnapshotKind::Tasks => "tasks.json",
            SnapshotKind::PullRequests => "pull-requests.json",
            SnapshotKind::Avatars => "avatars.json",
            SnapshotKind::Statistics => "statistics.json",
            SnapshotKind::SocialMap => "social-map.json",
        }
    }
}

/// Durable storage for per-run result documents. Format and location are
/// the implementation's concern.
pub trait SnapshotStore {
    fn persist(&self, kind: SnapshotKind, data: &Value) -> Result<(), ProviderError>;

    /// Read back a previously persisted snapshot, if any.
    fn load(&self, kind: SnapshotKind) -> Result<Option<Value>, ProviderError>;
}
