//! Domain types for the directory reconciliation bot.
//!
//! Remote records (`Issue`, `PullRequest`) carry exactly the fields the
//! reconciliation engine reads; everything else the API returns is dropped
//! at deserialization. All types are serde round-trippable.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// An `owner/repo` pair identifying one GitHub repository.
///
/// Ordered owner-first so slug collections sort and dedupe by organization.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RepoSlug {
    pub owner: String,
    pub repo: String,
}

impl RepoSlug {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Parse a slug out of a repository URL.
    ///
    /// Accepts both the HTML form (`https://github.com/owner/repo`) and the
    /// API form (`https://api.github.com/repos/owner/repo`).
    pub fn from_url(url: &str) -> Result<Self, ConfigError> {
        let path = match url.split_once("//") {
            Some((_, rest)) => match rest.split_once('/') {
                Some((_host, path)) => path,
                None => return Err(ConfigError::InvalidRepo(url.to_string())),
            },
            None => url,
        };
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let first = segments.next();
        let owner = match first {
            Some("repos") => segments.next(),
            other => other,
        };
        match (owner, segments.next()) {
            (Some(owner), Some(repo)) => Ok(Self::new(owner, repo)),
            _ => Err(ConfigError::InvalidRepo(url.to_string())),
        }
    }

    /// The canonical HTML URL for this repository.
    pub fn html_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepoSlug {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() => {
                Ok(Self::new(owner, repo))
            }
            _ => Err(ConfigError::InvalidRepo(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Issue records
// ---------------------------------------------------------------------------

/// Open/closed lifecycle state shared by issues and pull requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    #[default]
    Open,
    Closed,
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueState::Open => write!(f, "open"),
            IssueState::Closed => write!(f, "closed"),
        }
    }
}

/// A label attached to an issue.
///
/// The API returns label objects, but older persisted snapshots (and some
/// fixtures) carry bare strings; both deserialize into the same shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "LabelCompat")]
pub struct Label {
    pub name: String,
}

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LabelCompat {
    Named { name: String },
    Plain(String),
}

impl From<LabelCompat> for Label {
    fn from(compat: LabelCompat) -> Self {
        match compat {
            LabelCompat::Named { name } => Label { name },
            LabelCompat::Plain(name) => Label { name },
        }
    }
}

/// A user reference (assignee).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub login: String,
}

/// Marker payload present only when an "issue" is actually a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PullRequestRef {
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
}

/// A partner or directory issue, reduced to the fields reconciliation reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: u64,
    pub node_id: String,
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub state: IssueState,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub assignee: Option<UserRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<UserRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<PullRequestRef>,
    pub html_url: String,
    pub repository_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Issue {
    /// Label names in source order. Duplicates are preserved here; set
    /// semantics are applied by the comparing code.
    pub fn label_names(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|l| l.name.as_str())
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.label_names().any(|n| n == name)
    }

    /// Whether anyone is assigned, via either the single or the plural field.
    pub fn is_assigned(&self) -> bool {
        self.assignee.is_some() || !self.assignees.is_empty()
    }

    /// Whether this record is a merged pull request.
    pub fn is_merged(&self) -> bool {
        self.pull_request
            .as_ref()
            .map(|pr| pr.merged_at.is_some())
            .unwrap_or(false)
    }
}

/// A pull request record, used only for the per-run snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub state: IssueState,
    pub html_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<DateTime<Utc>>,
}

/// One partner organization's avatar lookup result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgAvatar {
    #[serde(rename = "ownerName")]
    pub owner_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Summed reward amounts, bucketed by directory issue state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RewardTotals {
    pub not_assigned: f64,
    pub assigned: f64,
    pub completed: f64,
    pub total: f64,
}

/// Task counts, bucketed by directory issue state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskCounts {
    pub not_assigned: u64,
    pub assigned: u64,
    pub completed: u64,
    pub total: u64,
}

/// Aggregate statistics derived from a directory issue snapshot.
///
/// Always recomputed from scratch; never mutated incrementally.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Statistics {
    pub rewards: RewardTotals,
    pub tasks: TaskCounts,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_from_html_url() {
        let slug = RepoSlug::from_url("https://github.com/owner/repo").unwrap();
        assert_eq!(slug.owner, "owner");
        assert_eq!(slug.repo, "repo");
    }

    #[test]
    fn slug_from_api_url() {
        let slug = RepoSlug::from_url("https://api.github.com/repos/owner/repo").unwrap();
        assert_eq!(slug, RepoSlug::new("owner", "repo"));
    }

    #[test]
    fn slug_rejects_missing_owner_or_repo() {
        assert!(RepoSlug::from_url("https://github.com").is_err());
        assert!(RepoSlug::from_url("https://github.com/only-owner").is_err());
    }

    #[test]
    fn slug_display_and_from_str() {
        let slug: RepoSlug = "owner/repo".parse().unwrap();
        assert_eq!(slug.to_string(), "owner/repo");
        assert_eq!(slug.html_url(), "https://github.com/owner/repo");
        assert!("no-slash".parse::<RepoSlug>().is_err());
    }

    #[test]
    fn slugs_order_owner_first_and_dedupe_in_sets() {
        let mut slugs = vec![
            RepoSlug::new("beta", "alpha"),
            RepoSlug::new("alpha", "zeta"),
            RepoSlug::new("alpha", "beta"),
        ];
        slugs.sort();
        assert_eq!(
            slugs,
            vec![
                RepoSlug::new("alpha", "beta"),
                RepoSlug::new("alpha", "zeta"),
                RepoSlug::new("beta", "alpha"),
            ]
        );

        let set: std::collections::BTreeSet<RepoSlug> = slugs.into_iter().collect();
        assert!(set.contains(&RepoSlug::new("alpha", "zeta")));
    }

    #[test]
    fn label_deserializes_from_object_and_string() {
        let named: Label = serde_json::from_str(r#"{"name":"Pricing: 200 USD"}"#).unwrap();
        let plain: Label = serde_json::from_str(r#""Pricing: 200 USD""#).unwrap();
        assert_eq!(named, plain);
        assert_eq!(named.name, "Pricing: 200 USD");
    }

    #[test]
    fn issue_state_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&IssueState::Open).unwrap(), r#""open""#);
        let state: IssueState = serde_json::from_str(r#""closed""#).unwrap();
        assert_eq!(state, IssueState::Closed);
    }

    #[test]
    fn assignment_covers_both_fields() {
        let mut issue: Issue = serde_json::from_value(serde_json::json!({
            "id": 1,
            "node_id": "n1",
            "number": 1,
            "title": "t",
            "state": "open",
            "html_url": "https://github.com/o/r/issues/1",
            "repository_url": "https://api.github.com/repos/o/r",
        }))
        .unwrap();
        assert!(!issue.is_assigned());
        issue.assignees.push(UserRef {
            login: "hunter".into(),
        });
        assert!(issue.is_assigned());
    }

    #[test]
    fn statistics_serialize_camel_case() {
        let stats = Statistics::default();
        let json = serde_json::to_value(stats).unwrap();
        assert!(json["rewards"].get("notAssigned").is_some());
        assert!(json["tasks"].get("notAssigned").is_some());
    }
}
