//! Blocking GitHub REST client implementing [`IssueHost`].
//!
//! All list endpoints are paginated at 100 rows per page and drained fully;
//! the engine always sees complete lists. Issue lists are fetched with
//! `state=all` so closed mirrors and closed partner issues participate in
//! reconciliation.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use devdir_core::config::PartnerFilter;
use devdir_core::types::{Issue, OrgAvatar, PullRequest, RepoSlug};
use devdir_sync::{IssueHost, IssuePatch, ProviderError};

use crate::error::http_err;
use crate::repos;

const DEFAULT_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "devdir-directory-bot";
const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";
const PAGE_SIZE: usize = 100;

/// Authenticated GitHub API client.
pub struct GithubClient {
    agent: ureq::Agent,
    api_base: String,
    token: String,
}

impl GithubClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_api_base(token, DEFAULT_API_BASE)
    }

    /// Point the client at a non-default API base (GHE, test server).
    pub fn with_api_base(token: impl Into<String>, api_base: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        Self {
            agent,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Fork status and upstream parent of a repository.
    pub fn fetch_repo(&self, repo: &RepoSlug) -> Result<RepoInfo, ProviderError> {
        let url = format!("{}/repos/{repo}", self.api_base);
        let record: RepoRecord = self
            .request("GET", &url)
            .call()
            .map_err(|e| http_err("fetch_repo", e))?
            .into_json()
            .map_err(|e| ProviderError::decode("fetch_repo", e))?;
        Ok(record.into())
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        self.agent
            .request(method, url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", ACCEPT)
            .set("User-Agent", USER_AGENT)
            .set("X-GitHub-Api-Version", API_VERSION)
    }

    fn get_paged_raw<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, FetchError> {
        let mut page = 1u32;
        let mut rows = Vec::new();
        loop {
            let mut request = self
                .request("GET", url)
                .query("per_page", &PAGE_SIZE.to_string())
                .query("page", &page.to_string());
            for (key, value) in query {
                request = request.query(key, value);
            }
            let chunk: Vec<T> = request
                .call()
                .map_err(FetchError::Http)?
                .into_json()
                .map_err(FetchError::Decode)?;
            let chunk_len = chunk.len();
            rows.extend(chunk);
            if chunk_len < PAGE_SIZE {
                break;
            }
            page = page.saturating_add(1);
        }
        Ok(rows)
    }

    fn get_paged<T: DeserializeOwned>(
        &self,
        operation: &str,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, ProviderError> {
        self.get_paged_raw(url, query)
            .map_err(|e| e.into_provider(operation))
    }

    /// Every non-archived repository owned by `owner`.
    ///
    /// Tries the organization endpoint first; user accounts answer 404 there
    /// and fall back to the user endpoint.
    fn list_owner_repos(&self, owner: &str) -> Result<Vec<RepoSlug>, ProviderError> {
        let org_url = format!("{}/orgs/{owner}/repos", self.api_base);
        let records: Vec<OwnedRepoRecord> = match self.get_paged_raw(&org_url, &[]) {
            Ok(records) => records,
            Err(err) if err.is_not_found() => {
                let user_url = format!("{}/users/{owner}/repos", self.api_base);
                self.get_paged(&format!("listing repos of {owner}"), &user_url, &[])?
            }
            Err(err) => return Err(err.into_provider(&format!("listing repos of {owner}"))),
        };
        Ok(records
            .into_iter()
            .filter(|r| !r.archived)
            .filter_map(|r| r.full_name.parse().ok())
            .collect())
    }
}

impl IssueHost for GithubClient {
    fn fetch_all_issues(&self, repo: &RepoSlug) -> Result<Vec<Issue>, ProviderError> {
        let url = format!("{}/repos/{repo}/issues", self.api_base);
        self.get_paged(
            &format!("listing issues of {repo}"),
            &url,
            &[("state", "all")],
        )
    }

    fn fetch_all_pull_requests(&self, repo: &RepoSlug) -> Result<Vec<PullRequest>, ProviderError> {
        let url = format!("{}/repos/{repo}/pulls", self.api_base);
        self.get_paged(
            &format!("listing pull requests of {repo}"),
            &url,
            &[("state", "all")],
        )
    }

    fn create_issue(
        &self,
        repo: &RepoSlug,
        title: &str,
        body: &str,
        labels: &[String],
    ) -> Result<Issue, ProviderError> {
        let url = format!("{}/repos/{repo}/issues", self.api_base);
        self.request("POST", &url)
            .send_json(json!({
                "title": title,
                "body": body,
                "labels": labels,
            }))
            .map_err(|e| http_err("create_issue", e))?
            .into_json()
            .map_err(|e| ProviderError::decode("create_issue", e))
    }

    fn update_issue(
        &self,
        repo: &RepoSlug,
        number: u64,
        patch: &IssuePatch,
    ) -> Result<Issue, ProviderError> {
        let url = format!("{}/repos/{repo}/issues/{number}", self.api_base);
        self.request("PATCH", &url)
            .send_json(patch)
            .map_err(|e| http_err("update_issue", e))?
            .into_json()
            .map_err(|e| ProviderError::decode("update_issue", e))
    }

    fn add_label(&self, repo: &RepoSlug, number: u64, label: &str) -> Result<(), ProviderError> {
        let url = format!("{}/repos/{repo}/issues/{number}/labels", self.api_base);
        self.request("POST", &url)
            .send_json(json!({ "labels": [label] }))
            .map_err(|e| http_err("add_label", e))?;
        Ok(())
    }

    fn remove_label(&self, repo: &RepoSlug, number: u64, label: &str) -> Result<(), ProviderError> {
        let url = format!(
            "{}/repos/{repo}/issues/{number}/labels/{}",
            self.api_base,
            encode_path_segment(label)
        );
        self.request("DELETE", &url)
            .call()
            .map_err(|e| http_err("remove_label", e))?;
        Ok(())
    }

    fn fetch_org_avatar(&self, owner: &str) -> Result<OrgAvatar, ProviderError> {
        let url = format!("{}/users/{owner}", self.api_base);
        let record: OwnerRecord = self
            .request("GET", &url)
            .call()
            .map_err(|e| http_err("fetch_org_avatar", e))?
            .into_json()
            .map_err(|e| ProviderError::decode("fetch_org_avatar", e))?;
        Ok(OrgAvatar {
            owner_name: record.login,
            avatar_url: record.avatar_url,
        })
    }

    fn list_partner_repos(&self, filter: &PartnerFilter) -> Result<Vec<RepoSlug>, ProviderError> {
        repos::select_partners(filter, |owner| self.list_owner_repos(owner))
    }
}

// ---------------------------------------------------------------------------
// Wire records
// ---------------------------------------------------------------------------

/// Fork status of the directory repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
    pub fork: bool,
    /// Upstream parent, present only for forks.
    pub parent: Option<RepoSlug>,
}

#[derive(Debug, Deserialize)]
struct RepoRecord {
    #[serde(default)]
    fork: bool,
    #[serde(default)]
    parent: Option<ParentRecord>,
}

#[derive(Debug, Deserialize)]
struct ParentRecord {
    full_name: String,
}

impl From<RepoRecord> for RepoInfo {
    fn from(record: RepoRecord) -> Self {
        Self {
            fork: record.fork,
            parent: record.parent.and_then(|p| p.full_name.parse().ok()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwnedRepoRecord {
    full_name: String,
    #[serde(default)]
    archived: bool,
}

#[derive(Debug, Deserialize)]
struct OwnerRecord {
    login: String,
    #[serde(default)]
    avatar_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

enum FetchError {
    Http(ureq::Error),
    Decode(std::io::Error),
}

impl FetchError {
    fn is_not_found(&self) -> bool {
        matches!(self, FetchError::Http(ureq::Error::Status(404, _)))
    }

    fn into_provider(self, operation: &str) -> ProviderError {
        match self {
            FetchError::Http(err) => http_err(operation, err),
            FetchError::Decode(err) => ProviderError::decode(operation, err),
        }
    }
}

/// Percent-encode one URL path segment (labels contain spaces and colons).
fn encode_path_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}
