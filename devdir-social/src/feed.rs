//! Bearer-token status feed over a Mastodon-compatible API.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use devdir_sync::{ProviderError, SocialFeed};

/// `DEVDIR_SOCIAL_TOKEN` — bearer token; the feed is disabled when unset.
pub const TOKEN_ENV: &str = "DEVDIR_SOCIAL_TOKEN";
/// `DEVDIR_SOCIAL_BASE_URL` — instance base URL, defaults to mastodon.social.
pub const BASE_URL_ENV: &str = "DEVDIR_SOCIAL_BASE_URL";

const DEFAULT_BASE_URL: &str = "https://mastodon.social";

/// [`SocialFeed`] implementation posting statuses over HTTP.
pub struct HttpFeed {
    agent: ureq::Agent,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct StatusRecord {
    id: String,
}

impl HttpFeed {
    pub fn new(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Build the feed from environment variables. `None` (with a log line)
    /// when no token is configured.
    pub fn from_env() -> Option<Self> {
        let Ok(token) = std::env::var(TOKEN_ENV) else {
            tracing::info!("{TOKEN_ENV} not set, social feed disabled");
            return None;
        };
        let base_url =
            std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Some(Self::new(token, base_url))
    }

    fn statuses_url(&self) -> String {
        format!("{}/api/v1/statuses", self.base_url)
    }

    fn status_url(&self, id: &str) -> String {
        format!("{}/api/v1/statuses/{id}", self.base_url)
    }
}

impl SocialFeed for HttpFeed {
    fn post_update(&self, text: &str) -> Result<Option<String>, ProviderError> {
        let record: StatusRecord = self
            .agent
            .post(&self.statuses_url())
            .set("Authorization", &format!("Bearer {}", self.token))
            .send_json(json!({ "status": text }))
            .map_err(|e| map_err("post_update", e))?
            .into_json()
            .map_err(|e| ProviderError::decode("post_update", e))?;
        tracing::info!("posted status {}", record.id);
        Ok(Some(record.id))
    }

    fn delete_update(&self, id: &str) -> Result<(), ProviderError> {
        self.agent
            .delete(&self.status_url(id))
            .set("Authorization", &format!("Bearer {}", self.token))
            .call()
            .map_err(|e| map_err("delete_update", e))?;
        tracing::info!("deleted status {id}");
        Ok(())
    }
}

fn map_err(operation: &str, err: ureq::Error) -> ProviderError {
    match err {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            ProviderError::remote(operation, format!("status {code}: {body}"))
        }
        ureq::Error::Transport(transport) => ProviderError::remote(operation, transport),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_built_from_trimmed_base() {
        let feed = HttpFeed::new("t", "https://example.social/");
        assert_eq!(feed.statuses_url(), "https://example.social/api/v1/statuses");
        assert_eq!(
            feed.status_url("123"),
            "https://example.social/api/v1/statuses/123"
        );
    }

    #[test]
    fn status_record_decodes_id() {
        let record: StatusRecord = serde_json::from_str(r#"{"id":"109","visibility":"public"}"#)
            .unwrap();
        assert_eq!(record.id, "109");
    }
}
