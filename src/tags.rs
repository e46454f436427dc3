//! Tag Fetching - GitHub tag reference discovery
//!
//! Fetches the current set of version tags for a repository from the
//! GitHub refs API. Tag names are extracted by stripping the fixed
//! `refs/tags/` prefix; any ref outside that namespace is treated as an
//! upstream contract violation and fails the repository's run loudly
//! rather than producing a corrupted tag name.

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Reference namespace every returned tag ref must live under
pub const REFS_TAGS_PREFIX: &str = "refs/tags/";

/// Errors from fetching a repository's tag references
#[derive(Debug, Error)]
pub enum TagFetchError {
    /// Transport-level failure or undecodable response
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success status from the refs API; body kept for diagnostics
    #[error("tag fetch from {url} returned {status}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    /// A ref outside the `refs/tags/` namespace
    #[error("malformed tag reference from upstream: {reference:?}")]
    MalformedRef { reference: String },
}

/// One entry of the refs API response; only the ref path matters here
#[derive(Debug, Deserialize)]
struct TagRef {
    #[serde(rename = "ref")]
    reference: String,
}

/// Client for the GitHub tag references endpoint
pub struct TagClient {
    http: Client,
    api_base: String,
}

impl TagClient {
    pub fn new(http: Client, api_base: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into(),
        }
    }

    /// Fetch the full upstream tag set for a repository, in API order
    pub async fn fetch_tags(&self, owner: &str, repo: &str) -> Result<Vec<String>, TagFetchError> {
        let url = format!("{}/repos/{}/{}/git/refs/tags", self.api_base, owner, repo);

        debug!("Fetching tag refs from {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| TagFetchError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TagFetchError::Status { url, status, body });
        }

        let refs: Vec<TagRef> =
            response
                .json()
                .await
                .map_err(|source| TagFetchError::Http {
                    url: url.clone(),
                    source,
                })?;

        let mut tags = Vec::with_capacity(refs.len());
        for TagRef { reference } in refs {
            match reference.strip_prefix(REFS_TAGS_PREFIX) {
                Some(name) => tags.push(name.to_string()),
                None => return Err(TagFetchError::MalformedRef { reference }),
            }
        }

        debug!("Found {} tags for {}/{}", tags.len(), owner, repo);
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> TagClient {
        TagClient::new(Client::new(), server.uri())
    }

    #[tokio::test]
    async fn test_fetch_tags_preserves_api_order() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/acme/widget/git/refs/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "ref": "refs/tags/v1.0" },
                { "ref": "refs/tags/v0.9" },
                { "ref": "refs/tags/v1.1" },
            ])))
            .mount(&server)
            .await;

        let tags = client(&server)
            .fetch_tags("acme", "widget")
            .await
            .expect("fetch should succeed");

        assert_eq!(tags, vec!["v1.0", "v0.9", "v1.1"]);
    }

    #[tokio::test]
    async fn test_fetch_tags_empty_repository() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/acme/widget/git/refs/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let tags = client(&server)
            .fetch_tags("acme", "widget")
            .await
            .expect("fetch should succeed");

        assert!(tags.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_tags_non_success_carries_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/acme/widget/git/refs/tags"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch_tags("acme", "widget")
            .await
            .expect_err("fetch should fail");

        assert_matches!(err, TagFetchError::Status { status, ref body, .. } => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(body, "Not Found");
        });
    }

    #[tokio::test]
    async fn test_fetch_tags_rejects_foreign_ref_namespace() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/acme/widget/git/refs/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "ref": "refs/tags/v1.0" },
                { "ref": "refs/heads/main" },
            ])))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch_tags("acme", "widget")
            .await
            .expect_err("fetch should fail");

        assert_matches!(err, TagFetchError::MalformedRef { ref reference } => {
            assert_eq!(reference, "refs/heads/main");
        });
    }
}
