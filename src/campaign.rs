//! Campaign Client - Typed operations over the Mailchimp campaign API
//!
//! Four independent remote operations drive one outbound email blast:
//! create a campaign, set its plain-text content, send it, and delete it.
//! Every request carries `Authorization: apikey <key>`; success is decided
//! by HTTP status class, and any non-success response surfaces the URL and
//! body for diagnostics.

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Response};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::config::Credentials;

/// Errors from a single campaign API operation
#[derive(Debug, Error)]
pub enum CampaignError {
    /// Transport-level failure or undecodable response
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success status; body kept for diagnostics
    #[error("campaign API call to {url} returned {status}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    /// Create reported success but returned no usable campaign id
    #[error("campaign created via {url} but response carried no id")]
    MissingId { url: String },
}

/// Plain-text notification body for a repository's new tags
///
/// The exact format is interoperability-sensitive: the receiving rendering
/// pipeline expects the repository identity with its release-page URL, a
/// `New Tag`/`New Tags` label (singular only for exactly one tag), and the
/// comma-joined tag list.
pub fn content_body(owner: &str, repo: &str, new_tags: &[String]) -> String {
    let label = if new_tags.len() == 1 { "Tag" } else { "Tags" };
    format!(
        "Repository: {owner}/{repo} (http://github.com/{owner}/{repo}/release)\n\n\
         New {label}:{tags}\n\n.\n",
        tags = new_tags.join(", ")
    )
}

/// Client for the per-account Mailchimp campaign endpoints
pub struct CampaignClient {
    http: Client,
    api_base: String,
    credentials: Credentials,
}

impl CampaignClient {
    pub fn new(http: Client, api_base: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            http,
            api_base: api_base.into(),
            credentials,
        }
    }

    /// Create a plain-text campaign addressed to the configured list
    ///
    /// Returns the remote campaign id on success.
    pub async fn create_campaign(&self, owner: &str, repo: &str) -> Result<String, CampaignError> {
        let url = format!("{}/campaigns", self.api_base);
        let payload = json!({
            "type": "plaintext",
            "recipients": {
                "list_id": self.credentials.list_id,
            },
            "settings": {
                "subject_line": format!("New release for {}/{}", owner, repo),
                "title": format!("{}/{}", owner, repo),
                "from_name": self.credentials.from_email,
                "reply_to": self.credentials.from_email,
            },
        });

        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, self.auth_header())
            .json(&payload)
            .send()
            .await
            .map_err(|source| CampaignError::Http {
                url: url.clone(),
                source,
            })?;
        let response = Self::check_status(response, &url).await?;

        let body: serde_json::Value =
            response
                .json()
                .await
                .map_err(|source| CampaignError::Http {
                    url: url.clone(),
                    source,
                })?;

        match body.get("id").and_then(|id| id.as_str()) {
            Some(id) if !id.is_empty() => {
                debug!("Created campaign {} for {}/{}", id, owner, repo);
                Ok(id.to_string())
            }
            _ => Err(CampaignError::MissingId { url }),
        }
    }

    /// Set the campaign's plain-text content to the new-tag notification
    pub async fn set_content(
        &self,
        campaign_id: &str,
        owner: &str,
        repo: &str,
        new_tags: &[String],
    ) -> Result<(), CampaignError> {
        let url = format!("{}/campaigns/{}/content", self.api_base, campaign_id);
        let payload = json!({
            "plain_text": content_body(owner, repo, new_tags),
        });

        let response = self
            .http
            .put(&url)
            .header(AUTHORIZATION, self.auth_header())
            .json(&payload)
            .send()
            .await
            .map_err(|source| CampaignError::Http {
                url: url.clone(),
                source,
            })?;
        Self::check_status(response, &url).await?;

        Ok(())
    }

    /// Trigger delivery of the campaign
    pub async fn send_campaign(&self, campaign_id: &str) -> Result<(), CampaignError> {
        let url = format!("{}/campaigns/{}/actions/send", self.api_base, campaign_id);

        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, self.auth_header())
            .send()
            .await
            .map_err(|source| CampaignError::Http {
                url: url.clone(),
                source,
            })?;
        Self::check_status(response, &url).await?;

        debug!("Campaign {} sent", campaign_id);
        Ok(())
    }

    /// Delete the campaign resource (single attempt; see [`crate::retry`])
    pub async fn delete_campaign(&self, campaign_id: &str) -> Result<(), CampaignError> {
        let url = format!("{}/campaigns/{}", self.api_base, campaign_id);

        let response = self
            .http
            .delete(&url)
            .header(AUTHORIZATION, self.auth_header())
            .send()
            .await
            .map_err(|source| CampaignError::Http {
                url: url.clone(),
                source,
            })?;
        Self::check_status(response, &url).await?;

        Ok(())
    }

    fn auth_header(&self) -> String {
        format!("apikey {}", self.credentials.api_key)
    }

    async fn check_status(response: Response, url: &str) -> Result<Response, CampaignError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(CampaignError::Status {
                url: url.to_string(),
                status,
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> Credentials {
        Credentials {
            api_key: "0123456789abcdef-us21".to_string(),
            list_id: "a1b2c3d4e5".to_string(),
            from_email: "releases@example.com".to_string(),
        }
    }

    fn client(server: &MockServer) -> CampaignClient {
        CampaignClient::new(Client::new(), server.uri(), credentials())
    }

    fn strings(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_content_body_plural() {
        let body = content_body("acme", "widget", &strings(&["v1.0", "v1.1"]));

        assert!(body.contains("Repository: acme/widget (http://github.com/acme/widget/release)"));
        assert!(body.contains("New Tags:v1.0, v1.1"));
    }

    #[test]
    fn test_content_body_singular() {
        let body = content_body("acme", "widget", &strings(&["v2.0"]));

        assert!(body.contains("New Tag:v2.0"));
        assert!(!body.contains("New Tags:"));
    }

    #[test]
    fn test_content_body_exact() {
        let body = content_body("acme", "widget", &strings(&["v1.0", "v1.1"]));

        assert_eq!(
            body,
            "Repository: acme/widget (http://github.com/acme/widget/release)\n\n\
             New Tags:v1.0, v1.1\n\n.\n"
        );
    }

    #[tokio::test]
    async fn test_create_campaign_returns_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/campaigns"))
            .and(header("Authorization", "apikey 0123456789abcdef-us21"))
            .and(body_json(serde_json::json!({
                "type": "plaintext",
                "recipients": { "list_id": "a1b2c3d4e5" },
                "settings": {
                    "subject_line": "New release for acme/widget",
                    "title": "acme/widget",
                    "from_name": "releases@example.com",
                    "reply_to": "releases@example.com",
                },
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "c0ffee" })),
            )
            .mount(&server)
            .await;

        let id = client(&server)
            .create_campaign("acme", "widget")
            .await
            .expect("create should succeed");

        assert_eq!(id, "c0ffee");
    }

    #[tokio::test]
    async fn test_create_campaign_without_id_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/campaigns"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let err = client(&server)
            .create_campaign("acme", "widget")
            .await
            .expect_err("create should fail");

        assert_matches!(err, CampaignError::MissingId { .. });
    }

    #[tokio::test]
    async fn test_set_content_sends_notification_body() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/campaigns/c0ffee/content"))
            .and(header("Authorization", "apikey 0123456789abcdef-us21"))
            .and(body_json(serde_json::json!({
                "plain_text":
                    "Repository: acme/widget (http://github.com/acme/widget/release)\n\n\
                     New Tag:v2.0\n\n.\n",
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .set_content("c0ffee", "acme", "widget", &strings(&["v2.0"]))
            .await
            .expect("set_content should succeed");
    }

    #[tokio::test]
    async fn test_send_failure_carries_url_and_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/campaigns/c0ffee/actions/send"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
            .mount(&server)
            .await;

        let err = client(&server)
            .send_campaign("c0ffee")
            .await
            .expect_err("send should fail");

        assert_matches!(err, CampaignError::Status { ref url, ref body, .. } => {
            assert!(url.ends_with("/campaigns/c0ffee/actions/send"));
            assert_eq!(body, "backend exploded");
        });
    }

    #[tokio::test]
    async fn test_delete_campaign() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/campaigns/c0ffee"))
            .and(header("Authorization", "apikey 0123456789abcdef-us21"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .delete_campaign("c0ffee")
            .await
            .expect("delete should succeed");
    }
}
