//! API client for the academy REST backend.
//!
//! Fetches directory snapshots for an administrative scope and submits
//! outbound announcements and SMS messages.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::directory::{BranchLists, DirectoryPayload, DirectoryTree, Scope};
use crate::models::{Channel, OutboundMessage};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// Directory trees for large academies are a few hundred KB; 30s is ample.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

const GLOBAL_DIRECTORY_PATH: &str = "audience/directory";
const ANNOUNCEMENTS_PATH: &str = "announcements";
const SMS_PATH: &str = "sms";

/// Response to a create request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageReceipt {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

/// API client for the academy backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client for a base URL such as `https://academy.example/api`
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn directory_path(scope: &Scope) -> String {
        match scope {
            Scope::Global => GLOBAL_DIRECTORY_PATH.to_string(),
            Scope::Branch(branch) => format!("branches/{}/{}", branch, GLOBAL_DIRECTORY_PATH),
        }
    }

    fn message_path(channel: Channel) -> &'static str {
        match channel {
            Channel::Announcement => ANNOUNCEMENTS_PATH,
            Channel::Sms => SMS_PATH,
        }
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit
    /// (should retry), or Err for other errors.
    async fn check_response_for_retry(response: reqwest::Response) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .get(url)
                .headers(self.auth_headers()?)
                .query(query)
                .send()
                .await
                .with_context(|| format!("Failed to send GET request to {}", url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    return response.json().await
                        .with_context(|| format!("Failed to parse JSON response from {}", url));
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, url: &str, body: &B) -> Result<T> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .post(url)
                .headers(self.auth_headers()?)
                .json(body)
                .send()
                .await
                .with_context(|| format!("Failed to send POST request to {}", url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    return response.json().await
                        .with_context(|| format!("Failed to parse JSON response from {}", url));
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }

    // ===== Directory =====

    /// Fetch the candidate recipients for a scope, optionally filtered
    /// server-side by a search term.
    pub async fn fetch_directory(&self, scope: &Scope, search: Option<&str>) -> Result<DirectoryPayload> {
        let url = self.url(&Self::directory_path(scope));
        let query: Vec<(&str, &str)> = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| vec![("search", s)])
            .unwrap_or_default();

        let payload = match scope {
            Scope::Global => {
                let tree: DirectoryTree = self.get(&url, &query).await?;
                DirectoryPayload::Tree(tree)
            }
            Scope::Branch(branch) => {
                let lists: BranchLists = self.get(&url, &query).await?;
                DirectoryPayload::Branch {
                    branch: branch.clone(),
                    lists,
                }
            }
        };
        debug!(scope = ?scope, search = ?search, "Directory response received");
        Ok(payload)
    }

    // ===== Messages =====

    /// Submit an announcement or SMS with its canonical `target_audience`.
    /// The message's channel picks the endpoint.
    pub async fn submit_message(&self, message: &OutboundMessage) -> Result<MessageReceipt> {
        let url = self.url(Self::message_path(message.channel));
        let receipt: MessageReceipt = self.post(&url, message).await?;
        debug!(channel = %message.channel, id = ?receipt.id, "Message submitted");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BranchId;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = ApiClient::new("https://academy.example/api/").unwrap();
        assert_eq!(client.base_url(), "https://academy.example/api");
        assert_eq!(client.url("sms"), "https://academy.example/api/sms");
    }

    #[test]
    fn test_directory_paths() {
        assert_eq!(ApiClient::directory_path(&Scope::Global), "audience/directory");
        assert_eq!(
            ApiClient::directory_path(&Scope::Branch(BranchId::from("4"))),
            "branches/4/audience/directory"
        );
    }

    #[test]
    fn test_token_becomes_bearer_header() {
        let mut client = ApiClient::new("https://academy.example/api").unwrap();
        assert!(client.auth_headers().unwrap().get(header::AUTHORIZATION).is_none());

        client.set_token("abc123".to_string());
        let headers = client.auth_headers().unwrap();
        assert_eq!(headers[header::AUTHORIZATION], "Bearer abc123");
        assert_eq!(headers[header::ACCEPT], "application/json");
    }

    #[test]
    fn test_message_paths() {
        assert_eq!(ApiClient::message_path(Channel::Announcement), "announcements");
        assert_eq!(ApiClient::message_path(Channel::Sms), "sms");
    }

    #[test]
    fn test_parse_receipt() {
        let receipt: MessageReceipt =
            serde_json::from_str(r#"{"id": 812, "message": "Queued for 42 recipients"}"#).unwrap();
        assert_eq!(receipt.id, Some(serde_json::json!(812)));
        assert_eq!(receipt.message.as_deref(), Some("Queued for 42 recipients"));
    }
}
