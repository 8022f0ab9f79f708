//! HTTP directory client.
//!
//! Resolves login credentials to users, lists every user for the roster and
//! fetches conversation history between two users.

use std::time::Duration;

use parley_proto::{ChatPayload, UserId, UserRecord};
use reqwest::StatusCode;
use tracing::debug;

use crate::DirectoryError;

/// Default HTTP timeout for directory requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Directory base URL used when none is configured.
const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Directory client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryConfig {
    /// Base URL, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_BASE_URL.to_string(), request_timeout: DEFAULT_TIMEOUT }
    }
}

/// Directory HTTP client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    http: reqwest::Client,
    base_url: String,
}

impl DirectoryClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &DirectoryConfig) -> Result<Self, DirectoryError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("parley/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, base_url: config.base_url.trim_end_matches('/').to_string() })
    }

    /// Find the user with exactly this name and surname.
    ///
    /// Returns `None` on `404` or an empty body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the status is unexpected or
    /// the body is not a user record.
    pub async fn find_user(&self, name: &str, surname: &str) -> Result<Option<UserRecord>, DirectoryError> {
        let path = format!("/finduser/{}/{}", urlencoding::encode(name), urlencoding::encode(surname));
        let response = self.http.get(self.url(&path)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(%path, "user not found");
            return Ok(None);
        }
        let response = check_status(response, &path)?;

        let body = response.text().await?;
        let body = body.trim();
        if body.is_empty() || body == "null" {
            debug!(%path, "user not found (empty body)");
            return Ok(None);
        }
        Ok(Some(UserRecord::from_json(body)?))
    }

    /// Every user the directory knows, in directory order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the status is unexpected or
    /// the body is not a list of user records.
    pub async fn list_users(&self) -> Result<Vec<UserRecord>, DirectoryError> {
        let path = "/users";
        let response = check_status(self.http.get(self.url(path)).send().await?, path)?;
        Ok(UserRecord::list_from_json(&response.text().await?)?)
    }

    /// Messages exchanged between `own_id` and `peer_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the status is unexpected or
    /// the body is not a list of messages.
    pub async fn conversation(&self, own_id: UserId, peer_id: UserId) -> Result<Vec<ChatPayload>, DirectoryError> {
        let path = format!("/messages/{own_id}/{peer_id}");
        let response = check_status(self.http.get(self.url(&path)).send().await?, &path)?;
        Ok(ChatPayload::list_from_json(&response.text().await?)?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn check_status(response: reqwest::Response, path: &str) -> Result<reqwest::Response, DirectoryError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(DirectoryError::Status { status: status.as_u16(), path: path.to_string() })
    }
}
