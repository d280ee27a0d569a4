//! Notion public API client for workspace users.
//!
//! User listing is cursor paginated: each response carries `has_more` and an
//! opaque `next_cursor` that is only meaningful while `has_more` is true.

use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::config::clamp_page_size;
use crate::{NotionError, NotionResult};

/// User id the public API resolves to the integration's own bot user.
pub const SELF_USER_ID: &str = "me";

/// `person` sub-record of a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotionPerson {
    #[serde(default)]
    pub email: Option<String>,
}

/// Workspace user as returned by the public API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotionUser {
    pub id: String,
    /// `person` or `bot`.
    #[serde(rename = "type", default)]
    pub user_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub person: Option<NotionPerson>,
    #[serde(default)]
    pub bot: Option<serde_json::Value>,
}

/// `GET /users` list response.
#[derive(Debug, Deserialize)]
struct UserListResponse {
    #[serde(default)]
    results: Vec<NotionUser>,
    #[serde(default)]
    next_cursor: Option<String>,
    #[serde(default)]
    has_more: bool,
}

/// Public API error body.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// One page of the user listing.
#[derive(Debug, Clone)]
pub struct UsersPage {
    pub users: Vec<NotionUser>,
    pub has_more: bool,
    /// Continuation cursor; `None` whenever `has_more` is false.
    pub next_cursor: Option<String>,
}

/// HTTP client for the Notion public API.
#[derive(Clone)]
pub struct NotionApiClient {
    base_url: String,
    api_key: SecretString,
    notion_version: String,
    http_client: Client,
}

impl std::fmt::Debug for NotionApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotionApiClient")
            .field("base_url", &self.base_url)
            .field("notion_version", &self.notion_version)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl NotionApiClient {
    /// Creates a new public API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        api_key: SecretString,
        notion_version: &str,
        timeout: Duration,
    ) -> NotionResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent("xavyo-connector-notion/1.0")
            .build()
            .map_err(|e| NotionError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self::with_http_client(
            base_url,
            api_key,
            notion_version,
            http_client,
        ))
    }

    /// Creates a client around a pre-built `reqwest::Client`.
    #[must_use]
    pub fn with_http_client(
        base_url: &str,
        api_key: SecretString,
        notion_version: &str,
        http_client: Client,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            notion_version: notion_version.to_string(),
            http_client,
        }
    }

    /// Fetches one page of users (`GET /users?page_size&start_cursor`).
    #[instrument(skip(self))]
    pub async fn list_users_page(
        &self,
        cursor: Option<&str>,
        page_size: u32,
    ) -> NotionResult<UsersPage> {
        let url = format!("{}/users", self.base_url);
        let mut query = vec![("page_size", clamp_page_size(page_size).to_string())];
        if let Some(c) = cursor.filter(|c| !c.is_empty()) {
            query.push(("start_cursor", c.to_string()));
        }

        debug!("Notion GET {} (cursor={:?})", url, cursor);
        let response = self
            .http_client
            .get(&url)
            .query(&query)
            .bearer_auth(self.api_key.expose_secret())
            .header("Notion-Version", self.notion_version.as_str())
            .send()
            .await?;

        let body: UserListResponse = self.handle_response(response, "users").await?;

        Ok(UsersPage {
            users: body.results,
            has_more: body.has_more,
            next_cursor: if body.has_more { body.next_cursor } else { None },
        })
    }

    /// Gets a single user (`GET /users/{id}`).
    #[instrument(skip(self))]
    pub async fn find_user_by_id(&self, user_id: &str) -> NotionResult<NotionUser> {
        let url = format!("{}/users/{}", self.base_url, user_id);
        self.get(&url, user_id).await
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, subject: &str) -> NotionResult<T> {
        debug!("Notion GET {}", url);
        let response = self
            .http_client
            .get(url)
            .bearer_auth(self.api_key.expose_secret())
            .header("Notion-Version", self.notion_version.as_str())
            .send()
            .await?;
        self.handle_response(response, subject).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        subject: &str,
    ) -> NotionResult<T> {
        let status = response.status();
        if status.is_success() {
            let body = response.text().await?;
            return Ok(serde_json::from_str(&body)?);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND {
            return Err(NotionError::NotFound(subject.to_string()));
        }

        let (code, message) = match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(err) => (
                err.code.unwrap_or_else(|| status.to_string()),
                err.message.unwrap_or(body),
            ),
            Err(_) => (status.to_string(), body),
        };

        Err(NotionError::Api {
            status: status.as_u16(),
            code,
            message,
        })
    }
}
