//! Notion SCIM 2.0 client for groups, group membership and user removal.
//!
//! The SCIM API pages with a 1-based `startIndex` and a `count` capped at 100.

use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::config::{clamp_page_size, MAX_PAGE_SIZE};
use crate::cursor::FIRST_START_INDEX;
use crate::{NotionError, NotionResult};

const SCIM_CONTENT_TYPE: &str = "application/scim+json";

/// Reference from a group to one of its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScimMember {
    /// Member id; for users this is the public API user id.
    pub value: String,
    #[serde(rename = "$ref", default)]
    pub reference: Option<String>,
    #[serde(rename = "type", default)]
    pub member_type: Option<String>,
}

/// SCIM group resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimGroup {
    #[serde(default)]
    pub schemas: Vec<String>,
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub members: Vec<ScimMember>,
}

/// `GET /Groups` list response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimGroupListResponse {
    #[serde(default)]
    pub total_results: u64,
    #[serde(rename = "Resources", default)]
    pub resources: Vec<ScimGroup>,
    #[serde(default)]
    pub start_index: Option<u64>,
    #[serde(default)]
    pub items_per_page: Option<u64>,
}

/// SCIM `name` complex attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimName {
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub formatted: Option<String>,
}

/// SCIM email entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScimEmail {
    pub value: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(rename = "type", default)]
    pub email_type: Option<String>,
}

/// SCIM user resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimUser {
    #[serde(default)]
    pub schemas: Vec<String>,
    pub id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub name: ScimName,
    #[serde(default)]
    pub emails: Vec<ScimEmail>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// SCIM error body (RFC 7644 section 3.12).
#[derive(Debug, Deserialize)]
struct ScimErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(rename = "scimType", default)]
    scim_type: Option<String>,
}

/// One page of the group listing.
#[derive(Debug, Clone)]
pub struct GroupsPage {
    /// Groups on this page.
    pub groups: Vec<ScimGroup>,
    /// Total number of groups the directory reports.
    pub total_results: u64,
    /// `startIndex` this page was requested with, after normalisation.
    pub start_index: u32,
}

impl GroupsPage {
    /// Number of groups actually returned on this page.
    #[must_use]
    pub fn returned(&self) -> u32 {
        u32::try_from(self.groups.len()).unwrap_or(u32::MAX)
    }

    /// Returns true once every group has been read.
    ///
    /// An empty page always ends the listing, even if `totalResults` claims
    /// otherwise.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        let consumed = u64::from(self.start_index.saturating_sub(FIRST_START_INDEX))
            + u64::from(self.returned());
        self.returned() == 0 || consumed >= self.total_results
    }

    /// `startIndex` of the following page, advanced by the items actually
    /// returned so that short pages are tolerated.
    #[must_use]
    pub fn next_start_index(&self) -> Option<u32> {
        if self.is_exhausted() {
            None
        } else {
            Some(self.start_index.saturating_add(self.returned()))
        }
    }
}

/// Normalises a requested `startIndex`; values below 1 become 1.
#[must_use]
pub fn normalize_start_index(start_index: i64) -> u32 {
    if start_index < i64::from(FIRST_START_INDEX) {
        FIRST_START_INDEX
    } else {
        u32::try_from(start_index).unwrap_or(u32::MAX)
    }
}

/// Normalises a requested `count`; zero, negative or oversized values become 100.
#[must_use]
pub fn normalize_count(count: i64) -> u32 {
    if count <= 0 {
        MAX_PAGE_SIZE
    } else {
        clamp_page_size(u32::try_from(count).unwrap_or(u32::MAX))
    }
}

/// HTTP client for the Notion SCIM API.
#[derive(Clone)]
pub struct ScimClient {
    base_url: String,
    token: SecretString,
    http_client: Client,
}

impl std::fmt::Debug for ScimClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScimClient")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl ScimClient {
    /// Creates a new SCIM client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, token: SecretString, timeout: Duration) -> NotionResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent("xavyo-connector-notion/1.0")
            .build()
            .map_err(|e| NotionError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self::with_http_client(base_url, token, http_client))
    }

    /// Creates a client around a pre-built `reqwest::Client`.
    #[must_use]
    pub fn with_http_client(base_url: &str, token: SecretString, http_client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            http_client,
        }
    }

    /// Base URL of the SCIM API.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches one page of groups (`GET /Groups?startIndex&count`).
    #[instrument(skip(self))]
    pub async fn list_groups_page(&self, start_index: i64, count: i64) -> NotionResult<GroupsPage> {
        let start_index = normalize_start_index(start_index);
        let count = normalize_count(count);
        let url = format!("{}/Groups", self.base_url);

        debug!("SCIM GET {} (startIndex={}, count={})", url, start_index, count);
        let response = self
            .http_client
            .get(&url)
            .query(&[("startIndex", start_index), ("count", count)])
            .bearer_auth(self.token.expose_secret())
            .header("Accept", SCIM_CONTENT_TYPE)
            .send()
            .await?;

        let body: ScimGroupListResponse = self.handle_response(response, "groups").await?;

        Ok(GroupsPage {
            groups: body.resources,
            total_results: body.total_results,
            start_index,
        })
    }

    /// Gets a group with its members (`GET /Groups/{id}`).
    #[instrument(skip(self))]
    pub async fn get_group(&self, group_id: &str) -> NotionResult<ScimGroup> {
        let url = format!("{}/Groups/{}", self.base_url, group_id);
        self.get(&url, group_id).await
    }

    /// Gets a user (`GET /Users/{id}`).
    #[instrument(skip(self))]
    pub async fn get_user(&self, user_id: &str) -> NotionResult<ScimUser> {
        let url = format!("{}/Users/{}", self.base_url, user_id);
        self.get(&url, user_id).await
    }

    /// Deletes a user (`DELETE /Users/{id}`). The response carries no body.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, user_id: &str) -> NotionResult<()> {
        let url = format!("{}/Users/{}", self.base_url, user_id);

        debug!("SCIM DELETE {}", url);
        let response = self
            .http_client
            .delete(&url)
            .bearer_auth(self.token.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT || status.is_success() {
            Ok(())
        } else {
            self.handle_error_response(response, user_id).await
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, subject: &str) -> NotionResult<T> {
        debug!("SCIM GET {}", url);
        let response = self
            .http_client
            .get(url)
            .bearer_auth(self.token.expose_secret())
            .header("Accept", SCIM_CONTENT_TYPE)
            .send()
            .await?;
        self.handle_response(response, subject).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        subject: &str,
    ) -> NotionResult<T> {
        if response.status().is_success() {
            let body = response.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            self.handle_error_response(response, subject).await
        }
    }

    async fn handle_error_response<T>(
        &self,
        response: reqwest::Response,
        subject: &str,
    ) -> NotionResult<T> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status == StatusCode::NOT_FOUND {
            return Err(NotionError::NotFound(subject.to_string()));
        }

        let (code, message) = match serde_json::from_str::<ScimErrorBody>(&body) {
            Ok(err) => (
                err.scim_type.unwrap_or_else(|| status.to_string()),
                err.detail.unwrap_or(body),
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
