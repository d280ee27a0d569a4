//! Error types for the Notion connector.

use thiserror::Error;

/// Result type alias using `NotionError`.
pub type NotionResult<T> = Result<T, NotionError>;

/// Errors that can occur when syncing or provisioning against Notion.
#[derive(Debug, Error)]
pub enum NotionError {
    /// Configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Page token could not be decoded.
    #[error("Invalid page token: {0}")]
    InvalidCursor(String),

    /// Page token was minted for a different resource type.
    #[error("Page token was issued for resource type '{found}', expected '{expected}'")]
    ResourceTypeMismatch { expected: String, found: String },

    /// Resource not found upstream.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Operation needs a credential that was not supplied.
    #[error("Not configured: {0}")]
    NotConfigured(String),

    /// A delete call succeeded but the user is still observable.
    #[error("Deprovisioning of user {user_id} could not be verified: {reason}")]
    DeprovisionVerificationFailed { user_id: String, reason: String },

    /// Connection test failed.
    #[error("Connection test failed: {0}")]
    ConnectionTest(String),

    /// Non-success response from the Notion or SCIM API.
    #[error("API error: {status} {code} - {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Upstream answered successfully but broke its own paging contract.
    #[error("Unexpected upstream response: {0}")]
    UnexpectedResponse(String),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl NotionError {
    /// Returns true if the upstream reported that the resource does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, NotionError::NotFound(_))
    }

    /// Returns true for failures produced by the upstream APIs or the transport.
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            NotionError::Api { .. }
                | NotionError::UnexpectedResponse(_)
                | NotionError::Http(_)
                | NotionError::Json(_)
                | NotionError::NotFound(_)
        )
    }
}
