//! Connector configuration and credentials.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::str::FromStr;

use crate::{NotionError, NotionResult};

/// Default base URL of the Notion public API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.notion.com/v1";

/// Default base URL of the Notion SCIM API.
pub const DEFAULT_SCIM_BASE_URL: &str = "https://www.notion.so/scim/v2";

/// Notion API version sent with every request.
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";

/// Largest page either upstream API will return.
pub const MAX_PAGE_SIZE: u32 = 100;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How group listing walks the SCIM directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupListing {
    /// Read every page in one call and return no page token.
    #[default]
    Drain,
    /// Return one directory page per call with a resumable page token.
    ///
    /// Duplicates are removed within a page only; a group may reappear on a
    /// later page if the directory changes between calls.
    Paged,
}

impl fmt::Display for GroupListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupListing::Drain => write!(f, "drain"),
            GroupListing::Paged => write!(f, "paged"),
        }
    }
}

impl FromStr for GroupListing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "drain" => Ok(GroupListing::Drain),
            "paged" => Ok(GroupListing::Paged),
            other => Err(format!("unknown group listing mode '{other}'")),
        }
    }
}

/// Secrets used to reach Notion.
///
/// The SCIM token is optional. Without it the connector runs read-only over
/// users: no groups, no grants and no deprovisioning.
#[derive(Debug, Clone)]
pub struct NotionCredentials {
    /// Integration token for the public API.
    pub api_key: SecretString,
    /// Bearer token for the SCIM API.
    pub scim_token: Option<SecretString>,
}

impl NotionCredentials {
    /// Creates credentials, treating an empty SCIM token as absent.
    pub fn new(api_key: impl Into<String>, scim_token: Option<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            scim_token: scim_token
                .filter(|t| !t.trim().is_empty())
                .map(SecretString::new),
        }
    }

    /// Loads credentials from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Loads credentials from a custom variable reader.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let api_key = reader("BATON_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingVar("BATON_API_KEY".into()))?;

        Ok(Self::new(api_key, reader("BATON_SCIM_TOKEN").ok()))
    }

    /// Returns true if a SCIM token was supplied.
    #[must_use]
    pub fn has_scim_token(&self) -> bool {
        self.scim_token
            .as_ref()
            .is_some_and(|t| !t.expose_secret().is_empty())
    }
}

/// Non-secret connector settings.
#[derive(Debug, Clone)]
pub struct NotionConfig {
    /// Base URL of the public API.
    pub api_base_url: String,
    /// Base URL of the SCIM API.
    pub scim_base_url: String,
    /// Value of the `Notion-Version` header.
    pub notion_version: String,
    /// Users requested per page.
    pub user_page_size: u32,
    /// Groups requested per page.
    pub group_page_size: u32,
    /// Per-request timeout.
    pub request_timeout_secs: u64,
    /// Group listing mode.
    pub group_listing: GroupListing,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            scim_base_url: DEFAULT_SCIM_BASE_URL.to_string(),
            notion_version: DEFAULT_NOTION_VERSION.to_string(),
            user_page_size: MAX_PAGE_SIZE,
            group_page_size: MAX_PAGE_SIZE,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            group_listing: GroupListing::Drain,
        }
    }
}

impl NotionConfig {
    /// Returns a builder seeded with defaults.
    #[must_use]
    pub fn builder() -> NotionConfigBuilder {
        NotionConfigBuilder::default()
    }

    /// Validates URLs and limits.
    ///
    /// # Errors
    ///
    /// Returns `NotionError::Config` describing the first invalid field.
    pub fn validate(&self) -> NotionResult<()> {
        for (field, value) in [
            ("api_base_url", &self.api_base_url),
            ("scim_base_url", &self.scim_base_url),
        ] {
            let parsed = url::Url::parse(value)
                .map_err(|e| NotionError::Config(format!("{field} is not a valid URL: {e}")))?;
            if parsed.scheme() != "https" && parsed.scheme() != "http" {
                return Err(NotionError::Config(format!(
                    "{field} must use http or https, got '{}'",
                    parsed.scheme()
                )));
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(NotionError::Config(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }

        if self.notion_version.trim().is_empty() {
            return Err(NotionError::Config("notion_version must not be empty".into()));
        }

        Ok(())
    }

    /// Loads settings from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Loads settings from a custom variable reader.
    ///
    /// Every variable is optional and falls back to its default.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let defaults = Self::default();

        let page_size = match reader("NOTION_PAGE_SIZE") {
            Ok(v) => v
                .parse::<u32>()
                .map_err(|e| ConfigError::InvalidValue("NOTION_PAGE_SIZE".into(), e.to_string()))?,
            Err(_) => defaults.user_page_size,
        };

        let request_timeout_secs = match reader("NOTION_REQUEST_TIMEOUT_SECS") {
            Ok(v) => v.parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue("NOTION_REQUEST_TIMEOUT_SECS".into(), e.to_string())
            })?,
            Err(_) => defaults.request_timeout_secs,
        };

        let group_listing = match reader("NOTION_GROUP_LISTING") {
            Ok(v) => v
                .parse::<GroupListing>()
                .map_err(|e| ConfigError::InvalidValue("NOTION_GROUP_LISTING".into(), e))?,
            Err(_) => defaults.group_listing,
        };

        Ok(Self {
            api_base_url: reader("NOTION_API_BASE_URL").unwrap_or(defaults.api_base_url),
            scim_base_url: reader("NOTION_SCIM_BASE_URL").unwrap_or(defaults.scim_base_url),
            notion_version: reader("NOTION_VERSION").unwrap_or(defaults.notion_version),
            user_page_size: clamp_page_size(page_size),
            group_page_size: clamp_page_size(page_size),
            request_timeout_secs,
            group_listing,
        })
    }
}

/// Clamps a requested page size into `1..=MAX_PAGE_SIZE`; zero means the maximum.
#[must_use]
pub fn clamp_page_size(requested: u32) -> u32 {
    if requested == 0 || requested > MAX_PAGE_SIZE {
        MAX_PAGE_SIZE
    } else {
        requested
    }
}

/// Builder for [`NotionConfig`].
#[derive(Debug, Default)]
pub struct NotionConfigBuilder {
    api_base_url: Option<String>,
    scim_base_url: Option<String>,
    notion_version: Option<String>,
    user_page_size: Option<u32>,
    group_page_size: Option<u32>,
    request_timeout_secs: Option<u64>,
    group_listing: Option<GroupListing>,
}

impl NotionConfigBuilder {
    #[must_use]
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn scim_base_url(mut self, url: impl Into<String>) -> Self {
        self.scim_base_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn notion_version(mut self, version: impl Into<String>) -> Self {
        self.notion_version = Some(version.into());
        self
    }

    #[must_use]
    pub fn user_page_size(mut self, size: u32) -> Self {
        self.user_page_size = Some(size);
        self
    }

    #[must_use]
    pub fn group_page_size(mut self, size: u32) -> Self {
        self.group_page_size = Some(size);
        self
    }

    #[must_use]
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn group_listing(mut self, mode: GroupListing) -> Self {
        self.group_listing = Some(mode);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `NotionError::Config` if validation fails.
    pub fn build(self) -> NotionResult<NotionConfig> {
        let defaults = NotionConfig::default();
        let config = NotionConfig {
            api_base_url: trim_url(self.api_base_url.unwrap_or(defaults.api_base_url)),
            scim_base_url: trim_url(self.scim_base_url.unwrap_or(defaults.scim_base_url)),
            notion_version: self.notion_version.unwrap_or(defaults.notion_version),
            user_page_size: clamp_page_size(self.user_page_size.unwrap_or(defaults.user_page_size)),
            group_page_size: clamp_page_size(
                self.group_page_size.unwrap_or(defaults.group_page_size),
            ),
            request_timeout_secs: self
                .request_timeout_secs
                .unwrap_or(defaults.request_timeout_secs),
            group_listing: self.group_listing.unwrap_or(defaults.group_listing),
        };
        config.validate()?;
        Ok(config)
    }
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}
