//! The Notion connector: client wiring, credential validation and syncer selection.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

use crate::api_client::{NotionApiClient, SELF_USER_ID};
use crate::config::{NotionConfig, NotionCredentials};
use crate::groups::GroupSyncer;
use crate::resource::ResourceTypes;
use crate::scim_client::ScimClient;
use crate::traits::ResourceSyncer;
use crate::users::UserSyncer;
use crate::{NotionError, NotionResult};

/// Descriptive metadata about the connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorMetadata {
    pub display_name: String,
    pub description: String,
}

/// Connector for a Notion workspace.
///
/// Without a SCIM token the connector only syncs users; groups, grants and
/// deprovisioning need the SCIM API.
#[derive(Debug, Clone)]
pub struct NotionConnector {
    config: NotionConfig,
    api_client: NotionApiClient,
    scim_client: Option<ScimClient>,
    resource_types: Arc<ResourceTypes>,
}

impl NotionConnector {
    /// Creates a connector with the default resource types.
    ///
    /// No request is made until a sync or validation call.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or an HTTP client cannot be built.
    pub fn new(config: NotionConfig, credentials: NotionCredentials) -> NotionResult<Self> {
        Self::with_resource_types(config, credentials, ResourceTypes::default())
    }

    /// Creates a connector with caller-supplied resource types.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or an HTTP client cannot be built.
    pub fn with_resource_types(
        config: NotionConfig,
        credentials: NotionCredentials,
        resource_types: ResourceTypes,
    ) -> NotionResult<Self> {
        config.validate()?;
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let api_client = NotionApiClient::new(
            &config.api_base_url,
            credentials.api_key.clone(),
            &config.notion_version,
            timeout,
        )?;

        let scim_client = match credentials.scim_token {
            Some(ref token) if credentials.has_scim_token() => Some(ScimClient::new(
                &config.scim_base_url,
                token.clone(),
                timeout,
            )?),
            _ => None,
        };

        info!(
            directory = scim_client.is_some(),
            group_listing = %config.group_listing,
            "Notion connector created"
        );

        Ok(Self {
            config,
            api_client,
            scim_client,
            resource_types: Arc::new(resource_types),
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &NotionConfig {
        &self.config
    }

    /// Returns the public API client.
    #[must_use]
    pub fn api_client(&self) -> &NotionApiClient {
        &self.api_client
    }

    /// Returns the SCIM client, if a SCIM token was supplied.
    #[must_use]
    pub fn scim_client(&self) -> Option<&ScimClient> {
        self.scim_client.as_ref()
    }

    /// Returns the resource types this connector emits.
    #[must_use]
    pub fn resource_types(&self) -> &ResourceTypes {
        &self.resource_types
    }

    /// Returns true if the SCIM API is available.
    #[must_use]
    pub fn is_directory_configured(&self) -> bool {
        self.scim_client.is_some()
    }

    /// Returns connector metadata.
    #[must_use]
    pub fn metadata(&self) -> ConnectorMetadata {
        ConnectorMetadata {
            display_name: "Notion".to_string(),
            description: "Syncs Notion workspace users, groups and group memberships".to_string(),
        }
    }

    /// Checks that the API key works by looking up the integration's own user.
    ///
    /// # Errors
    ///
    /// Returns `NotionError::ConnectionTest` if the lookup fails.
    #[instrument(skip(self))]
    pub async fn validate(&self) -> NotionResult<()> {
        self.api_client
            .find_user_by_id(SELF_USER_ID)
            .await
            .map_err(|e| NotionError::ConnectionTest(format!("failed to authenticate: {e}")))?;
        info!("Notion credentials validated");
        Ok(())
    }

    /// Returns the user syncer.
    #[must_use]
    pub fn user_syncer(&self) -> UserSyncer {
        UserSyncer::new(
            self.api_client.clone(),
            Arc::clone(&self.resource_types),
            self.config.user_page_size,
        )
    }

    /// Returns the group syncer.
    ///
    /// # Errors
    ///
    /// Returns `NotionError::NotConfigured` without a SCIM token.
    pub fn group_syncer(&self) -> NotionResult<GroupSyncer> {
        let scim_client = self.require_scim()?;
        Ok(GroupSyncer::new(
            scim_client.clone(),
            self.api_client.clone(),
            Arc::clone(&self.resource_types),
            self.config.group_page_size,
            self.config.group_listing,
        ))
    }

    /// Returns a syncer for every resource type available with the supplied credentials.
    #[must_use]
    pub fn resource_syncers(&self) -> Vec<Box<dyn ResourceSyncer>> {
        let mut syncers: Vec<Box<dyn ResourceSyncer>> = vec![Box::new(self.user_syncer())];
        if let Ok(groups) = self.group_syncer() {
            syncers.push(Box::new(groups));
        }
        syncers
    }

    pub(crate) fn require_scim(&self) -> NotionResult<&ScimClient> {
        self.scim_client.as_ref().ok_or_else(|| {
            NotionError::NotConfigured(
                "SCIM token not supplied; directory operations are disabled".into(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> NotionConfig {
        NotionConfig::builder().build().unwrap()
    }

    #[test]
    fn test_read_only_mode_without_scim_token() {
        let connector =
            NotionConnector::new(config(), NotionCredentials::new("secret_abc", None)).unwrap();

        assert!(!connector.is_directory_configured());
        let syncers = connector.resource_syncers();
        assert_eq!(syncers.len(), 1);
        assert_eq!(syncers[0].resource_type().id, "user");
        assert!(matches!(
            connector.group_syncer(),
            Err(NotionError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_full_mode_with_scim_token() {
        let connector = NotionConnector::new(
            config(),
            NotionCredentials::new("secret_abc", Some("scim-token".into())),
        )
        .unwrap();

        assert!(connector.is_directory_configured());
        let ids: Vec<String> = connector
            .resource_syncers()
            .iter()
            .map(|s| s.resource_type().id.clone())
            .collect();
        assert_eq!(ids, vec!["user".to_string(), "group".to_string()]);
    }

    #[test]
    fn test_metadata() {
        let connector =
            NotionConnector::new(config(), NotionCredentials::new("secret_abc", None)).unwrap();
        assert_eq!(connector.metadata().display_name, "Notion");
    }
}
