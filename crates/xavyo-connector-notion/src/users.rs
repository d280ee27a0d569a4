//! User normalisation and the user syncer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::api_client::{NotionApiClient, NotionUser};
use crate::cursor::{self, PageState};
use crate::resource::{
    new_user_resource, Entitlement, Grant, Page, Resource, ResourceType, ResourceTypes,
    UserEmail, UserStatus, UserTrait,
};
use crate::scim_client::ScimUser;
use crate::traits::ResourceSyncer;
use crate::{NotionError, NotionResult};

/// Normalised workspace member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Upstream user id.
    pub id: String,
    pub display_name: String,
    pub first_name: String,
    pub last_name: String,
    /// Primary email; empty when upstream has none.
    pub email: String,
    /// `person` or `bot`, when upstream says.
    pub user_type: Option<String>,
    pub status: UserStatus,
}

impl Identity {
    /// Login used by the governance platform, which is the email address.
    #[must_use]
    pub fn login(&self) -> &str {
        &self.email
    }
}

/// Splits a display name on its first space.
///
/// The first token is the first name and the remainder, unchanged, is the
/// last name, so "Mary Anne Smith" yields ("Mary", "Anne Smith").
#[must_use]
pub fn split_name(name: &str) -> (String, String) {
    let mut parts = name.splitn(2, ' ');
    let first = parts.next().unwrap_or_default().to_string();
    let last = parts.next().unwrap_or_default().to_string();
    (first, last)
}

/// Normalises a public API user.
///
/// The public API exposes no account state, so every user is enabled.
#[must_use]
pub fn normalize_user(raw: &NotionUser) -> Identity {
    let display_name = raw.name.clone().unwrap_or_default();
    let (first_name, last_name) = split_name(&display_name);
    let email = raw
        .person
        .as_ref()
        .and_then(|p| p.email.clone())
        .unwrap_or_default();

    Identity {
        id: raw.id.clone(),
        display_name,
        first_name,
        last_name,
        email,
        user_type: raw.user_type.clone(),
        status: UserStatus::Enabled,
    }
}

/// Normalises a SCIM user.
#[must_use]
pub fn normalize_scim_user(raw: &ScimUser) -> Identity {
    let given = raw.name.given_name.clone().unwrap_or_default();
    let family = raw.name.family_name.clone().unwrap_or_default();

    let display_name = raw
        .name
        .formatted
        .clone()
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| format!("{given} {family}").trim().to_string());
    let display_name = if display_name.is_empty() {
        raw.user_name.clone()
    } else {
        display_name
    };

    let (first_name, last_name) = if given.is_empty() && family.is_empty() {
        split_name(&display_name)
    } else {
        (given, family)
    };

    let email = raw
        .emails
        .iter()
        .find(|e| e.primary)
        .or_else(|| raw.emails.first())
        .map(|e| e.value.clone())
        .unwrap_or_else(|| raw.user_name.clone());

    Identity {
        id: raw.id.clone(),
        display_name,
        first_name,
        last_name,
        email,
        user_type: Some("person".to_string()),
        status: if raw.active {
            UserStatus::Enabled
        } else {
            UserStatus::Disabled
        },
    }
}

/// Builds the outbound user resource for an identity.
#[must_use]
pub fn user_resource(identity: &Identity, resource_type: &ResourceType) -> Resource {
    let mut profile = Map::new();
    profile.insert("first_name".into(), Value::from(identity.first_name.as_str()));
    profile.insert("last_name".into(), Value::from(identity.last_name.as_str()));
    profile.insert("login".into(), Value::from(identity.login()));
    profile.insert("user_id".into(), Value::from(identity.id.as_str()));
    if let Some(ref kind) = identity.user_type {
        profile.insert("user_type".into(), Value::from(kind.as_str()));
    }

    let emails = if identity.email.is_empty() {
        Vec::new()
    } else {
        vec![UserEmail {
            address: identity.email.clone(),
            is_primary: true,
        }]
    };

    new_user_resource(
        &identity.display_name,
        resource_type,
        &identity.id,
        UserTrait {
            profile,
            emails,
            status: identity.status,
            login: identity.login().to_string(),
        },
    )
}

/// Syncs workspace users from the public API, one page per call.
#[derive(Debug, Clone)]
pub struct UserSyncer {
    client: NotionApiClient,
    resource_types: Arc<ResourceTypes>,
    page_size: u32,
}

impl UserSyncer {
    #[must_use]
    pub fn new(client: NotionApiClient, resource_types: Arc<ResourceTypes>, page_size: u32) -> Self {
        Self {
            client,
            resource_types,
            page_size,
        }
    }
}

#[async_trait]
impl ResourceSyncer for UserSyncer {
    fn resource_type(&self) -> &ResourceType {
        &self.resource_types.user
    }

    #[instrument(skip(self))]
    async fn list(&self, page_token: Option<&str>) -> NotionResult<Page<Resource>> {
        let user_type = &self.resource_types.user.id;
        let cursor = match cursor::decode(page_token, user_type, PageState::users_start())? {
            PageState::Users { cursor } => cursor,
            other => {
                return Err(NotionError::InvalidCursor(format!(
                    "unexpected page state for users: {other:?}"
                )))
            }
        };

        let page = self
            .client
            .list_users_page(cursor.as_deref(), self.page_size)
            .await?;

        debug!("Processing page with {} users", page.users.len());
        let items: Vec<Resource> = page
            .users
            .iter()
            .map(|raw| user_resource(&normalize_user(raw), &self.resource_types.user))
            .collect();

        let next_page_token = if page.has_more {
            let next = page.next_cursor.ok_or_else(|| {
                NotionError::UnexpectedResponse(
                    "more users reported without a continuation cursor".into(),
                )
            })?;
            Some(cursor::encode(
                user_type,
                &PageState::Users { cursor: Some(next) },
            ))
        } else {
            info!("User listing complete");
            None
        };

        Ok(Page {
            items,
            next_page_token,
        })
    }

    async fn entitlements(
        &self,
        _resource: &Resource,
        _page_token: Option<&str>,
    ) -> NotionResult<Page<Entitlement>> {
        Ok(Page::empty())
    }

    async fn grants(
        &self,
        _resource: &Resource,
        _page_token: Option<&str>,
    ) -> NotionResult<Page<Grant>> {
        Ok(Page::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_client::NotionPerson;
    use crate::scim_client::{ScimEmail, ScimName};

    fn raw_user(name: Option<&str>, email: Option<&str>) -> NotionUser {
        NotionUser {
            id: "u-1".into(),
            user_type: Some("person".into()),
            name: name.map(String::from),
            avatar_url: None,
            person: email.map(|e| NotionPerson {
                email: Some(e.to_string()),
            }),
            bot: None,
        }
    }

    #[test]
    fn test_split_name_keeps_multi_word_last_name() {
        assert_eq!(
            split_name("Mary Anne Smith"),
            ("Mary".to_string(), "Anne Smith".to_string())
        );
        assert_eq!(split_name("Ada Lovelace"), ("Ada".into(), "Lovelace".into()));
    }

    #[test]
    fn test_split_name_single_and_empty() {
        assert_eq!(split_name("Cher"), ("Cher".into(), String::new()));
        assert_eq!(split_name(""), (String::new(), String::new()));
    }

    #[test]
    fn test_normalize_user_complete() {
        let identity = normalize_user(&raw_user(Some("Mary Anne Smith"), Some("mary@example.com")));
        assert_eq!(identity.first_name, "Mary");
        assert_eq!(identity.last_name, "Anne Smith");
        assert_eq!(identity.email, "mary@example.com");
        assert_eq!(identity.login(), "mary@example.com");
        assert_eq!(identity.status, UserStatus::Enabled);
    }

    #[test]
    fn test_normalize_user_without_person() {
        let identity = normalize_user(&raw_user(Some("Build Bot"), None));
        assert_eq!(identity.email, "");
        assert_eq!(identity.login(), "");
        assert_eq!(identity.status, UserStatus::Enabled);

        let resource = user_resource(&identity, &ResourceTypes::default().user);
        let user_trait = resource.user_trait().unwrap();
        assert!(user_trait.emails.is_empty());
        assert_eq!(user_trait.login, "");
        assert_eq!(user_trait.profile["login"], "");
    }

    #[test]
    fn test_user_resource_profile() {
        let identity = normalize_user(&raw_user(Some("Ada Lovelace"), Some("ada@example.com")));
        let resource = user_resource(&identity, &ResourceTypes::default().user);

        assert_eq!(resource.id.resource_type, "user");
        assert_eq!(resource.id.resource, "u-1");
        assert_eq!(resource.display_name, "Ada Lovelace");

        let user_trait = resource.user_trait().unwrap();
        assert_eq!(user_trait.profile["first_name"], "Ada");
        assert_eq!(user_trait.profile["last_name"], "Lovelace");
        assert_eq!(user_trait.profile["user_id"], "u-1");
        assert_eq!(user_trait.profile["user_type"], "person");
        assert_eq!(
            user_trait.emails,
            vec![UserEmail {
                address: "ada@example.com".into(),
                is_primary: true
            }]
        );
    }

    #[test]
    fn test_normalize_scim_user() {
        let raw = ScimUser {
            schemas: vec![],
            id: "u-7".into(),
            user_name: "grace@example.com".into(),
            name: ScimName {
                given_name: Some("Grace".into()),
                family_name: Some("Hopper".into()),
                formatted: None,
            },
            emails: vec![
                ScimEmail {
                    value: "other@example.com".into(),
                    primary: false,
                    email_type: None,
                },
                ScimEmail {
                    value: "grace@example.com".into(),
                    primary: true,
                    email_type: Some("work".into()),
                },
            ],
            active: false,
        };

        let identity = normalize_scim_user(&raw);
        assert_eq!(identity.display_name, "Grace Hopper");
        assert_eq!(identity.first_name, "Grace");
        assert_eq!(identity.last_name, "Hopper");
        assert_eq!(identity.email, "grace@example.com");
        assert_eq!(identity.status, UserStatus::Disabled);
    }

    #[test]
    fn test_normalize_scim_user_falls_back_to_user_name() {
        let raw = ScimUser {
            schemas: vec![],
            id: "u-8".into(),
            user_name: "solo@example.com".into(),
            name: ScimName::default(),
            emails: vec![],
            active: true,
        };

        let identity = normalize_scim_user(&raw);
        assert_eq!(identity.display_name, "solo@example.com");
        assert_eq!(identity.email, "solo@example.com");
        assert_eq!(identity.status, UserStatus::Enabled);
    }
}
