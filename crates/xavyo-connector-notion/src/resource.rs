//! Normalized resource, entitlement and grant shapes handed to the governance platform.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Resource type id for workspace members.
pub const USER_RESOURCE_TYPE: &str = "user";

/// Resource type id for access groups.
pub const GROUP_RESOURCE_TYPE: &str = "group";

/// Capability a resource type advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceTrait {
    User,
    Group,
}

/// Describes one kind of resource the connector emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceType {
    pub id: String,
    pub display_name: String,
    pub traits: Vec<ResourceTrait>,
}

/// The resource types this connector knows about.
///
/// Built once and handed to each syncer instead of living in process-wide statics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTypes {
    pub user: ResourceType,
    pub group: ResourceType,
}

impl Default for ResourceTypes {
    fn default() -> Self {
        Self {
            user: ResourceType {
                id: USER_RESOURCE_TYPE.to_string(),
                display_name: "User".to_string(),
                traits: vec![ResourceTrait::User],
            },
            group: ResourceType {
                id: GROUP_RESOURCE_TYPE.to_string(),
                display_name: "Group".to_string(),
                traits: vec![ResourceTrait::Group],
            },
        }
    }
}

/// Typed reference to a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId {
    pub resource_type: String,
    pub resource: String,
}

impl ResourceId {
    pub fn new(resource_type: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource: resource.into(),
        }
    }
}

/// Account status reported in a user trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Enabled,
    Disabled,
}

/// Email address attached to a user trait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEmail {
    pub address: String,
    pub is_primary: bool,
}

/// User-specific details of a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserTrait {
    pub profile: Map<String, Value>,
    pub emails: Vec<UserEmail>,
    pub status: UserStatus,
    pub login: String,
}

/// Group-specific details of a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTrait {
    pub profile: Map<String, Value>,
}

/// Trait payload carried by a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceTraits {
    User(UserTrait),
    Group(GroupTrait),
}

/// A synced resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub display_name: String,
    pub traits: ResourceTraits,
}

impl Resource {
    /// Returns the user trait, if this is a user resource.
    #[must_use]
    pub fn user_trait(&self) -> Option<&UserTrait> {
        match &self.traits {
            ResourceTraits::User(t) => Some(t),
            ResourceTraits::Group(_) => None,
        }
    }

    /// Returns the group trait, if this is a group resource.
    #[must_use]
    pub fn group_trait(&self) -> Option<&GroupTrait> {
        match &self.traits {
            ResourceTraits::Group(t) => Some(t),
            ResourceTraits::User(_) => None,
        }
    }
}

/// What holding an entitlement means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitlementPurpose {
    Assignment,
}

/// Something that can be granted on a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
    pub id: String,
    pub resource: ResourceId,
    pub slug: String,
    pub display_name: String,
    pub description: String,
    pub purpose: EntitlementPurpose,
    pub grantable_to: Vec<String>,
}

/// A principal holding an entitlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub id: String,
    pub entitlement: Entitlement,
    pub principal: ResourceId,
}

/// One page of listing output.
///
/// `next_page_token` is `None` once the listing is exhausted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    /// A page with no continuation.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page_token: None,
        }
    }

    /// An empty terminal page.
    pub fn empty() -> Self {
        Self::last(Vec::new())
    }

    /// Returns true if there is nothing left to fetch.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.next_page_token.is_none()
    }
}

/// Builds a user resource.
pub fn new_user_resource(
    display_name: &str,
    resource_type: &ResourceType,
    id: &str,
    user_trait: UserTrait,
) -> Resource {
    Resource {
        id: ResourceId::new(&resource_type.id, id),
        display_name: display_name.to_string(),
        traits: ResourceTraits::User(user_trait),
    }
}

/// Builds a group resource.
pub fn new_group_resource(
    display_name: &str,
    resource_type: &ResourceType,
    id: &str,
    profile: Map<String, Value>,
) -> Resource {
    Resource {
        id: ResourceId::new(&resource_type.id, id),
        display_name: display_name.to_string(),
        traits: ResourceTraits::Group(GroupTrait { profile }),
    }
}

/// Builds an assignment entitlement on `resource`.
pub fn new_assignment_entitlement(
    resource: &Resource,
    slug: &str,
    display_name: String,
    description: String,
    grantable_to: &[&ResourceType],
) -> Entitlement {
    Entitlement {
        id: entitlement_id(&resource.id, slug),
        resource: resource.id.clone(),
        slug: slug.to_string(),
        display_name,
        description,
        purpose: EntitlementPurpose::Assignment,
        grantable_to: grantable_to.iter().map(|rt| rt.id.clone()).collect(),
    }
}

/// Builds a grant of `entitlement` to `principal`.
pub fn new_grant(entitlement: &Entitlement, principal: ResourceId) -> Grant {
    Grant {
        id: format!(
            "{}:{}:{}",
            entitlement.id, principal.resource_type, principal.resource
        ),
        entitlement: entitlement.clone(),
        principal,
    }
}

fn entitlement_id(resource: &ResourceId, slug: &str) -> String {
    format!("{}:{}:{}", resource.resource_type, resource.resource, slug)
}
