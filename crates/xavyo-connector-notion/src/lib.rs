//! Notion Connector for xavyo
//!
//! Ingests the users, groups and group memberships of a Notion workspace and
//! exposes them as resources, entitlements and grants. Users come from the
//! cursor-paginated public API; groups and memberships come from the
//! offset-paginated SCIM API, which also serves the one provisioning action,
//! user deprovisioning.
//!
//! # Features
//!
//! - Resumable user listing through opaque page tokens
//! - Group listing that drains the SCIM directory, or pages through it
//! - One `member` entitlement per group, with membership grants resolved
//!   against the public API
//! - Verified user deprovisioning
//! - Read-only mode (users only) when no SCIM token is supplied
//!
//! # Example
//!
//! ```no_run
//! use xavyo_connector_notion::{NotionConfig, NotionConnector, NotionCredentials, ResourceSyncer};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = NotionConfig::builder().build()?;
//! let credentials = NotionCredentials::new("secret_...", Some("scim-token".to_string()));
//!
//! let connector = NotionConnector::new(config, credentials)?;
//! connector.validate().await?;
//!
//! for syncer in connector.resource_syncers() {
//!     let mut token: Option<String> = None;
//!     loop {
//!         let page = syncer.list(token.as_deref()).await?;
//!         token = page.next_page_token;
//!         if token.is_none() {
//!             break;
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod api_client;
mod config;
mod connector;
mod cursor;
mod error;
mod groups;
mod provisioning;
mod resource;
mod scim_client;
mod traits;
mod users;

// Re-exports
pub use api_client::{NotionApiClient, NotionPerson, NotionUser, UsersPage, SELF_USER_ID};
pub use config::{
    clamp_page_size, ConfigError, GroupListing, NotionConfig, NotionConfigBuilder,
    NotionCredentials, DEFAULT_API_BASE_URL, DEFAULT_NOTION_VERSION, DEFAULT_SCIM_BASE_URL,
    MAX_PAGE_SIZE,
};
pub use connector::{ConnectorMetadata, NotionConnector};
pub use cursor::{decode as decode_page_token, encode as encode_page_token, PageState};
pub use error::{NotionError, NotionResult};
pub use groups::{
    group_resource, member_entitlement, normalize_group, Group, GroupSyncer, MemberRef,
    MEMBER_ENTITLEMENT,
};
pub use resource::{
    new_assignment_entitlement, new_grant, new_group_resource, new_user_resource, Entitlement,
    EntitlementPurpose, Grant, GroupTrait, Page, Resource, ResourceId, ResourceTrait,
    ResourceTraits, ResourceType, ResourceTypes, UserEmail, UserStatus, UserTrait,
    GROUP_RESOURCE_TYPE, USER_RESOURCE_TYPE,
};
pub use scim_client::{
    normalize_count, normalize_start_index, GroupsPage, ScimClient, ScimEmail, ScimGroup,
    ScimMember, ScimName, ScimUser,
};
pub use traits::ResourceSyncer;
pub use users::{
    normalize_scim_user, normalize_user, split_name, user_resource, Identity, UserSyncer,
};
