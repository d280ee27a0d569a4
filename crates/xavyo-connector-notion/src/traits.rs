//! Per-resource-type sync capability.

use async_trait::async_trait;

use crate::resource::{Entitlement, Grant, Page, Resource, ResourceType};
use crate::NotionResult;

/// Lists one resource type together with its entitlements and grants.
///
/// Every call is independent: the only state carried between calls is the
/// page token the caller hands back. A `None` token starts from the beginning
/// and a returned page with no token is the last one.
#[async_trait]
pub trait ResourceSyncer: Send + Sync {
    /// The resource type this syncer emits.
    fn resource_type(&self) -> &ResourceType;

    /// Lists resources.
    async fn list(&self, page_token: Option<&str>) -> NotionResult<Page<Resource>>;

    /// Lists entitlements offered by `resource`.
    async fn entitlements(
        &self,
        resource: &Resource,
        page_token: Option<&str>,
    ) -> NotionResult<Page<Entitlement>>;

    /// Lists grants of `resource`'s entitlements.
    async fn grants(
        &self,
        resource: &Resource,
        page_token: Option<&str>,
    ) -> NotionResult<Page<Grant>>;
}
