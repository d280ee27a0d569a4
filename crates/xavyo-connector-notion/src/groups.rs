//! Group normalisation, group listing, the `member` entitlement and membership grants.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::api_client::NotionApiClient;
use crate::config::GroupListing;
use crate::cursor::{self, PageState};
use crate::resource::{
    new_assignment_entitlement, new_grant, new_group_resource, Entitlement, Grant, Page, Resource,
    ResourceType, ResourceTypes,
};
use crate::scim_client::{ScimClient, ScimGroup};
use crate::traits::ResourceSyncer;
use crate::users::{normalize_user, user_resource};
use crate::{NotionError, NotionResult};

/// Slug of the only entitlement a group offers.
pub const MEMBER_ENTITLEMENT: &str = "member";

/// Reference from a group to a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRef {
    /// Upstream id of the member.
    pub id: String,
    /// Upstream reference type, e.g. `User`.
    pub member_type: Option<String>,
}

/// Normalised access group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub display_name: String,
    /// Members in upstream order, as of fetch time.
    pub members: Vec<MemberRef>,
}

/// Normalises a SCIM group. Fields are copied as-is.
#[must_use]
pub fn normalize_group(raw: &ScimGroup) -> Group {
    Group {
        id: raw.id.clone(),
        display_name: raw.display_name.clone(),
        members: raw
            .members
            .iter()
            .map(|m| MemberRef {
                id: m.value.clone(),
                member_type: m.member_type.clone(),
            })
            .collect(),
    }
}

/// Builds the outbound group resource.
#[must_use]
pub fn group_resource(group: &Group, resource_type: &ResourceType) -> Resource {
    let mut profile = Map::new();
    profile.insert("group_id".into(), Value::from(group.id.as_str()));
    profile.insert("group_name".into(), Value::from(group.display_name.as_str()));

    new_group_resource(&group.display_name, resource_type, &group.id, profile)
}

/// Builds the `member` entitlement of a group resource.
#[must_use]
pub fn member_entitlement(resource: &Resource, user_type: &ResourceType) -> Entitlement {
    new_assignment_entitlement(
        resource,
        MEMBER_ENTITLEMENT,
        format!("{} Group {}", resource.display_name, MEMBER_ENTITLEMENT),
        format!("Member of {} Group in Notion", resource.display_name),
        &[user_type],
    )
}

/// Syncs groups from the SCIM API and resolves their members through the public API.
#[derive(Debug, Clone)]
pub struct GroupSyncer {
    scim_client: ScimClient,
    api_client: NotionApiClient,
    resource_types: Arc<ResourceTypes>,
    page_size: u32,
    listing: GroupListing,
}

impl GroupSyncer {
    #[must_use]
    pub fn new(
        scim_client: ScimClient,
        api_client: NotionApiClient,
        resource_types: Arc<ResourceTypes>,
        page_size: u32,
        listing: GroupListing,
    ) -> Self {
        Self {
            scim_client,
            api_client,
            resource_types,
            page_size,
            listing,
        }
    }

    fn start_index(&self, page_token: Option<&str>) -> NotionResult<u32> {
        let group_type = &self.resource_types.group.id;
        match cursor::decode(page_token, group_type, PageState::groups_start())? {
            PageState::Groups { start_index } => Ok(start_index),
            other => Err(NotionError::InvalidCursor(format!(
                "unexpected page state for groups: {other:?}"
            ))),
        }
    }

    /// Reads every remaining group page starting at `start_index`.
    ///
    /// Groups are returned in upstream order with duplicates removed.
    #[instrument(skip(self))]
    pub async fn drain_groups(&self, start_index: u32) -> NotionResult<Vec<Group>> {
        let mut seen = HashSet::new();
        let mut groups = Vec::new();
        let mut start_index = start_index;

        loop {
            let page = self
                .scim_client
                .list_groups_page(i64::from(start_index), i64::from(self.page_size))
                .await?;
            debug!(
                "Processing page with {} groups (startIndex={}, total={})",
                page.returned(),
                page.start_index,
                page.total_results
            );

            let next = page.next_start_index();
            for raw in &page.groups {
                if seen.insert(raw.id.clone()) {
                    groups.push(normalize_group(raw));
                }
            }

            match next {
                Some(n) => start_index = n,
                None => break,
            }
        }

        info!("Group listing complete, {} groups", groups.len());
        Ok(groups)
    }

    async fn list_one_page(&self, start_index: u32) -> NotionResult<(Vec<Group>, Option<u32>)> {
        let page = self
            .scim_client
            .list_groups_page(i64::from(start_index), i64::from(self.page_size))
            .await?;

        let mut seen = HashSet::new();
        let groups = page
            .groups
            .iter()
            .filter(|g| seen.insert(g.id.clone()))
            .map(normalize_group)
            .collect();

        Ok((groups, page.next_start_index()))
    }
}

#[async_trait]
impl ResourceSyncer for GroupSyncer {
    fn resource_type(&self) -> &ResourceType {
        &self.resource_types.group
    }

    #[instrument(skip(self))]
    async fn list(&self, page_token: Option<&str>) -> NotionResult<Page<Resource>> {
        let start_index = self.start_index(page_token)?;

        let (groups, next_start_index) = match self.listing {
            GroupListing::Drain => (self.drain_groups(start_index).await?, None),
            GroupListing::Paged => self.list_one_page(start_index).await?,
        };

        let items = groups
            .iter()
            .map(|g| group_resource(g, &self.resource_types.group))
            .collect();

        Ok(Page {
            items,
            next_page_token: next_start_index
                .map(|start_index| {
                    cursor::encode(
                        &self.resource_types.group.id,
                        &PageState::Groups { start_index },
                    )
                }),
        })
    }

    async fn entitlements(
        &self,
        resource: &Resource,
        _page_token: Option<&str>,
    ) -> NotionResult<Page<Entitlement>> {
        Ok(Page::last(vec![member_entitlement(
            resource,
            &self.resource_types.user,
        )]))
    }

    /// Resolves every member of the group to a user.
    ///
    /// One unresolvable member fails the whole group; no partial grant set is returned.
    #[instrument(skip(self, resource), fields(group_id = %resource.id.resource))]
    async fn grants(
        &self,
        resource: &Resource,
        _page_token: Option<&str>,
    ) -> NotionResult<Page<Grant>> {
        let group = normalize_group(&self.scim_client.get_group(&resource.id.resource).await?);
        let entitlement = member_entitlement(resource, &self.resource_types.user);

        let mut grants = Vec::with_capacity(group.members.len());
        for member in &group.members {
            let user = match self.api_client.find_user_by_id(&member.id).await {
                Ok(user) => user,
                Err(e) => {
                    warn!(
                        "Failed to resolve member {} of group {}: {}",
                        member.id, group.id, e
                    );
                    return Err(e);
                }
            };

            let principal = user_resource(&normalize_user(&user), &self.resource_types.user);
            grants.push(new_grant(&entitlement, principal.id));
        }

        debug!("Group {} has {} grants", group.id, grants.len());
        Ok(Page::last(grants))
    }
}
