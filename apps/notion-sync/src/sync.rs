//! Walks every resource syncer to completion and collects the resulting graph.

use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};
use xavyo_connector_notion::{Entitlement, Grant, NotionResult, Page, Resource, ResourceSyncer};

/// Everything one sync produced.
#[derive(Debug, Default, Serialize)]
pub struct SyncReport {
    pub resources: Vec<Resource>,
    pub entitlements: Vec<Entitlement>,
    pub grants: Vec<Grant>,
}

impl SyncReport {
    /// Number of resources of the given type.
    pub fn count_of(&self, resource_type: &str) -> usize {
        self.resources
            .iter()
            .filter(|r| r.id.resource_type == resource_type)
            .count()
    }
}

/// Runs `list` for every syncer until it returns a terminal token, then
/// collects the entitlements and grants of each listed resource.
///
/// Resources repeated across pages are kept once, in first-seen order. The
/// first error aborts the walk.
pub async fn run_sync(syncers: &[Box<dyn ResourceSyncer>]) -> NotionResult<SyncReport> {
    let mut report = SyncReport::default();

    for syncer in syncers {
        let resource_type = syncer.resource_type().id.clone();
        let mut resources =
            drain(|token| async move { syncer.list(token.as_deref()).await }).await?;

        let listed = resources.len();
        let mut seen = HashSet::new();
        resources.retain(|r| seen.insert(r.id.clone()));
        if resources.len() < listed {
            debug!(
                resource_type = %resource_type,
                duplicates = listed - resources.len(),
                "Dropped resources repeated across pages"
            );
        }

        for resource in &resources {
            let entitlements = drain(|token| async move {
                syncer.entitlements(resource, token.as_deref()).await
            })
            .await?;
            let grants =
                drain(|token| async move { syncer.grants(resource, token.as_deref()).await })
                    .await?;

            report.entitlements.extend(entitlements);
            report.grants.extend(grants);
        }

        info!(
            resource_type = %resource_type,
            count = resources.len(),
            "Resource type synced"
        );
        report.resources.extend(resources);
    }

    Ok(report)
}

async fn drain<T, F, Fut>(mut fetch: F) -> NotionResult<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: std::future::Future<Output = NotionResult<Page<T>>>,
{
    let mut items = Vec::new();
    let mut token: Option<String> = None;

    loop {
        let page = fetch(token.take()).await?;
        items.extend(page.items);
        match page.next_page_token {
            Some(next) if !next.is_empty() => token = Some(next),
            _ => break,
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Map;
    use xavyo_connector_notion::{
        new_assignment_entitlement, new_grant, new_group_resource, NotionError, ResourceId,
        ResourceType, ResourceTypes,
    };

    /// Serves two single-item pages of groups, each with one entitlement and grant.
    struct FakeGroups {
        types: ResourceTypes,
        fail_grants: bool,
        repeat_on_second_page: bool,
    }

    impl FakeGroups {
        fn group(&self, id: &str) -> Resource {
            new_group_resource(id, &self.types.group, id, Map::new())
        }
    }

    #[async_trait]
    impl ResourceSyncer for FakeGroups {
        fn resource_type(&self) -> &ResourceType {
            &self.types.group
        }

        async fn list(&self, page_token: Option<&str>) -> NotionResult<Page<Resource>> {
            match page_token {
                None => Ok(Page {
                    items: vec![self.group("g-1")],
                    next_page_token: Some("next".into()),
                }),
                Some("next") if self.repeat_on_second_page => {
                    Ok(Page::last(vec![self.group("g-1"), self.group("g-2")]))
                }
                Some("next") => Ok(Page::last(vec![self.group("g-2")])),
                Some(other) => Err(NotionError::InvalidCursor(other.to_string())),
            }
        }

        async fn entitlements(
            &self,
            resource: &Resource,
            _page_token: Option<&str>,
        ) -> NotionResult<Page<Entitlement>> {
            Ok(Page::last(vec![new_assignment_entitlement(
                resource,
                "member",
                format!("{} member", resource.display_name),
                String::new(),
                &[&self.types.user],
            )]))
        }

        async fn grants(
            &self,
            resource: &Resource,
            page_token: Option<&str>,
        ) -> NotionResult<Page<Grant>> {
            if self.fail_grants {
                return Err(NotionError::NotFound("u-missing".into()));
            }
            let entitlements = self.entitlements(resource, page_token).await?;
            Ok(Page::last(
                entitlements
                    .items
                    .iter()
                    .map(|e| new_grant(e, ResourceId::new("user", "u-1")))
                    .collect(),
            ))
        }
    }

    #[tokio::test]
    async fn test_run_sync_follows_tokens() {
        let syncers: Vec<Box<dyn ResourceSyncer>> = vec![Box::new(FakeGroups {
            types: ResourceTypes::default(),
            fail_grants: false,
            repeat_on_second_page: false,
        })];

        let report = run_sync(&syncers).await.unwrap();

        assert_eq!(report.count_of("group"), 2);
        assert_eq!(report.count_of("user"), 0);
        assert_eq!(report.entitlements.len(), 2);
        assert_eq!(report.grants.len(), 2);
        assert_eq!(report.grants[1].id, "group:g-2:member:user:u-1");
    }

    #[tokio::test]
    async fn test_run_sync_stops_on_first_error() {
        let syncers: Vec<Box<dyn ResourceSyncer>> = vec![Box::new(FakeGroups {
            types: ResourceTypes::default(),
            fail_grants: true,
            repeat_on_second_page: false,
        })];

        let err = run_sync(&syncers).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_run_sync_drops_resources_repeated_across_pages() {
        let syncers: Vec<Box<dyn ResourceSyncer>> = vec![Box::new(FakeGroups {
            types: ResourceTypes::default(),
            fail_grants: false,
            repeat_on_second_page: true,
        })];

        let report = run_sync(&syncers).await.unwrap();

        let ids: Vec<&str> = report
            .resources
            .iter()
            .map(|r| r.id.resource.as_str())
            .collect();
        assert_eq!(ids, vec!["g-1", "g-2"]);
        assert_eq!(report.grants.len(), 2);
    }

    #[tokio::test]
    async fn test_report_serializes() {
        let syncers: Vec<Box<dyn ResourceSyncer>> = vec![Box::new(FakeGroups {
            types: ResourceTypes::default(),
            fail_grants: false,
            repeat_on_second_page: false,
        })];

        let report = run_sync(&syncers).await.unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["resources"].as_array().unwrap().len(), 2);
        assert_eq!(json["grants"][0]["principal"]["resource"], "u-1");
    }
}
