//! Common test utilities for xavyo-connector-notion integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};
use xavyo_connector_notion::{
    GroupListing, NotionConfig, NotionConnector, NotionCredentials, ResourceTypes,
};

pub const API_KEY: &str = "secret_test_api_key";
pub const SCIM_TOKEN: &str = "scim-test-token";

/// Test data factory for public API person users.
pub fn create_person(id: &str, name: &str, email: &str) -> Value {
    json!({
        "object": "user",
        "id": id,
        "type": "person",
        "name": name,
        "avatar_url": null,
        "person": { "email": email }
    })
}

/// Test data factory for public API bot users.
pub fn create_bot(id: &str, name: &str) -> Value {
    json!({
        "object": "user",
        "id": id,
        "type": "bot",
        "name": name,
        "avatar_url": null,
        "bot": {}
    })
}

/// Wraps users in a public API list response.
pub fn create_user_list(users: Vec<Value>, next_cursor: Option<&str>) -> Value {
    json!({
        "object": "list",
        "results": users,
        "next_cursor": next_cursor,
        "has_more": next_cursor.is_some()
    })
}

/// Public API error body.
pub fn create_api_error(status: u16, code: &str, message: &str) -> Value {
    json!({
        "object": "error",
        "status": status,
        "code": code,
        "message": message
    })
}

/// Test data factory for SCIM groups.
pub fn create_scim_group(id: &str, name: &str, member_ids: &[&str]) -> Value {
    let members: Vec<Value> = member_ids
        .iter()
        .map(|m| {
            json!({
                "value": m,
                "$ref": format!("https://www.notion.so/scim/v2/Users/{m}"),
                "type": "User"
            })
        })
        .collect();
    json!({
        "schemas": ["urn:ietf:params:scim:schemas:core:2.0:Group"],
        "id": id,
        "displayName": name,
        "members": members
    })
}

/// Generate a sequence of SCIM groups with ids `group-{start}..`.
pub fn generate_scim_groups(start: usize, count: usize) -> Vec<Value> {
    (start..start + count)
        .map(|i| create_scim_group(&format!("group-{i}"), &format!("Group {i}"), &[]))
        .collect()
}

/// Wraps groups in a SCIM list response.
pub fn create_group_list(groups: Vec<Value>, total: usize, start_index: usize) -> Value {
    json!({
        "schemas": ["urn:ietf:params:scim:api:messages:2.0:ListResponse"],
        "totalResults": total,
        "itemsPerPage": groups.len(),
        "startIndex": start_index,
        "Resources": groups
    })
}

/// Test data factory for SCIM users.
pub fn create_scim_user(id: &str, email: &str) -> Value {
    json!({
        "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
        "id": id,
        "userName": email,
        "name": { "givenName": "Test", "familyName": "User", "formatted": "Test User" },
        "emails": [{ "primary": true, "value": email, "type": "work" }],
        "active": true
    })
}

/// SCIM error body.
pub fn create_scim_error(status: u16, detail: &str) -> Value {
    json!({
        "schemas": ["urn:ietf:params:scim:api:messages:2.0:Error"],
        "status": status.to_string(),
        "detail": detail
    })
}

/// Mock server wrapper serving both the public API (`/v1`) and SCIM (`/scim/v2`).
pub struct MockNotionServer {
    pub server: MockServer,
}

impl MockNotionServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn api_base_url(&self) -> String {
        format!("{}/v1", self.server.uri())
    }

    pub fn scim_base_url(&self) -> String {
        format!("{}/scim/v2", self.server.uri())
    }

    pub fn config(&self, listing: GroupListing, page_size: u32) -> NotionConfig {
        NotionConfig::builder()
            .api_base_url(self.api_base_url())
            .scim_base_url(self.scim_base_url())
            .user_page_size(page_size)
            .group_page_size(page_size)
            .request_timeout_secs(5)
            .group_listing(listing)
            .build()
            .expect("valid test config")
    }

    /// Connector with both tokens and default paging.
    pub fn connector(&self) -> NotionConnector {
        self.connector_with(GroupListing::Drain, 100)
    }

    pub fn connector_with(&self, listing: GroupListing, page_size: u32) -> NotionConnector {
        NotionConnector::new(
            self.config(listing, page_size),
            NotionCredentials::new(API_KEY, Some(SCIM_TOKEN.to_string())),
        )
        .expect("connector")
    }

    /// Connector with both tokens and a caller-supplied resource type registry.
    pub fn connector_with_types(&self, listing: GroupListing, types: ResourceTypes) -> NotionConnector {
        NotionConnector::with_resource_types(
            self.config(listing, 100),
            NotionCredentials::new(API_KEY, Some(SCIM_TOKEN.to_string())),
            types,
        )
        .expect("connector")
    }

    /// Connector without a SCIM token.
    pub fn read_only_connector(&self) -> NotionConnector {
        NotionConnector::new(
            self.config(GroupListing::Drain, 100),
            NotionCredentials::new(API_KEY, None),
        )
        .expect("connector")
    }

    /// First user page: request carries no `start_cursor`.
    pub async fn mock_first_users_page(&self, response: Value) {
        Mock::given(method("GET"))
            .and(path("/v1/users"))
            .and(query_param_is_missing("start_cursor"))
            .respond_with(ResponseTemplate::new(200).set_body_json(response))
            .mount(&self.server)
            .await;
    }

    /// User page selected by `start_cursor`.
    pub async fn mock_users_page(&self, cursor: &str, response: Value) {
        Mock::given(method("GET"))
            .and(path("/v1/users"))
            .and(query_param("start_cursor", cursor))
            .respond_with(ResponseTemplate::new(200).set_body_json(response))
            .mount(&self.server)
            .await;
    }

    /// `GET /v1/users/{id}` returning a user.
    pub async fn mock_find_user(&self, user: Value) {
        let id = user["id"].as_str().expect("user id").to_string();
        Mock::given(method("GET"))
            .and(path(format!("/v1/users/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(user))
            .mount(&self.server)
            .await;
    }

    /// `GET /v1/users/{id}` returning 404.
    pub async fn mock_user_not_found(&self, id: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/users/{id}")))
            .respond_with(ResponseTemplate::new(404).set_body_json(create_api_error(
                404,
                "object_not_found",
                "Could not find user",
            )))
            .mount(&self.server)
            .await;
    }

    /// Group page selected by `startIndex`.
    pub async fn mock_groups_page(&self, start_index: usize, response: Value) {
        Mock::given(method("GET"))
            .and(path("/scim/v2/Groups"))
            .and(query_param("startIndex", start_index.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(response))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// `GET /scim/v2/Groups/{id}`.
    pub async fn mock_get_group(&self, group: Value) {
        let id = group["id"].as_str().expect("group id").to_string();
        Mock::given(method("GET"))
            .and(path(format!("/scim/v2/Groups/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(group))
            .mount(&self.server)
            .await;
    }

    /// `DELETE /scim/v2/Users/{id}` with the given status.
    pub async fn mock_delete_user(&self, id: &str, status: u16) {
        let template = if status == 404 {
            ResponseTemplate::new(404).set_body_json(create_scim_error(404, "User not found"))
        } else {
            ResponseTemplate::new(status)
        };
        Mock::given(method("DELETE"))
            .and(path(format!("/scim/v2/Users/{id}")))
            .respond_with(template)
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// `GET /scim/v2/Users/{id}` with the given status; 200 returns a user body.
    pub async fn mock_get_scim_user(&self, id: &str, status: u16) {
        let template = match status {
            200 => ResponseTemplate::new(200)
                .set_body_json(create_scim_user(id, &format!("{id}@example.com"))),
            404 => ResponseTemplate::new(404).set_body_json(create_scim_error(404, "User not found")),
            other => ResponseTemplate::new(other).set_body_json(create_scim_error(other, "upstream failure")),
        };
        Mock::given(method("GET"))
            .and(path(format!("/scim/v2/Users/{id}")))
            .respond_with(template)
            .mount(&self.server)
            .await;
    }
}
