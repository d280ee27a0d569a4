//! Opaque page tokens.
//!
//! A token is URL-safe base64 over a small JSON document carrying the id of
//! the resource type it was minted for and the position marker of that
//! type's upstream: the public API's opaque cursor for users, the SCIM
//! `startIndex` for groups. A token is only ever decoded against the
//! resource type that produced it.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::mem;

use crate::{NotionError, NotionResult};

/// First SCIM `startIndex`. SCIM is 1-based.
pub const FIRST_START_INDEX: u32 = 1;

/// Resumable listing position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageState {
    /// Position in the public API user listing. `None` is the first page.
    Users { cursor: Option<String> },
    /// Position in the SCIM group listing.
    Groups { start_index: u32 },
}

impl PageState {
    /// First page of the user listing.
    #[must_use]
    pub fn users_start() -> Self {
        PageState::Users { cursor: None }
    }

    /// First page of the group listing.
    #[must_use]
    pub fn groups_start() -> Self {
        PageState::Groups {
            start_index: FIRST_START_INDEX,
        }
    }

    fn is_same_kind(&self, other: &PageState) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

#[derive(Serialize)]
struct TokenRef<'a> {
    rt: &'a str,
    pos: &'a PageState,
}

#[derive(Deserialize)]
struct Token {
    rt: String,
    pos: serde_json::Value,
}

/// Encodes a state minted for `resource_type` into an opaque token.
#[must_use]
pub fn encode(resource_type: &str, state: &PageState) -> String {
    let token = TokenRef {
        rt: resource_type,
        pos: state,
    };
    // Serializing strings and integers cannot fail.
    let json = serde_json::to_vec(&token).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

/// Decodes a token minted for `expected_resource_type`.
///
/// A missing or empty token yields `start`. A decoded position must be of
/// the same kind as `start`.
///
/// # Errors
///
/// - `InvalidCursor` if the token is not one this connector produced.
/// - `ResourceTypeMismatch` if it was produced for another resource type.
pub fn decode(
    token: Option<&str>,
    expected_resource_type: &str,
    start: PageState,
) -> NotionResult<PageState> {
    let token = match token.map(str::trim) {
        None | Some("") => return Ok(start),
        Some(t) => t,
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|e| NotionError::InvalidCursor(format!("not base64: {e}")))?;

    let token: Token = serde_json::from_slice(&bytes)
        .map_err(|e| NotionError::InvalidCursor(format!("not a page token: {e}")))?;

    if token.rt != expected_resource_type {
        return Err(NotionError::ResourceTypeMismatch {
            expected: expected_resource_type.to_string(),
            found: token.rt,
        });
    }

    let state: PageState = serde_json::from_value(token.pos)
        .map_err(|e| NotionError::InvalidCursor(format!("malformed page state: {e}")))?;

    if !state.is_same_kind(&start) {
        return Err(NotionError::InvalidCursor(format!(
            "page state {state:?} does not belong to resource type '{expected_resource_type}'"
        )));
    }

    Ok(state)
}
