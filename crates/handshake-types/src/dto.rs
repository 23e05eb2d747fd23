//! Request and response DTOs for the HTTP host.

use crate::{ObservedUser, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Uniform JSON envelope: `{code, message, data}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: 200,
            message: "Success".to_string(),
            data: Some(data),
        }
    }

    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

/// Body of `POST /observe/users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObserveUsersRequest {
    pub records: Vec<ObservedUser>,
}

/// Body of `POST /observe/edges`: each key's complete following set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObserveEdgesRequest {
    pub edges: BTreeMap<UserId, BTreeSet<UserId>>,
}

/// Anchor pair used by target and path queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorQuery {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfoQuery {
    pub id: UserId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObserveData {
    /// False when the observation was empty or malformed and changed nothing.
    pub applied: bool,
    pub persisted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextTargetData {
    /// `None` means no further crawl can make progress.
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathData {
    pub usernames: Vec<String>,
    pub ids: Vec<UserId>,
    /// Human-readable rendering, e.g. `Alice A (alice) <-> Bob B (bob)`.
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfoData {
    pub id: UserId,
    pub info: String,
}
