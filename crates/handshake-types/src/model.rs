//! Graph-level records: users, adjacency, paths and snapshots.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Stable, externally assigned user identifier.
pub type UserId = u64;

/// Directed adjacency: `id -> ids it points to`.
///
/// Ordered maps keep iteration (and therefore tie-breaking) deterministic.
pub type Adjacency = BTreeMap<UserId, BTreeSet<UserId>>;

/// Ordered sequence of ids from start to end inclusive. A single id means start == end.
pub type Path = Vec<UserId>;

/// Stored profile of a known user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl UserRecord {
    pub fn new(id: UserId, username: Option<&str>, full_name: Option<&str>) -> Self {
        Self {
            id,
            username: username.map(str::to_string),
            full_name: full_name.map(str::to_string),
        }
    }
}

/// A user as seen by the crawl feed. The id may be missing when the source
/// page was malformed; such observations are ignored by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedUser {
    #[serde(default)]
    pub id: Option<UserId>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

impl ObservedUser {
    pub fn new(id: UserId, username: &str, full_name: Option<&str>) -> Self {
        Self {
            id: Some(id),
            username: Some(username.to_string()),
            full_name: full_name.map(str::to_string),
        }
    }
}

/// One page of a user's following list. Pages of the same user are unioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowingPage {
    pub user: ObservedUser,
    #[serde(default)]
    pub following: Vec<ObservedUser>,
}

/// Persisted state: raw user records and raw follow adjacency. Derived views
/// (parents, mutual graph) are rebuilt on load and never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub users: Vec<UserRecord>,
    pub edges: Adjacency,
    /// RFC 3339 time of the save; informational only.
    #[serde(default)]
    pub saved_at: String,
}

/// Size counters for a social graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub users: usize,
    pub crawled: usize,
    pub dead_ends: usize,
    pub edges: usize,
    pub mutual_pairs: usize,
}
