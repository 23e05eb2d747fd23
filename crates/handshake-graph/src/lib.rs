//! Follow graph state, derived views, shortest paths and snapshot backends.

mod follow_graph;
mod path;
mod snapshot;
mod social;
mod user_store;

#[cfg(feature = "sqlite")]
mod sqlite;

pub use follow_graph::{DerivedViews, FollowGraph};
pub use handshake_types::{
    Adjacency, FollowingPage, GraphSnapshot, GraphStats, ObservedUser, Path, SnapshotError,
    SnapshotStore, UserId, UserRecord,
};
pub use path::{shortest_paths, weighted_shortest_paths};
pub use snapshot::JsonFileSnapshotStore;
pub use social::SocialGraph;
pub use user_store::UserStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSnapshotStore;
