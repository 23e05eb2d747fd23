//! `SocialGraph`: the owned crawl state and its query surface.

use crate::follow_graph::{DerivedViews, FollowGraph};
use crate::path::shortest_paths;
use crate::user_store::UserStore;
use handshake_types::{
    Adjacency, FollowingPage, GraphSnapshot, GraphStats, ObservedUser, Path, SnapshotStore, UserId,
};
use std::collections::{BTreeMap, BTreeSet};

/// Users, follow edges and derived views, mutated only through `&mut self`.
///
/// Every edge merge rebuilds the derived views before returning, so a reader
/// holding `&SocialGraph` always sees views consistent with `follows`.
#[derive(Debug, Clone, Default)]
pub struct SocialGraph {
    users: UserStore,
    follows: FollowGraph,
    derived: DerivedViews,
}

impl SocialGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(users: UserStore, follows: FollowGraph) -> Self {
        let derived = DerivedViews::rebuild(&follows);
        Self {
            users,
            follows,
            derived,
        }
    }

    pub fn from_snapshot(snapshot: GraphSnapshot) -> Self {
        Self::from_parts(
            UserStore::from_records(snapshot.users),
            FollowGraph::from_edges(snapshot.edges),
        )
    }

    /// Load from `store`, falling back to an empty graph when nothing was
    /// saved or the snapshot cannot be read.
    pub fn restore(store: &dyn SnapshotStore) -> Self {
        match store.load() {
            Ok(Some(snapshot)) => {
                let graph = Self::from_snapshot(snapshot);
                tracing::info!(
                    users = graph.users.len(),
                    crawled = graph.follows.crawled_count(),
                    "snapshot restored"
                );
                graph
            }
            Ok(None) => {
                tracing::info!("no snapshot found, starting empty");
                Self::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "snapshot unreadable, starting empty");
                Self::new()
            }
        }
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            users: self.users.records().cloned().collect(),
            edges: self.follows.edges().clone(),
            saved_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    // =========================================================================
    // Crawl feed
    // =========================================================================

    pub fn observe_users<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = ObservedUser>,
    {
        self.users.merge(records)
    }

    /// Merge one edge batch (each key's complete following set) and rebuild views.
    pub fn observe_edges<S>(&mut self, batch: BTreeMap<UserId, S>) -> usize
    where
        S: IntoIterator<Item = UserId>,
    {
        self.observe_edge_batches(std::iter::once(batch))
    }

    /// Merge several batches, rebuilding the derived views once at the end.
    pub fn observe_edge_batches<B, S>(&mut self, batches: B) -> usize
    where
        B: IntoIterator<Item = BTreeMap<UserId, S>>,
        S: IntoIterator<Item = UserId>,
    {
        let added: usize = batches.into_iter().map(|b| self.follows.merge(b)).sum();
        self.rebuild_derived();
        tracing::debug!(
            added,
            crawled = self.follows.crawled_count(),
            mutual_pairs = self.derived.mutual_pair_count(),
            "edges merged"
        );
        added
    }

    /// Apply one page of a crawled user's following list: the user and every
    /// followed profile go to the user store, their ids to the follow graph.
    /// Pages with a missing id anywhere are dropped and `false` is returned.
    pub fn observe_following(&mut self, page: FollowingPage) -> bool {
        let Some(user_id) = page.user.id else {
            tracing::warn!(username = ?page.user.username, "dropping page without user id");
            return false;
        };
        let targets: Option<BTreeSet<UserId>> = page.following.iter().map(|u| u.id).collect();
        let Some(targets) = targets else {
            tracing::warn!(user_id, "dropping page with unidentified followed user");
            return false;
        };
        self.users
            .merge(std::iter::once(page.user).chain(page.following));
        self.observe_edges(BTreeMap::from([(user_id, targets)]));
        true
    }

    pub fn rebuild_derived(&mut self) {
        self.derived = DerivedViews::rebuild(&self.follows);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn users(&self) -> &UserStore {
        &self.users
    }

    pub fn follows(&self) -> &FollowGraph {
        &self.follows
    }

    pub fn derived(&self) -> &DerivedViews {
        &self.derived
    }

    pub fn resolve(&self, username: &str) -> Option<UserId> {
        self.users.resolve(username)
    }

    pub fn is_dead_end(&self, id: UserId) -> bool {
        self.follows.is_dead_end(id)
    }

    /// Known users whose following list has not been crawled yet.
    pub fn dead_ends(&self) -> impl Iterator<Item = UserId> + '_ {
        self.users.ids().filter(move |&id| self.follows.is_dead_end(id))
    }

    pub fn user_info(&self, id: UserId) -> String {
        self.users.describe(id)
    }

    /// All shortest handshake paths from `id` over the mutual graph.
    pub fn mutual_paths_from(&self, id: UserId) -> BTreeMap<UserId, Path> {
        shortest_paths(self.derived.mutual(), id, None)
    }

    /// All shortest paths from `id` over the full directed follow graph.
    pub fn directed_paths_from(&self, id: UserId) -> BTreeMap<UserId, Path> {
        shortest_paths(self.follows.edges(), id, None)
    }

    /// Shortest mutual-follow path between two usernames, as ids.
    /// Empty when either name is unknown or no handshake path exists.
    pub fn handshake_ids(&self, from: &str, to: &str) -> Path {
        self.path_between(self.derived.mutual(), from, to)
    }

    /// Shortest mutual-follow path between two usernames, as usernames.
    pub fn handshake_path(&self, from: &str, to: &str) -> Vec<String> {
        self.usernames(&self.handshake_ids(from, to))
    }

    /// Shortest one-directional "follows" chain between two usernames.
    pub fn directed_path(&self, from: &str, to: &str) -> Path {
        self.path_between(self.follows.edges(), from, to)
    }

    /// Render a path as `"Name (user) <-> Name (user)"`.
    pub fn describe_path(&self, path: &[UserId]) -> String {
        path.iter()
            .map(|&id| self.users.describe(id))
            .collect::<Vec<_>>()
            .join(" <-> ")
    }

    pub fn usernames(&self, path: &[UserId]) -> Vec<String> {
        path.iter()
            .map(|&id| self.users.username(id).unwrap_or_default().to_string())
            .collect()
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            users: self.users.len(),
            crawled: self.follows.crawled_count(),
            dead_ends: self.dead_ends().count(),
            edges: self.follows.edge_count(),
            mutual_pairs: self.derived.mutual_pair_count(),
        }
    }

    fn path_between(&self, graph: &Adjacency, from: &str, to: &str) -> Path {
        let (Some(start), Some(finish)) = (self.resolve(from), self.resolve(to)) else {
            return Vec::new();
        };
        shortest_paths(graph, start, Some(finish))
            .remove(&finish)
            .unwrap_or_default()
    }
}
