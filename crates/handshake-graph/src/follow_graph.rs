//! Directed follow graph and the views derived from it.

use handshake_types::{Adjacency, UserId};
use std::collections::BTreeSet;

/// `edges[a]` holds everyone `a` follows. Edges are only ever added.
///
/// A missing key means the user was never crawled (a dead end); a key with an
/// empty set means the user was crawled and follows no one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowGraph {
    edges: Adjacency,
}

impl FollowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_edges(edges: Adjacency) -> Self {
        Self { edges }
    }

    /// Union each `(from, to_set)` into `edges[from]`, creating the key if absent.
    /// Returns the number of edges that were not already present.
    pub fn merge<I, S>(&mut self, batch: I) -> usize
    where
        I: IntoIterator<Item = (UserId, S)>,
        S: IntoIterator<Item = UserId>,
    {
        let mut added = 0;
        for (from, targets) in batch {
            let set = self.edges.entry(from).or_default();
            for to in targets {
                if set.insert(to) {
                    added += 1;
                }
            }
        }
        added
    }

    /// True iff `id` has no outgoing-edge key yet.
    pub fn is_dead_end(&self, id: UserId) -> bool {
        !self.edges.contains_key(&id)
    }

    pub fn following(&self, id: UserId) -> Option<&BTreeSet<UserId>> {
        self.edges.get(&id)
    }

    pub fn edges(&self) -> &Adjacency {
        &self.edges
    }

    pub fn into_edges(self) -> Adjacency {
        self.edges
    }

    pub fn crawled_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }
}

/// Reverse adjacency and the mutual-follow subgraph, recomputed in full from
/// a `FollowGraph`. Never patched incrementally and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedViews {
    parents: Adjacency,
    mutual: Adjacency,
}

impl DerivedViews {
    pub fn rebuild(graph: &FollowGraph) -> Self {
        let mut parents = Adjacency::new();
        for (&from, targets) in graph.edges() {
            for &to in targets {
                parents.entry(to).or_default().insert(from);
            }
        }

        let mutual = graph
            .edges()
            .iter()
            .filter_map(|(&id, following)| {
                let followers = parents.get(&id)?;
                let both: BTreeSet<UserId> = following.intersection(followers).copied().collect();
                (!both.is_empty()).then_some((id, both))
            })
            .collect();

        Self { parents, mutual }
    }

    /// Everyone known to follow `id`.
    pub fn parents(&self, id: UserId) -> Option<&BTreeSet<UserId>> {
        self.parents.get(&id)
    }

    pub fn parents_graph(&self) -> &Adjacency {
        &self.parents
    }

    /// Reciprocal-follow subgraph; ids without any mutual partner are absent.
    pub fn mutual(&self) -> &Adjacency {
        &self.mutual
    }

    /// Number of unordered mutual pairs.
    pub fn mutual_pair_count(&self) -> usize {
        self.mutual.values().map(BTreeSet::len).sum::<usize>() / 2
    }
}
