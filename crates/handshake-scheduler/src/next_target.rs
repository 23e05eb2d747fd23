//! Next-target heuristic: pick the uncrawled user that best advances the
//! search for a handshake path between two anchors.

use handshake_graph::SocialGraph;
use handshake_types::{Path, UserId};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;
use std::collections::{BTreeMap, BTreeSet};

/// Decides which username to crawl next. Tiers are evaluated in order and the
/// first one that produces a decision wins:
///
/// 1. an anchor that is not known yet;
/// 2. an anchor that is known but not crawled;
/// 3. fewer than two distinct crawled anchors: nothing to schedule;
/// 4. a dead end followed directly by both anchors;
/// 5. the dead end whose parents are mutually reachable from both anchors at
///    the lowest summed handshake distance;
/// 6./7. otherwise a random dead end reachable from exactly one anchor, with
///    every anchor side receiving the same total probability.
pub struct CrawlScheduler<R = StdRng> {
    rng: R,
}

impl CrawlScheduler<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Reproducible exploration order.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for CrawlScheduler<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> CrawlScheduler<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Username to crawl next for the anchor pair, or `None` when no crawl can
    /// make further progress.
    pub fn next_target(&mut self, graph: &SocialGraph, from: &str, to: &str) -> Option<String> {
        let mut anchors = Vec::with_capacity(2);
        for username in [from, to] {
            match graph.resolve(username) {
                Some(id) => anchors.push((username, id)),
                None => {
                    tracing::info!(username, "anchor unknown, fetching profile");
                    return Some(username.to_string());
                }
            }
        }

        if let Some(&(username, _)) = anchors.iter().find(|(_, id)| graph.is_dead_end(*id)) {
            tracing::info!(username, "anchor not crawled yet");
            return Some(username.to_string());
        }

        let anchor_ids: BTreeSet<UserId> = anchors.iter().map(|&(_, id)| id).collect();
        if anchor_ids.len() <= 1 {
            return None;
        }

        // Dead ends without a username cannot be fetched by the consumer.
        let dead_ends: Vec<(UserId, &str)> = graph
            .dead_ends()
            .filter_map(|id| graph.users().username(id).map(|name| (id, name)))
            .collect();

        if let Some(username) = direct_bridge(graph, &anchor_ids, &dead_ends) {
            tracing::info!(username, "direct bridge");
            return Some(username.to_string());
        }

        let handshakes: BTreeMap<UserId, BTreeMap<UserId, Path>> = anchor_ids
            .iter()
            .map(|&anchor| {
                let mut paths = graph.mutual_paths_from(anchor);
                paths.entry(anchor).or_insert_with(|| vec![anchor]);
                (anchor, paths)
            })
            .collect();

        let mut best: Option<(usize, &str)> = None;
        let mut frontiers: BTreeMap<UserId, Vec<&str>> =
            anchor_ids.iter().map(|&a| (a, Vec::new())).collect();

        for &(dead_end, username) in &dead_ends {
            let Some(parents) = graph.derived().parents(dead_end) else {
                continue;
            };
            let mut matching = Vec::new();
            let mut cost = 0;
            for (&anchor, paths) in &handshakes {
                let nearest = parents
                    .iter()
                    .filter_map(|parent| paths.get(parent))
                    .map(|path| path.len() - 1)
                    .min();
                if let Some(hops) = nearest {
                    matching.push(anchor);
                    cost += hops;
                }
            }
            match matching.as_slice() {
                [] => {}
                [anchor] => {
                    if let Some(frontier) = frontiers.get_mut(anchor) {
                        frontier.push(username);
                    }
                }
                _ => {
                    if best.map_or(true, |(best_cost, _)| cost < best_cost) {
                        best = Some((cost, username));
                    }
                }
            }
        }

        if let Some((cost, username)) = best {
            tracing::info!(username, cost, "weighted bridge");
            return Some(username.to_string());
        }

        let chosen = self.sample_frontier(&frontiers);
        match chosen {
            Some(username) => tracing::info!(username, "exploring frontier"),
            None => tracing::info!(from, to, "frontiers exhausted"),
        }
        chosen.map(str::to_string)
    }

    /// Each non-empty frontier gets equal mass, split evenly among its members.
    fn sample_frontier<'a>(&mut self, frontiers: &BTreeMap<UserId, Vec<&'a str>>) -> Option<&'a str> {
        let sides: Vec<&Vec<&str>> = frontiers.values().filter(|f| !f.is_empty()).collect();
        let mut candidates = Vec::new();
        let mut weights = Vec::new();
        for frontier in &sides {
            let mass = 1.0 / (sides.len() * frontier.len()) as f64;
            for &username in frontier.iter() {
                candidates.push(username);
                weights.push(mass);
            }
        }
        match candidates.len() {
            0 => None,
            1 => Some(candidates[0]),
            _ => {
                let dist = WeightedIndex::new(&weights).ok()?;
                Some(candidates[dist.sample(&mut self.rng)])
            }
        }
    }
}

/// First dead end followed by more than one anchor.
fn direct_bridge<'a>(
    graph: &SocialGraph,
    anchors: &BTreeSet<UserId>,
    dead_ends: &[(UserId, &'a str)],
) -> Option<&'a str> {
    dead_ends.iter().find_map(|&(id, username)| {
        let parents = graph.derived().parents(id)?;
        (parents.intersection(anchors).count() > 1).then_some(username)
    })
}
