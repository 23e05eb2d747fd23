//! Shortest paths by priority-driven relaxation.
//!
//! Works over any `Adjacency`: the full follow graph or the mutual subgraph.

use handshake_types::{Adjacency, Path, UserId};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet};

/// Unit-weight shortest paths from `start`.
///
/// With `finish = None` every node reachable from `start` (including `start`
/// itself) maps to one shortest path; with `finish = Some(t)` the search stops
/// once `t` is settled and only `t` is reported. An unreachable `finish` is
/// simply absent from the result.
pub fn shortest_paths(
    graph: &Adjacency,
    start: UserId,
    finish: Option<UserId>,
) -> BTreeMap<UserId, Path> {
    weighted_shortest_paths(graph, start, finish, |_, _| 1)
}

/// Same as [`shortest_paths`] with an arbitrary non-negative edge weight.
///
/// A `start` that is not a key of `graph` has unknown outgoing edges and
/// cannot originate any path, so the result is empty. Ties between equal-cost
/// nodes settle the lowest id first.
pub fn weighted_shortest_paths<W>(
    graph: &Adjacency,
    start: UserId,
    finish: Option<UserId>,
    mut weight: W,
) -> BTreeMap<UserId, Path>
where
    W: FnMut(UserId, UserId) -> u64,
{
    let mut paths = BTreeMap::new();
    if !graph.contains_key(&start) {
        return paths;
    }

    let mut cost: HashMap<UserId, u64> = HashMap::from([(start, 0)]);
    let mut parent: HashMap<UserId, UserId> = HashMap::new();
    let mut settled: HashSet<UserId> = HashSet::new();
    let mut frontier = BinaryHeap::from([Reverse((0u64, start))]);

    while let Some(Reverse((current_cost, current))) = frontier.pop() {
        if !settled.insert(current) {
            continue;
        }
        if finish == Some(current) {
            break;
        }
        let Some(neighbors) = graph.get(&current) else {
            continue;
        };
        for &next in neighbors {
            if settled.contains(&next) {
                continue;
            }
            let candidate = current_cost.saturating_add(weight(current, next));
            if cost.get(&next).map_or(true, |&known| candidate < known) {
                cost.insert(next, candidate);
                parent.insert(next, current);
                frontier.push(Reverse((candidate, next)));
            }
        }
    }

    let endpoints: Vec<UserId> = match finish {
        Some(target) if settled.contains(&target) => vec![target],
        Some(_) => Vec::new(),
        None => settled.into_iter().collect(),
    };
    for endpoint in endpoints {
        paths.insert(endpoint, reconstruct(&parent, start, endpoint));
    }
    paths
}

/// Walk parent pointers from `node` back to `start`.
fn reconstruct(parent: &HashMap<UserId, UserId>, start: UserId, node: UserId) -> Path {
    let mut way = vec![node];
    let mut cursor = node;
    while cursor != start {
        match parent.get(&cursor) {
            Some(&p) => {
                way.push(p);
                cursor = p;
            }
            None => break,
        }
    }
    way.reverse();
    way
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn adj(pairs: &[(UserId, &[UserId])]) -> Adjacency {
        pairs
            .iter()
            .map(|(k, v)| (*k, v.iter().copied().collect()))
            .collect()
    }

    fn bfs_distances(graph: &Adjacency, start: UserId) -> HashMap<UserId, usize> {
        let mut dist = HashMap::from([(start, 0)]);
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            let d = dist[&node];
            for &next in graph.get(&node).into_iter().flatten() {
                if !dist.contains_key(&next) {
                    dist.insert(next, d + 1);
                    queue.push_back(next);
                }
            }
        }
        dist
    }

    fn sample() -> Adjacency {
        adj(&[
            (1, &[2, 3]),
            (2, &[4]),
            (3, &[4, 5]),
            (4, &[6]),
            (5, &[6, 1]),
            (6, &[]),
            (7, &[1]),
        ])
    }

    #[test]
    fn paths_are_valid_and_optimal() {
        let graph = sample();
        let expected = bfs_distances(&graph, 1);
        let paths = shortest_paths(&graph, 1, None);
        assert_eq!(paths.len(), expected.len());
        for (node, path) in &paths {
            assert_eq!(path.first(), Some(&1));
            assert_eq!(path.last(), Some(node));
            for hop in path.windows(2) {
                assert!(graph[&hop[0]].contains(&hop[1]), "{:?} is not an edge", hop);
            }
            assert_eq!(path.len() - 1, expected[node]);
        }
        assert!(!paths.contains_key(&7));
    }

    #[test]
    fn finish_limits_result_to_target() {
        let graph = sample();
        let paths = shortest_paths(&graph, 1, Some(6));
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[&6].len(), 4);
    }

    #[test]
    fn unreachable_finish_is_absent() {
        let graph = sample();
        assert!(shortest_paths(&graph, 1, Some(7)).is_empty());
    }

    #[test]
    fn dead_end_start_yields_nothing() {
        let graph = sample();
        assert!(shortest_paths(&graph, 42, None).is_empty());
        assert!(shortest_paths(&graph, 42, Some(1)).is_empty());
    }

    #[test]
    fn start_equal_to_finish_is_single_node() {
        let graph = sample();
        let paths = shortest_paths(&graph, 3, Some(3));
        assert_eq!(paths[&3], vec![3]);
    }

    #[test]
    fn weights_steer_the_route() {
        let graph = adj(&[(1, &[2, 3]), (2, &[4]), (3, &[4]), (4, &[])]);
        let paths = weighted_shortest_paths(&graph, 1, Some(4), |from, to| {
            if (from, to) == (1, 2) {
                10
            } else {
                1
            }
        });
        assert_eq!(paths[&4], vec![1, 3, 4]);
    }
}
