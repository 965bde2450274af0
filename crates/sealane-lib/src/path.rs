//! Shortest-path search over the sea-lane graph.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::filter::ChokepointFilter;
use crate::graph::{NodeId, SeaLaneGraph};

/// Placeholder vessel speed stamped on every sea lane, in km/h. Travel times
/// are derived from distance at this constant speed.
pub const SEA_SPEED_KMH: f64 = 30.0;

/// Cost of a found route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteCost {
    pub distance_m: f64,
    pub time_ms: i64,
}

impl RouteCost {
    fn from_distance(distance_m: f64) -> Self {
        let speed_m_per_ms = SEA_SPEED_KMH * 1000.0 / 3_600_000.0;
        Self {
            distance_m,
            time_ms: (distance_m / speed_m_per_ms).round() as i64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct QueueEntry {
    node: NodeId,
    cost: f64,
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap on cost.
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
    }
}

/// Dijkstra shortest path between two graph nodes honoring an edge filter.
///
/// Returns `None` when the target is unreachable, when either endpoint is
/// out of range, or when an endpoint itself is excluded by the filter.
pub fn shortest_path(
    graph: &SeaLaneGraph,
    start: NodeId,
    goal: NodeId,
    filter: &ChokepointFilter,
) -> Option<RouteCost> {
    let node_count = graph.node_count();
    if start as usize >= node_count || goal as usize >= node_count {
        return None;
    }
    // An excluded endpoint can never be part of an accepted edge.
    if !filter.accept(start, start) || !filter.accept(goal, goal) {
        return None;
    }
    if start == goal {
        return Some(RouteCost::from_distance(0.0));
    }

    let mut best = vec![f64::INFINITY; node_count];
    let mut heap = BinaryHeap::new();

    best[start as usize] = 0.0;
    heap.push(QueueEntry {
        node: start,
        cost: 0.0,
    });

    while let Some(QueueEntry { node, cost }) = heap.pop() {
        if cost > best[node as usize] {
            continue;
        }
        if node == goal {
            return Some(RouteCost::from_distance(cost));
        }

        for &(neighbour, distance_m) in graph.neighbours(node) {
            if !filter.accept(node, neighbour) {
                continue;
            }
            let next_cost = cost + distance_m;
            if next_cost < best[neighbour as usize] {
                best[neighbour as usize] = next_cost;
                heap.push(QueueEntry {
                    node: neighbour,
                    cost: next_cost,
                });
            }
        }
    }

    None
}
