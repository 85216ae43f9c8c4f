use std::collections::HashMap;

use crate::graph::Graph;
use crate::model::{
    VertexId,
    Weight,
};
use crate::queue::KeyedPriorityQueue;

/// Witness search: is there a path from `source` to `target` of length at most `limit` and with
/// at most `hop_limit` edges that avoids every processed vertex and every vertex `excluded`
/// returns `true` for?
///
/// This is a Dijkstra search bounded both by distance and by hop count. Hops are tracked along
/// the current shortest path to each vertex, so a longer path with fewer hops may be missed;
/// that only ever costs an unnecessary shortcut, never a wrong distance. A hop limit of 0
/// never finds a witness.
#[must_use]
pub fn has_path_shorter_equal_than(
    graph: &Graph,
    source: VertexId,
    target: VertexId,
    limit: Weight,
    hop_limit: u32,
    excluded: impl Fn(VertexId) -> bool,
) -> bool {
    if hop_limit == 0 {
        return false;
    }
    if source == target {
        return true;
    }

    let mut queue = KeyedPriorityQueue::new();
    let mut hops: HashMap<VertexId, u32> = HashMap::new();
    let mut settled: HashMap<VertexId, Weight> = HashMap::new();
    queue.push_or_decrease(source, 0);
    hops.insert(source, 0);

    while let Some((vertex, distance)) = queue.pop() {
        settled.insert(vertex, distance);
        let vertex_hops = hops[&vertex];
        if vertex_hops >= hop_limit {
            continue;
        }

        for edge in graph.outgoing_edges(vertex) {
            let next = graph.other_vertex(edge, vertex);
            if excluded(next) || settled.contains_key(&next) || graph.vertex(next).processed {
                continue;
            }
            let next_distance = distance + graph.weight(edge);
            if next_distance > limit {
                continue;
            }
            if next == target {
                return true;
            }
            if queue.push_or_decrease(next, next_distance) {
                hops.insert(next, vertex_hops + 1);
            }
        }
    }
    false
}
