use std::collections::{
    BTreeMap,
    HashSet,
};

use serde::Serialize;

use super::search::has_path_shorter_equal_than;
use crate::graph::Graph;
use crate::model::{
    EdgeId,
    VertexId,
};
use crate::settings::PreprocessorSettings;

/// One shortcut the contraction of a vertex requires: `edge_in` into the vertex followed by
/// `edge_out` out of it. A multiplicity of 2 marks a bidirectional shortcut, needed both as
/// `edge_in, edge_out` and as `edge_out, edge_in`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ShortcutPair {
    /// Edge into the contracted vertex.
    pub edge_in: EdgeId,
    /// Edge out of the contracted vertex.
    pub edge_out: EdgeId,
    /// 1 for a directed shortcut, 2 for a bidirectional one.
    pub multiplicity: u8,
}

/// What contracting a vertex right now would do to the graph.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ContractionSimulationResult {
    /// Directed shortcuts needed; a bidirectional shortcut counts twice.
    pub num_of_shortcuts: usize,
    /// Distinct edges bypassed by at least one shortcut.
    pub num_of_removed_edges: usize,
    /// Shortcuts to create, sorted by `(edge_in, edge_out)`.
    pub shortcut_edge_pairs: Vec<ShortcutPair>,
    /// Input edges represented by the new shortcuts, counted per direction.
    pub original_edge_count_added: u64,
    /// Input edges represented by the bypassed edges.
    pub original_edge_count_removed: u64,
}

/// Computes the shortcuts that contracting `vertex` would need, without touching the graph.
///
/// Every pair of an edge `u -> vertex` and an edge `vertex -> w` between distinct unprocessed
/// neighbours is a candidate. The candidate is dropped when a witness path from `u` to `w`, no
/// longer than the two edges together, exists that avoids `vertex` (see
/// [`has_path_shorter_equal_than`]). A pair found in both orientations, which happens for
/// bidirectional edges, is reported once with multiplicity 2.
///
/// Use this for ranking; vertices contracted together in one round go through
/// [`simulate_in_round`].
#[must_use]
pub fn simulate(settings: &PreprocessorSettings, graph: &Graph, vertex: VertexId) -> ContractionSimulationResult {
    simulate_with(settings, graph, vertex, |other| other == vertex)
}

/// Like [`simulate`], but witness paths also avoid every vertex of `round`, the set contracted
/// together with `vertex`. Those vertices are gone once the round is applied, so a witness
/// through one of them would not exist anymore.
#[must_use]
pub fn simulate_in_round(
    settings: &PreprocessorSettings,
    graph: &Graph,
    vertex: VertexId,
    round: &HashSet<VertexId>,
) -> ContractionSimulationResult {
    simulate_with(settings, graph, vertex, |other| other == vertex || round.contains(&other))
}

/// Simulation with witness paths avoiding every vertex `excluded` accepts; `excluded` must
/// accept `vertex`.
fn simulate_with(
    settings: &PreprocessorSettings,
    graph: &Graph,
    vertex: VertexId,
    excluded: impl Fn(VertexId) -> bool,
) -> ContractionSimulationResult {
    let live_neighbor = |edge: EdgeId| {
        let neighbor = graph.other_vertex(edge, vertex);
        (neighbor != vertex && !graph.vertex(neighbor).processed).then_some((edge, neighbor))
    };
    let ingoing: Vec<_> = graph.ingoing_edges(vertex).into_iter().filter_map(live_neighbor).collect();
    let outgoing: Vec<_> = graph.outgoing_edges(vertex).into_iter().filter_map(live_neighbor).collect();

    let mut result = ContractionSimulationResult::default();
    if ingoing.is_empty() || outgoing.is_empty() {
        return result;
    }

    let mut pairs: BTreeMap<(EdgeId, EdgeId), u8> = BTreeMap::new();
    let mut bypassed: HashSet<EdgeId> = HashSet::new();
    for &(edge_in, source) in &ingoing {
        for &(edge_out, target) in &outgoing {
            if source == target {
                continue;
            }
            let length = graph.weight(edge_in) + graph.weight(edge_out);
            if has_path_shorter_equal_than(graph, source, target, length, settings.search_space_hop_limit, &excluded) {
                continue;
            }

            result.num_of_shortcuts += 1;
            result.original_edge_count_added +=
                u64::from(graph.original_edge_count(edge_in)) + u64::from(graph.original_edge_count(edge_out));
            for edge in [edge_in, edge_out] {
                if bypassed.insert(edge) {
                    result.num_of_removed_edges += 1;
                    result.original_edge_count_removed += u64::from(graph.original_edge_count(edge));
                }
            }

            if let Some(multiplicity) = pairs.get_mut(&(edge_out, edge_in)) {
                *multiplicity = 2;
            } else {
                pairs.insert((edge_in, edge_out), 1);
            }
        }
    }

    result.shortcut_edge_pairs = pairs
        .into_iter()
        .map(|((edge_in, edge_out), multiplicity)| ShortcutPair { edge_in, edge_out, multiplicity })
        .collect();
    result
}
