use std::collections::HashSet;

use ordered_float::OrderedFloat;
use rayon::prelude::*;

use super::simulator::ContractionSimulationResult;
use crate::graph::Graph;
use crate::model::VertexId;
use crate::settings::PreprocessorSettings;

/// Scores vertices from their contraction simulation; lower scores contract earlier.
///
/// The score is a weighted sum of three terms (Geisberger et al.):
/// - the edge quotient, shortcuts added per edge removed,
/// - the hierarchy depth plus one,
/// - the original-edge quotient, input edges added per input edge removed.
///
/// A term whose factor is 0 is left out entirely.
#[derive(Clone, Copy, Debug)]
pub struct VertexRanker {
    /// Factor of the edge quotient.
    edge_quotient_factor: f64,
    /// Factor of the hierarchy depth.
    hierarchy_depths_factor: f64,
    /// Factor of the original-edge quotient.
    original_edge_quotient_factor: f64,
}

impl VertexRanker {
    /// Creates a ranker with the factors of `settings`.
    #[must_use]
    pub const fn new(settings: &PreprocessorSettings) -> Self {
        Self {
            edge_quotient_factor: settings.edge_quotient_factor,
            hierarchy_depths_factor: settings.hierarchy_depths_factor,
            original_edge_quotient_factor: settings.original_edge_quotient_factor,
        }
    }

    /// Priority of a vertex whose simulated contraction gave `result`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn priority(&self, result: &ContractionSimulationResult, hierarchy_depth: u32) -> f64 {
        let mut priority = 0.0;
        if self.edge_quotient_factor != 0.0 {
            priority += self.edge_quotient_factor
                * quotient(result.num_of_shortcuts as f64, result.num_of_removed_edges as f64);
        }
        if self.hierarchy_depths_factor != 0.0 {
            priority += self.hierarchy_depths_factor * (f64::from(hierarchy_depth) + 1.0);
        }
        if self.original_edge_quotient_factor != 0.0 {
            priority += self.original_edge_quotient_factor
                * quotient(result.original_edge_count_added as f64, result.original_edge_count_removed as f64);
        }
        priority
    }
}

/// `numerator / denominator`, or 0 for an empty denominator.
fn quotient(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Picks the vertices that may be contracted in the same round.
///
/// A vertex qualifies when no unprocessed vertex within `k_neighborhood` hops ranks below it.
/// Ranks compare priorities first and vertex ids second, so equal priorities cannot block each
/// other forever and two adjacent vertices never share a round.
#[derive(Clone, Copy, Debug)]
pub struct IndependentSetSelector {
    /// Search radius in hops.
    k_neighborhood: u32,
}

impl IndependentSetSelector {
    /// Creates a selector with the radius of `settings`.
    #[must_use]
    pub const fn new(settings: &PreprocessorSettings) -> Self {
        Self { k_neighborhood: settings.k_neighborhood }
    }

    /// Whether `vertex` ranks lowest among the unprocessed vertices in its neighbourhood.
    ///
    /// The neighbourhood is explored over live edges in both directions and only through
    /// unprocessed vertices, i.e. in the current core graph.
    #[must_use]
    pub fn is_independent(&self, graph: &Graph, vertex: VertexId) -> bool {
        let own_rank = rank(graph, vertex);
        let mut visited = HashSet::from([vertex]);
        let mut frontier = vec![vertex];
        for _ in 0..self.k_neighborhood {
            let mut next = Vec::new();
            for current in frontier {
                for neighbor in graph.neighbors(current) {
                    if graph.vertex(neighbor).processed || !visited.insert(neighbor) {
                        continue;
                    }
                    if rank(graph, neighbor) < own_rank {
                        return false;
                    }
                    next.push(neighbor);
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        true
    }

    /// All independent unprocessed vertices, in ascending rank.
    #[must_use]
    pub fn select(&self, graph: &Graph) -> Vec<VertexId> {
        let mut candidates: Vec<_> = graph.unprocessed_vertices().collect();
        candidates.sort_unstable_by_key(|&v| rank(graph, v));
        candidates
            .into_par_iter()
            .filter(|&v| self.is_independent(graph, v))
            .collect()
    }
}

/// Total order used for selection: priority first, id second.
fn rank(graph: &Graph, vertex: VertexId) -> (OrderedFloat<f64>, VertexId) {
    (OrderedFloat(graph.vertex(vertex).priority), vertex)
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;

    fn ranker(edge: f64, depth: f64, original: f64) -> VertexRanker {
        VertexRanker::new(&PreprocessorSettings {
            edge_quotient_factor: edge,
            hierarchy_depths_factor: depth,
            original_edge_quotient_factor: original,
            ..Default::default()
        })
    }

    fn result(added: u64) -> ContractionSimulationResult {
        ContractionSimulationResult {
            num_of_shortcuts: 6,
            num_of_removed_edges: 2,
            original_edge_count_added: added,
            original_edge_count_removed: 4,
            ..Default::default()
        }
    }

    #[rstest]
    #[case::all_terms((2.0, 3.0, 1.0), 4, 10.0)]
    #[case::no_edge_quotient((0.0, 3.0, 1.0), 4, 4.0)]
    #[case::no_depth((2.0, 0.0, 1.0), 4, 7.0)]
    #[case::no_original_quotient((2.0, 3.0, 0.0), 4, 9.0)]
    #[case::fractional((2.0, 3.0, 3.0), 5, 12.75)]
    fn test_priority(#[case] factors: (f64, f64, f64), #[case] added: u64, #[case] expected: f64) {
        let (edge, depth, original) = factors;
        let priority = ranker(edge, depth, original).priority(&result(added), 0);
        assert!((priority - expected).abs() < 1e-9, "{priority} != {expected}");
    }

    #[test]
    fn test_priority_of_empty_result_is_depth_term() {
        let priority = ranker(2.0, 3.0, 1.0).priority(&ContractionSimulationResult::default(), 2);
        assert!((priority - 9.0).abs() < 1e-9);
    }

    //        4       5
    //        |       |
    //   3 -- 0 -- 1  2      0 -- 7 -- 8 -- 6
    //        |_______|
    //
    // 1..5 all rank below 0 and lie within two hops; 6 ranks below 0 but lies three hops away.
    #[fixture]
    fn dependencies() -> Graph {
        let mut graph = Graph::new();
        for _ in 0..9 {
            graph.add_vertex(0.0, 0.0);
        }
        for (source, target) in [(0, 1), (0, 2), (0, 3), (1, 4), (2, 5), (0, 7), (7, 8), (8, 6)] {
            graph.add_edge(source, target, 1, true).unwrap();
        }
        for (vertex, priority) in [(0, 5.0), (1, 1.0), (2, 1.0), (3, 1.0), (4, 0.5), (5, 0.5), (6, 0.1), (7, 9.0), (8, 9.0)] {
            graph.set_priority(vertex, priority);
        }
        graph
    }

    fn selector(k: u32) -> IndependentSetSelector {
        IndependentSetSelector::new(&PreprocessorSettings { k_neighborhood: k, ..Default::default() })
    }

    #[rstest]
    fn test_independent_once_lower_neighbors_are_processed(mut dependencies: Graph) {
        for vertex in [4, 5, 1, 2, 3] {
            assert!(!selector(2).is_independent(&dependencies, 0));
            dependencies.mark_processed(vertex, 0).unwrap();
        }
        assert!(selector(2).is_independent(&dependencies, 0));
        assert!(!selector(3).is_independent(&dependencies, 0));
    }

    #[rstest]
    fn test_ties_are_broken_by_id(mut dependencies: Graph) {
        dependencies.set_priority(4, 1.0);
        // 1 and 4 are adjacent and tied
        assert!(selector(1).is_independent(&dependencies, 1));
        assert!(!selector(1).is_independent(&dependencies, 4));
    }

    #[rstest]
    fn test_select_returns_ascending_ranks(dependencies: Graph) {
        // 6 is the global minimum; 4 and 5 are each lowest within two hops
        assert_eq!(selector(2).select(&dependencies), vec![6, 4, 5]);
        assert_eq!(selector(1).select(&dependencies), vec![6, 4, 5, 3]);
    }
}
