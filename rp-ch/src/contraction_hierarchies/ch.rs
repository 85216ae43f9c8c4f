use std::collections::HashSet;
use std::time::{
    Duration,
    Instant,
};

use anyhow::Result;
use itertools::Itertools;
use rp_core::errors::EmptyResult;
use serde::Serialize;
use tracing::{
    debug,
    info,
    instrument,
};

use super::heuristic::{
    IndependentSetSelector,
    VertexRanker,
};
use super::simulator::{
    simulate,
    ContractionSimulationResult,
};
use super::worker::WorkerPool;
use crate::errors::ContractionError;
use crate::graph::Graph;
use crate::model::{
    EdgeId,
    VertexId,
    Weight,
};
use crate::settings::PreprocessorSettings;

/// Counters describing one preprocessing run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PreprocessingStatistics {
    /// Contraction rounds executed.
    pub rounds: usize,
    /// Vertices contracted.
    pub vertices_contracted: usize,
    /// Shortcut edges created.
    pub shortcuts_added: usize,
    /// Edges superseded by a lighter shortcut.
    pub edges_removed: usize,
    /// Contraction simulations run, for ranking and for contracting.
    pub simulations: usize,
    /// Largest hierarchy depth of any vertex.
    pub max_hierarchy_depth: u32,
    /// Wall-clock time of the run.
    pub elapsed: Duration,
}

/// The hierarchy produced by a [`Contractable`] strategy.
#[derive(Clone, Debug)]
pub struct ContractionOutput {
    /// Input graph plus shortcuts, every vertex processed.
    pub graph: Graph,
    /// What it took to get there.
    pub statistics: PreprocessingStatistics,
}

/// A strategy that turns a graph into a contraction hierarchy.
pub trait Contractable {
    /// Contracts every vertex of `graph`.
    fn contract(&self, graph: Graph) -> Result<ContractionOutput>;
}

/// Priority-driven contraction: each round contracts an independent set of low-priority vertices,
/// simulated in parallel.
#[derive(Clone, Debug)]
pub struct Preprocessor {
    /// Settings, validated on construction.
    settings: PreprocessorSettings,
}

impl Preprocessor {
    /// Creates a preprocessor, rejecting unusable settings.
    pub fn new(settings: PreprocessorSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    /// The settings of this preprocessor.
    #[must_use]
    pub const fn settings(&self) -> &PreprocessorSettings {
        &self.settings
    }

    /// Contracts every vertex of `graph`.
    pub fn execute(&self, graph: Graph) -> Result<ContractionOutput> {
        self.execute_with_progress(graph, |_| {})
    }

    /// Like [`Self::execute`], calling `progress` with the number of contracted vertices after
    /// every round.
    #[instrument(skip_all, fields(vertices = graph.vertex_count(), edges = graph.edge_count()))]
    pub fn execute_with_progress<F>(&self, mut graph: Graph, mut progress: F) -> Result<ContractionOutput>
    where
        F: FnMut(usize),
    {
        let start = Instant::now();
        let pool = WorkerPool::new(&self.settings)?;
        let ranker = VertexRanker::new(&self.settings);
        let selector = IndependentSetSelector::new(&self.settings);
        let mut statistics = PreprocessingStatistics::default();
        info!(num_threads = pool.num_threads(), settings = ?self.settings, "starting contraction");

        let unprocessed: Vec<_> = graph.unprocessed_vertices().collect();
        let initial = unprocessed.len();
        let mut remaining = initial;
        self.rank(&pool, &ranker, &mut graph, &unprocessed, &mut statistics)?;

        let mut round = 0;
        while remaining > 0 {
            let batch = pool.install(|| selector.select(&graph));
            if batch.is_empty() {
                return Err(ContractionError::non_convergence(remaining));
            }

            let results = pool.simulate_round(&self.settings, &graph, &batch)?;
            statistics.simulations += results.len();
            let shortcuts_before = statistics.shortcuts_added;
            let touched = apply_round(&mut graph, round, results, &mut statistics)?;
            remaining -= batch.len();
            debug!(
                round,
                contracted = batch.len(),
                shortcuts = statistics.shortcuts_added - shortcuts_before,
                remaining,
                "round finished"
            );

            self.rank(&pool, &ranker, &mut graph, &touched, &mut statistics)?;
            round += 1;
            progress(initial - remaining);
        }

        statistics.rounds = round;
        statistics.elapsed = start.elapsed();
        statistics.max_hierarchy_depth = graph.vertices().map(|v| v.hierarchy_depth).max().unwrap_or(0);
        info!(
            rounds = statistics.rounds,
            shortcuts = statistics.shortcuts_added,
            removed = statistics.edges_removed,
            elapsed = ?statistics.elapsed,
            "contraction finished"
        );
        Ok(ContractionOutput { graph, statistics })
    }

    /// Recomputes the priority of `vertices` from a fresh simulation of each.
    fn rank(
        &self,
        pool: &WorkerPool,
        ranker: &VertexRanker,
        graph: &mut Graph,
        vertices: &[VertexId],
        statistics: &mut PreprocessingStatistics,
    ) -> EmptyResult {
        let results = pool.simulate_all(&self.settings, graph, vertices)?;
        statistics.simulations += results.len();
        for (vertex, result) in results {
            let priority = ranker.priority(&result, graph.vertex(vertex).hierarchy_depth);
            graph.set_priority(vertex, priority);
        }
        Ok(())
    }
}

impl Contractable for Preprocessor {
    fn contract(&self, graph: Graph) -> Result<ContractionOutput> {
        self.execute(graph)
    }
}

/// Contracts one vertex per round in a caller-chosen order, e.g. one computed by an external
/// ordering tool or a previous run.
#[derive(Clone, Debug)]
pub struct FixedOrderContractor {
    /// Settings; only the hop limit matters here.
    settings: PreprocessorSettings,
    /// Every vertex id exactly once.
    order: Vec<VertexId>,
}

impl FixedOrderContractor {
    /// Creates a contractor for `order`.
    pub fn new(settings: PreprocessorSettings, order: Vec<VertexId>) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings, order })
    }
}

impl Contractable for FixedOrderContractor {
    #[instrument(skip_all, fields(vertices = graph.vertex_count()))]
    fn contract(&self, mut graph: Graph) -> Result<ContractionOutput> {
        let start = Instant::now();
        let unprocessed = graph.unprocessed_vertices().count();
        if self.order.len() != unprocessed {
            return Err(ContractionError::invalid_settings(format!(
                "contraction order has {} vertices, the graph {unprocessed} unprocessed ones",
                self.order.len()
            )));
        }

        let mut statistics = PreprocessingStatistics::default();
        for (round, &vertex) in self.order.iter().enumerate() {
            if vertex >= graph.vertex_count() {
                return Err(ContractionError::graph_consistency(format!("unknown vertex {vertex} in contraction order")));
            }
            let result = simulate(&self.settings, &graph, vertex);
            statistics.simulations += 1;
            #[allow(clippy::cast_precision_loss)]
            graph.set_priority(vertex, round as f64);
            apply_round(&mut graph, round, vec![(vertex, result)], &mut statistics)?;
        }

        statistics.rounds = self.order.len();
        statistics.elapsed = start.elapsed();
        statistics.max_hierarchy_depth = graph.vertices().map(|v| v.hierarchy_depth).max().unwrap_or(0);
        Ok(ContractionOutput { graph, statistics })
    }
}

/// Commits a round's simulation results and returns the unprocessed neighbours of the contracted
/// vertices, ascending.
///
/// For every result this adds its shortcuts, retires parallel edges the shortcuts make obsolete,
/// marks the vertex processed and pushes its neighbours' hierarchy depth above its own. The
/// results must come from one independent set simulated on the graph as it was before this call.
fn apply_round(
    graph: &mut Graph,
    round: usize,
    mut results: Vec<(VertexId, ContractionSimulationResult)>,
    statistics: &mut PreprocessingStatistics,
) -> Result<Vec<VertexId>> {
    results.sort_unstable_by_key(|(vertex, _)| *vertex);
    let batch: HashSet<VertexId> = results.iter().map(|(vertex, _)| *vertex).collect();
    let mut touched = Vec::new();

    for (vertex, result) in results {
        for pair in &result.shortcut_edge_pairs {
            let source = graph.other_vertex(pair.edge_in, vertex);
            let target = graph.other_vertex(pair.edge_out, vertex);
            for edge in [pair.edge_in, pair.edge_out] {
                if graph.edge(edge).removed {
                    return Err(ContractionError::invariant_violation(format!(
                        "shortcut of vertex {vertex} bypasses removed edge {edge}"
                    )));
                }
            }
            if batch.contains(&source) || batch.contains(&target) {
                return Err(ContractionError::invariant_violation(format!(
                    "vertex {vertex} shares an edge with another vertex of round {round}"
                )));
            }

            let weight = graph.weight(pair.edge_in) + graph.weight(pair.edge_out);
            let original_edge_count =
                graph.original_edge_count(pair.edge_in).saturating_add(graph.original_edge_count(pair.edge_out));
            let bidirectional = pair.multiplicity == 2;
            for superseded in superseded_edges(graph, source, target, weight, bidirectional) {
                graph.mark_edge_removed(superseded)?;
                statistics.edges_removed += 1;
            }
            graph.add_shortcut_edge(
                source,
                target,
                weight,
                original_edge_count,
                (pair.edge_in, pair.edge_out),
                bidirectional,
            )?;
            statistics.shortcuts_added += 1;
        }

        let depth = graph.vertex(vertex).hierarchy_depth + 1;
        let neighbors: Vec<_> = graph
            .neighbors(vertex)
            .into_iter()
            .filter(|&n| !graph.vertex(n).processed)
            .collect();
        for &neighbor in &neighbors {
            graph.raise_hierarchy_depth(neighbor, depth);
        }
        touched.extend(neighbors);
        graph.mark_processed(vertex, round)?;
        statistics.vertices_contracted += 1;
    }

    Ok(touched.into_iter().filter(|v| !batch.contains(v)).sorted_unstable().dedup().collect())
}

/// Live edges between `source` and `target` that are heavier than a new shortcut of `weight` and
/// usable in no direction the shortcut is not.
fn superseded_edges(graph: &Graph, source: VertexId, target: VertexId, weight: Weight, bidirectional: bool) -> Vec<EdgeId> {
    graph
        .outgoing_edges(source)
        .into_iter()
        .chain(graph.ingoing_edges(source))
        .filter(|&e| graph.other_vertex(e, source) == target)
        .unique()
        .filter(|&e| {
            let edge = graph.edge(e);
            let covered = if bidirectional {
                true
            } else {
                !edge.bidirectional && edge.source == source
            };
            covered && edge.weight > weight
        })
        .collect()
}
