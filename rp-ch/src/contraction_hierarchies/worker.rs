use std::collections::HashSet;
use std::sync::atomic::{
    AtomicUsize,
    Ordering,
};

use anyhow::{
    Context,
    Result,
};
use rayon::prelude::*;
use tracing::{
    debug,
    instrument,
};

use super::simulator::{
    simulate,
    simulate_in_round,
    ContractionSimulationResult,
};
use crate::errors::ContractionError;
use crate::graph::Graph;
use crate::model::VertexId;
use crate::settings::PreprocessorSettings;

/// Hands out fixed-size batches of a round's vertices to whichever worker asks first.
#[derive(Debug)]
pub struct BatchSource<'a> {
    /// The round's vertices.
    vertices: &'a [VertexId],
    /// Vertices per batch.
    batch_size: usize,
    /// Start of the next batch.
    cursor: AtomicUsize,
}

impl<'a> BatchSource<'a> {
    /// Creates a source over `vertices`. A `batch_size` of 0 is treated as 1.
    #[must_use]
    pub fn new(vertices: &'a [VertexId], batch_size: usize) -> Self {
        Self { vertices, batch_size: batch_size.max(1), cursor: AtomicUsize::new(0) }
    }

    /// The next unclaimed batch, or `None` once the round is exhausted.
    pub fn get_next_batch(&self) -> Option<&'a [VertexId]> {
        let start = self.cursor.fetch_add(self.batch_size, Ordering::Relaxed);
        if start >= self.vertices.len() {
            return None;
        }
        let end = (start + self.batch_size).min(self.vertices.len());
        Some(&self.vertices[start..end])
    }
}

/// Runs contraction simulations for the batches it pulls. Only ever reads the graph.
#[derive(Debug)]
pub struct ContractorWorker<'a> {
    /// Worker number, for logging.
    id: usize,
    /// Settings of the run.
    settings: &'a PreprocessorSettings,
    /// Graph as of the start of the round.
    graph: &'a Graph,
    /// Vertices contracted together in this round, when simulating for contraction rather than
    /// for ranking.
    round: Option<&'a HashSet<VertexId>>,
}

impl<'a> ContractorWorker<'a> {
    /// Creates worker `id`. With a `round`, witness paths avoid all of the round's vertices.
    #[must_use]
    pub const fn new(
        id: usize,
        settings: &'a PreprocessorSettings,
        graph: &'a Graph,
        round: Option<&'a HashSet<VertexId>>,
    ) -> Self {
        Self { id, settings, graph, round }
    }

    /// Simulates batches until `source` runs dry and returns the results it staged.
    pub fn run(&self, source: &BatchSource<'_>) -> Vec<(VertexId, ContractionSimulationResult)> {
        let mut staged = Vec::new();
        let mut batches = 0;
        while let Some(batch) = source.get_next_batch() {
            batches += 1;
            staged.extend(batch.iter().map(|&vertex| {
                let result = match self.round {
                    Some(round) => simulate_in_round(self.settings, self.graph, vertex, round),
                    None => simulate(self.settings, self.graph, vertex),
                };
                (vertex, result)
            }));
        }
        debug!(worker = self.id, batches, vertices = staged.len(), "worker finished");
        staged
    }
}

/// A fixed set of `num_threads` threads that lives as long as one preprocessing run.
#[derive(Debug)]
pub struct WorkerPool {
    /// The threads.
    pool: rayon::ThreadPool,
    /// Number of workers started per round.
    num_threads: usize,
    /// Vertices per batch.
    batch_size: usize,
}

impl WorkerPool {
    /// Starts the threads.
    pub fn new(settings: &PreprocessorSettings) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(settings.num_threads)
            .thread_name(|i| format!("contractor-{i}"))
            .build()
            .context("failed to build contractor thread pool")?;
        Ok(Self {
            pool,
            num_threads: settings.num_threads,
            batch_size: settings.batch_size,
        })
    }

    /// Number of worker threads.
    #[must_use]
    pub const fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Runs `op` inside the pool, so rayon iterators in it use the pool's threads.
    pub fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        self.pool.install(op)
    }

    /// Simulates the contraction of every vertex in `vertices` on its own, for ranking, and
    /// returns the results in the same order.
    ///
    /// All simulations read the graph as it is now; the call returns only after every worker is
    /// done, so the caller may mutate the graph afterwards. A vertex listed twice is an error.
    #[instrument(skip_all, fields(vertices = vertices.len()))]
    pub fn simulate_all(
        &self,
        settings: &PreprocessorSettings,
        graph: &Graph,
        vertices: &[VertexId],
    ) -> Result<Vec<(VertexId, ContractionSimulationResult)>> {
        self.dispatch(settings, graph, vertices, None)
    }

    /// Simulates the contraction of a round's independent set. Unlike [`Self::simulate_all`],
    /// no witness path may pass through another vertex of `batch`.
    #[instrument(skip_all, fields(vertices = batch.len()))]
    pub fn simulate_round(
        &self,
        settings: &PreprocessorSettings,
        graph: &Graph,
        batch: &[VertexId],
    ) -> Result<Vec<(VertexId, ContractionSimulationResult)>> {
        let round: HashSet<_> = batch.iter().copied().collect();
        self.dispatch(settings, graph, batch, Some(&round))
    }

    /// Runs one worker per thread over `vertices` and collects their results in input order.
    fn dispatch(
        &self,
        settings: &PreprocessorSettings,
        graph: &Graph,
        vertices: &[VertexId],
        round: Option<&HashSet<VertexId>>,
    ) -> Result<Vec<(VertexId, ContractionSimulationResult)>> {
        let source = BatchSource::new(vertices, self.batch_size);
        let staged: Vec<Vec<_>> = self.pool.install(|| {
            (0..self.num_threads)
                .into_par_iter()
                .map(|id| ContractorWorker::new(id, settings, graph, round).run(&source))
                .collect()
        });

        let mut slots: Vec<Option<ContractionSimulationResult>> = vec![None; graph.vertex_count()];
        for (vertex, result) in staged.into_iter().flatten() {
            if slots[vertex].replace(result).is_some() {
                return Err(ContractionError::invariant_violation(format!("vertex {vertex} simulated twice in one round")));
            }
        }
        vertices
            .iter()
            .map(|&vertex| {
                slots[vertex]
                    .take()
                    .map(|result| (vertex, result))
                    .ok_or_else(|| ContractionError::invariant_violation(format!("vertex {vertex} was not simulated")))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use assertables::*;
    use rstest::*;

    use super::*;

    #[test]
    fn test_batches_cover_everything_once() {
        let vertices: Vec<_> = (0..10).collect();
        let source = BatchSource::new(&vertices, 4);
        assert_eq!(source.get_next_batch(), Some(&vertices[0..4]));
        assert_eq!(source.get_next_batch(), Some(&vertices[4..8]));
        assert_eq!(source.get_next_batch(), Some(&vertices[8..10]));
        assert_eq!(source.get_next_batch(), None);
        assert_eq!(source.get_next_batch(), None);
    }

    #[fixture]
    fn grid() -> Graph {
        // 4x4 grid, bidirectional unit edges
        let mut graph = Graph::new();
        for _ in 0..16 {
            graph.add_vertex(0.0, 0.0);
        }
        for row in 0..4 {
            for col in 0..4 {
                let v = row * 4 + col;
                if col < 3 {
                    graph.add_edge(v, v + 1, 1, true).unwrap();
                }
                if row < 3 {
                    graph.add_edge(v, v + 4, 1, true).unwrap();
                }
            }
        }
        graph
    }

    #[rstest]
    #[case::single_thread(1, 1)]
    #[case::more_threads_than_batches(8, 5)]
    #[case::many_small_batches(3, 2)]
    fn test_simulate_all_matches_sequential(grid: Graph, #[case] num_threads: usize, #[case] batch_size: usize) {
        let settings = PreprocessorSettings { num_threads, batch_size, ..Default::default() };
        let pool = WorkerPool::new(&settings).unwrap();
        let vertices: Vec<_> = (0..16).rev().collect();

        let results = pool.simulate_all(&settings, &grid, &vertices).unwrap();
        assert_eq!(results.iter().map(|(v, _)| *v).collect::<Vec<_>>(), vertices);
        for (vertex, result) in results {
            assert_eq!(result, simulate(&settings, &grid, vertex));
        }
    }

    #[rstest]
    fn test_duplicate_vertices_are_rejected(grid: Graph) {
        let settings = PreprocessorSettings { num_threads: 2, batch_size: 1, ..Default::default() };
        let pool = WorkerPool::new(&settings).unwrap();
        let err = pool.simulate_all(&settings, &grid, &[3, 5, 3]).unwrap_err();
        assert!(matches!(err.downcast_ref::<ContractionError>(), Some(ContractionError::InvariantViolation(_))));
    }

    #[rstest]
    fn test_round_simulation_excludes_the_whole_batch(grid: Graph) {
        // the only short detour from 1 to 4 around corner 0 runs through 5
        let settings = PreprocessorSettings { num_threads: 2, batch_size: 1, ..Default::default() };
        let pool = WorkerPool::new(&settings).unwrap();
        let batch = [0, 5];
        let round = HashSet::from(batch);

        let results = pool.simulate_round(&settings, &grid, &batch).unwrap();
        assert_eq!(simulate(&settings, &grid, 0).num_of_shortcuts, 0);
        assert_gt!(results[0].1.num_of_shortcuts, 0);
        for (vertex, result) in results {
            assert_eq!(result, simulate_in_round(&settings, &grid, vertex, &round));
        }
    }
}
