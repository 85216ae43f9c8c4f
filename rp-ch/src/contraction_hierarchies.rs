//! Contraction Hierarchies preprocessing for road networks.
//!
//! Preprocessing repeatedly removes ("contracts") the least important remaining vertex and adds
//! shortcut edges between its remaining neighbours wherever the path through it was the only
//! shortest path. The result, the input graph plus all shortcuts with every vertex annotated
//! with the round it was contracted in, is the eponymous "contraction hierarchy". Query-time
//! search over it lives elsewhere.
//!
//! A run proceeds in rounds:
//! 1. every vertex whose surroundings changed is ranked ([`VertexRanker`]) by simulating its
//!    contraction ([`simulate`]),
//! 2. the vertices that have the lowest priority within their `k`-hop neighbourhood are selected
//!    ([`IndependentSetSelector`]),
//! 3. the [`WorkerPool`] simulates their contraction in parallel on the unchanged graph,
//! 4. the results are applied to the graph, after all workers are done.
//!
//! Vertices are never deleted and edges only flagged as removed, so one graph holds every
//! intermediate core graph as well as the final hierarchy.

/// Round orchestration and the contraction strategies
mod ch;
/// Vertex ranking and independent-set selection
mod heuristic;
/// Hop-limited witness search
mod search;
/// Per-vertex contraction simulation
mod simulator;
/// Thread pool running simulations
mod worker;

pub use ch::{
    Contractable,
    ContractionOutput,
    FixedOrderContractor,
    PreprocessingStatistics,
    Preprocessor,
};
pub use heuristic::{
    IndependentSetSelector,
    VertexRanker,
};
pub use search::has_path_shorter_equal_than;
pub use simulator::{
    simulate,
    simulate_in_round,
    ContractionSimulationResult,
    ShortcutPair,
};
pub use worker::{
    BatchSource,
    ContractorWorker,
    WorkerPool,
};
