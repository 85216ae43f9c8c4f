#![deny(
    // This is overly strict, of course. The intent is somewhat of a "quality seal," less to fix everything, and more to force us to add inline allows, which are even more needlessly verbose, but give us a mechanism to say "we think this is okay, but you might want to take a second look here."
    clippy::nursery,
    clippy::pedantic,
    missing_docs,
    clippy::missing_docs_in_private_items,
)]
#![allow(clippy::module_name_repetitions)]

//! # rp-ch – Contraction Hierarchies preprocessing for road networks
//!
//! rp-ch turns a weighted road graph into a contraction hierarchy: every vertex gets a rank (the
//! round it was contracted in) and shortcut edges are added so that shortest paths can be found
//! by searching upwards in rank only.
//!
//! ## Pipeline overview
//! 1. Graph loading ([`Graph::from_raw`]) – Validate the extracted [`RawGraph`] into the
//!    petgraph-backed [`Graph`].
//! 2. Contraction ([`Preprocessor`]) – Rank vertices from simulated contractions, pick an
//!    independent set of low-priority vertices, simulate their contraction on a thread pool and
//!    apply the resulting shortcuts, round after round until every vertex is processed.
//! 3. Path combining ([`PathCombiner`]) – Expand every shortcut into its original edges and fold
//!    expansions that occur inside others, so the hop indices stay small.
//!
//! The entry point [`pipeline::run`] orchestrates these stages and writes the hierarchy, the
//! hop indices and run metadata into a timestamped directory.
//!
//! All long-running stages are annotated with [`tracing`] spans so that callers can observe
//! progress and timing.

pub mod contraction_hierarchies;
pub mod errors;
pub mod graph;
pub mod model;
pub mod path_combiner;
pub mod pipeline;
pub mod queue;
pub mod settings;
pub mod utils;

pub use contraction_hierarchies::{
    Contractable,
    ContractionOutput,
    FixedOrderContractor,
    PreprocessingStatistics,
    Preprocessor,
};
pub use errors::ContractionError;
pub use graph::Graph;
pub use model::{
    Edge,
    EdgeId,
    RawEdge,
    RawGraph,
    RawVertex,
    Vertex,
    VertexId,
    Weight,
};
pub use path_combiner::{
    PathCombiner,
    PathLocation,
};
pub use settings::PreprocessorSettings;
