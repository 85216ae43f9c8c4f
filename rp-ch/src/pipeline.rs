//! End-to-end preprocessing run.
//!
//! The run has three stages, each its own function coordinated by [`run`]:
//! 1. Loading - read the raw graph and validate it into a [`Graph`]
//! 2. Contraction - build the contraction hierarchy with a [`Preprocessor`]
//! 3. Path combining - fold shortcut expansions into shared hop-index paths with a [`PathCombiner`]
//!
//! Everything a run produces lands in a timestamped directory below the requested output
//! directory.

use std::path::{
    Path,
    PathBuf,
};

use anyhow::Result;
use indicatif::{
    ProgressBar,
    ProgressFinish,
    ProgressStyle,
};
use serde::Serialize;
use tracing::{
    info,
    instrument,
};

use crate::contraction_hierarchies::{
    ContractionOutput,
    PreprocessingStatistics,
    Preprocessor,
};
use crate::graph::Graph;
use crate::model::{
    Edge,
    Vertex,
};
use crate::path_combiner::{
    HopIndices,
    PathCombiner,
};
use crate::settings::PreprocessorSettings;
use crate::utils::{
    create_timestamped_output_dir,
    read_raw_graph,
    write_dot_file,
    write_json_file,
};

/// Contents of `hierarchy.json`.
#[derive(Debug, Serialize)]
struct HierarchyFile<'a> {
    /// Settings of the run.
    settings: &'a PreprocessorSettings,
    /// Counters of the run.
    statistics: &'a PreprocessingStatistics,
    /// All vertices, with rounds and depths.
    vertices: Vec<&'a Vertex>,
    /// All edges, shortcuts and removed ones included.
    edges: Vec<&'a Edge>,
}

/// Everything a run computed, for callers that want more than the files.
#[derive(Debug)]
pub struct PipelineOutput {
    /// Directory the files were written to.
    pub output_dir: PathBuf,
    /// The contraction hierarchy.
    pub graph: Graph,
    /// Contraction counters.
    pub statistics: PreprocessingStatistics,
    /// Combined shortcut expansions.
    pub hop_indices: HopIndices,
}

/// Preprocesses the graph in `input` and writes the results below `output_base`.
#[instrument(skip(settings))]
pub fn run(input: &Path, settings: PreprocessorSettings, output_base: &Path, write_dot: bool) -> Result<PipelineOutput> {
    let graph = load_graph(input)?;
    let output_dir = create_timestamped_output_dir(output_base)?;

    let ContractionOutput { graph, statistics } = contract_graph(graph, settings.clone())?;
    let hop_indices = combine_paths(&graph);

    let hierarchy = HierarchyFile {
        settings: &settings,
        statistics: &statistics,
        vertices: graph.vertices().collect(),
        edges: graph.edges().collect(),
    };
    let path = write_json_file(&output_dir, "hierarchy.json", &hierarchy)?;
    info!("Hierarchy written to: {}", path.display());
    let path = write_json_file(&output_dir, "hop_indices.json", &hop_indices)?;
    info!("Hop indices written to: {}", path.display());
    if write_dot {
        let path = write_dot_file(&output_dir, "hierarchy.dot", &graph.to_dot())?;
        info!("Hierarchy graph written to: {}", path.display());
    }

    Ok(PipelineOutput { output_dir, graph, statistics, hop_indices })
}

/// Reads and validates the input graph.
#[instrument]
pub(crate) fn load_graph(input: &Path) -> Result<Graph> {
    let raw = read_raw_graph(input)?;
    let graph = Graph::from_raw(&raw)?;
    info!(vertices = graph.vertex_count(), edges = graph.edge_count(), "graph loaded");
    Ok(graph)
}

/// Contracts every vertex while showing a progress bar.
#[instrument(skip_all, fields(vertices = graph.vertex_count()))]
pub(crate) fn contract_graph(graph: Graph, settings: PreprocessorSettings) -> Result<ContractionOutput> {
    let preprocessor = Preprocessor::new(settings)?;
    let total = graph.unprocessed_vertices().count();

    let pb = ProgressBar::new(total as u64)
        .with_style(ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.yellow/blue}] {pos}/{len} vertices ({percent}%) {msg}",
        )?)
        .with_message("Contraction")
        .with_finish(ProgressFinish::AndLeave);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let output = preprocessor.execute_with_progress(graph, |contracted| pb.set_position(contracted as u64))?;
    pb.finish_using_style();
    Ok(output)
}

/// Combines the expansions of all live shortcuts.
#[instrument(skip_all)]
pub(crate) fn combine_paths(graph: &Graph) -> HopIndices {
    let mut combiner = PathCombiner::from_graph(graph);
    combiner.combine();
    combiner.hop_indices()
}
