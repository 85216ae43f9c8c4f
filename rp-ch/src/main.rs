#![deny(
    // This is overly strict, of course. The intent is somewhat of a "quality seal," less to fix everything, and more to force us to add inline allows, which are even more needlessly verbose, but give us a mechanism to say "we think this is okay, but you might want to take a second look here."
    clippy::nursery,
    clippy::pedantic,
    missing_docs,
    clippy::missing_docs_in_private_items,
)]
//! `rp-ch` command line interface: builds a contraction hierarchy from an extracted road graph.
//!
//! Settings come from the defaults, then an optional YAML file, then individual flags, each
//! overriding the previous. See binary --help for more information.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rp_ch::PreprocessorSettings;
use tracing::info;

/// rp-ch command-line interface to preprocess a road graph into a contraction hierarchy
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the input graph, JSON with `vertices` and `edges` arrays.
    #[arg(short, long)]
    input: PathBuf,

    /// YAML file with preprocessor settings; missing fields take their defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory under which the timestamped run directory is created.
    #[arg(short, long, default_value = "runs")]
    output_dir: PathBuf,

    /// Also write the hierarchy as a Graphviz DOT file.
    #[arg(long)]
    dot: bool,

    /// Logging verbosity level (`trace`, `debug`, `info`, `warn`, `error`) or a full filter
    /// directive such as `rp_ch=debug`.
    #[arg(short, long, default_value = "info")]
    verbosity: String,

    /// Maximum number of edges of a witness path.
    #[arg(long)]
    search_space_hop_limit: Option<u32>,

    /// Radius of the neighbourhood a vertex must be the lowest-priority vertex of.
    #[arg(short, long)]
    k_neighborhood: Option<u32>,

    /// Weight of the edge quotient in the priority.
    #[arg(long)]
    edge_quotient_factor: Option<f64>,

    /// Weight of the hierarchy depth in the priority.
    #[arg(long)]
    hierarchy_depths_factor: Option<f64>,

    /// Weight of the original-edge quotient in the priority.
    #[arg(long)]
    original_edge_quotient_factor: Option<f64>,

    /// Number of worker threads (defaults to the number of CPUs).
    #[arg(short = 'j', long)]
    num_threads: Option<usize>,

    /// Vertices a worker takes at a time.
    #[arg(long)]
    batch_size: Option<usize>,
}

impl Cli {
    /// Resolves the effective settings.
    fn settings(&self) -> Result<PreprocessorSettings> {
        let mut settings = match &self.config {
            Some(path) => PreprocessorSettings::from_yaml_file(path)?,
            None => PreprocessorSettings::default(),
        };
        if let Some(v) = self.search_space_hop_limit {
            settings.search_space_hop_limit = v;
        }
        if let Some(v) = self.k_neighborhood {
            settings.k_neighborhood = v;
        }
        if let Some(v) = self.edge_quotient_factor {
            settings.edge_quotient_factor = v;
        }
        if let Some(v) = self.hierarchy_depths_factor {
            settings.hierarchy_depths_factor = v;
        }
        if let Some(v) = self.original_edge_quotient_factor {
            settings.original_edge_quotient_factor = v;
        }
        if let Some(v) = self.num_threads {
            settings.num_threads = v;
        }
        if let Some(v) = self.batch_size {
            settings.batch_size = v;
        }
        Ok(settings)
    }
}

/// Parses the command line, sets up logging and runs the pipeline.
fn main() -> Result<()> {
    let args = Cli::parse();

    // Conform to crate-standard logging.
    rp_core::logging::setup(&args.verbosity);
    let settings = args.settings()?;
    info!("Preprocessing {}", args.input.display());

    let output = rp_ch::pipeline::run(&args.input, settings, &args.output_dir, args.dot)?;
    info!(
        rounds = output.statistics.rounds,
        shortcuts = output.statistics.shortcuts_added,
        hop_paths = output.hop_indices.paths.len(),
        "Results written to: {}",
        output.output_dir.display()
    );
    Ok(())
}
