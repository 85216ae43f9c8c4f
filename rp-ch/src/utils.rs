//! File helpers for the preprocessing pipeline.

use std::fs::File;
use std::io::{
    BufReader,
    BufWriter,
    Write,
};
use std::path::{
    Path,
    PathBuf,
};
use std::time::SystemTime;

use anyhow::{
    Context,
    Result,
};
use chrono::{
    DateTime,
    Utc,
};
use serde::Serialize;
use serde_json::json;
use tracing::{
    debug,
    instrument,
};

use crate::model::RawGraph;

/// Create a timestamped directory under `base_dir` and write run metadata into it.
#[instrument]
pub fn create_timestamped_output_dir(base_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(base_dir)?;

    let now: DateTime<Utc> = SystemTime::now().into();
    let timestamp = now.to_rfc3339().replace([':', '.'], "-"); // make filesystem-friendly
    let output_dir = base_dir.join(timestamp);
    std::fs::create_dir_all(&output_dir)?;

    let metadata = json!({
        "timestamp": now.to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "command_args": std::env::args().collect::<Vec<_>>()
    });
    write_json_file(&output_dir, "metadata.json", &metadata)?;

    Ok(output_dir)
}

/// Write DOT graph description to a file within `output_dir` and return the path.
#[instrument(skip(dot_content))]
pub fn write_dot_file(output_dir: &Path, filename: &str, dot_content: &str) -> Result<PathBuf> {
    let file_path = output_dir.join(filename);
    let mut file = File::create(&file_path)?;
    write!(file, "{dot_content}")?;

    debug!("Graph written to: {}", file_path.display());
    Ok(file_path)
}

/// Pretty-print `value` as JSON into `output_dir/filename` and return the path.
#[instrument(skip(value))]
pub fn write_json_file<T: Serialize + ?Sized>(output_dir: &Path, filename: &str, value: &T) -> Result<PathBuf> {
    let file_path = output_dir.join(filename);
    let mut writer = BufWriter::new(File::create(&file_path)?);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("serializing {}", file_path.display()))?;
    writer.flush()?;

    debug!("JSON written to: {}", file_path.display());
    Ok(file_path)
}

/// Read an input graph from a JSON file.
#[instrument]
pub fn read_raw_graph(path: &Path) -> Result<RawGraph> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let raw: RawGraph = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing graph from {}", path.display()))?;
    debug!(vertices = raw.vertices.len(), edges = raw.edges.len(), "graph read");
    Ok(raw)
}
