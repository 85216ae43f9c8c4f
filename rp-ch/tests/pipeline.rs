use std::fs;
use std::path::PathBuf;

use assertables::*;
use rp_ch::pipeline;
use rp_ch::PreprocessorSettings;
use serde_json::Value;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("rp-ch-pipeline-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

// A 3x3 grid of two-way streets plus a one-way diagonal.
const GRID: &str = r#"{
    "vertices": [
        {"lat": 0.0, "lon": 0.0}, {"lat": 0.0, "lon": 1.0}, {"lat": 0.0, "lon": 2.0},
        {"lat": 1.0, "lon": 0.0}, {"lat": 1.0, "lon": 1.0}, {"lat": 1.0, "lon": 2.0},
        {"lat": 2.0, "lon": 0.0}, {"lat": 2.0, "lon": 1.0}, {"lat": 2.0, "lon": 2.0}
    ],
    "edges": [
        {"source": 0, "target": 1, "weight": 4, "bidirectional": true},
        {"source": 1, "target": 2, "weight": 3, "bidirectional": true},
        {"source": 3, "target": 4, "weight": 5, "bidirectional": true},
        {"source": 4, "target": 5, "weight": 2, "bidirectional": true},
        {"source": 6, "target": 7, "weight": 6, "bidirectional": true},
        {"source": 7, "target": 8, "weight": 1, "bidirectional": true},
        {"source": 0, "target": 3, "weight": 2, "bidirectional": true},
        {"source": 3, "target": 6, "weight": 7, "bidirectional": true},
        {"source": 1, "target": 4, "weight": 3, "bidirectional": true},
        {"source": 4, "target": 7, "weight": 4, "bidirectional": true},
        {"source": 2, "target": 5, "weight": 5, "bidirectional": true},
        {"source": 5, "target": 8, "weight": 2, "bidirectional": true},
        {"source": 0, "target": 8, "weight": 9}
    ]
}"#;

#[test]
fn test_run_writes_all_outputs() {
    let dir = scratch_dir("outputs");
    let input = dir.join("grid.json");
    fs::write(&input, GRID).unwrap();

    let settings = PreprocessorSettings { num_threads: 2, ..Default::default() };
    let output = pipeline::run(&input, settings, &dir.join("runs"), true).unwrap();

    for file in ["metadata.json", "hierarchy.json", "hop_indices.json", "hierarchy.dot"] {
        assert!(output.output_dir.join(file).is_file(), "{file} missing");
    }

    let hierarchy: Value = serde_json::from_str(&fs::read_to_string(output.output_dir.join("hierarchy.json")).unwrap()).unwrap();
    assert_eq!(hierarchy["vertices"].as_array().unwrap().len(), 9);
    assert_eq!(hierarchy["statistics"]["vertices_contracted"], 9);
    assert_eq!(hierarchy["settings"]["num_threads"], 2);
    assert_eq!(hierarchy["edges"].as_array().unwrap().len(), output.graph.edge_count());

    let dot = fs::read_to_string(output.output_dir.join("hierarchy.dot")).unwrap();
    assert_starts_with!(dot, "digraph");

    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_hop_indices_expand_every_shortcut() {
    let dir = scratch_dir("hops");
    let input = dir.join("grid.json");
    fs::write(&input, GRID).unwrap();

    let settings = PreprocessorSettings { num_threads: 1, search_space_hop_limit: 1, ..Default::default() };
    let output = pipeline::run(&input, settings, &dir.join("runs"), false).unwrap();
    assert!(!output.output_dir.join("hierarchy.dot").exists());

    let live_shortcuts: Vec<_> = output.graph.edges().filter(|e| e.is_shortcut() && !e.removed).collect();
    assert_eq!(output.hop_indices.locations.len(), live_shortcuts.len());
    for shortcut in live_shortcuts {
        let expansion = output.graph.unpack_edge(shortcut.id);
        assert_eq!(expansion.len(), shortcut.original_edge_count as usize);

        let location = output.hop_indices.locations[&shortcut.id];
        let path = &output.hop_indices.paths[&location.path_id];
        assert_eq!(&path[location.offset..location.offset + expansion.len()], expansion.as_slice());

        let weight: u64 = expansion.iter().map(|&e| output.graph.weight(e)).sum();
        assert_eq!(weight, shortcut.weight);
    }

    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_invalid_input_is_rejected() {
    let dir = scratch_dir("invalid");
    let input = dir.join("broken.json");
    fs::write(&input, r#"{"vertices": [{}], "edges": [{"source": 0, "target": 3, "weight": 1}]}"#).unwrap();

    let settings = PreprocessorSettings { num_threads: 1, ..Default::default() };
    let err = pipeline::run(&input, settings, &dir.join("runs"), false).unwrap_err();
    assert!(matches!(err.downcast_ref::<rp_ch::ContractionError>(), Some(rp_ch::ContractionError::GraphConsistency(_))));
    assert!(!dir.join("runs").exists());

    fs::remove_dir_all(dir).unwrap();
}
