mod common;

use capgraph::commands::{
    graph_command, perms_command, query_command, summary_command, symbols_command,
    tag_heap_command, GraphOptions,
};
use capgraph::{parse_addresses, resolve_graph_config, validate_overlap_policy};
use capgraph_core::graph::{EdgeLabel, OverlapPolicy};
use capgraph_core::model::Address;
use capgraph_core::services::GraphRequest;
use tempfile::tempdir;

use common::seed_trace;

/// The graph command reports what it wrote.
#[test]
fn graph_command_returns_written_paths() {
    let temp = tempdir().unwrap();
    let db = temp.path().join("trace.db");
    seed_trace(&db);
    let out = temp.path().join("graphs");

    let opts = GraphOptions {
        db: db.to_string_lossy().to_string(),
        out_dir: Some(out.to_string_lossy().to_string()),
        overlap: Some("first-loaded".into()),
        ..GraphOptions::default()
    };
    let written = graph_command(&opts, GraphRequest::Compartments).unwrap();
    assert_eq!(written.dot_path, out.join("comparts_graph.gv"));
    assert_eq!(written.nodes, 4);
    assert_eq!(written.edges, 2);
}

/// A `dot` binary that cannot be spawned fails the command.
#[test]
fn graph_command_surfaces_render_failures() {
    let temp = tempdir().unwrap();
    let db = temp.path().join("trace.db");
    seed_trace(&db);

    let opts = GraphOptions {
        db: db.to_string_lossy().to_string(),
        out_dir: Some(temp.path().join("out").to_string_lossy().to_string()),
        render: Some("svg".into()),
        dot_bin: Some(temp.path().join("no-such-dot").to_string_lossy().to_string()),
        ..GraphOptions::default()
    };
    let err = graph_command(&opts, GraphRequest::Regions).unwrap_err();
    assert!(format!("{err:#}").contains("failed to spawn dot"), "unexpected error: {err:#}");
}

/// Every command refuses to create a missing trace database.
#[test]
fn commands_error_when_database_missing() {
    let temp = tempdir().unwrap();
    let missing = temp.path().join("missing.db").to_string_lossy().to_string();

    let err = summary_command(&missing, false).unwrap_err();
    assert!(err.to_string().contains("Failed to open trace database"), "unexpected error: {err}");
    assert!(perms_command(&missing, true).is_err());
    assert!(query_command(&missing, "SELECT 1").is_err());
    assert!(tag_heap_command(&missing, &["0x10".to_string()]).is_err());
    assert!(!temp.path().join("missing.db").exists());
}

/// Heap tagging validates addresses before touching the trace.
#[test]
fn tag_heap_command_rejects_bad_addresses() {
    let temp = tempdir().unwrap();
    let db = temp.path().join("trace.db");
    seed_trace(&db);
    let db = db.to_string_lossy().to_string();

    let err = tag_heap_command(&db, &["0xnope".to_string()]).unwrap_err();
    assert!(err.to_string().contains("Invalid heap block address"));
    assert!(tag_heap_command(&db, &[]).is_err());
    assert_eq!(tag_heap_command(&db, &["262160".to_string()]).unwrap(), 1);
}

/// Command-line flags override values from the config file.
#[test]
fn overrides_apply_on_top_of_config() {
    let temp = tempdir().unwrap();
    let config = temp.path().join("graph.json");
    std::fs::write(&config, r#"{"output_dir": "cfg-out", "overlap_policy": "smallest"}"#).unwrap();
    let config = config.to_string_lossy().to_string();

    let cfg = resolve_graph_config(Some(&config), None, None, false).unwrap();
    assert_eq!(cfg.output_dir, "cfg-out");
    assert_eq!(cfg.overlap_policy, OverlapPolicy::Smallest);
    assert_eq!(cfg.edge_label, EdgeLabel::Permissions);

    let cfg = resolve_graph_config(Some(&config), Some("cli-out"), Some("all"), true).unwrap();
    assert_eq!(cfg.output_dir, "cli-out");
    assert_eq!(cfg.overlap_policy, OverlapPolicy::All);
    assert_eq!(cfg.edge_label, EdgeLabel::Unlabeled);

    let cfg = resolve_graph_config(None, None, None, false).unwrap();
    assert_eq!(cfg.output_dir, "graph-output");
}

/// Overlap policy names parse or list the allowed values.
#[test]
fn overlap_policy_validation() {
    assert_eq!(validate_overlap_policy("first-loaded").unwrap(), OverlapPolicy::FirstLoaded);
    let err = validate_overlap_policy("widest").unwrap_err();
    assert!(err.to_string().contains("Allowed: all, first-loaded, smallest"));
}

/// Heap block addresses accept hex and decimal.
#[test]
fn addresses_parse_hex_and_decimal() {
    let parsed = parse_addresses(&["0x10".to_string(), "16".to_string()]).unwrap();
    assert_eq!(parsed, vec![Address(16), Address(16)]);
}

/// The symbol report covers every capability held in the library.
#[test]
fn symbols_command_joins_capabilities_with_symbols() {
    let temp = tempdir().unwrap();
    let db = temp.path().join("trace.db");
    seed_trace(&db);

    let report = symbols_command(&db.to_string_lossy(), "libA", true).unwrap();
    assert_eq!(report.total(), 2);
    let first = &report.capabilities[0];
    assert_eq!(first.location_symbols[0].display(), "got_entry (OBJECT)");
    assert_eq!(first.target_symbol.as_ref().map(|s| s.name.as_str()), Some("helper"));
    assert!(report.capabilities[1].location_symbols.is_empty());
    assert!(report.capabilities[1].target_symbol.is_none());
}
