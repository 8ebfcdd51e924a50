use crate::output::read_bundles;
use crate::utils::config::{load_config, AnalyticsConfig, SCHEMA_VERSION};
use anyhow::{Context, Result};
use log::debug;
use std::path::{Path, PathBuf};

/// Load the TOML config when given, else defaults
pub fn load_analytics_config(path: Option<&Path>) -> Result<AnalyticsConfig> {
    match path {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => {
            debug!("No config file given, using defaults");
            Ok(AnalyticsConfig::default())
        }
    }
}

/// Validate a trace bundle JSON file
pub fn validate_bundle_file(file_path: PathBuf) -> Result<()> {
    println!("Validating trace data: {}", file_path.display());

    let bundles = read_bundles(&file_path)?;

    println!("✓ Valid trace JSON");
    for bundle in &bundles {
        println!("  Trace: {} ({})", bundle.trace.id, bundle.trace.name);
        println!("    Status: {}", bundle.trace.status);
        println!("    Spans: {}", bundle.spans.len());
        println!(
            "    Errors: {}",
            bundle.spans.iter().filter(|s| s.is_error()).count()
        );
    }

    Ok(())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("Vizpath Studio Report Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Input (trace bundle):");
        println!("  trace: object              - id, name, status, duration_ms?, total_tokens?, total_cost?");
        println!("  spans: array               - Flat, unordered span records");
        println!("    id: string               - Unique span id (alias: span_id)");
        println!("    parent_id: string?       - Parent span id; dangling => root");
        println!("    span_type: string        - llm | tool | agent | retrieval | chain | custom");
        println!("    start_time / end_time    - RFC 3339 timestamps");
        println!("    tokens: number?          - Token usage (alias: token_count)");
        println!("    cost: number?            - Recorded cost, trusted over estimates");
        println!("    attributes.model: string? - Model used for rate lookup");
        println!();
        println!("Analysis report:");
        println!("  version: string            - Schema version");
        println!("  summary: object            - Span/root/error counts, depth, tokens");
        println!("  tree: array                - Root nodes with nested children");
        println!("  timeline: object           - Window and per-span left/width percent");
        println!("  graph: object              - Nodes, edges and simulated positions");
        println!("  costs: object              - Per-category cost, top spans, total");
        println!("  heatmap: object            - Category x duration bucket counts");
        println!("  generated_at: string       - ISO 8601 timestamp");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("Vizpath Studio v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Trace analytics for agent execution traces.");
}
