use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use vizpath_studio::commands::{
    execute_analyze, execute_diff, execute_export, AnalyzeArgs, DiffArgs, ExportArgs,
};
use vizpath_studio::output::ExportFormat;

fn write_trace(dir: &Path, file: &str, trace_id: &str, tool_ms: f64) -> PathBuf {
    let path = dir.join(file);
    let raw = json!({
        "trace": {"id": trace_id, "name": "support-bot", "status": "success"},
        "spans": [
            {
                "id": "root", "trace_id": trace_id, "name": "answer", "span_type": "agent",
                "start_time": "2024-09-01T10:00:00Z", "end_time": "2024-09-01T10:00:02Z"
            },
            {
                "id": "llm", "trace_id": trace_id, "parent_id": "root", "name": "draft",
                "span_type": "llm", "start_time": "2024-09-01T10:00:00Z", "duration_ms": 900.0,
                "tokens": 1200, "attributes": {"model": "claude-3-haiku"},
                "input": {"prompt": "hello"}, "output": {"text": "hi"}
            },
            {
                "id": "kb", "trace_id": trace_id, "parent_id": "root", "name": "lookup",
                "span_type": "tool", "start_time": "2024-09-01T10:00:01Z", "duration_ms": tool_ms
            }
        ]
    });
    fs::write(&path, serde_json::to_string_pretty(&raw).unwrap()).unwrap();
    path
}

#[test]
fn test_analyze_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_trace(dir.path(), "trace.json", "t1", 40.0);
    let output = dir.path().join("artifacts/report.json");

    let report = execute_analyze(AnalyzeArgs {
        input,
        output: output.clone(),
        config: None,
        ticks: Some(20),
        print_summary: false,
    })
    .unwrap();

    assert_eq!(report.summary.span_count, 3);
    assert_eq!(report.graph.ticks, 20);

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written["summary"]["trace_id"], "t1");
    assert_eq!(written["tree"][0]["children"].as_array().unwrap().len(), 2);
}

#[test]
fn test_analyze_uses_config_rates() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_trace(dir.path(), "trace.json", "t1", 40.0);
    let config = dir.path().join("rates.toml");
    fs::write(
        &config,
        "[pricing.models]\n\"claude-3-haiku\" = 1.0\n\n[simulation]\nmax_ticks = 5\n",
    )
    .unwrap();

    let report = execute_analyze(AnalyzeArgs {
        input,
        output: dir.path().join("report.json"),
        config: Some(config),
        ticks: None,
        print_summary: true,
    })
    .unwrap();

    assert!((report.costs.total_cost - 1.2).abs() < 1e-12);
    assert_eq!(report.graph.ticks, 5);
}

#[test]
fn test_analyze_rejects_bad_config() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_trace(dir.path(), "trace.json", "t1", 40.0);
    let config = dir.path().join("rates.toml");
    fs::write(&config, "[pricing]\ndefault_rate = -1.0\n").unwrap();

    let result = execute_analyze(AnalyzeArgs {
        input,
        output: dir.path().join("report.json"),
        config: Some(config),
        ticks: None,
        print_summary: false,
    });
    assert!(result.is_err());
}

#[test]
fn test_diff_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    let baseline = write_trace(dir.path(), "a.json", "a", 40.0);
    let target = write_trace(dir.path(), "b.json", "b", 80.0);
    let output = dir.path().join("diff.json");

    let report = execute_diff(DiffArgs {
        baseline,
        target,
        output: Some(output.clone()),
        config: None,
        summary: true,
    })
    .unwrap();

    assert_eq!(report.names[0].name, "lookup");
    assert_eq!(report.names[0].percent_change, 100.0);
    assert!(output.exists());
}

#[test]
fn test_export_csv_and_strip_io() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_trace(dir.path(), "a.json", "a", 40.0);
    let b = write_trace(dir.path(), "b.json", "b", 80.0);

    let csv = dir.path().join("spans.csv");
    let count = execute_export(ExportArgs {
        inputs: vec![a.clone(), b.clone()],
        format: ExportFormat::Csv,
        output: csv.clone(),
        strip_io: false,
    })
    .unwrap();
    assert_eq!(count, 2);
    assert_eq!(fs::read_to_string(&csv).unwrap().lines().count(), 7);

    let jsonl = dir.path().join("traces.jsonl");
    execute_export(ExportArgs {
        inputs: vec![a, b],
        format: ExportFormat::Jsonl,
        output: jsonl.clone(),
        strip_io: true,
    })
    .unwrap();
    let contents = fs::read_to_string(&jsonl).unwrap();
    assert_eq!(contents.lines().count(), 2);
    assert!(!contents.contains("prompt"));
}

#[test]
fn test_export_requires_input() {
    let dir = tempfile::tempdir().unwrap();
    let result = execute_export(ExportArgs {
        inputs: Vec::new(),
        format: ExportFormat::Json,
        output: dir.path().join("out.json"),
        strip_io: false,
    });
    assert!(result.is_err());
}
