//! Runs the `seedgraph` binary against the offline backends.

use std::path::Path;
use std::process::{Command, Output};

fn seedgraph(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_seedgraph"))
        .args(args)
        .current_dir(cwd)
        .env_remove("SEEDGRAPH_LLM")
        .env_remove("SEEDGRAPH_LLM_TIMEOUT_SECS")
        .env_remove("RUST_LOG")
        .output()
        .expect("run seedgraph")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "seedgraph failed:\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn generate_writes_domain_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("seeds.json"),
        r#"{"travel": ["What are popular attractions to visit in Seattle?",
                       "Which popular attractions in Seattle are free?"]}"#,
    )
    .unwrap();

    let output = seedgraph(
        &["generate", "-s", "seeds.json", "-n", "2", "--seed", "5", "-o", "out"],
        dir.path(),
    );
    assert_success(&output);

    let csv = std::fs::read_to_string(dir.path().join("out/travel_dataset.csv")).unwrap();
    assert!(csv.starts_with("question,answer,elements\n"));
    assert_eq!(csv.lines().count(), 3);
    assert!(dir.path().join("out/travel_graph.dot").exists());
}

#[test]
fn expand_writes_query_results() {
    let dir = tempfile::tempdir().unwrap();
    let output = seedgraph(
        &[
            "expand",
            "-q",
            "What restaurants serve vegan food in Austin?",
            "-n",
            "2",
            "--answers",
            "llm",
            "--format",
            "both",
            "-o",
            "out",
        ],
        dir.path(),
    );
    assert_success(&output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Original Query (q1)"));
    assert!(stdout.contains("LLM Answers:"));
    let csv = std::fs::read_to_string(dir.path().join("out/query_results.csv")).unwrap();
    assert!(csv.starts_with("query_id,original_query,generated_question,llm_answer\n"));
}

#[test]
fn graph_json_and_log_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = seedgraph(
        &[
            "graph",
            "-q",
            "Compare Google Cloud pricing with Amazon Web Services pricing.",
            "--format",
            "json",
            "--log-dir",
            "logs",
        ],
        dir.path(),
    );
    assert_success(&output);

    let snapshot: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(snapshot["stats"]["nodes"].as_u64().unwrap() > 0);

    let logs: Vec<_> = std::fs::read_dir(dir.path().join("logs"))
        .unwrap()
        .filter_map(Result::ok)
        .collect();
    assert_eq!(logs.len(), 1);
    let name = logs[0].file_name().to_string_lossy().to_string();
    assert!(name.starts_with("seedgraph_") && name.ends_with(".log"));
}

#[test]
fn unknown_backend_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let output = seedgraph(&["generate", "-q", "x", "--llm", "gpt-9000"], dir.path());
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown LLM backend"));
}
