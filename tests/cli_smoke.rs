use std::process::Command;

use tempfile::tempdir;

#[derive(Debug, serde::Deserialize)]
struct EvalMetrics {
    ranking_accuracy: f64,
    pre_aggregation_accuracy: f64,
    consistency_rate: f64,
    contradictions: usize,
    judgments: usize,
}

#[derive(Debug, serde::Deserialize)]
struct EvalResult {
    case_name: String,
    metrics: EvalMetrics,
    ranking: Vec<String>,
}

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

fn run_cli_eval(case: &str) -> EvalResult {
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("eval.jsonl");

    let status = Command::new(env!("CARGO_BIN_EXE_ordinal"))
        .args(["eval", "--case", case])
        .arg("--out")
        .arg(&out_path)
        .status()
        .unwrap();
    assert!(status.success());

    let raw = std::fs::read_to_string(&out_path).unwrap();
    let first_line = raw.lines().next().unwrap();
    serde_json::from_str(first_line).unwrap()
}

/// Legacy field names: `essay1_id`/`essay2_id`, `essay1`/`essay2`, `reasoning`,
/// `subcriteria` with yes/no flags.
const LEGACY_INPUT: &str = r#"{
  "judgments": [
    {"essay1_id": "a", "essay2_id": "b", "decision": "essay1", "reasoning": "clearer"},
    {"essay1_id": "b", "essay2_id": "a", "decision": "essay2"},
    {"essay1_id": "b", "essay2_id": "c", "decision": "essay1"},
    {"essay1_id": "c", "essay2_id": "b", "decision": "essay1"},
    {"essay1_id": "a", "essay2_id": "c", "decision": "tie"}
  ],
  "ground_truth": {"a": 4.0, "b": 3.0, "c": 3.0},
  "feedback": {
    "b": {"subcriteria": [{"correct": "yes"}, {"correct": "no"}]},
    "c": {"subcriteria": [{"correct": "yes"}, {"correct": "yes"}]}
  }
}"#;

#[test]
fn cli_eval_smoke_and_determinism() {
    let a = run_cli_eval("clean_ordering_10");
    let b = run_cli_eval("clean_ordering_10");

    assert_eq!(a.case_name, "clean_ordering_10");
    assert!(approx_eq(a.metrics.ranking_accuracy, 100.0, 1e-9));
    assert!(approx_eq(a.metrics.pre_aggregation_accuracy, 100.0, 1e-9));
    assert!(approx_eq(a.metrics.consistency_rate, 100.0, 1e-9));
    assert_eq!(a.metrics.contradictions, 0);
    assert_eq!(a.metrics.judgments, 90);

    assert_eq!(a.ranking, b.ranking);
    assert!(approx_eq(
        a.metrics.ranking_accuracy,
        b.metrics.ranking_accuracy,
        1e-12
    ));
}

#[test]
fn cli_eval_writes_curve_csv() {
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("eval.jsonl");
    let csv_path = dir.path().join("curve.csv");

    let status = Command::new(env!("CARGO_BIN_EXE_ordinal"))
        .args(["eval", "--case", "noisy_judge_20"])
        .arg("--out")
        .arg(&out_path)
        .arg("--curve-csv")
        .arg(&csv_path)
        .status()
        .unwrap();
    assert!(status.success());

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "case,delta,post_accuracy,pre_accuracy"
    );
    // Scores 20..1 give deltas 1..19.
    assert_eq!(lines.count(), 19);
}

#[test]
fn cli_analyze_json_smoke() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("input.json");
    let out_path = dir.path().join("report.json");
    std::fs::write(&input_path, LEGACY_INPUT).unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_ordinal"))
        .arg("analyze")
        .arg("--input")
        .arg(&input_path)
        .arg("--out")
        .arg(&out_path)
        .args(["--method", "net-wins", "--seed", "5"])
        .status()
        .unwrap();
    assert!(status.success());

    let raw = std::fs::read_to_string(&out_path).unwrap();
    let report: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(report["input_hash"].as_str().unwrap().len(), 64);
    assert_eq!(report["summary"]["method"], "net-wins");
    assert_eq!(report["summary"]["contradictions_removed"], 2);
    assert_eq!(report["summary"]["consistency"]["bidirectional_pairs"], 2);
    assert_eq!(report["summary"]["consistency"]["inconsistent_pairs"], 1);
    assert_eq!(report["ranking"][0]["item"], "a");
    assert_eq!(report["run_stamp"]["rng_seed"], 5);
}

#[test]
fn cli_analyze_markdown_with_trials() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("input.json");
    let out_path = dir.path().join("report.md");
    std::fs::write(&input_path, LEGACY_INPUT).unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_ordinal"))
        .arg("analyze")
        .arg("--input")
        .arg(&input_path)
        .arg("--out")
        .arg(&out_path)
        .args(["--trials", "4", "--flip-pct", "25", "--seed", "3", "--format", "md"])
        .status()
        .unwrap();
    assert!(status.success());

    let md = std::fs::read_to_string(&out_path).unwrap();
    assert!(md.starts_with("# Evaluation Report"));
    assert!(md.contains("over 4 trials"));
    assert!(md.contains("Deviation from baseline"));
}

#[test]
fn cli_analyze_rejects_invalid_trial_count() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("input.json");
    std::fs::write(&input_path, LEGACY_INPUT).unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_ordinal"))
        .arg("analyze")
        .arg("--input")
        .arg(&input_path)
        .arg("--out")
        .arg(dir.path().join("never.json"))
        .args(["--trials", "0"])
        .status()
        .unwrap();
    assert!(!status.success());
    assert!(!dir.path().join("never.json").exists());
}

#[test]
fn cli_contradictions_lists_reversed_pair() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("input.json");
    let out_path = dir.path().join("contradictions.json");
    std::fs::write(&input_path, LEGACY_INPUT).unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_ordinal"))
        .arg("contradictions")
        .arg("--input")
        .arg(&input_path)
        .arg("--out")
        .arg(&out_path)
        .status()
        .unwrap();
    assert!(status.success());

    let raw = std::fs::read_to_string(&out_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let list = value["contradictions"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["key"]["low"], "b");
    assert_eq!(list[0]["key"]["high"], "c");
    assert_eq!(value["consistency"]["consistency_rate"], 50.0);
}
