use assert_cmd::Command;
use indoc::indoc;
use std::fs;
use tempfile::TempDir;

fn greenmap() -> Command {
    let mut cmd = Command::cargo_bin("greenmap").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_analyze_stdin_as_json() {
    let output = greenmap()
        .args(["analyze", "--format", "json"])
        .write_stdin("total = sum([i*i for i in range(1000000)])\n")
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["source"], "<stdin>");
    assert_eq!(value["matches"][0]["rule_id"], "gen_exp");
    assert_eq!(
        value["rewrite"]["rewritten_code"],
        "total = sum(i*i for i in range(1000000))\n"
    );
}

#[test]
fn test_analyze_multiple_files_keeps_order() {
    let temp = TempDir::new().unwrap();
    let first = temp.path().join("first.py");
    let second = temp.path().join("second.py");
    fs::write(&first, "x = 1\n").unwrap();
    fs::write(&second, "while 1:\n    break\n").unwrap();

    let output = greenmap()
        .arg("analyze")
        .arg(&first)
        .arg(&second)
        .args(["-f", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let reports = value.as_array().unwrap();
    assert_eq!(reports.len(), 2);
    assert!(reports[0]["source"].as_str().unwrap().ends_with("first.py"));
    assert_eq!(reports[1]["matches"][0]["rule_id"], "while_one");
}

#[test]
fn test_analyze_markdown_to_file() {
    let temp = TempDir::new().unwrap();
    let report = temp.path().join("report.md");

    greenmap()
        .args(["analyze", "--format", "markdown", "--output"])
        .arg(&report)
        .write_stdin("for i in range(len(xs)):\n    print(xs[i])\n")
        .assert()
        .success();

    let contents = fs::read_to_string(&report).unwrap();
    assert!(contents.contains("# Greenmap Report"));
    assert!(contents.contains("Use direct iteration instead of range(len(x))"));
}

#[test]
fn test_analyze_missing_file_fails() {
    greenmap()
        .args(["analyze", "/definitely/not/here.py"])
        .assert()
        .failure();
}

#[test]
fn test_explicit_config_weights_apply() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("green.toml");
    fs::write(
        &config,
        indoc! {r#"
            [cost]
            call_weight = 500

            [[rules]]
            id = "deep_copy"
            pattern = 'copy\.deepcopy\('
            suggestion = "Avoid deepcopy in hot paths"
        "#},
    )
    .unwrap();

    let output = greenmap()
        .arg("--config")
        .arg(&config)
        .args(["analyze", "-f", "json"])
        .write_stdin("y = copy.deepcopy(x)\n")
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["report"]["operations"], 500);
    assert_eq!(value["matches"][0]["rule_id"], "deep_copy");
}

#[test]
fn test_rules_lists_catalogue() {
    let output = greenmap().arg("rules").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    for id in ["gen_exp", "busy_wait", "gc_man"] {
        assert!(stdout.contains(id), "missing {id}");
    }
}

#[test]
fn test_measure_refuses_system_imports() {
    let output = greenmap()
        .args(["measure", "--format", "json"])
        .write_stdin("import sys\nprint(sys.argv)\n")
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["status"], "failed");
    assert!(value["error"].as_str().unwrap().starts_with("Refused"));
}

#[test]
fn test_measure_timeout() {
    if which::which("python3").is_err() {
        return;
    }
    let output = greenmap()
        .args(["measure", "--format", "json", "--timeout", "0.5"])
        .write_stdin("while True: pass\n")
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["status"], "timeout");
    assert_eq!(value["error"], "Timeout");
}

#[test]
fn test_bench_writes_csv() {
    let temp = TempDir::new().unwrap();
    let csv_path = temp.path().join("metrics.csv");

    greenmap()
        .args(["bench", "--no-progress", "--timeout", "5", "--output"])
        .arg(&csv_path)
        .assert()
        .success();

    let contents = fs::read_to_string(&csv_path).unwrap();
    let mut lines = contents.lines();
    assert_eq!(
        lines.next(),
        Some("Example_ID,Duration_sec,Emissions_kg,Green_Code_Fix")
    );
    assert_eq!(lines.count(), 20);
}
