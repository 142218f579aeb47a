use std::fs;
use std::path::Path;

use assert_cmd::Command;
use tempfile::TempDir;

/// pair(x) = (x + 1, x * x); main(x) = pair(x)[0] + pair(x)[0]
const PROGRAM: &str = r#"{
  "root": "main",
  "graphs": [
    { "name": "main",
      "params": [{ "name": "x", "type": "i64" }],
      "nodes": [
        { "name": "r1", "apply": ["pair", "x"], "type": { "tuple": ["i64", "i64"] } },
        { "name": "r2", "apply": ["pair", "x"], "type": { "tuple": ["i64", "i64"] } },
        { "name": "zero", "const": 0 },
        { "name": "a", "apply": ["tuple_getitem", "r1", "zero"], "type": "i64" },
        { "name": "b", "apply": ["tuple_getitem", "r2", "zero"], "type": "i64" },
        { "name": "s", "apply": ["add", "a", "b"], "type": "i64" }
      ],
      "output": "s" },
    { "name": "pair",
      "params": [{ "name": "x", "type": "i64" }],
      "nodes": [
        { "name": "one", "const": 1 },
        { "name": "inc", "apply": ["add", "x", "one"], "type": "i64" },
        { "name": "sq", "apply": ["mul", "x", "x"], "type": "i64" },
        { "name": "t", "apply": ["make_tuple", "inc", "sq"], "type": { "tuple": ["i64", "i64"] } }
      ],
      "output": "t" }
  ]
}"#;

fn write(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.to_string_lossy().to_string()
}

fn graphopt() -> Command {
    Command::cargo_bin("graphopt").unwrap()
}

#[test]
fn opt_prints_optimized_graphs_and_round_table() {
    let dir = tempfile::tempdir().unwrap();
    let program = write(&dir, "prog.json", PROGRAM);

    let out = graphopt().args(["opt", program.as_str()]).output().unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);

    assert!(stdout.contains("graph main("));
    assert!(stdout.contains("graph pair("));
    assert!(stdout.contains("DEAD"), "unused element replaced: {}", stdout);
    assert_eq!(stdout.matches("@pair(").count(), 1, "duplicate calls merged: {}", stdout);
    assert!(stdout.contains("round"));
    assert!(stdout.contains("converged after"));
}

#[test]
fn passes_flag_limits_the_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let program = write(&dir, "prog.json", PROGRAM);

    let out = graphopt().args(["opt", program.as_str(), "--passes", "cse"]).output().unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(!stdout.contains("DEAD"));
    assert!(!stdout.contains("dde"));
}

#[test]
fn output_flag_writes_the_dump_to_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let program = write(&dir, "prog.json", PROGRAM);
    let target = dir.path().join("out.txt");

    graphopt()
        .args(["opt", program.as_str(), "--dump", "after", "--output"])
        .arg(&target)
        .assert()
        .success();

    let written = fs::read_to_string(&target).unwrap();
    assert!(written.starts_with("graph main("));
    assert!(Path::new(&target).exists());
}

#[test]
fn config_file_is_honoured() {
    let dir = tempfile::tempdir().unwrap();
    let program = write(&dir, "prog.json", PROGRAM);
    let config = write(&dir, "cfg.json", r#"{ "passes": ["dde"], "dde": { "report_changes": true } }"#);

    let out = graphopt()
        .args(["opt", program.as_str(), "--config", config.as_str()])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("changed"));
    assert!(!stdout.contains("cse"));
}

#[test]
fn check_lists_graphs_without_optimizing() {
    let dir = tempfile::tempdir().unwrap();
    let program = write(&dir, "prog.json", PROGRAM);

    let out = graphopt().args(["check", program.as_str()]).output().unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(stdout.matches("@pair(").count(), 2);
    assert!(stdout.contains("ok: root is main"));
}

#[test]
fn malformed_programs_fail_with_invalid_input() {
    let dir = tempfile::tempdir().unwrap();
    let cases = [
        ("unknown.json", r#"{"graphs": [{"name": "m", "nodes": [{"name": "a", "apply": ["nope"]}], "output": "a"}]}"#, "unknown name 'nope'"),
        ("dup.json", r#"{"graphs": [{"name": "m", "params": [{"name": "x"}, {"name": "x"}], "output": "x"}]}"#, "duplicate name 'x'"),
        ("dangling.json", r#"{"graphs": [{"name": "m", "output": "y"}]}"#, "output 'y'"),
        ("arity.json", r#"{"graphs": [{"name": "m", "params": [{"name": "x"}], "nodes": [{"name": "n", "apply": ["neg", "x", "x"]}], "output": "n"}]}"#, "neg takes 1 argument(s), got 2"),
        ("untyped_callee.json", r#"{"graphs": [{"name": "m", "params": [{"name": "f"}], "nodes": [{"name": "n", "apply": ["f"]}], "output": "n"}]}"#, "'f' is applied but has no function type"),
        ("root.json", r#"{"root": "other", "graphs": [{"name": "m", "params": [{"name": "x"}], "output": "x"}]}"#, "root graph 'other'"),
    ];
    for (name, body, expected) in cases {
        let path = write(&dir, name, body);
        let out = graphopt().args(["check", path.as_str()]).output().unwrap();
        assert!(!out.status.success(), "{} should fail", name);
        let stderr = String::from_utf8_lossy(&out.stderr);
        assert!(stderr.contains("invalid-input"), "{}: {}", name, stderr);
        assert!(stderr.contains(expected), "{}: {}", name, stderr);
    }
}

#[test]
fn missing_file_fails() {
    graphopt().args(["check", "/definitely/not/here.json"]).assert().failure();
}
