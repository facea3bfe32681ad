//! Integration test: run the binary and read its JSON report.

use std::env;
use std::fs;
use std::process::Command;

fn binary() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_transcript-layout"));
    command
        .arg("--log-stderr")
        .arg("--config")
        .arg(env::temp_dir().join("transcript_layout_cli_no_config.toml"))
        .env_remove("TRANSCRIPT_LAYOUT_TRUST_WEIGHTED")
        .env_remove("TRANSCRIPT_LAYOUT_IDLE_INTERVAL_MS");
    command
}

#[test]
fn binary_prints_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_transcript-layout"))
        .arg("--version")
        .output()
        .expect("Failed to execute binary");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains(env!("CARGO_PKG_VERSION")),
        "Expected version in output, got: {}",
        stdout
    );
}

#[test]
fn reports_layout_for_viewport() {
    let output = binary()
        .args(["--width", "400", "--height", "300", "--state", "loading"])
        .output()
        .expect("Failed to execute binary");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");

    assert_eq!(report["state"], "loading");
    let height = report["metrics"]["contentHeight"]
        .as_f64()
        .expect("content height");
    assert!((height - 299.8).abs() < 1e-3);
}

#[test]
fn paginates_history_file() {
    let path = env::temp_dir().join("transcript_layout_cli_history.jsonl");
    fs::write(
        &path,
        concat!(
            r#"[{"convoId":0,"messageId":1,"timestamp":"2023-08-01T00:00:00Z","type":"input","text":"first"}]"#,
            "\n",
            r#"[{"convoId":0,"messageId":2,"timestamp":"2023-08-01T00:00:01Z","type":"response","text":"second"}]"#,
            "\n",
        ),
    )
    .expect("write fixture");

    let output = binary()
        .arg("--history")
        .arg(&path)
        .args(["--ticks", "2", "--idle-interval-ms", "10"])
        .output()
        .expect("Failed to execute binary");
    fs::remove_file(&path).ok();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    let messages = report["messages"].as_array().expect("messages array");
    assert!(!messages.is_empty());
}

#[test]
fn invalid_history_file_fails() {
    let path = env::temp_dir().join("transcript_layout_cli_bad_history.jsonl");
    fs::write(&path, "{not a page}\n").expect("write fixture");

    let output = binary()
        .arg("--history")
        .arg(&path)
        .output()
        .expect("Failed to execute binary");
    fs::remove_file(&path).ok();

    assert!(!output.status.success());
}
