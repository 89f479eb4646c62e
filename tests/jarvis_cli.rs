use std::io::Write;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn combined_output(output: &Output) -> String {
    let mut combined = String::new();
    combined.push_str(&String::from_utf8_lossy(&output.stdout));
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined
}

fn jarvis_bin() -> &'static str {
    option_env!("CARGO_BIN_EXE_jarvis").expect("jarvis test binary not built")
}

fn run_with_stdin(dir: &TempDir, extra: &[&str], input: &str) -> Output {
    let prefs = dir.path().join("prefs.json");
    let mut child = Command::new(jarvis_bin())
        .arg("--prefs-file")
        .arg(&prefs)
        .args([
            "--typing-delay-min-ms",
            "0",
            "--typing-ms-per-char",
            "0",
            "--no-logs",
        ])
        .args(extra)
        .env_remove("JARVIS_TTS_CMD")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn jarvis");
    child
        .stdin
        .take()
        .expect("stdin handle")
        .write_all(input.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("wait for jarvis")
}

#[test]
fn jarvis_help_mentions_ipc_flag() {
    let output = Command::new(jarvis_bin())
        .arg("--help")
        .output()
        .expect("run jarvis --help");
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(combined.contains("Jarvis"));
    assert!(combined.contains("--json-ipc"));
}

#[test]
fn jarvis_rejects_invalid_history_max() {
    let output = Command::new(jarvis_bin())
        .args(["--history-max", "0", "--no-logs"])
        .stdin(Stdio::null())
        .output()
        .expect("run jarvis");
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("--history-max"));
}

#[test]
fn repl_answers_percentage_question() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = run_with_stdin(&dir, &[], "сколько 25% от 100\n/exit\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Джарвис: 25, я гений, да?"), "{stdout}");
}

#[test]
fn repl_history_survives_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let first = run_with_stdin(&dir, &[], "сколько 50% от 10\n");
    assert!(first.status.success());

    let second = run_with_stdin(&dir, &[], "/history\n/exit\n");
    let stdout = String::from_utf8_lossy(&second.stdout);
    assert!(stdout.contains("Вы: сколько 50% от 10"), "{stdout}");
    assert!(stdout.contains("Джарвис: 5, я гений, да?"), "{stdout}");
}

#[test]
fn json_ipc_emits_capabilities_and_reply() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = run_with_stdin(
        &dir,
        &["--json-ipc"],
        "{\"cmd\":\"send\",\"text\":\"сколько 25% от 100\"}\n{\"cmd\":\"exit\"}\n",
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let events: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("json event line"))
        .collect();
    assert_eq!(events[0]["event"], "capabilities");
    assert!(events
        .iter()
        .any(|event| event["event"] == "reply" && event["text"] == "25, я гений, да?"));
}
