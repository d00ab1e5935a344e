//! End-to-end tests for `install`, `uninstall` and `status`.
//!
//! Every test points `HOME` and the working directory at fresh temporary
//! directories, so the real user configuration is never touched.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

struct Sandbox {
    home: TempDir,
    repo: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Sandbox {
            home: TempDir::new().unwrap(),
            repo: TempDir::new().unwrap(),
        }
    }

    fn chime(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("chime");
        cmd.env("HOME", self.home.path())
            .env("CHIME_CONFIG", self.home.path().join("no-config.toml"))
            .env_remove("CHIME_LOG")
            .env_remove("RUST_LOG")
            .current_dir(self.repo.path());
        cmd
    }

    fn home(&self) -> &Path {
        self.home.path()
    }

    fn repo(&self) -> &Path {
        self.repo.path()
    }
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn status_on_clean_machine() {
    let sb = Sandbox::new();
    sb.chime()
        .arg("status")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("claude")
                .and(predicate::str::contains("gemini"))
                .and(predicate::str::contains("copilot"))
                .and(predicate::str::contains("yes").not()),
        );
}

#[test]
fn status_json_shape() {
    let sb = Sandbox::new();
    fs::create_dir_all(sb.home().join(".gemini")).unwrap();

    let output = sb.chime().args(["status", "--format", "json"]).output().unwrap();
    assert!(output.status.success());
    let value = stdout_json(&output);
    let rows = value.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1]["target"], "gemini");
    assert_eq!(rows[1]["detected"], true);
    assert_eq!(rows[1]["installed"], false);
    assert!(rows[2]["config_path"]
        .as_str()
        .unwrap()
        .ends_with(".github/hooks/chime.json"));
}

#[test]
fn install_with_nothing_detected() {
    let sb = Sandbox::new();
    sb.chime()
        .arg("install")
        .assert()
        .success()
        .stdout(predicate::str::contains("No supported agent tools detected"));
    assert!(!sb.home().join(".claude").exists());
}

#[test]
fn install_named_target_is_idempotent() {
    let sb = Sandbox::new();
    let path = sb.home().join(".claude/settings.json");

    sb.chime()
        .args(["install", "claude"])
        .assert()
        .success()
        .stdout(predicate::str::contains("installed"));
    let first = fs::read_to_string(&path).unwrap();
    assert!(first.contains(r#""command": "chime \"Task complete\" -t \"Claude Code\"""#));

    sb.chime()
        .args(["install", "claude"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already installed"));
    assert_eq!(fs::read_to_string(&path).unwrap(), first);
}

#[test]
fn install_unknown_target_fails_with_args_error() {
    let sb = Sandbox::new();
    sb.chime()
        .args(["install", "vim"])
        .assert()
        .code(10)
        .stderr(predicate::str::contains("unknown target 'vim'"));
}

#[test]
fn json_errors_carry_code_name() {
    let sb = Sandbox::new();
    let output = sb
        .chime()
        .args(["install", "vim", "--format", "json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(10));
    assert!(output.stdout.is_empty());
    let err: Value = serde_json::from_slice(&output.stderr).expect("stderr should be JSON");
    assert_eq!(err["status"], "error");
    assert_eq!(err["error"]["code"], "ERR_ARGS");
    assert_eq!(err["error"]["exit_code"], 10);
    assert!(err["error"]["message"].as_str().unwrap().contains("vim"));
}

#[test]
fn log_format_flag_emits_json_lines() {
    let sb = Sandbox::new();
    let output = sb
        .chime()
        .args(["status", "-vv", "--log-format", "jsonl"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    let first = stderr.lines().next().expect("debug events on stderr");
    let event: Value = serde_json::from_str(first).expect("a JSON log line");
    assert!(event.get("level").is_some());
}

#[test]
fn install_all_then_uninstall_all() {
    let sb = Sandbox::new();
    fs::create_dir_all(sb.home().join(".claude")).unwrap();
    fs::write(
        sb.home().join(".claude/settings.json"),
        "{\"model\": \"opus\"}\n",
    )
    .unwrap();
    fs::create_dir_all(sb.repo().join(".github")).unwrap();

    let output = sb.chime().args(["install", "--format", "json"]).output().unwrap();
    assert!(output.status.success());
    let reports = stdout_json(&output);
    let ids: Vec<&str> = reports
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["target"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["claude", "copilot"]);
    assert!(reports
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r["result"] == "installed"));

    let copilot = sb.repo().join(".github/hooks/chime.json");
    let doc: Value = serde_json::from_str(&fs::read_to_string(&copilot).unwrap()).unwrap();
    assert_eq!(doc["version"], 1);
    assert_eq!(
        doc["hooks"]["sessionEnd"][0]["bash"],
        "chime 'Session complete' -t 'Copilot'"
    );
    assert!(sb.home().join(".claude/settings.json.bak").exists());

    sb.chime()
        .arg("uninstall")
        .assert()
        .success()
        .stdout(predicate::str::contains("removed (file deleted)"));
    assert!(!copilot.exists());
    let claude: Value = serde_json::from_str(
        &fs::read_to_string(sb.home().join(".claude/settings.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(claude, serde_json::json!({"model": "opus", "hooks": {}}));

    sb.chime()
        .arg("uninstall")
        .assert()
        .success()
        .stdout(predicate::str::contains("No chime hooks installed"));
}

#[test]
fn copilot_hook_lands_at_repository_root_from_subdirectory() {
    let sb = Sandbox::new();
    fs::create_dir_all(sb.repo().join(".git")).unwrap();
    fs::create_dir_all(sb.repo().join(".github")).unwrap();
    let subdir = sb.repo().join("crates/inner");
    fs::create_dir_all(&subdir).unwrap();

    sb.chime()
        .current_dir(&subdir)
        .args(["install", "copilot"])
        .assert()
        .success();

    assert!(sb.repo().join(".github/hooks/chime.json").exists());
    assert!(!subdir.join(".github").exists());
}

#[test]
fn partial_failure_sets_exit_code() {
    let sb = Sandbox::new();
    fs::create_dir_all(sb.home().join(".gemini")).unwrap();
    // A directory in place of the settings file cannot be replaced
    fs::create_dir_all(sb.home().join(".claude/settings.json")).unwrap();

    sb.chime()
        .arg("install")
        .assert()
        .code(3)
        .stdout(predicate::str::contains("gemini").and(predicate::str::contains("claude")));
    assert!(sb.home().join(".gemini/settings.json").exists());
}

#[test]
fn notify_with_preset_reports_resolved_notification() {
    let sb = Sandbox::new();
    let output = sb
        .chime()
        .args(["--format", "json", "--preset", "codex", "Build finished"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value = stdout_json(&output);
    assert_eq!(value["agent"], "codex");
    assert_eq!(value["detected"], false);
    assert_eq!(value["title"], "Codex");
    assert_eq!(value["body"], "Build finished");
    assert_eq!(value["sound"], "Hero");
}

#[test]
fn notify_applies_config_and_cli_overrides() {
    let sb = Sandbox::new();
    let config = sb.home().join("chime.toml");
    fs::write(&config, "[presets.gemini]\ntitle = \"Gem\"\nsound = \"Purr\"\n").unwrap();

    let output = sb
        .chime()
        .env("CHIME_CONFIG", &config)
        .args(["--format", "json", "-p", "gemini", "-s", "Tink"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value = stdout_json(&output);
    assert_eq!(value["title"], "Gem");
    assert_eq!(value["sound"], "Tink");
    assert_eq!(value["body"], "Done");
}

#[test]
fn notify_with_malformed_config_still_succeeds() {
    let sb = Sandbox::new();
    let config = sb.home().join("chime.toml");
    fs::write(&config, "max_depth = [").unwrap();

    let output = sb
        .chime()
        .env("CHIME_CONFIG", &config)
        .args(["--format", "json", "--preset", "aider", "-t", "Custom"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["title"], "Custom");
}

#[test]
fn debug_trace_goes_to_stderr_only() {
    let sb = Sandbox::new();
    sb.chime()
        .args(["--debug", "hello"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("pid=").or(predicate::str::contains("no agent matched")));
}
