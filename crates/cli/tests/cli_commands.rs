//! End-to-end tests of the `agentsync` binary against a temporary project.

use std::process::{Command, Output};

use agentsync_test_utils::TestFixture;
use anyhow::{Context, Result};
use serde_json::Value;

const AGENT: &str = r#"{
    "name": "support",
    "language": "en",
    "voice_speed": 1.0,
    "llm": {
        "model": "gpt-4o",
        "prompt_config": {
            "fragments": ["persona/base", "context/caller"],
            "variables": { "company": "Acme", "customer_name": "OVERRIDE" }
        }
    }
}"#;

const PROMPT: &str =
    "You are the Acme agent.\n\nThe caller is {{customer_name}}. It is {{system__time}}.";

fn project() -> TestFixture {
    let fixture = TestFixture::new().expect("fixture");
    fixture
        .write_fragment("persona/base", "You are the {{company}} agent.")
        .unwrap();
    fixture
        .write_fragment(
            "context/caller",
            "The caller is {{customer_name}}. It is {{system__time}}.",
        )
        .unwrap();
    fixture.write_agent("support", AGENT).unwrap();
    fixture
        .write_file(
            "remote/agent.json",
            r#"{"agent_id": "agent_1", "name": "support", "language": "en", "voice_speed": 1.0}"#,
        )
        .unwrap();
    fixture
        .write_file(
            "remote/llm.json",
            &serde_json::json!({"model": "gpt-4o", "prompt": PROMPT}).to_string(),
        )
        .unwrap();
    fixture
}

fn agentsync(fixture: &TestFixture, args: &[&str]) -> Result<Output> {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_agentsync"));
    for key in [
        "AGENTSYNC_ENV",
        "AGENTSYNC_AGENTS_DIR",
        "AGENTSYNC_FRAGMENTS_DIR",
        "AGENTSYNC_STATE_DIR",
        "AGENTSYNC_SYSTEM_VARIABLES",
        "GITHUB_SHA",
        "GITHUB_REF_NAME",
        "GITHUB_REPOSITORY",
        "GITHUB_WORKFLOW",
        "GITHUB_ACTOR",
        "RUST_LOG",
    ] {
        cmd.env_remove(key);
    }
    cmd.env("AGENTSYNC_PROJECT_DIR", fixture.project_path())
        .current_dir(fixture.project_path())
        .args(args)
        .output()
        .context("Failed to execute agentsync")
}

fn remote_args(fixture: &TestFixture) -> [String; 4] {
    let root = fixture.project_path();
    [
        "--remote-agent".into(),
        root.join("remote/agent.json").display().to_string(),
        "--remote-llm".into(),
        root.join("remote/llm.json").display().to_string(),
    ]
}

fn with_remote<'a>(base: &[&'a str], remote: &'a [String; 4]) -> Vec<&'a str> {
    base.iter()
        .copied()
        .chain(remote.iter().map(String::as_str))
        .collect()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn compose_prints_prompt_with_static_values_only() -> Result<()> {
    let fixture = project();
    let output = agentsync(&fixture, &["compose", "support", "--check"])?;
    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout(&output), format!("{PROMPT}\n"));
    Ok(())
}

#[test]
fn validate_reports_every_problem_and_fails() -> Result<()> {
    let fixture = project();
    fixture
        .write_fragment("context/caller", "Hi {{custmer_name}}, order {{order}}.")
        .unwrap();

    let output = agentsync(&fixture, &["validate"])?;
    assert!(!output.status.success());
    let text = stdout(&output);
    assert!(text.contains("support: 3 problem(s)"), "{text}");
    assert!(text.contains("custmer_name"), "{text}");
    assert!(text.contains("order"), "{text}");
    assert!(text.contains("customer_name"), "{text}");
    Ok(())
}

#[test]
fn detect_exit_codes_follow_sync_state() -> Result<()> {
    let fixture = project();
    let remote = remote_args(&fixture);

    let in_sync = agentsync(&fixture, &with_remote(&["detect", "support"], &remote))?;
    assert_eq!(in_sync.status.code(), Some(0), "{in_sync:?}");
    assert!(stdout(&in_sync).contains("is in sync"));

    fixture.write_file(
        "remote/agent.json",
        r#"{"name": "support", "language": "en", "voice_speed": 1.2}"#,
    )?;
    let drifted = agentsync(&fixture, &with_remote(&["detect", "support", "--json"], &remote))?;
    assert_eq!(drifted.status.code(), Some(2), "{drifted:?}");

    let report: Value = serde_json::from_slice(&drifted.stdout)?;
    assert_eq!(report["environment"], "production");
    assert_eq!(report["detection"]["status"], "out_of_sync");
    let conflicts = report["detection"]["field_conflicts"].as_array().unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0]["path"], "agent.voice_speed");
    assert_eq!(conflicts[0]["remote"], 1.2);
    Ok(())
}

#[test]
fn record_then_status_tracks_local_edits() -> Result<()> {
    let fixture = project();
    let remote = remote_args(&fixture);

    let recorded = agentsync(
        &fixture,
        &with_remote(
            &["record", "support", "--agent-id", "agent_1", "--commit", "abc123"],
            &remote,
        ),
    )?;
    assert!(recorded.status.success(), "{recorded:?}");

    let record: Value = serde_json::from_str(&std::fs::read_to_string(
        fixture.state_dir.join("production/support.json"),
    )?)?;
    assert_eq!(record["agent_id"], "agent_1");
    assert_eq!(record["gitops"]["commit"], "abc123");
    assert!(record["fingerprint"].as_str().unwrap().starts_with("sha256:"));

    let clean = agentsync(&fixture, &["status"])?;
    assert!(clean.status.success(), "{clean:?}");
    assert!(stdout(&clean).contains("up to date"));

    fixture.write_fragment("persona/base", "You are the {{company}} concierge.")?;
    let dirty = agentsync(&fixture, &["status", "--json"])?;
    let status: Value = serde_json::from_slice(&dirty.stdout)?;
    assert_eq!(status["agents"][0]["agent"], "support");
    assert_eq!(status["agents"][0]["state"], "local_changes_not_pushed");

    // remote unchanged since the record: detection still reports in sync
    let detect = agentsync(&fixture, &with_remote(&["detect", "support"], &remote))?;
    assert_eq!(detect.status.code(), Some(0));
    Ok(())
}

#[test]
fn status_continues_past_broken_agents() -> Result<()> {
    let fixture = project();
    fixture.write_agent("broken", r#"{"name": "broken", "llm": {}}"#)?;
    fixture.write_file(
        ".agentsync/production/broken.json",
        r#"{"agent_id":"b","last_synced_at":"2026-01-01T00:00:00Z","fingerprint":null}"#,
    )?;

    let output = agentsync(&fixture, &["status"])?;
    assert!(!output.status.success());
    let text = stdout(&output);
    assert!(text.contains("broken"), "{text}");
    assert!(text.contains("support"), "{text}");
    assert!(text.contains("never synced"), "{text}");
    Ok(())
}

#[test]
fn resolve_use_remote_rewrites_local_file() -> Result<()> {
    let fixture = project();
    let remote = remote_args(&fixture);
    fixture.write_file(
        "remote/agent.json",
        r#"{"name": "support", "language": "de", "voice_speed": 0.9}"#,
    )?;

    let output = agentsync(
        &fixture,
        &with_remote(&["resolve", "support", "--strategy", "use-remote"], &remote),
    )?;
    assert!(output.status.success(), "{output:?}");

    let written: Value =
        serde_json::from_str(&std::fs::read_to_string(fixture.agent_path("support"))?)?;
    assert_eq!(written["language"], "de");
    assert_eq!(written["voice_speed"], 0.9);
    assert!(written["llm"].get("prompt_config").is_some());
    assert!(written["llm"].get("prompt").is_none());

    let detect = agentsync(&fixture, &with_remote(&["detect", "support"], &remote))?;
    assert_eq!(detect.status.code(), Some(0), "{detect:?}");
    Ok(())
}

#[test]
fn resolve_without_strategy_needs_a_terminal() -> Result<()> {
    let fixture = project();
    let remote = remote_args(&fixture);
    fixture.write_file(
        "remote/agent.json",
        r#"{"name": "support", "language": "de"}"#,
    )?;

    let output = agentsync(&fixture, &with_remote(&["resolve", "support"], &remote))?;
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--strategy is required"), "{stderr}");
    Ok(())
}
