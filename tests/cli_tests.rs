//! CLI smoke tests: blueprint validation and journal inspection.

use assert_cmd::Command;
use cadence::blueprint::Blueprint;
use cadence::common::{DelegationResult, RunStatus};
use cadence::config::EngineConfig;
use cadence::controller::Engine;
use cadence::dispatch::{from_fn, RoleInput, RoleRegistry};
use predicates::prelude::*;
use serde_json::json;

fn cadence_cmd() -> Command {
    Command::cargo_bin("cadence").unwrap()
}

#[test]
fn check_accepts_valid_blueprint() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blueprint.json");
    Blueprint::standard("cli test goal").save(&path).unwrap();

    cadence_cmd()
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("OK"))
        .stdout(predicate::str::contains("5 phases"));
}

#[test]
fn check_rejects_incomplete_blueprint() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blueprint.json");
    let mut blueprint = Blueprint::standard("cli test goal");
    blueprint.phases.remove(0);
    blueprint.save(&path).unwrap();

    cadence_cmd()
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid"));
}

#[test]
fn status_fails_without_journal() {
    let dir = tempfile::tempdir().unwrap();

    cadence_cmd()
        .arg("--journal")
        .arg(dir.path().join("missing.jsonl"))
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

/// Run a full engine against a journal, then inspect it with the CLI.
#[tokio::test]
async fn status_and_history_read_a_real_journal() {
    let dir = tempfile::tempdir().unwrap();
    let journal = dir.path().join("cadence.jsonl");

    let mut registry = RoleRegistry::new();
    for role in ["analyst", "planner", "architect", "implementer", "integrator"] {
        registry.register(
            role,
            from_fn(|input: RoleInput| async move {
                let mut result = DelegationResult::success(input.spec.id);
                for key in &input.spec.deliverables {
                    result = result.with_deliverable(key.clone(), json!("done"));
                }
                Ok(result)
            }),
        );
    }

    let config = EngineConfig::default().with_journal(journal.clone());
    let engine = Engine::new(config, registry).unwrap();
    let run_id = engine
        .start_run("cli inspection goal", Blueprint::standard("cli inspection goal"))
        .unwrap();
    let view = engine.join_run(run_id).await.unwrap();
    assert_eq!(view.status, RunStatus::Completed);
    drop(engine);

    cadence_cmd()
        .arg("--journal")
        .arg(&journal)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("completed"))
        .stdout(predicate::str::contains("cli inspection goal"));

    cadence_cmd()
        .arg("--journal")
        .arg(&journal)
        .args(["history", "spec/requirements"])
        .assert()
        .success()
        .stdout(predicate::str::contains("v1"))
        .stdout(predicate::str::contains("analyst"));

    cadence_cmd()
        .arg("--journal")
        .arg(&journal)
        .args(["gates", "--run", &run_id.to_string()])
        .assert()
        .success()
        .stdout(predicate::str::contains("specification-complete"))
        .stdout(predicate::str::contains("passed"));
}
