#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn artiflow(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("artiflow").unwrap();
    cmd.current_dir(dir.path())
        .env("ARTIFLOW_ROOT", dir.path())
        .env("XDG_DATA_HOME", dir.path().join("data"))
        .env_remove("RUST_LOG");
    cmd
}

fn json_output(cmd: &mut Command) -> serde_json::Value {
    let out = cmd.arg("--json").assert().success().get_output().stdout.clone();
    serde_json::from_slice(&out).unwrap()
}

/// Install a schema under the user data dir so it shadows or extends the
/// built-ins.
fn install_user_schema(dir: &TempDir, name: &str, yaml: &str, templates: &[&str]) {
    let schema_dir = dir.path().join("data/artiflow/schemas").join(name);
    fs::create_dir_all(schema_dir.join("templates")).unwrap();
    fs::write(schema_dir.join("schema.yaml"), yaml).unwrap();
    for t in templates {
        fs::write(schema_dir.join("templates").join(t), format!("# {t}\n")).unwrap();
    }
}

const MINI_SCHEMA: &str = "\
name: mini
version: 1
artifacts:
  - id: proposal
    generates: proposal.md
    description: Why
    template: templates/proposal.md
  - id: tasks
    generates: tasks.md
    description: Checklist
    template: templates/tasks.md
    requires: [proposal]
";

fn status_of(status: &serde_json::Value, id: &str) -> String {
    status["artifacts"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["id"] == id)
        .map(|a| a["status"].as_str().unwrap().to_string())
        .unwrap()
}

fn change_dir(dir: &TempDir, name: &str) -> std::path::PathBuf {
    dir.path().join(".artiflow/changes").join(name)
}

fn write(path: &Path, body: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

// ---------------------------------------------------------------------------
// artiflow init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_directory_tree() {
    let dir = TempDir::new().unwrap();
    artiflow(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("created: .artiflow/config.yaml"));

    assert!(dir.path().join(".artiflow/changes").is_dir());
    let config = fs::read_to_string(dir.path().join(".artiflow/config.yaml")).unwrap();
    assert!(config.contains("default_schema: spec-driven"));
}

#[test]
fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    artiflow(&dir).arg("init").assert().success();
    artiflow(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists:  .artiflow/config.yaml"));
}

// ---------------------------------------------------------------------------
// artiflow new / list
// ---------------------------------------------------------------------------

#[test]
fn new_records_default_schema() {
    let dir = TempDir::new().unwrap();
    artiflow(&dir)
        .args(["new", "add-auth"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created change 'add-auth' (spec-driven)"));

    let meta = fs::read_to_string(change_dir(&dir, "add-auth").join(".artiflow.yaml")).unwrap();
    assert!(meta.contains("schema: spec-driven"));
    assert!(meta.contains("created: "));
}

#[test]
fn new_rejects_bad_names_and_duplicates() {
    let dir = TempDir::new().unwrap();
    artiflow(&dir)
        .args(["new", "Add_Auth"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid change name"));

    artiflow(&dir).args(["new", "add-auth"]).assert().success();
    artiflow(&dir)
        .args(["new", "add-auth"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn new_rejects_unknown_schema() {
    let dir = TempDir::new().unwrap();
    artiflow(&dir)
        .args(["new", "add-auth", "--schema", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Schema 'nope' not found"))
        .stderr(predicate::str::contains("spec-driven"));
    assert!(!change_dir(&dir, "add-auth").exists());
}

#[test]
fn list_shows_changes_with_schema() {
    let dir = TempDir::new().unwrap();
    artiflow(&dir).args(["new", "zeta"]).assert().success();
    artiflow(&dir)
        .args(["new", "alpha", "--schema", "tdd"])
        .assert()
        .success();

    let rows = json_output(artiflow(&dir).arg("list"));
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], "alpha");
    assert_eq!(rows[0]["schema"], "tdd");
    assert_eq!(rows[1]["name"], "zeta");
    assert_eq!(rows[1]["schema"], "spec-driven");
}

#[test]
fn list_empty_project() {
    let dir = TempDir::new().unwrap();
    artiflow(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes"));
}

// ---------------------------------------------------------------------------
// artiflow status / next
// ---------------------------------------------------------------------------

#[test]
fn fresh_change_has_only_proposal_ready() {
    let dir = TempDir::new().unwrap();
    artiflow(&dir).args(["new", "add-auth"]).assert().success();

    let status = json_output(artiflow(&dir).args(["status", "--change", "add-auth"]));
    assert_eq!(status["changeName"], "add-auth");
    assert_eq!(status["schemaName"], "spec-driven");
    assert_eq!(status["isComplete"], false);
    assert_eq!(status_of(&status, "proposal"), "ready");
    assert_eq!(status_of(&status, "specs"), "blocked");
    assert_eq!(status_of(&status, "tasks"), "blocked");

    let specs = status["artifacts"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["id"] == "specs")
        .unwrap();
    assert_eq!(specs["missingDeps"], serde_json::json!(["proposal"]));
}

#[test]
fn glob_output_completes_on_any_matching_file() {
    let dir = TempDir::new().unwrap();
    artiflow(&dir).args(["new", "add-auth"]).assert().success();
    let change = change_dir(&dir, "add-auth");
    write(&change.join("proposal.md"), "# Proposal\n");
    fs::create_dir_all(change.join("specs")).unwrap();

    let status = json_output(artiflow(&dir).args(["status", "--change", "add-auth"]));
    assert_eq!(status_of(&status, "specs"), "ready");

    write(&change.join("specs/auth/spec.md"), "# Auth\n");
    let status = json_output(artiflow(&dir).args(["status", "--change", "add-auth"]));
    assert_eq!(status_of(&status, "specs"), "done");
    assert_eq!(status_of(&status, "design"), "ready");
}

#[test]
fn mini_workflow_end_to_end() {
    let dir = TempDir::new().unwrap();
    install_user_schema(&dir, "mini", MINI_SCHEMA, &["proposal.md", "tasks.md"]);
    artiflow(&dir)
        .args(["new", "c1", "--schema", "mini"])
        .assert()
        .success();

    let status = json_output(artiflow(&dir).args(["status", "--change", "c1"]));
    assert_eq!(status_of(&status, "proposal"), "ready");
    assert_eq!(status_of(&status, "tasks"), "blocked");

    write(&change_dir(&dir, "c1").join("proposal.md"), "x");
    let next = json_output(artiflow(&dir).args(["next", "--change", "c1"]));
    assert_eq!(next["ready"], serde_json::json!(["tasks"]));
    assert_eq!(next["isComplete"], false);

    write(&change_dir(&dir, "c1").join("tasks.md"), "- [ ] x");
    let status = json_output(artiflow(&dir).args(["status", "--change", "c1"]));
    assert_eq!(status["isComplete"], true);

    artiflow(&dir)
        .args(["next", "--change", "c1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("are complete"));
}

#[test]
fn schema_flag_overrides_metadata() {
    let dir = TempDir::new().unwrap();
    install_user_schema(&dir, "mini", MINI_SCHEMA, &["proposal.md", "tasks.md"]);
    artiflow(&dir).args(["new", "c1"]).assert().success();

    let status = json_output(artiflow(&dir).args(["status", "--change", "c1", "--schema", "mini"]));
    assert_eq!(status["schemaName"], "mini");
    assert_eq!(status["artifacts"].as_array().unwrap().len(), 2);
}

#[test]
fn status_unknown_change_fails() {
    let dir = TempDir::new().unwrap();
    artiflow(&dir)
        .args(["status", "--change", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("change not found: ghost"));
}

#[test]
fn status_table_output() {
    let dir = TempDir::new().unwrap();
    artiflow(&dir).args(["new", "add-auth"]).assert().success();
    artiflow(&dir)
        .args(["status", "--change", "add-auth"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Progress: 0/4 artifacts"))
        .stdout(predicate::str::contains("needs proposal"));
}

// ---------------------------------------------------------------------------
// artiflow instructions
// ---------------------------------------------------------------------------

#[test]
fn instructions_include_template_and_graph_context() {
    let dir = TempDir::new().unwrap();
    artiflow(&dir).args(["new", "add-auth"]).assert().success();
    write(&change_dir(&dir, "add-auth").join("proposal.md"), "# P\n");

    let instr = json_output(artiflow(&dir).args(["instructions", "design", "--change", "add-auth"]));
    assert_eq!(instr["artifactId"], "design");
    assert_eq!(instr["outputPath"], "design.md");
    assert_eq!(instr["unlocks"], serde_json::json!(["tasks"]));
    assert_eq!(instr["dependencies"][0]["id"], "proposal");
    assert_eq!(instr["dependencies"][0]["done"], true);
    assert!(!instr["templateContent"].as_str().unwrap().is_empty());
}

#[test]
fn instructions_unknown_artifact_fails() {
    let dir = TempDir::new().unwrap();
    artiflow(&dir).args(["new", "add-auth"]).assert().success();
    artiflow(&dir)
        .args(["instructions", "nope", "--change", "add-auth"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("artifact 'nope' not found"));
}

// ---------------------------------------------------------------------------
// artiflow apply
// ---------------------------------------------------------------------------

#[test]
fn apply_follows_task_checklist() {
    let dir = TempDir::new().unwrap();
    artiflow(&dir).args(["new", "add-auth"]).assert().success();

    let apply = json_output(artiflow(&dir).args(["apply", "--change", "add-auth"]));
    assert_eq!(apply["state"], "blocked");
    assert_eq!(apply["missingArtifacts"], serde_json::json!(["tasks"]));

    let change = change_dir(&dir, "add-auth");
    write(&change.join("proposal.md"), "# P\n");
    write(&change.join("specs/auth/spec.md"), "# Auth\n");
    write(&change.join("design.md"), "# D\n");
    write(&change.join("tasks.md"), "- [x] 1.1 login\n- [ ] 1.2 logout\n");

    let apply = json_output(artiflow(&dir).args(["apply", "--change", "add-auth"]));
    assert_eq!(apply["state"], "ready");
    assert_eq!(apply["progress"]["total"], 2);
    assert_eq!(apply["progress"]["remaining"], 1);
    assert!(apply["instruction"].as_str().unwrap().contains("Work through tasks.md"));
    assert!(apply["contextFiles"]["design"].as_str().unwrap().ends_with("design.md"));

    write(&change.join("tasks.md"), "- [x] 1.1 login\n- [x] 1.2 logout\n");
    artiflow(&dir)
        .args(["apply", "--change", "add-auth"])
        .assert()
        .success()
        .stdout(predicate::str::contains("State:    all_done"))
        .stdout(predicate::str::contains("Tasks:    2/2 complete"));
}

// ---------------------------------------------------------------------------
// artiflow schema
// ---------------------------------------------------------------------------

#[test]
fn schema_show_includes_apply_block() {
    let dir = TempDir::new().unwrap();
    let shown = json_output(artiflow(&dir).args(["schema", "show", "spec-driven"]));
    assert_eq!(shown["apply"]["tracks"], "tasks.md");
    assert!(shown["apply"]["instruction"]
        .as_str()
        .unwrap()
        .starts_with("Work through tasks.md"));
}

#[test]
fn schema_list_shows_builtins() {
    let dir = TempDir::new().unwrap();
    let catalog = json_output(artiflow(&dir).args(["schema", "list"]));
    let names: Vec<&str> = catalog
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"spec-driven"));
    assert!(names.contains(&"tdd"));
}

#[test]
fn user_schema_shadows_builtin() {
    let dir = TempDir::new().unwrap();
    install_user_schema(
        &dir,
        "spec-driven",
        "name: spec-driven\nversion: 2\nartifacts:\n  - {id: notes, generates: notes.md, description: Notes, template: templates/notes.md}\n",
        &["notes.md"],
    );

    let catalog = json_output(artiflow(&dir).args(["schema", "list"]));
    let entry = catalog
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["name"] == "spec-driven")
        .unwrap()
        .clone();
    assert_eq!(entry["source"], "user");
    assert_eq!(entry["artifacts"], serde_json::json!(["notes"]));

    let shown = json_output(artiflow(&dir).args(["schema", "show", "spec-driven"]));
    assert_eq!(shown["version"], 2);
    assert_eq!(shown["buildOrder"], serde_json::json!(["notes"]));
}

#[test]
fn schema_show_unknown_lists_available() {
    let dir = TempDir::new().unwrap();
    artiflow(&dir)
        .args(["schema", "show", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Available schemas:"));
}

#[test]
fn schema_validate_reports_cycle() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cyclic.yaml");
    fs::write(
        &path,
        "name: cyclic\nversion: 1\nartifacts:\n  - {id: a, generates: a.md, description: A, template: a.md, requires: [b]}\n  - {id: b, generates: b.md, description: B, template: b.md, requires: [a]}\n",
    )
    .unwrap();

    artiflow(&dir)
        .args(["schema", "validate"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cyclic dependency detected"));
}

#[test]
fn schema_validate_accepts_builtin_shape() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ok.yaml");
    fs::write(&path, MINI_SCHEMA).unwrap();

    let report = json_output(artiflow(&dir).args(["schema", "validate"]).arg(&path));
    assert_eq!(report["valid"], true);
    assert_eq!(report["buildOrder"], serde_json::json!(["proposal", "tasks"]));
}

// ---------------------------------------------------------------------------
// artiflow config
// ---------------------------------------------------------------------------

#[test]
fn config_show_defaults_without_file() {
    let dir = TempDir::new().unwrap();
    let cfg = json_output(artiflow(&dir).args(["config", "show"]));
    assert_eq!(cfg["default_schema"], "spec-driven");
    assert_eq!(cfg["version"], 1);
}

#[test]
fn config_validate_flags_unknown_default_schema() {
    let dir = TempDir::new().unwrap();
    artiflow(&dir).arg("init").assert().success();
    fs::write(
        dir.path().join(".artiflow/config.yaml"),
        "version: 1\ndefault_schema: missing\n",
    )
    .unwrap();

    artiflow(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("default_schema 'missing' not found"));
}

#[test]
fn config_default_schema_drives_new_changes() {
    let dir = TempDir::new().unwrap();
    artiflow(&dir).arg("init").assert().success();
    fs::write(
        dir.path().join(".artiflow/config.yaml"),
        "version: 1\ndefault_schema: tdd\n",
    )
    .unwrap();

    artiflow(&dir).args(["new", "c1"]).assert().success();
    let status = json_output(artiflow(&dir).args(["status", "--change", "c1"]));
    assert_eq!(status["schemaName"], "tdd");
}
