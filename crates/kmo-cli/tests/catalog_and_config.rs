use anyhow::Result;
use assert_cmd::Command;
use kmo_testing::TestWorld;
use predicates::prelude::*;

#[test]
fn catalog_lists_every_operation() -> Result<()> {
    let world = TestWorld::new();
    let result = world.run(&["--format", "json", "catalog"])?;
    assert!(result.success(), "stderr: {}", result.stderr());

    let json = result.json()?;
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 18);
    assert!(entries.iter().all(|e| e.get("available").is_none()));

    let top = entries
        .iter()
        .find(|e| e["id"] == "top_procedures")
        .expect("top_procedures listed");
    assert_eq!(top["min_version"], "10.0");
    Ok(())
}

#[test]
fn catalog_marks_availability_for_engine_version() -> Result<()> {
    let world = TestWorld::new();
    let result = world.run(&["--format", "json", "catalog", "--engine-version", "9.0"])?;
    assert!(result.success(), "stderr: {}", result.stderr());

    let json = result.json()?;
    let available = |id: &str| {
        json.as_array()
            .unwrap()
            .iter()
            .find(|e| e["id"] == id)
            .map(|e| e["available"].clone())
    };
    assert_eq!(available("who"), Some(serde_json::Value::Bool(true)));
    assert_eq!(available("top_procedures"), Some(serde_json::Value::Bool(false)));
    assert_eq!(available("service_status"), Some(serde_json::Value::Bool(false)));
    Ok(())
}

#[test]
fn version_name_resolves_known_and_unknown() -> Result<()> {
    let world = TestWorld::new();

    let known = world.run(&["version-name", "10.50.6000.34"])?;
    assert!(known.success());
    assert_eq!(known.stdout().trim(), "Sql Server 2008 R2");

    let unknown = world.run(&["version-name", "15.0"])?;
    assert!(unknown.success());
    assert_eq!(unknown.stdout().trim(), "Unknown edition");
    Ok(())
}

#[test]
fn version_name_rejects_garbage() {
    let world = TestWorld::new();
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("kmo").unwrap();
    world.configure_command(&mut cmd);

    cmd.args(["version-name", "not-a-version"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid engine version"));
}

#[test]
fn config_path_honours_env() -> Result<()> {
    let world = TestWorld::new();
    let result = world.run(&["config", "path"])?;
    assert!(result.success());
    assert_eq!(
        result.stdout().trim(),
        world.config_path().display().to_string()
    );
    Ok(())
}

#[test]
fn config_init_writes_builtin_defaults_once() -> Result<()> {
    let world = TestWorld::new();

    let first = world.run(&["config", "init"])?;
    assert!(first.success(), "stderr: {}", first.stderr());
    let content = world.read_config()?;
    assert!(content.contains("[top_queries]"));
    assert!(content.contains("BROKER_EVENTHANDLER"));

    let second = world.run(&["config", "init"])?;
    assert!(!second.success());
    assert!(second.stderr().contains("already exists"));

    let forced = world.run(&["config", "init", "--force"])?;
    assert!(forced.success());
    Ok(())
}

#[test]
fn config_show_reports_overrides() -> Result<()> {
    let world = TestWorld::new();

    let missing = world.run(&["config", "show"])?;
    assert!(missing.success());
    assert!(missing.stdout().contains("built-in defaults"));

    world.write_raw_config("[top_queries]\nrow_limit = 7\n\n[wait_statistics]\nexcluded_wait_types = []\n")?;
    let result = world.run(&["--format", "json", "config", "show"])?;
    assert!(result.success(), "stderr: {}", result.stderr());

    let json = result.json()?;
    assert_eq!(json["config_found"], true);
    assert_eq!(json["top_queries"]["row_limit"], 7);
    assert_eq!(json["top_procedures"]["row_limit"], 50);
    assert!(json["excluded_wait_types"].as_array().unwrap().is_empty());
    Ok(())
}

#[test]
fn unknown_operation_is_a_usage_error() {
    let world = TestWorld::new();
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("kmo").unwrap();
    world.configure_command(&mut cmd);

    cmd.args(["compose", "not_an_operation"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown operation"));
}
