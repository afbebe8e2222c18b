use anyhow::Result;
use kmo_testing::TestWorld;
use kmo_testing::assertions::assert_composed_operation;

#[test]
fn compose_top_queries_binds_default_limit() -> Result<()> {
    let world = TestWorld::new();
    let result = world.run(&["--format", "json", "compose", "top-queries"])?;
    assert!(result.success(), "stderr: {}", result.stderr());

    let json = result.json()?;
    assert_eq!(json["operation"], "top_queries");
    assert!(
        json["text"]
            .as_str()
            .unwrap()
            .contains("ORDER BY [Average Worker Time] DESC")
    );

    let params = json["parameters"].as_array().unwrap();
    assert_eq!(params.len(), 1);
    assert_eq!(params[0]["name"], "@row_limit");
    assert_eq!(params[0]["value"]["value"], 50);
    Ok(())
}

#[test]
fn compose_respects_flags_over_config() -> Result<()> {
    let world = TestWorld::new();
    world.write_raw_config(
        r#"
[top_procedures]
order_by = "Execution Count"
row_limit = 10
"#,
    )?;

    let from_config = world.run(&["--format", "json", "compose", "top_procedures"])?;
    assert!(from_config.success(), "stderr: {}", from_config.stderr());
    let json = from_config.json()?;
    assert!(json["text"].as_str().unwrap().contains("[Execution Count]"));
    assert_eq!(json["parameters"][0]["value"]["value"], 10);

    let overridden = world.run(&[
        "--format",
        "json",
        "compose",
        "top_procedures",
        "--order-by",
        "Average CPU",
        "--row-limit",
        "5",
    ])?;
    assert!(overridden.success(), "stderr: {}", overridden.stderr());
    let json = overridden.json()?;
    assert!(json["text"].as_str().unwrap().contains("[Average CPU]"));
    assert_eq!(json["parameters"][0]["value"]["value"], 5);
    Ok(())
}

#[test]
fn compose_wait_statistics_excludes_defaults() -> Result<()> {
    let world = TestWorld::new();
    let result = world.run(&["--format", "json", "compose", "wait_statistics"])?;
    assert!(result.success(), "stderr: {}", result.stderr());

    let json = result.json()?;
    let params = json["parameters"].as_array().unwrap();
    assert!(!params.is_empty());
    assert_eq!(params[0]["name"], "@wait_type_0");
    assert_eq!(params[0]["value"]["value"], "BROKER_EVENTHANDLER");
    assert!(json["text"].as_str().unwrap().contains("NOT IN (@wait_type_0"));
    Ok(())
}

#[test]
fn compose_wait_statistics_without_exclusions() -> Result<()> {
    let world = TestWorld::new();
    let result = world.run(&[
        "--format",
        "json",
        "compose",
        "wait_statistics",
        "--no-wait-exclusion",
    ])?;
    assert!(result.success(), "stderr: {}", result.stderr());

    let json = result.json()?;
    assert!(json["parameters"].as_array().unwrap().is_empty());
    assert!(!json["text"].as_str().unwrap().contains("NOT IN"));
    Ok(())
}

#[test]
fn compose_rejects_malformed_wait_type() -> Result<()> {
    let world = TestWorld::new();
    let result = world.run(&[
        "compose",
        "wait_statistics",
        "--exclude-wait-type",
        "X'); DROP TABLE t;--",
    ])?;
    assert!(!result.success());
    assert!(result.stderr().contains("Invalid option"));
    Ok(())
}

#[test]
fn compose_plain_lists_parameters() -> Result<()> {
    let world = TestWorld::new();
    let result = world.run(&[
        "compose",
        "error_log",
        "--start-time",
        "2024-01-01",
        "--log-file-number",
        "2",
    ])?;
    assert!(result.success(), "stderr: {}", result.stderr());

    let stdout = result.stdout();
    assert!(stdout.starts_with("-- error_log"));
    assert!(stdout.contains("@log_file_number"));
    assert!(stdout.contains("@start_time"));
    assert!(!stdout.contains("@end_time"));
    Ok(())
}

#[test]
fn compose_unsupported_version_fails() -> Result<()> {
    let world = TestWorld::new();
    let result = world.run(&["compose", "top_procedures", "--engine-version", "9.0"])?;
    assert!(!result.success());
    assert!(result.stderr().contains("Unsupported version"));
    assert!(result.stdout().is_empty());
    Ok(())
}

#[test]
fn compose_rejects_inapplicable_flag() -> Result<()> {
    let world = TestWorld::new();
    let result = world.run(&["compose", "who", "--row-limit", "5"])?;
    assert!(!result.success());
    assert!(result.stderr().contains("--row-limit does not apply to 'who'"));
    Ok(())
}

#[test]
fn compose_rejects_unknown_sort_column() -> Result<()> {
    let world = TestWorld::new();
    let result = world.run(&["compose", "top_queries", "--order-by", "Average CPU"])?;
    assert!(!result.success());
    assert!(result.stderr().starts_with("Error:"));
    Ok(())
}

#[test]
fn compose_rejects_invalid_config_override() -> Result<()> {
    let world = TestWorld::new();
    world.write_raw_config("[top_queries]\norder_by = \"name; DROP TABLE x\"\n")?;

    let result = world.run(&["compose", "top_queries"])?;
    assert!(!result.success());
    assert!(result.stderr().contains("[top_queries]"));
    Ok(())
}

#[test]
fn free_disk_space_variant_follows_ole_flag() -> Result<()> {
    let world = TestWorld::new();
    let plain = world.run(&["compose", "free_disk_space"])?;
    let ole = world.run(&["compose", "free_disk_space", "--ole-automation"])?;
    assert!(plain.success() && ole.success());

    assert!(plain.stdout().contains("xp_fixeddrives"));
    assert!(!plain.stdout().contains("sp_OACreate"));
    assert!(ole.stdout().contains("sp_OACreate"));
    assert_ne!(plain.stdout(), ole.stdout());
    Ok(())
}

#[test]
fn rust_log_sends_debug_events_to_stderr() -> Result<()> {
    let world = TestWorld::new().with_env("RUST_LOG", "debug");
    let result = world.run(&["--format", "json", "compose", "failed_logins"])?;
    assert!(result.success(), "stderr: {}", result.stderr());

    assert_composed_operation(&result.json()?, "failed_logins")?;
    assert!(result.stderr().contains("composing offline"));
    Ok(())
}

#[test]
fn suppress_informational_overrides_config() -> Result<()> {
    let world = TestWorld::new();
    world.write_raw_config("[error_log]\ninclude_informational_messages = true\n")?;

    let kept = world.run(&["compose", "error_log"])?;
    assert!(kept.success(), "stderr: {}", kept.stderr());
    assert!(!kept.stdout().contains("This is an informational message"));

    let suppressed = world.run(&["compose", "error_log", "--suppress-informational"])?;
    assert!(suppressed.success(), "stderr: {}", suppressed.stderr());
    assert!(suppressed.stdout().contains("This is an informational message"));

    let both = world.run(&[
        "compose",
        "error_log",
        "--include-informational",
        "--suppress-informational",
    ])?;
    assert!(!both.success());
    Ok(())
}
