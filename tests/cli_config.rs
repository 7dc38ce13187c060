use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_config(root: &Path, contents: &str) {
    let config_dir = root.join(".crewdesk");
    fs::create_dir_all(&config_dir).expect("create .crewdesk directory");
    fs::write(config_dir.join("config.toml"), contents).expect("write config.toml");
}

#[test]
fn cli_list_uses_project_config_defaults_for_format_and_page_size() {
    let tmp = tempdir().expect("tempdir");
    write_config(
        tmp.path(),
        r#"
[list]
format = "json"
page_size = 5
"#,
    );

    let mut cmd = cargo_bin_cmd!("crewdesk");
    cmd.current_dir(tmp.path());
    cmd.env_remove("CREWDESK_SERVER_URL");
    cmd.args(["list", "managed-users"]);

    let assert = cmd.assert().success();
    let value: Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("valid json output");

    assert_eq!(value["pageSize"], 5);
    assert_eq!(value["total"], 36);
    assert_eq!(value["data"].as_array().expect("data").len(), 5);
}

#[test]
fn cli_config_is_discovered_from_nested_directories() {
    let tmp = tempdir().expect("tempdir");
    write_config(
        tmp.path(),
        r#"
[list]
format = "json"

[serve]
activities = 4
"#,
    );
    let nested = tmp.path().join("deck").join("cabin");
    fs::create_dir_all(&nested).expect("nested dirs");

    let mut cmd = cargo_bin_cmd!("crewdesk");
    cmd.current_dir(&nested);
    cmd.env_remove("CREWDESK_SERVER_URL");
    cmd.args(["list", "activities"]);

    let assert = cmd.assert().success();
    let value: Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("valid json output");
    assert_eq!(value["total"], 4);
}

#[test]
fn cli_list_config_can_disable_server_even_with_env() {
    let tmp = tempdir().expect("tempdir");
    write_config(
        tmp.path(),
        r#"
[list]
format = "json"
no_server = true
"#,
    );

    let mut cmd = cargo_bin_cmd!("crewdesk");
    cmd.current_dir(tmp.path());
    // Nothing listens on the discard port; a request there would fail.
    cmd.env("CREWDESK_SERVER_URL", "http://127.0.0.1:9");
    cmd.args(["list", "events"]);

    let assert = cmd.assert().success();
    let value: Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("valid json output");
    assert_eq!(value["total"], 24);
}

#[test]
fn cli_reports_malformed_config() {
    let tmp = tempdir().expect("tempdir");
    write_config(tmp.path(), "[list\nformat = ");

    let mut cmd = cargo_bin_cmd!("crewdesk");
    cmd.current_dir(tmp.path());
    cmd.args(["collections"]);

    cmd.assert().failure();
}
