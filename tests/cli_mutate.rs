use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;

fn run_json(args: &[&str]) -> Value {
    let mut cmd = cargo_bin_cmd!("crewdesk");
    cmd.env_remove("CREWDESK_SERVER_URL");
    cmd.args(args);

    let assert = cmd.assert().success();
    serde_json::from_slice(&assert.get_output().stdout).expect("valid json output")
}

#[test]
fn cli_create_fills_schema_defaults() {
    let value = run_json(&[
        "create",
        "activities",
        "--set",
        "title=夜间航行培训",
        "--set",
        "participants=30",
    ]);

    assert_eq!(value["success"], true);
    let data = &value["data"];
    assert_eq!(data["title"], "夜间航行培训");
    assert_eq!(data["participants"], 30);
    assert_eq!(data["type"], "online");
    assert_eq!(data["status"], "draft");
    assert_eq!(data["organizer"], "未指定");
    assert_eq!(data["location"], "待定");
    assert!(data["id"].as_str().expect("id").parse::<u64>().is_ok());
    assert_eq!(data["createdAt"], data["updatedAt"]);
}

#[test]
fn cli_create_user_keeps_phone_as_text() {
    let value = run_json(&[
        "create",
        "managed-users",
        "--set",
        "name=张三",
        "--set",
        "phone=13800000001",
    ]);

    let data = &value["data"];
    assert_eq!(data["phone"], "13800000001");
    assert_eq!(data["role"], "viewer");
    assert_eq!(data["status"], "pending");
}

#[test]
fn cli_update_merges_fields_and_keeps_sticky_values() {
    let value = run_json(&[
        "update",
        "managed-users",
        "--id",
        "1",
        "--set",
        "department=航运部",
        "--set",
        "role=",
    ]);

    assert_eq!(value["success"], true);
    let data = &value["data"];
    assert_eq!(data["id"], "1");
    assert_eq!(data["department"], "航运部");
    assert_eq!(data["role"], "admin");
    assert_eq!(data["email"], "user1@example.com");
}

#[test]
fn cli_update_unknown_id_succeeds_without_data() {
    let value = run_json(&["update", "activities", "--id", "999", "--set", "title=x"]);
    assert_eq!(value["success"], true);
    assert!(value.get("data").is_none());
}

#[test]
fn cli_delete_reports_success() {
    let value = run_json(&["delete", "events", "--id", "1,2"]);
    assert_eq!(value["success"], true);
}

#[test]
fn cli_local_mutation_warns_that_change_is_not_kept() {
    let mut cmd = cargo_bin_cmd!("crewdesk");
    cmd.env_remove("CREWDESK_SERVER_URL");
    cmd.env_remove("RUST_LOG");
    cmd.env("CREWDESK_LOG", "warn");
    cmd.args(["delete", "events", "--id", "1"]);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("not kept"));
}

#[test]
fn cli_get_prints_record_fields() {
    let mut cmd = cargo_bin_cmd!("crewdesk");
    cmd.env_remove("CREWDESK_SERVER_URL");
    cmd.args(["get", "activities", "3"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("活动策划会 3"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("live"));
}

#[test]
fn cli_get_unknown_id_fails() {
    let mut cmd = cargo_bin_cmd!("crewdesk");
    cmd.env_remove("CREWDESK_SERVER_URL");
    cmd.args(["get", "events", "999"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no record with id 999 in events"));
}
