use std::path::PathBuf;

use assert_cmd::Command;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;

/// Write `document` into a fresh temp dir and return the dir with the file path.
fn write_document(document: &Value) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dashboard.json");
    std::fs::write(&path, serde_json::to_string(document).unwrap()).unwrap();
    (dir, path)
}

fn perfdash() -> Command {
    let mut cmd = Command::cargo_bin("perfdash").unwrap();
    cmd.env_remove("PERFDASH_STRICT")
        .env_remove("PERFDASH_PRETTY")
        .env_remove("PERFDASH_LOG_FORMAT")
        .env("RUST_LOG", "off");
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

fn order_of(document: &Value, id: &str) -> u64 {
    document["widgets"]
        .as_array()
        .unwrap()
        .iter()
        .find(|w| w["id"] == id)
        .unwrap()["order"]
        .as_u64()
        .unwrap()
}

fn three_widgets() -> Value {
    json!({
        "id": "d-1",
        "name": "Air quality",
        "widgets": [
            { "id": "abc", "name": "Intro", "widgetType": "Text", "order": 0 },
            { "id": "xyz", "name": "Trend", "widgetType": "Chart", "order": 1 },
            { "id": "def", "name": "Data", "widgetType": "Table", "order": 2 }
        ]
    })
}

fn sectioned() -> Value {
    json!({
        "widgets": [
            { "id": "s", "name": "Section", "widgetType": "Section", "order": 0,
              "content": { "widgetIds": ["c"] } },
            { "id": "c", "name": "Child", "widgetType": "Text", "order": 1, "section": "s" },
            { "id": "e", "name": "Empty", "widgetType": "Section", "order": 2,
              "content": { "widgetIds": [] } },
            { "id": "t", "name": "Tail", "widgetType": "Image", "order": 3 }
        ]
    })
}

// -- move-widget ----------------------------------------------------------

#[test]
fn move_widget_swaps_orders() {
    let (_dir, path) = write_document(&three_widgets());
    let document = stdout_json(perfdash().arg("move-widget").arg(&path).args(["0", "1"]));

    assert_eq!(order_of(&document, "abc"), 1);
    assert_eq!(order_of(&document, "xyz"), 0);
    assert_eq!(order_of(&document, "def"), 2);
    assert_eq!(document["name"], json!("Air quality"));
}

#[test]
fn move_widget_out_of_bounds_leaves_document_unchanged() {
    let (_dir, path) = write_document(&three_widgets());
    let document = stdout_json(perfdash().arg("move-widget").arg(&path).args(["0", "-1"]));
    assert_eq!(document, three_widgets());
}

#[test]
fn move_widget_writes_payload_to_output_file() {
    let (dir, path) = write_document(&sectioned());
    let output = dir.path().join("payload.json");
    perfdash()
        .arg("move-widget")
        .arg(&path)
        .args(["3", "2", "--payload", "--output"])
        .arg(&output)
        .assert()
        .success();

    let payload: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    let tail = payload
        .as_array()
        .unwrap()
        .iter()
        .find(|entry| entry["id"] == "t")
        .unwrap();
    assert_eq!(tail["section"], json!("e"));
    let empty = payload
        .as_array()
        .unwrap()
        .iter()
        .find(|entry| entry["id"] == "e")
        .unwrap();
    assert_eq!(empty["widgetIds"], json!(["t"]));
}

#[test]
fn strict_mode_rejects_nested_sections() {
    let mut document = sectioned();
    document["widgets"][2]["section"] = json!("s");
    let (_dir, path) = write_document(&document);

    perfdash()
        .env("PERFDASH_STRICT", "true")
        .arg("move-widget")
        .arg(&path)
        .args(["0", "1"])
        .assert()
        .failure();
}

#[test]
fn invalid_configuration_fails_fast() {
    let (_dir, path) = write_document(&three_widgets());
    let output = perfdash()
        .env("PERFDASH_LOG_FORMAT", "xml")
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .get_output()
        .clone();
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("PERFDASH_LOG_FORMAT must be 'text' or 'json', got 'xml'"));
}

// -- move-metric ----------------------------------------------------------

#[test]
fn move_metric_reorders_metrics_content() {
    let document = json!({
        "widgets": [
            { "id": "m", "name": "Figures", "widgetType": "Metrics", "order": 0,
              "content": { "metrics": [ { "title": "polution" }, { "title": "temperature" } ] } }
        ]
    });
    let (_dir, path) = write_document(&document);
    let moved = stdout_json(
        perfdash()
            .arg("move-metric")
            .arg(&path)
            .args(["--widget", "m", "0", "1"]),
    );
    assert_eq!(
        moved["widgets"][0]["content"]["metrics"],
        json!([{ "title": "temperature" }, { "title": "polution" }])
    );
}

#[test]
fn move_metric_on_unknown_widget_fails() {
    let (_dir, path) = write_document(&three_widgets());
    perfdash()
        .arg("move-metric")
        .arg(&path)
        .args(["--widget", "nope", "0", "1"])
        .assert()
        .failure();
}

// -- check / renumber / tree ----------------------------------------------

#[test]
fn check_passes_consistent_document() {
    let (_dir, path) = write_document(&sectioned());
    let violations = stdout_json(perfdash().arg("check").arg(&path));
    assert_eq!(violations, json!([]));
}

#[test]
fn check_reports_violations_with_failing_status() {
    let mut document = sectioned();
    document["widgets"][0]["content"]["widgetIds"] = json!([]);
    let (_dir, path) = write_document(&document);

    let output = perfdash().arg("check").arg(&path).assert().code(1).get_output().stdout.clone();
    let violations: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(violations[0]["violation"], json!("child_list_mismatch"));
    assert_eq!(violations[0]["section"], json!("s"));
}

#[test]
fn renumber_rewrites_orders_and_child_lists() {
    let document = json!({
        "widgets": [
            { "id": "c", "widgetType": "Text", "order": 30, "section": "s" },
            { "id": "a", "widgetType": "Text", "order": 5 },
            { "id": "s", "widgetType": "Section", "order": 10 }
        ]
    });
    let (_dir, path) = write_document(&document);
    let renumbered = stdout_json(perfdash().arg("renumber").arg(&path));

    let ranks: Vec<(String, u64)> = renumbered["widgets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| (w["id"].as_str().unwrap().to_string(), w["order"].as_u64().unwrap()))
        .collect();
    assert_eq!(
        ranks,
        vec![("a".to_string(), 0), ("s".to_string(), 1), ("c".to_string(), 2)]
    );
    assert_eq!(renumbered["widgets"][1]["content"]["widgetIds"], json!(["c"]));
}

#[test]
fn tree_shows_divider_for_empty_section() {
    let (_dir, path) = write_document(&sectioned());
    let tree = stdout_json(perfdash().arg("tree").arg(&path));

    assert_eq!(tree[0]["children"][0]["id"], json!("c"));
    assert_eq!(tree[1]["children"][0], json!({ "id": "e-divider", "dragIndex": 3 }));
    assert_eq!(tree[2]["dragIndex"], json!(4));
}

#[test]
fn unreadable_document_fails() {
    perfdash()
        .args(["check", "/nonexistent/dashboard.json"])
        .assert()
        .failure();
}
