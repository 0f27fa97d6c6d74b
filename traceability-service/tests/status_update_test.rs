//! ChangeStatus and ProtocolPartInsert integration tests.

mod common;

use common::{ts, TestApp};
use reqwest::Client;
use serde_json::json;

#[tokio::test]
async fn gitterbox_status_change_updates_every_part_and_keeps_history() {
    let app = TestApp::spawn().await;
    app.seed_part_status("P1", "OK", Some(3), ts(2024, 3, 1, 8, 0, 0), Some("G-1"))
        .await;
    app.seed_part_status("P2", "OK", Some(3), ts(2024, 3, 1, 8, 5, 0), Some("G-1"))
        .await;
    app.seed_part_status("P3", "OK", Some(3), ts(2024, 3, 1, 8, 10, 0), Some("G-2"))
        .await;

    let client = Client::new();
    let response = client
        .post(format!("{}/ChangeStatus", app.address))
        .json(&json!({
            "station_id": 5,
            "status": "EXPED",
            "status_timestamp": "2024-03-02T12:00:00",
            "shipping_id": "G-1"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Status updated successfully");

    // Both parts in G-1 carry the new status; the part in G-2 is untouched.
    let statuses: Vec<(String, String)> = sqlx::query_as(
        "SELECT part_id, last_status FROM part_status ORDER BY part_id",
    )
    .fetch_all(app.db.pool())
    .await
    .unwrap();
    assert_eq!(
        statuses,
        vec![
            ("P1".to_string(), "EXPED".to_string()),
            ("P2".to_string(), "EXPED".to_string()),
            ("P3".to_string(), "OK".to_string()),
        ]
    );

    // The superseded statuses were snapshotted into the history log.
    let history_count: i64 =
        sqlx::query_scalar("SELECT count(*) FROM h_part_status WHERE status = 'OK'")
            .fetch_one(app.db.pool())
            .await
            .unwrap();
    assert_eq!(history_count, 2);

    // And InfoStatus now reports the change for an updated part.
    let response = client
        .get(format!("{}/InfoStatus?part_id=P1", app.address))
        .send()
        .await
        .expect("Failed to execute request");
    let body: serde_json::Value = response.json().await.unwrap();
    let history = body["part_history"].as_array().unwrap();
    assert!(history
        .iter()
        .any(|row| row["zmena"] == "zmena statusu" && row["history_status"] == "OK"));
    assert!(history
        .iter()
        .any(|row| row["rezim_cteni"] == "EXPED" && row["zmena"].is_null()));

    app.cleanup().await;
}

#[tokio::test]
async fn workspace_filter_narrows_the_status_change() {
    let app = TestApp::spawn().await;
    app.seed_part_status("P1", "OK", Some(3), ts(2024, 3, 1, 8, 0, 0), Some("G-1"))
        .await;
    app.seed_part_status("P2", "OK", Some(4), ts(2024, 3, 1, 8, 5, 0), Some("G-1"))
        .await;

    let client = Client::new();
    let response = client
        .post(format!("{}/ChangeStatus", app.address))
        .json(&json!({
            "station_id": 5,
            "status": "EXPED",
            "status_timestamp": "2024-03-02T12:00:00",
            "shipping_id": "G-1",
            "current_workspace_id": 3
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);

    let p1: String = sqlx::query_scalar("SELECT last_status FROM part_status WHERE part_id = 'P1'")
        .fetch_one(app.db.pool())
        .await
        .unwrap();
    let p2: String = sqlx::query_scalar("SELECT last_status FROM part_status WHERE part_id = 'P2'")
        .fetch_one(app.db.pool())
        .await
        .unwrap();
    assert_eq!(p1, "EXPED");
    assert_eq!(p2, "OK");

    app.cleanup().await;
}

#[tokio::test]
async fn malformed_change_status_body_is_rejected() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/ChangeStatus", app.address))
        .header("content-type", "application/json")
        .body("{{{")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid JSON format");

    app.cleanup().await;
}

#[tokio::test]
async fn protocol_part_is_registered() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/ProtocolPartInsert", app.address))
        .json(&json!({
            "part_id": "ABC123",
            "protocol_id": "PROT-9",
            "employee_id": "E42",
            "station_id": 3,
            "status": "MEASURED",
            "status_timestamp": "2024-03-02T12:00:00"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Protocol part data inserted successfully");

    let (part_id, protocol_id): (String, String) = sqlx::query_as(
        "SELECT part_id, protocol_id FROM protocol_parts WHERE part_id = 'ABC123'",
    )
    .fetch_one(app.db.pool())
    .await
    .unwrap();
    assert_eq!(part_id, "ABC123");
    assert_eq!(protocol_id, "PROT-9");

    app.cleanup().await;
}

#[tokio::test]
async fn protocol_part_requires_both_identifiers() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/ProtocolPartInsert", app.address))
        .json(&json!({"part_id": "ABC123"}))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Request body must contain 'part_id' and 'protocol_id'"
    );

    app.cleanup().await;
}

#[tokio::test]
async fn protocol_part_requires_json_content_type() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/ProtocolPartInsert", app.address))
        .header("content-type", "text/plain")
        .body(r#"{"part_id": "ABC123", "protocol_id": "PROT-9"}"#)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Content-Type must be application/json");

    app.cleanup().await;
}
