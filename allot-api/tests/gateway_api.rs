//! Integration tests for the Allocation Gateway Service router.
//!
//! Validation and routing go through `oneshot`; the end-to-end tests run a
//! real store router on a loopback port and point the gateway at it.

use allot_api::server::{ALLOCATIONS_PATH, GatewayState, StoreState, build_gateway_router, build_store_router};
use allot_core::StaticCredentials;
use allot_core::config::GatewayConfig;
use allot_core::envelope::CONNECTION_MESSAGE;
use allot_store::DatasetSource;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt; // .oneshot()

// ── Helpers ───────────────────────────────────────────────────

fn gateway_config(upstream_url: String, audit_dir: &Path) -> GatewayConfig {
    GatewayConfig {
        upstream_url,
        timeout_secs: 5,
        audit_dir: audit_dir.to_path_buf(),
        ..GatewayConfig::default()
    }
}

fn make_gateway(upstream_url: String, audit_dir: &Path) -> Arc<GatewayState> {
    Arc::new(GatewayState::from_config(&gateway_config(upstream_url, audit_dir)).unwrap())
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Serve a store router over `records` on an ephemeral loopback port.
async fn spawn_store(dir: &Path, records: Value) -> SocketAddr {
    let path = dir.join("data.json");
    std::fs::write(&path, records.to_string()).unwrap();
    let state = Arc::new(StoreState::new(
        DatasetSource::new(path),
        Arc::new(StaticCredentials::new("bob", "bob")),
    ));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_store_router(state)).await.unwrap();
    });
    addr
}

fn audit_entries(dir: &Path) -> Vec<Value> {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| serde_json::from_slice(&std::fs::read(e.path()).unwrap()).unwrap())
        .collect()
}

fn full_request(password: &str) -> String {
    json!({
        "username": "bob",
        "password": password,
        "projectCode": "P1",
        "allocStartDate": "15 Jan 2024",
        "allocEndDate": "20 Jan 2024"
    })
    .to_string()
}

// ── Validation ────────────────────────────────────────────────

#[tokio::test]
async fn missing_fields_are_listed_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_gateway_router(make_gateway("http://127.0.0.1:9/unused".into(), dir.path()));

    let body = json!({ "username": "bob", "projectCode": "P1" }).to_string();
    let resp = app.oneshot(post_json("/api/allocations", &body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let j = body_json(resp).await;
    assert_eq!(j["success"], false);
    assert_eq!(j["error"], "Missing required fields: password, allocStartDate, allocEndDate");
    assert!(audit_entries(dir.path()).is_empty());
}

#[tokio::test]
async fn empty_strings_count_as_missing() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_gateway_router(make_gateway("http://127.0.0.1:9/unused".into(), dir.path()));

    let body = json!({
        "username": "bob",
        "password": "",
        "projectCode": "P1",
        "allocStartDate": "01 Jan 2024",
        "allocEndDate": "31 Jan 2024"
    })
    .to_string();
    let resp = app.oneshot(post_json("/api/allocations", &body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "Missing required fields: password");
}

#[tokio::test]
async fn non_json_body_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_gateway_router(make_gateway("http://127.0.0.1:9/unused".into(), dir.path()));

    let resp = app.oneshot(post_json("/api/allocations", "hello")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "No JSON data provided");
}

// ── Auxiliary endpoints ───────────────────────────────────────

#[tokio::test]
async fn health_reports_version_and_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_gateway_router(make_gateway("http://127.0.0.1:9/unused".into(), dir.path()));

    let req = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let j = body_json(resp).await;
    assert_eq!(j["status"], "healthy");
    assert_eq!(j["version"], env!("CARGO_PKG_VERSION"));
    let ts = j["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok(), "{ts}");
}

#[tokio::test]
async fn unknown_path_returns_json_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_gateway_router(make_gateway("http://127.0.0.1:9/unused".into(), dir.path()));

    let req = Request::builder().uri("/api/nothing").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(resp).await,
        json!({ "success": false, "error": "Endpoint not found" })
    );
}

#[tokio::test]
async fn get_on_allocations_returns_json_405() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_gateway_router(make_gateway("http://127.0.0.1:9/unused".into(), dir.path()));

    let req = Request::builder().uri("/api/allocations").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(resp.headers().contains_key(header::ALLOW));
    assert_eq!(
        body_json(resp).await,
        json!({ "success": false, "error": "Method not allowed" })
    );
}

// ── End to end ────────────────────────────────────────────────

#[tokio::test]
async fn forwards_to_store_and_records_audit() {
    let dir = tempfile::tempdir().unwrap();
    let records = json!([
        { "ProjectCode": "P1", "AllocStartDate": "01 Jan 2024", "AllocEndDate": "31 Jan 2024" },
        { "ProjectCode": "P1", "AllocStartDate": "01 Feb 2024", "AllocEndDate": "10 Feb 2024" }
    ]);
    let store = spawn_store(dir.path(), records).await;
    let audit_dir = dir.path().join("response_data");
    let app = build_gateway_router(make_gateway(format!("http://{store}{ALLOCATIONS_PATH}"), &audit_dir));

    let resp = app
        .oneshot(post_json("/api/allocations", &full_request("bob")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let j = body_json(resp).await;
    assert_eq!(j["success"], true);
    assert_eq!(j["status_code"], 200);
    assert_eq!(
        j["data"],
        json!([{ "ProjectCode": "P1", "AllocStartDate": "01 Jan 2024", "AllocEndDate": "31 Jan 2024" }])
    );
    assert_eq!(
        j["request_payload"],
        json!({ "projectCode": "P1", "allocStartDate": "15 Jan 2024", "allocEndDate": "20 Jan 2024" })
    );
    assert!(j["request_payload"].get("password").is_none());
    assert!(j["response_headers"].is_object());

    let audit = audit_entries(&audit_dir);
    assert_eq!(audit, vec![j]);
}

#[tokio::test]
async fn store_rejection_is_a_200_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let store = spawn_store(dir.path(), json!([])).await;
    let audit_dir = dir.path().join("response_data");
    let app = build_gateway_router(make_gateway(format!("http://{store}{ALLOCATIONS_PATH}"), &audit_dir));

    let resp = app
        .oneshot(post_json("/api/allocations", &full_request("wrong")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let j = body_json(resp).await;
    assert_eq!(j["success"], false);
    assert_eq!(j["status_code"], 401);
    assert!(j["error"].as_str().unwrap().contains("Unauthorized"));
    assert!(j.get("data").is_none_or(Value::is_null));
    assert_eq!(audit_entries(&audit_dir).len(), 1);
}

#[tokio::test]
async fn unreachable_store_is_a_200_envelope() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let app = build_gateway_router(make_gateway(format!("http://{addr}{ALLOCATIONS_PATH}"), dir.path()));

    let resp = app
        .oneshot(post_json("/api/allocations", &full_request("bob")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let j = body_json(resp).await;
    assert_eq!(j["success"], false);
    assert_eq!(j["status_code"], 0);
    assert_eq!(j["error"], CONNECTION_MESSAGE);
    assert!(j.get("response_headers").is_none());
}

// ── Run comparison ────────────────────────────────────────────

fn compare_request() -> String {
    json!({
        "projectCode": "P1",
        "allocStartDate": "15 Jan 2024",
        "allocEndDate": "20 Jan 2024"
    })
    .to_string()
}

#[tokio::test]
async fn compare_requires_payload_fields() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_gateway_router(make_gateway("http://127.0.0.1:9/unused".into(), dir.path()));

    let body = json!({ "projectCode": "P1" }).to_string();
    let resp = app.oneshot(post_json("/api/allocations/compare", &body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(resp).await["error"],
        "Missing required fields: allocStartDate, allocEndDate"
    );
}

#[tokio::test]
async fn compare_diffs_the_two_latest_runs() {
    let dir = tempfile::tempdir().unwrap();
    let first = json!([
        { "AllocNo": 1, "ProjectCode": "P1", "EmpNo": "E1", "EmpName": "Ada", "Percent": 100,
          "ActivityDesc": "Dev", "AllocStartDate": "01 Jan 2024", "AllocEndDate": "31 Jan 2024" },
        { "AllocNo": 2, "ProjectCode": "P1", "EmpNo": "E2", "EmpName": "Grace", "Percent": 50,
          "ActivityDesc": "QA", "AllocStartDate": "01 Jan 2024", "AllocEndDate": "31 Jan 2024" }
    ]);
    let store = spawn_store(dir.path(), first).await;
    let audit_dir = dir.path().join("response_data");
    let state = make_gateway(format!("http://{store}{ALLOCATIONS_PATH}"), &audit_dir);

    let resp = build_gateway_router(Arc::clone(&state))
        .oneshot(post_json("/api/allocations", &full_request("bob")))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["success"], true);

    let resp = build_gateway_router(Arc::clone(&state))
        .oneshot(post_json("/api/allocations/compare", &compare_request()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let j = body_json(resp).await;
    assert_eq!(j["runs"], 1);
    assert!(j["comparison"].is_null());

    let second = json!([
        { "AllocNo": 1, "ProjectCode": "P1", "EmpNo": "E1", "EmpName": "Ada", "Percent": 60,
          "ActivityDesc": "Dev", "AllocStartDate": "01 Jan 2024", "AllocEndDate": "31 Jan 2024" },
        { "AllocNo": 3, "ProjectCode": "P1", "EmpNo": "E3", "EmpName": "Ken", "Percent": 100,
          "ActivityDesc": "Dev", "AllocStartDate": "10 Jan 2024", "AllocEndDate": "28 Feb 2024" },
        { "AllocNo": 4, "ProjectCode": "P1", "EmpNo": "E4", "EmpName": "Linus", "Percent": 100,
          "ActivityDesc": "Dev", "AllocStartDate": "01 Jan 2024", "AllocEndDate": "31 Jan 2024" }
    ]);
    std::fs::write(dir.path().join("data.json"), second.to_string()).unwrap();

    let resp = build_gateway_router(Arc::clone(&state))
        .oneshot(post_json("/api/allocations", &full_request("bob")))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["success"], true);

    // a rejected call is audited but is not a run to compare against
    let resp = build_gateway_router(Arc::clone(&state))
        .oneshot(post_json("/api/allocations", &full_request("wrong")))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["success"], false);
    assert_eq!(audit_entries(&audit_dir).len(), 3);

    let resp = build_gateway_router(state)
        .oneshot(post_json("/api/allocations/compare", &compare_request()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let j = body_json(resp).await;
    assert_eq!(j["success"], true);
    assert_eq!(j["runs"], 2);

    let summary = &j["comparison"]["summary"];
    assert_eq!(summary["total_previous"], 2);
    assert_eq!(summary["total_current"], 3);
    assert_eq!(summary["net_change"], 1);
    assert_eq!(summary["added"], 2);
    assert_eq!(summary["removed"], 1);
    assert_eq!(summary["modified"], 1);
    assert_eq!(summary["change_percentage"], 50.0);

    let modified = &j["comparison"]["modified"][0];
    assert_eq!(modified["alloc_no"], 1);
    assert_eq!(
        modified["changes"],
        json!([{ "field": "Percent", "from": 100, "to": 60 }])
    );
    assert_eq!(j["comparison"]["removed"][0]["EmpName"], "Grace");
    assert_eq!(
        j["comparison"]["activity_changes"],
        json!([
            { "activity": "Dev", "before": 1, "after": 3, "change": 2 },
            { "activity": "QA", "before": 1, "after": 0, "change": -1 }
        ])
    );
}

#[tokio::test]
async fn numeric_project_code_round_trips_through_both_services() {
    let dir = tempfile::tempdir().unwrap();
    let records = json!([
        { "ProjectCode": 1042, "AllocStartDate": "01 Jan 2024", "AllocEndDate": "31 Jan 2024" }
    ]);
    let store = spawn_store(dir.path(), records.clone()).await;
    let audit_dir = dir.path().join("response_data");
    let app = build_gateway_router(make_gateway(format!("http://{store}{ALLOCATIONS_PATH}"), &audit_dir));

    let body = json!({
        "username": "bob",
        "password": "bob",
        "projectCode": 1042,
        "allocStartDate": "15 Jan 2024",
        "allocEndDate": "20 Jan 2024"
    })
    .to_string();
    let resp = app.oneshot(post_json("/api/allocations", &body)).await.unwrap();
    let j = body_json(resp).await;
    assert_eq!(j["success"], true);
    assert_eq!(j["status_code"], 200);
    assert_eq!(j["data"], records);
}
