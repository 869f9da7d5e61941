// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use campaign_insights::insight::{MockClient, FALLBACK_UNEXPECTED};
use campaign_insights::{router, AppState, DashboardService, StaleResponsePolicy};

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

const CSV: &str = "Email Name,Sent,Open Rate,Click Rate\n\
Promo Blast,100,25.5,3\n\
Weekly News,200,40,1.5\n\
Winback,50,12,0.4\n";

fn test_router(client: MockClient) -> Router {
    let svc = DashboardService::new(Arc::new(client), StaleResponsePolicy::Discard);
    router(AppState::new(svc))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<String>) -> (StatusCode, Json) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(b) => {
            builder = builder.header("content-type", "application/json");
            Body::from(b)
        }
        None => Body::empty(),
    };
    let resp = app
        .clone()
        .oneshot(builder.body(body).expect("build request"))
        .await
        .expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let v = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, v)
}

async fn upload(app: &Router, csv: &str) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("POST")
        .uri("/dataset")
        .header("content-type", "text/csv")
        .body(Body::from(csv.to_string()))
        .expect("build POST /dataset");
    let resp = app.clone().oneshot(req).await.expect("oneshot /dataset");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Json::Null))
}

#[tokio::test]
async fn health_returns_ok() {
    let app = test_router(MockClient::replying_text("x"));
    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn upload_then_filter_then_view() {
    let app = test_router(MockClient::replying_text("x"));

    let (status, info) = upload(&app, CSV).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["rows"], 3);
    assert_eq!(info["headers"][0], "Email Name");

    let (status, snap) = send(
        &app,
        "PUT",
        "/filters",
        Some(json!({ "search": "", "min_open_rate": "20", "max_click_rate": "abc" }).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snap["visible_rows"], 2);
    assert_eq!(snap["criteria"]["max_click_rate"], Json::Null);

    let (status, criteria) = send(&app, "GET", "/filters", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(criteria["min_open_rate"], json!(20.0));
    assert_eq!(criteria["name_query"], Json::Null);

    let (_, view) = send(&app, "GET", "/view", None).await;
    let ids: Vec<u64> = view["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![0, 1]);
    assert_eq!(view["rows"][1]["values"][0], "Weekly News");
    assert_eq!(view["rows"][1]["values"][2], 40.0);
}

#[tokio::test]
async fn bad_upload_is_400_and_keeps_previous_dataset() {
    let app = test_router(MockClient::replying_text("x"));
    upload(&app, CSV).await;

    let (status, err) = upload(&app, "Email Name,Sent\nPromo\n").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "parse_error");
    assert!(err["message"].as_str().unwrap().contains("line 2"));

    let (_, info) = send(&app, "GET", "/dataset", None).await;
    assert_eq!(info["rows"], 3);
}

#[tokio::test]
async fn insight_without_selection_is_409() {
    let app = test_router(MockClient::replying_text("x"));
    upload(&app, CSV).await;

    let (status, err) = send(&app, "POST", "/insight", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"], "invalid_state");

    let (_, state) = send(&app, "GET", "/state", None).await;
    assert_eq!(state["insight"], Json::Null);
    assert_eq!(state["loading"], false);
}

#[tokio::test]
async fn select_and_request_insight() {
    let app = test_router(MockClient::replying_text("Strong opens, weak clicks."));
    upload(&app, CSV).await;

    let (status, snap) = send(&app, "POST", "/selection", Some(r#"{"row": 2}"#.into())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snap["selection"], 2);

    let (status, snap) = send(&app, "POST", "/insight", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snap["loading"], false);
    assert_eq!(snap["insight"]["text"], "Strong opens, weak clicks.");
    assert_eq!(snap["insight"]["record_name"], "Winback");
    assert_eq!(snap["insight"]["outcome"], "generated");

    // changing filters drops both selection and insight
    let (_, snap) = send(&app, "PUT", "/filters", Some(r#"{"search": "win"}"#.into())).await;
    assert_eq!(snap["selection"], Json::Null);
    assert_eq!(snap["insight"], Json::Null);
}

#[tokio::test]
async fn selecting_row_outside_view_is_409() {
    let app = test_router(MockClient::replying_text("x"));
    upload(&app, CSV).await;
    send(&app, "PUT", "/filters", Some(r#"{"search": "promo"}"#.into())).await;

    let (status, _) = send(&app, "POST", "/selection", Some(r#"{"row": 1}"#.into())).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn unexpected_reply_surfaces_fallback_text() {
    let app = test_router(MockClient::replying(json!({ "candidates": [] })));
    upload(&app, CSV).await;
    send(&app, "POST", "/selection", Some(r#"{"row": 0}"#.into())).await;

    let (status, snap) = send(&app, "POST", "/insight", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snap["loading"], false);
    assert_eq!(snap["insight"]["text"], FALLBACK_UNEXPECTED);
    assert_eq!(snap["insight"]["outcome"], "unexpected_response");
}

#[tokio::test]
async fn delete_selection_clears_it() {
    let app = test_router(MockClient::replying_text("x"));
    upload(&app, CSV).await;
    send(&app, "POST", "/selection", Some(r#"{"row": 0}"#.into())).await;
    let (status, snap) = send(&app, "DELETE", "/selection", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snap["selection"], Json::Null);
}
