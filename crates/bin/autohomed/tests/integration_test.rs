//! End-to-end smoke tests for the full autohomed stack.
//!
//! Each test spins up the complete application (simulated home backend, real
//! services, real pipeline, real axum router) and exercises the HTTP layer
//! via `tower::ServiceExt::oneshot` — no TCP port is bound.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use autohome_adapter_http_axum::router;
use autohome_adapter_http_axum::state::AppState;
use autohome_adapter_virtual::MockDeviceAdapter;
use autohome_app::event_bus::InProcessEventBus;
use autohome_app::pipeline::IntentPipeline;
use autohome_app::services::approval_service::ApprovalService;
use autohome_app::services::dashboard_service::DashboardService;
use autohome_app::services::dispatch_service::{CommandDispatcher, DispatcherConfig};
use autohome_app::services::guardrail_service::GuardrailService;

/// Build a fully-wired router backed by the simulated home.
///
/// The debounce quiet period is shortened so tests that wait for a value to
/// reach the wire stay fast.
async fn app() -> axum::Router {
    let adapter = MockDeviceAdapter::new();
    let publisher = Arc::new(InProcessEventBus::new(256));
    let guardrails = Arc::new(GuardrailService::new());
    let approvals = Arc::new(ApprovalService::new());
    let dashboard = Arc::new(DashboardService::new(
        Arc::clone(&publisher),
        Arc::clone(&approvals),
    ));
    let dispatcher = Arc::new(CommandDispatcher::new(
        adapter,
        Arc::clone(&publisher),
        Arc::clone(&guardrails),
        DispatcherConfig {
            quiet_period: Duration::from_millis(25),
            call_timeout: Duration::from_secs(1),
        },
    ));
    dispatcher.refresh().await.expect("mock backend should list");
    let pipeline = Arc::new(IntentPipeline::new(
        guardrails, approvals, dashboard, dispatcher, publisher,
    ));
    router::build(AppState::new(pipeline))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let resp = app()
        .await
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn should_start_with_an_empty_dashboard_in_auto_mode() {
    let resp = app()
        .await
        .oneshot(
            Request::builder()
                .uri("/api/dashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["operation_mode"], json!("auto"));
    assert_eq!(body["approval_queue"], json!([]));
    assert_eq!(body["chat_history"], json!([]));
}

#[tokio::test]
async fn should_dispatch_a_toggle_against_the_simulated_home() {
    let resp = app()
        .await
        .oneshot(json_request(
            "POST",
            "/api/intents",
            json!({ "type": "toggle_device", "device": "switch.coffee_machine", "on": true }),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["outcome"], json!("dispatched"));
    assert_eq!(body["commands"][0]["service"], json!("switch.turn_on"));
}

#[tokio::test]
async fn should_debounce_a_brightness_change_to_the_wire() {
    let app = app().await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/intents",
            json!({
                "type": "set_level",
                "device": "light.bedroom",
                "value": { "percent": 40 },
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["outcome"], json!("debounce_pending"));

    // let the quiet period elapse so the value lands on the backend
    tokio::time::sleep(Duration::from_millis(100)).await;
}

#[tokio::test]
async fn should_run_the_full_approval_round_trip() {
    let app = app().await;

    // gate the garage behind a confirmation
    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/guardrails/cover.garage",
            json!({ "enabled": true, "require_confirmation": true }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/intents",
            json!({ "type": "toggle_device", "device": "cover.garage", "on": true }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["outcome"], json!("queued"));
    let id = body["item"]["id"].as_str().unwrap().to_string();

    // the queued item shows up on the dashboard
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/dashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["approval_queue"][0]["status"], json!("pending"));

    // approving dispatches the parked intent
    let resp = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/dashboard/approvals/{id}"),
            json!({ "decision": "approved" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["approval_queue"][0]["status"], json!("approved"));
}

#[tokio::test]
async fn should_block_an_out_of_bounds_temperature() {
    let app = app().await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/guardrails/climate.thermostat_hall",
            json!({
                "enabled": true,
                "min_value": 55.0,
                "max_value": 85.0,
                "require_confirmation": false,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/intents",
            json!({
                "type": "set_level",
                "device": "climate.thermostat_hall",
                "value": { "temperature": 95.0 },
            }),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = body_json(resp).await;
    assert_eq!(body["reasons"][0]["reason"], json!("value_out_of_bounds"));
}

#[tokio::test]
async fn should_pause_and_resume_the_pipeline() {
    let app = app().await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/api/dashboard/operation-mode",
            json!({ "mode": "paused" }),
        ))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["operation_mode"], json!("paused"));

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/intents",
            json!({ "type": "toggle_device", "device": "light.bedroom", "on": true }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/api/dashboard/operation-mode",
            json!({ "mode": "auto" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/intents",
            json!({ "type": "toggle_device", "device": "light.bedroom", "on": true }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
