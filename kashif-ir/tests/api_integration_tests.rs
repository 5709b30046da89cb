//! Integration tests for kashif-ir API endpoints

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use base64::Engine;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

use kashif_common::events::EventBus;
use kashif_common::types::{AnalysisFinding, Prediction};
use kashif_ir::analysis::AnalysisTimeline;
use kashif_ir::classify::ClassificationPipeline;
use kashif_ir::db::reports::ReportStore;
use kashif_ir::model::{InferenceSession, ModelGateway, ModelProvider};
use kashif_ir::wizard::Wizard;
use kashif_ir::AppState;

struct ScriptedSession {
    labels: Vec<String>,
    predictions: Vec<Prediction>,
}

#[async_trait]
impl InferenceSession for ScriptedSession {
    async fn predict(&self, _image: &[u8]) -> kashif_common::Result<Vec<Prediction>> {
        Ok(self.predictions.clone())
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }
}

struct ScriptedProvider {
    predictions: Vec<Prediction>,
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    async fn fetch(&self) -> kashif_common::Result<Box<dyn InferenceSession>> {
        Ok(Box::new(ScriptedSession {
            labels: self.predictions.iter().map(|p| p.label.clone()).collect(),
            predictions: self.predictions.clone(),
        }))
    }
}

/// Short reveal script so submit() completes quickly in tests
fn quick_findings() -> Vec<AnalysisFinding> {
    (1..=3)
        .map(|i| AnalysisFinding {
            sequence: i,
            title: format!("Finding {}", i),
            detail: String::new(),
            reveal_delay_ms: 5 * i as u64,
        })
        .collect()
}

/// Test helper: create test app with an in-memory store and a scripted model
async fn create_test_app_with(predictions: Vec<Prediction>) -> axum::Router {
    let event_bus = EventBus::new(100);
    let store = ReportStore::in_memory()
        .await
        .expect("Failed to create in-memory store");

    let gateway = Arc::new(ModelGateway::new(
        Box::new(ScriptedProvider { predictions }),
        event_bus.clone(),
    ));
    let pipeline = Arc::new(ClassificationPipeline::new(
        Arc::clone(&gateway),
        event_bus.clone(),
    ));
    let timeline = AnalysisTimeline::new(quick_findings(), event_bus.clone());
    let wizard = Arc::new(Wizard::new(timeline, store.clone(), event_bus.clone()));

    let state = AppState::new(event_bus, gateway, pipeline, wizard, store);
    kashif_ir::build_router(state)
}

async fn create_test_app() -> axum::Router {
    create_test_app_with(vec![
        Prediction {
            label: "Pothole".to_string(),
            probability: 0.7,
        },
        Prediction {
            label: "Plain".to_string(),
            probability: 0.3,
        },
    ])
    .await
}

/// Test helper: issue a request against the router
async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_string(&json).unwrap())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn image_b64() -> String {
    base64::engine::general_purpose::STANDARD.encode(b"jpeg-bytes")
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app().await;

    let (status, json) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["uptime_seconds"].is_number());
}

#[tokio::test]
async fn test_model_load_and_status() {
    let app = create_test_app().await;

    let (status, json) = send(&app, "GET", "/model/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["phase"], "unloaded");

    let (status, json) = send(&app, "POST", "/model/load", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["phase"], "ready");

    let (status, json) = send(&app, "GET", "/model/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["phase"], "ready");
}

#[tokio::test]
async fn test_classify_before_load_is_conflict() {
    let app = create_test_app().await;

    let (status, json) = send(
        &app,
        "POST",
        "/classify",
        Some(json!({ "image": image_b64() })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "MODEL_NOT_READY");
}

#[tokio::test]
async fn test_classify_returns_ranked_decision() {
    let app = create_test_app().await;
    send(&app, "POST", "/model/load", None).await;

    let (status, json) = send(
        &app,
        "POST",
        "/classify",
        Some(json!({ "image": image_b64() })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["decision"]["label"], "Pothole");
    assert_eq!(json["decision"]["severity"], "severe");
    assert_eq!(json["ranked"][0]["label"], "Pothole");
    assert_eq!(json["ranked"][1]["label"], "Plain");

    // Decision is attached to the wizard draft
    let (_, snapshot) = send(&app, "GET", "/wizard", None).await;
    assert_eq!(snapshot["decision"]["label"], "Pothole");
}

#[tokio::test]
async fn test_classify_rejects_invalid_base64() {
    let app = create_test_app().await;
    send(&app, "POST", "/model/load", None).await;

    let (status, json) = send(
        &app,
        "POST",
        "/classify",
        Some(json!({ "image": "not base64!!!" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_wizard_advance_refused_while_gate_closed() {
    let app = create_test_app().await;

    let (status, json) = send(&app, "POST", "/wizard/advance", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "STEP_GATE_FAILED");

    let (_, snapshot) = send(&app, "GET", "/wizard", None).await;
    assert_eq!(snapshot["step"], "locate");
}

#[tokio::test]
async fn test_full_wizard_flow_over_http() {
    let app = create_test_app().await;

    let (status, draft) = send(
        &app,
        "PUT",
        "/wizard/draft",
        Some(json!({
            "road_image_ref": "road.jpg",
            "description": "Front wheel hit an unmarked pothole",
            "location_text": "King Fahd Road, Riyadh",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(draft["location_text"], "King Fahd Road, Riyadh");

    for expected in ["evidence", "details", "review"] {
        let (status, json) = send(&app, "POST", "/wizard/advance", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["step"], expected);
    }

    let (status, json) = send(&app, "POST", "/wizard/submit", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["outcome"], "submitted");
    let report_id = json["report"]["id"].as_str().unwrap().to_string();

    let (status, reports) = send(&app, "GET", "/reports", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reports.as_array().unwrap().len(), 1);
    assert_eq!(reports[0]["id"], report_id.as_str());

    let (status, report) = send(&app, "GET", &format!("/reports/{}", report_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["status"], "created");
}

#[tokio::test]
async fn test_submit_before_review_is_conflict() {
    let app = create_test_app().await;

    let (status, json) = send(&app, "POST", "/wizard/submit", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "STEP_GATE_FAILED");
}

#[tokio::test]
async fn test_wizard_reset_returns_to_first_step() {
    let app = create_test_app().await;

    send(
        &app,
        "PUT",
        "/wizard/draft",
        Some(json!({ "location_text": "Olaya Street" })),
    )
    .await;
    send(&app, "POST", "/wizard/advance", None).await;

    let (status, _) = send(&app, "POST", "/wizard/reset", None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, snapshot) = send(&app, "GET", "/wizard", None).await;
    assert_eq!(snapshot["step"], "locate");
    assert_eq!(snapshot["draft"]["location_text"], "");
}

#[tokio::test]
async fn test_report_lookup_errors() {
    let app = create_test_app().await;

    let (status, json) = send(&app, "GET", "/reports/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "BAD_REQUEST");

    let missing = uuid::Uuid::new_v4();
    let (status, json) = send(&app, "GET", &format!("/reports/{}", missing), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "NOT_FOUND");
}
