//! HTTP surface tests driven through the router without a socket

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use workout_rag::providers::mock::{HashEmbedder, ScriptedLlm};
use workout_rag::providers::InMemoryVectorStore;
use workout_rag::server::{AppState, RagServer};
use workout_rag::storage::SqliteTranscriptStore;
use workout_rag::RagConfig;

const BOUNDARY: &str = "workout-rag-test-boundary";

fn router(llm: ScriptedLlm, upload_dir: &std::path::Path) -> Router {
    let mut config = RagConfig::default();
    config.server.upload_dir = upload_dir.to_path_buf();
    config.storage.index_path = None;

    let state = AppState::from_providers(
        config.clone(),
        Arc::new(HashEmbedder::new(64)),
        Arc::new(llm),
        Arc::new(InMemoryVectorStore::new()),
        Arc::new(SqliteTranscriptStore::in_memory().unwrap()),
    );
    RagServer::with_state(config, state).build_router()
}

fn profile_json(name: &str) -> Value {
    json!({
        "name": name,
        "age": 29,
        "gender": "female",
        "height": 165.0,
        "weight": 60.0,
        "experience_level": "Intermediate",
        "goal": 2,
        "training_environment": "gym",
        "time_available": 60,
        "additional_info": ""
    })
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_upload(filename: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
         Content-Type: text/plain\r\n\r\n{c}\r\n--{b}--\r\n",
        b = BOUNDARY,
        f = filename,
        c = content
    );
    Request::builder()
        .method(Method::POST)
        .uri("/api/documents")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(ScriptedLlm::new(), dir.path());

    let (status, body) = send(
        &app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["documents_indexed"], 0);
}

#[tokio::test]
async fn test_plan_rejects_blank_name() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(ScriptedLlm::new(), dir.path());

    let (status, body) = send(&app, post_json("/api/workout/plan", profile_json("  "))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "validation_error");
}

#[tokio::test]
async fn test_plan_falls_back_when_model_fails() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(ScriptedLlm::failing(), dir.path());

    let (status, body) = send(&app, post_json("/api/workout/plan", profile_json("Riley"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Riley");
    assert_eq!(
        body["plan"]["Monday"],
        json!(["30 minutes walking", "Basic stretching"])
    );
    assert_eq!(body["plan"].as_object().unwrap().len(), 7);
}

#[tokio::test]
async fn test_plan_from_model_reply() {
    let dir = tempfile::tempdir().unwrap();
    let llm = ScriptedLlm::with_replies([
        r#"Plan: {"Tuesday": ["Deadlift: 4 sets x 5 reps"], "Thursday": ["Bench press: 4 sets x 6 reps"]}"#,
    ]);
    let app = router(llm, dir.path());

    let (status, body) = send(&app, post_json("/api/workout/plan", profile_json("Riley"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plan"]["Tuesday"], json!(["Deadlift: 4 sets x 5 reps"]));
    assert!(body["plan"].get("Monday").is_none());
}

#[tokio::test]
async fn test_adjust_rejects_malformed_plan() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(ScriptedLlm::failing(), dir.path());

    for plan in [json!({}), json!({"Monday": []}), json!({"Funday": ["Squats"]})] {
        let (status, body) = send(
            &app,
            post_json(
                "/api/workout/adjust",
                json!({"current_plan": plan, "adjustment": "add one rest day", "name": "Riley"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "validation_error");
    }

    let (status, body) = send(
        &app,
        post_json(
            "/api/workout/adjust",
            json!({
                "current_plan": {"monday": ["Squats: 3 sets x 8 reps"]},
                "adjustment": "add one rest day",
                "name": "Riley"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Riley");
}

#[tokio::test]
async fn test_assessment_rounds_bmi() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(ScriptedLlm::failing(), dir.path());

    let (status, body) = send(
        &app,
        post_json("/api/workout/assessment", profile_json("Riley")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bmi"], json!(22.0));
    assert!(body["assessment"].as_str().unwrap().starts_with("<p>"));
}

#[tokio::test]
async fn test_insights_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(ScriptedLlm::new(), dir.path());

    let (status, body) = send(
        &app,
        post_json(
            "/api/workout/insights",
            json!({"text": "--- Imported Chat History --- I love running but have knee pain"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let insights = body["insights"].as_array().unwrap();
    assert!(insights.iter().any(|i| i.as_str().unwrap().contains("running")));
    assert!(insights.iter().any(|i| i.as_str().unwrap().contains("knee")));

    let (_, body) = send(
        &app,
        post_json("/api/workout/insights", json!({"text": "I love running"})),
    )
    .await;
    assert_eq!(body["insights"], json!([]));
    assert_eq!(
        body["summary"],
        "No specific workout insights found in the conversation."
    );
}

#[tokio::test]
async fn test_document_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(ScriptedLlm::new(), dir.path());

    let (status, body) = send(
        &app,
        multipart_upload(
            "mobility.txt",
            "Hip openers improve squat depth.\n\nThoracic rotations help overhead pressing.",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["file_name"], "mobility.txt");
    assert_eq!(body["chunks"], 1);
    assert!(dir.path().join("mobility.txt").exists());

    let (status, body) = send(
        &app,
        Request::builder().uri("/api/documents").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["documents"], json!(["mobility.txt"]));

    let (status, body) = send(
        &app,
        Request::builder()
            .method(Method::DELETE)
            .uri("/api/documents")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["chunks_removed"], 1);
    assert!(!dir.path().join("mobility.txt").exists());

    let (_, body) = send(
        &app,
        Request::builder().uri("/api/documents").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(body["documents"], json!([]));
}

#[tokio::test]
async fn test_upload_rejects_unsupported_type() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(ScriptedLlm::new(), dir.path());

    let (status, body) = send(&app, multipart_upload("sheet.xlsx", "a,b,c")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "unsupported_type");
}

#[tokio::test]
async fn test_chat_history_empty_for_new_session() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(ScriptedLlm::new(), dir.path());

    let (status, body) = send(
        &app,
        Request::builder()
            .uri("/api/chat/fresh-session")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session_id"], "fresh-session");
    assert_eq!(body["messages"], json!([]));
}
