// HTTP tests for the web UI backend.
//
// Drives the Axum router in-process with tower's `oneshot`, no socket.
// Only built with `--features web`.

#![cfg(feature = "web")]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use casewriter::assemble::templates::TemplateSet;
use casewriter::config::Config;
use casewriter::knowledge::base::KnowledgeBase;
use casewriter::mapping::semantic::NgramMatcher;
use casewriter::pipeline::Pipeline;
use casewriter::web::handlers::analyze::MISSING_INPUT;
use casewriter::web::{build_router, AppState};

fn app() -> Router {
    let pipeline = Pipeline::from_parts(
        Arc::new(KnowledgeBase::builtin().unwrap()),
        TemplateSet::builtin(),
        Box::new(NgramMatcher),
        Config::default(),
    );
    build_router(AppState {
        pipeline: Arc::new(pipeline),
    })
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================
// GET /health, GET /
// ============================================================

#[tokio::test]
async fn health_is_ok() {
    let response = app().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn index_serves_html() {
    let response = app().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"), "got {content_type}");
}

// ============================================================
// POST /api/analyze
// ============================================================

#[tokio::test]
async fn analyze_requires_case_and_question() {
    let response = app()
        .oneshot(post_json(
            "/api/analyze",
            serde_json::json!({ "case_text": "Some case.", "question_text": "   " }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], MISSING_INPUT);
}

#[tokio::test]
async fn analyze_returns_answer_and_matches() {
    let response = app()
        .oneshot(post_json(
            "/api/analyze",
            serde_json::json!({
                "case_text": "Netflix relies on network effects and switching costs.",
                "question_text": "Why is Netflix hard to displace?",
                "top_n": 5,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let answer = body["answer"].as_str().unwrap();
    assert!(answer.contains("Network Effects"), "answer: {answer}");
    assert!(body["theories"]
        .as_array()
        .unwrap()
        .iter()
        .any(|t| t == "PlatformStrategy"));
    assert!(!body["matches"].as_array().unwrap().is_empty());
    assert!(body["word_count"].as_u64().unwrap() > 0);
    assert!(body["key_terms"].is_array());
}

// ============================================================
// GET /api/concepts
// ============================================================

#[tokio::test]
async fn concepts_filtered_by_theory() {
    let response = app().oneshot(get("/api/concepts?theory=tce")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let concepts = body["concepts"].as_array().unwrap();
    assert!(!concepts.is_empty());
    assert_eq!(body["total"].as_u64().unwrap() as usize, concepts.len());
    assert!(concepts.iter().all(|c| c["theory"] == "TCE"));
}

#[tokio::test]
async fn concepts_unknown_theory_is_bad_request() {
    let response = app().oneshot(get("/api/concepts?theory=Astrology")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================
// POST /api/export
// ============================================================

#[tokio::test]
async fn export_returns_docx_attachment() {
    let response = app()
        .oneshot(post_json(
            "/api/export",
            serde_json::json!({ "answer": "## Strategic Concepts\nNetwork effects." }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains(".docx"), "got {disposition}");

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"PK"));
}

#[tokio::test]
async fn export_empty_answer_is_bad_request() {
    let response = app()
        .oneshot(post_json("/api/export", serde_json::json!({ "answer": "  " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
