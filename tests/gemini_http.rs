//! `GeminiService` against a local httpmock server.

use gazette_report::pipeline::extract::build_request;
use gazette_report::{
    CompletionService, ErrorCategory, GazetteError, GeminiService, PageText, SchemaExtractor,
    ServiceConfig,
};
use httpmock::{Method::POST, MockServer};
use serde_json::json;
use std::sync::Arc;

const PATH: &str = "/v1beta/models/test-model:generateContent";

fn service(server: &MockServer) -> GeminiService {
    GeminiService::new(&ServiceConfig {
        api_key: Some("test-key".into()),
        api_base: server.url("/v1beta"),
        model: "test-model".into(),
        temperature: None,
    })
    .expect("service")
}

fn pages() -> Vec<PageText> {
    vec![PageText {
        page_number: 1,
        text: "Resolución de Consejo Directivo".into(),
    }]
}

fn candidate(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn sends_key_header_and_schema_and_returns_text() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(PATH)
                .header("x-goog-api-key", "test-key")
                .body_contains("\"responseMimeType\":\"application/json\"")
                .body_contains("\"responseSchema\"")
                .body_contains("--- PÁGINA 1 ---");
            then.status(200)
                .json_body(candidate(r#"{"gazetteDate":"Lunes, 20 de mayo de 2024"}"#));
        })
        .await;

    let text = service(&server)
        .complete(&build_request(&pages()))
        .await
        .expect("completion");

    mock.assert_async().await;
    assert_eq!(
        text.as_deref(),
        Some(r#"{"gazetteDate":"Lunes, 20 de mayo de 2024"}"#)
    );
}

#[tokio::test]
async fn extractor_over_http_normalizes_answer() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(PATH);
            then.status(200).json_body(candidate(
                &json!({
                    "gazetteDate": "Lunes, 20 de mayo de 2024",
                    "norms": [{
                        "sector": "Vivienda",
                        "normId": "R.C.D. N° 010-2024-SUNASS-CD",
                        "title": "Aprueban fórmula tarifaria",
                        "publicationDate": "20/05/2024",
                        "summary": "Fórmula tarifaria de la EPS.",
                        "relevanceToWaterSector": "Alta",
                        "pageNumber": 1.0
                    }]
                })
                .to_string(),
            ));
        })
        .await;

    let extractor = SchemaExtractor::new(Arc::new(service(&server)));
    let result = extractor.extract(&pages()).await.expect("analysis");
    assert_eq!(result.norms.len(), 1);
    assert_eq!(result.norms[0].page_number, 1);
    assert!(result.designated_appointments.is_empty());
}

#[tokio::test]
async fn error_status_is_extraction_error_with_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(PATH);
            then.status(403).body("API key not valid");
        })
        .await;

    let err = service(&server)
        .complete(&build_request(&pages()))
        .await
        .expect_err("403");
    assert!(
        matches!(err, GazetteError::ServiceStatus { status: 403, ref body } if body.contains("API key"))
    );
    assert_eq!(err.category(), ErrorCategory::Extraction);
}

#[tokio::test]
async fn non_json_envelope_is_malformed() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(PATH);
            then.status(200).body("<html>oops</html>");
        })
        .await;

    let err = service(&server)
        .complete(&build_request(&pages()))
        .await
        .expect_err("not json");
    assert!(matches!(err, GazetteError::MalformedResponse { .. }));
}

#[tokio::test]
async fn candidate_without_text_is_none() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(PATH);
            then.status(200)
                .json_body(json!({ "candidates": [{ "finishReason": "SAFETY" }] }));
        })
        .await;

    let text = service(&server)
        .complete(&build_request(&pages()))
        .await
        .expect("no error");
    assert!(text.is_none());
}

#[tokio::test]
async fn blocked_prompt_is_request_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(PATH);
            then.status(200)
                .json_body(json!({ "promptFeedback": { "blockReason": "SAFETY" } }));
        })
        .await;

    let err = service(&server)
        .complete(&build_request(&pages()))
        .await
        .expect_err("blocked");
    assert!(matches!(err, GazetteError::ServiceRequest { ref reason } if reason.contains("SAFETY")));
}

#[tokio::test]
async fn unreachable_service_is_request_error() {
    let svc = GeminiService::new(&ServiceConfig {
        api_key: Some("k".into()),
        api_base: "http://127.0.0.1:9/v1beta".into(),
        ..ServiceConfig::default()
    })
    .unwrap();
    let err = svc
        .complete(&build_request(&pages()))
        .await
        .expect_err("connection refused");
    assert!(matches!(err, GazetteError::ServiceRequest { .. }));
}
