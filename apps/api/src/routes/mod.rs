pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::sessions::handlers;
use crate::state::AppState;

/// Upper bound on files in one analyze request; sizes the body limit.
pub const MAX_DOCUMENTS_PER_REQUEST: usize = 50;

pub fn build_router(state: AppState) -> Router {
    // Per-file limits are enforced during ingestion; this only caps the whole body.
    let body_limit = state
        .config
        .max_upload_bytes()
        .saturating_mul(MAX_DOCUMENTS_PER_REQUEST);

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/analyze", post(handlers::handle_analyze))
        .route("/session/:session_id", get(handlers::handle_get_session))
        .route("/override", post(handlers::handle_override))
        .route("/finalize/:session_id", post(handlers::handle_finalize))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::{Config, DEFAULT_MODEL};
    use crate::ingest::DocumentIngestor;
    use crate::screening::ScreeningEngine;
    use crate::sessions::pipeline::SessionPipeline;
    use crate::sessions::store::InMemorySessionStore;

    const BOUNDARY: &str = "screener-test-boundary";

    fn test_config() -> Config {
        Config {
            gemini_api_key: None,
            gemini_model: DEFAULT_MODEL.to_string(),
            force_fallback: true,
            max_upload_size_mb: 1,
            screening_concurrency: 2,
            port: 0,
            rust_log: "info".to_string(),
        }
    }

    fn test_app() -> Router {
        let config = test_config();
        let pipeline = SessionPipeline::new(
            Arc::new(ScreeningEngine::from_config(&config)),
            Arc::new(DocumentIngestor::new(config.max_upload_size_mb)),
            Arc::new(InMemorySessionStore::new()),
            config.screening_concurrency,
        );
        build_router(AppState { config, pipeline })
    }

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a str),
    }

    fn multipart_body(parts: &[Part]) -> String {
        let mut body = String::new();
        for part in parts {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match part {
                Part::Text(name, value) => {
                    body.push_str(&format!(
                        "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                    ));
                }
                Part::File(name, filename, content) => {
                    body.push_str(&format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n{content}\r\n"
                    ));
                }
            }
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        body
    }

    fn analyze_request(parts: &[Part]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/analyze")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&test_app(), empty_request("GET", "/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "screener-api");
    }

    #[tokio::test]
    async fn test_full_session_flow() {
        let app = test_app();

        let (status, created) = send(
            &app,
            analyze_request(&[
                Part::Text("job_title", "Data Scientist"),
                Part::File("jd_pdf", "jd.txt", "Data scientist with Python and ML"),
                Part::File("resumes", "Resume_Ann_Lee.txt", "Ann Lee ann@example.com"),
                Part::File("resumes", "cv_bo_chen.txt", "Bo Chen"),
                Part::File("resumes", "notes.docx", "ignored"),
            ]),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["job_title"], "Data Scientist");
        assert_eq!(created["total_candidates"], 2);
        assert_eq!(created["errors"][0]["filename"], "notes.docx");

        let candidates = created["candidates"].as_array().unwrap();
        let scores: Vec<u64> = candidates
            .iter()
            .map(|c| c["total_score"].as_u64().unwrap())
            .collect();
        assert!(scores[0] >= scores[1]);
        let ann = candidates
            .iter()
            .find(|c| c["filename"] == "Resume_Ann_Lee.txt")
            .unwrap();
        assert_eq!(ann["name"], "Ann Lee");
        assert_eq!(ann["email"], "ann@example.com");

        let session_id = created["session_id"].as_str().unwrap().to_string();
        let candidate_id = candidates[1]["candidate_id"].as_str().unwrap().to_string();

        let (status, session) =
            send(&app, empty_request("GET", &format!("/session/{session_id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(session["candidates"], created["candidates"]);
        assert!(session["criteria"]["required_skills"].is_array());

        let (status, overridden) = send(
            &app,
            json_request(
                "POST",
                "/override",
                json!({
                    "session_id": session_id,
                    "candidate_id": candidate_id,
                    "decision": "Interview"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(overridden["ok"], true);
        assert_eq!(overridden["decision"], "Interview");

        let (status, report) =
            send(&app, empty_request("POST", &format!("/finalize/{session_id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["simulated"], true);
        let summary = &report["summary"];
        let total = summary["interview"].as_u64().unwrap()
            + summary["hold"].as_u64().unwrap()
            + summary["reject"].as_u64().unwrap();
        assert_eq!(total, 2);
        assert_eq!(
            report["email_previews"].as_array().unwrap().len() as u64,
            summary["interview"].as_u64().unwrap()
        );
        assert!(report["email_previews"]
            .as_array()
            .unwrap()
            .iter()
            .any(|p| p["candidate_id"] == candidate_id.as_str()));
    }

    #[tokio::test]
    async fn test_analyze_requires_jd_and_resumes() {
        let app = test_app();

        let (status, body) = send(
            &app,
            analyze_request(&[
                Part::Text("job_title", "Dev"),
                Part::File("resumes", "a.txt", "A"),
            ]),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_ARGUMENT");

        let (status, _) = send(
            &app,
            analyze_request(&[
                Part::Text("job_title", "Dev"),
                Part::File("jd_pdf", "jd.txt", "Backend"),
            ]),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_analyze_drains_unknown_fields() {
        let (status, body) = send(
            &test_app(),
            analyze_request(&[
                Part::Text("job_title", "Dev"),
                Part::Text("recruiter_note", "urgent"),
                Part::File("jd_pdf", "jd.txt", "Backend"),
                Part::File("attachment", "logo.png", "not a resume"),
                Part::File("resumes", "a.txt", "A"),
            ]),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_candidates"], 1);
        assert!(body["errors"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_analyze_rejects_truncated_unknown_field() {
        let mut raw = multipart_body(&[
            Part::Text("job_title", "Dev"),
            Part::File("jd_pdf", "jd.txt", "Backend"),
            Part::File("resumes", "a.txt", "A"),
            Part::File("attachment", "logo.png", "cut off here"),
        ]);
        // Drop the closing boundary so the trailing field never ends.
        raw.truncate(raw.len() - format!("\r\n--{BOUNDARY}--\r\n").len());
        let request = Request::builder()
            .method("POST")
            .uri("/analyze")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(raw))
            .unwrap();

        let (status, body) = send(&test_app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_ARGUMENT");
    }

    #[tokio::test]
    async fn test_analyze_rejects_unsupported_jd() {
        let (status, body) = send(
            &test_app(),
            analyze_request(&[
                Part::Text("job_title", "Dev"),
                Part::File("jd_pdf", "jd.docx", "Backend"),
                Part::File("resumes", "a.txt", "A"),
            ]),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "UNSUPPORTED_FORMAT");
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let app = test_app();
        let (status, body) = send(&app, empty_request("GET", "/session/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");

        let (status, _) = send(
            &app,
            empty_request("POST", &format!("/finalize/{}", uuid::Uuid::new_v4())),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_override_rejects_bad_decision() {
        let (status, body) = send(
            &test_app(),
            json_request(
                "POST",
                "/override",
                json!({"session_id": "x", "candidate_id": "y", "decision": "Maybe"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_ARGUMENT");
    }
}
