//! Axum route handlers for the screening session API.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::sessions::models::{Candidate, Decision, FinalizeReport, ResumeError, Session};
use crate::sessions::pipeline::{CreateSessionRequest, Document};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub job_title: String,
    pub total_candidates: usize,
    pub candidates: Vec<Candidate>,
    pub errors: Vec<ResumeError>,
}

impl From<Session> for CreateSessionResponse {
    fn from(session: Session) -> Self {
        Self {
            session_id: session.session_id,
            job_title: session.job_title,
            total_candidates: session.candidates.len(),
            candidates: session.candidates,
            errors: session.errors,
        }
    }
}

/// Missing fields deserialize as empty and are rejected by the pipeline.
#[derive(Debug, Deserialize)]
pub struct OverrideRequest {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub candidate_id: String,
    #[serde(default)]
    pub decision: String,
}

#[derive(Debug, Serialize)]
pub struct OverrideResponse {
    pub ok: bool,
    pub candidate_id: Uuid,
    pub decision: Decision,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /analyze
///
/// Multipart fields: `job_title` (text), `jd_pdf` (file), `resumes` (file, repeated).
pub async fn handle_analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<CreateSessionResponse>, AppError> {
    let mut job_title = String::new();
    let mut jd: Option<Document> = None;
    let mut resumes = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidArgument(format!("malformed multipart body: {e}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "job_title" => {
                job_title = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidArgument(format!("job_title: {e}")))?;
            }
            "jd_pdf" | "resumes" => {
                let filename = field.file_name().unwrap_or("unknown").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidArgument(format!("{filename}: {e}")))?;
                let document = Document { filename, bytes };
                if field_name == "jd_pdf" {
                    jd = Some(document);
                } else {
                    resumes.push(document);
                }
            }
            other => {
                // Drain unknown fields so the stream can advance.
                field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidArgument(format!("{other}: {e}")))?;
            }
        }
    }

    let jd = jd.ok_or_else(|| AppError::InvalidArgument("jd_pdf is required".to_string()))?;

    let session = state
        .pipeline
        .create(CreateSessionRequest {
            job_title,
            jd,
            resumes,
        })
        .await?;

    Ok(Json(CreateSessionResponse::from(session)))
}

/// GET /session/:session_id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Session>, AppError> {
    Ok(Json(state.pipeline.retrieve(&session_id).await?))
}

/// POST /override
pub async fn handle_override(
    State(state): State<AppState>,
    Json(req): Json<OverrideRequest>,
) -> Result<Json<OverrideResponse>, AppError> {
    let candidate = state
        .pipeline
        .override_decision(&req.session_id, &req.candidate_id, &req.decision)
        .await?;

    Ok(Json(OverrideResponse {
        ok: true,
        candidate_id: candidate.candidate_id,
        decision: candidate.decision,
    }))
}

/// POST /finalize/:session_id
///
/// Simulated: builds email previews, sends nothing.
pub async fn handle_finalize(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<FinalizeReport>, AppError> {
    Ok(Json(state.pipeline.finalize(&session_id).await?))
}
