//! Turns one JD and a batch of resumes into a ranked, recruiter-editable session.
//!
//! Flow: extract JD text → extract criteria → for each resume (bounded parallelism):
//!       extract text → extract facts → evaluate → collect → stable sort → publish.
//!
//! Per-resume failures are recorded and skipped. Quota exhaustion aborts the whole
//! round and nothing is published.

use std::sync::Arc;

use anyhow::anyhow;
use bytes::Bytes;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio::task::JoinError;
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::ingest::{IngestError, TextExtractor};
use crate::screening::models::Criteria;
use crate::screening::{QuotaExceeded, Screener};
use crate::sessions::models::{Candidate, Decision, FinalizeReport, ResumeError, Session};
use crate::sessions::store::SessionStore;

/// One uploaded file, as received from the transport layer.
#[derive(Debug, Clone)]
pub struct Document {
    pub filename: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone)]
pub struct CreateSessionRequest {
    pub job_title: String,
    pub jd: Document,
    pub resumes: Vec<Document>,
}

#[derive(Clone)]
pub struct SessionPipeline {
    screener: Arc<dyn Screener>,
    extractor: Arc<dyn TextExtractor>,
    store: Arc<dyn SessionStore>,
    concurrency: usize,
}

impl SessionPipeline {
    pub fn new(
        screener: Arc<dyn Screener>,
        extractor: Arc<dyn TextExtractor>,
        store: Arc<dyn SessionStore>,
        concurrency: usize,
    ) -> Self {
        Self {
            screener,
            extractor,
            store,
            concurrency: concurrency.max(1),
        }
    }

    /// Screens the whole batch and publishes the session atomically.
    pub async fn create(&self, request: CreateSessionRequest) -> Result<Session, AppError> {
        let job_title = request.job_title.trim().to_string();
        if job_title.is_empty() {
            return Err(AppError::InvalidArgument(
                "job_title cannot be empty".to_string(),
            ));
        }
        if request.resumes.is_empty() {
            return Err(AppError::InvalidArgument(
                "at least one resume is required".to_string(),
            ));
        }

        info!(
            "Screening round '{}': {} resume(s), jd={}",
            job_title,
            request.resumes.len(),
            request.jd.filename
        );

        // The JD is not per-resume: any failure here aborts the round.
        let jd_text = extract_off_thread(self.extractor.clone(), &request.jd)
            .await
            .map_err(|e| {
                AppError::Internal(anyhow!("spawn_blocking failed extracting JD: {e}"))
            })??;
        let criteria = Arc::new(self.screener.extract_criteria(&jd_text).await?);
        info!(
            "Criteria: {} required skill(s), level={:?}",
            criteria.required_skills.len(),
            criteria.role_level
        );

        let mut candidates = Vec::with_capacity(request.resumes.len());
        let mut errors = Vec::new();

        let unit = ResumeScreening {
            screener: self.screener.clone(),
            extractor: self.extractor.clone(),
            criteria: criteria.clone(),
        };
        // `buffered` yields in input order, so ties keep upload order after the sort.
        let mut outcomes = stream::iter(request.resumes)
            .map(move |doc| unit.clone().run(doc))
            .buffered(self.concurrency);

        while let Some(outcome) = outcomes.next().await {
            // Returning drops the stream: in-flight resumes are cancelled, the rest never start.
            match outcome? {
                Ok(candidate) => candidates.push(candidate),
                Err(resume_error) => errors.push(resume_error),
            }
        }
        drop(outcomes);

        // Stable: equal scores keep upload order.
        candidates.sort_by(|a: &Candidate, b: &Candidate| {
            b.evaluation.total_score.cmp(&a.evaluation.total_score)
        });

        let session = Session {
            session_id: Uuid::new_v4(),
            job_title,
            criteria: Arc::try_unwrap(criteria).unwrap_or_else(|shared| (*shared).clone()),
            candidates,
            errors,
            created_at: Utc::now(),
        };
        self.store.insert(session.clone()).await;

        info!(
            "Session {} published: {} candidate(s), {} error(s)",
            session.session_id,
            session.candidates.len(),
            session.errors.len()
        );
        Ok(session)
    }

    pub async fn retrieve(&self, session_id: &str) -> Result<Session, AppError> {
        let id = parse_id(session_id, "Session not found.")?;
        self.store
            .get(id)
            .await
            .ok_or_else(|| AppError::NotFound("Session not found.".to_string()))
    }

    pub async fn override_decision(
        &self,
        session_id: &str,
        candidate_id: &str,
        decision: &str,
    ) -> Result<Candidate, AppError> {
        let decision: Decision = decision.parse()?;
        let session_id = parse_id(session_id, "Session not found.")?;
        let candidate_id = parse_id(candidate_id, "Candidate not found in session.")?;

        let candidate = self
            .store
            .update_decision(session_id, candidate_id, decision)
            .await?;
        info!(
            "Override: session={session_id}, candidate={candidate_id}, decision={}",
            decision.as_str()
        );
        Ok(candidate)
    }

    /// Side-effect free; no email is sent.
    pub async fn finalize(&self, session_id: &str) -> Result<FinalizeReport, AppError> {
        let session = self.retrieve(session_id).await?;
        let report = session.finalize_report();
        info!(
            "Finalize: session={}, interview={}, hold={}, reject={}",
            report.session_id,
            report.summary.interview,
            report.summary.hold,
            report.summary.reject
        );
        Ok(report)
    }
}

/// Everything one resume needs, owned, so units run independently of the request.
#[derive(Clone)]
struct ResumeScreening {
    screener: Arc<dyn Screener>,
    extractor: Arc<dyn TextExtractor>,
    criteria: Arc<Criteria>,
}

impl ResumeScreening {
    async fn run(self, doc: Document) -> Result<Result<Candidate, ResumeError>, QuotaExceeded> {
        let extracted = extract_off_thread(self.extractor.clone(), &doc).await;
        let text = match extracted {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => return Ok(Err(rejected(doc.filename, e.to_string()))),
            Err(e) => {
                let reason = format!("Failed to parse '{}': {e}", doc.filename);
                return Ok(Err(rejected(doc.filename, reason)));
            }
        };

        let filename = doc.filename;
        let facts = self.screener.extract_candidate(&text, &filename).await?;
        let evaluation = self
            .screener
            .evaluate(&self.criteria, &facts, &filename)
            .await?;
        info!(
            "  {filename}: score={}, verdict={}",
            evaluation.total_score,
            evaluation.verdict.as_str()
        );

        Ok(Ok(Candidate::new(filename, facts, evaluation)))
    }
}

fn rejected(filename: String, error: String) -> ResumeError {
    error!("  {filename} failed: {error}");
    ResumeError { filename, error }
}

/// PDF parsing is CPU-bound; keep it off the async workers. A panicking parser
/// surfaces as a `JoinError` instead of taking the request down.
async fn extract_off_thread(
    extractor: Arc<dyn TextExtractor>,
    doc: &Document,
) -> Result<Result<String, IngestError>, JoinError> {
    let bytes = doc.bytes.clone();
    let filename = doc.filename.clone();
    tokio::task::spawn_blocking(move || extractor.extract_text(&bytes, &filename)).await
}

/// Unparseable ids can never match anything stored.
fn parse_id(raw: &str, not_found: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::NotFound(not_found.to_string()))
}
