use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::screening::models::{CandidateFacts, Criteria, EvaluationResult, Verdict};

/// Recruiter-controlled outcome, independent of the verdict once overridden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    Interview,
    Hold,
    Reject,
}

#[derive(Debug, Error)]
#[error("decision must be Interview, Hold, or Reject (got '{0}')")]
pub struct InvalidDecision(pub String);

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Interview => "Interview",
            Decision::Hold => "Hold",
            Decision::Reject => "Reject",
        }
    }
}

impl From<Verdict> for Decision {
    /// Default decision for a freshly screened candidate.
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::StrongYes | Verdict::Yes => Decision::Interview,
            Verdict::Maybe => Decision::Hold,
            Verdict::No => Decision::Reject,
        }
    }
}

impl FromStr for Decision {
    type Err = InvalidDecision;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Interview" => Ok(Decision::Interview),
            "Hold" => Ok(Decision::Hold),
            "Reject" => Ok(Decision::Reject),
            other => Err(InvalidDecision(other.to_string())),
        }
    }
}

/// One screened resume. Only `decision` changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub candidate_id: Uuid,
    pub filename: String,
    #[serde(flatten)]
    pub facts: CandidateFacts,
    #[serde(flatten)]
    pub evaluation: EvaluationResult,
    pub decision: Decision,
}

impl Candidate {
    pub fn new(filename: String, facts: CandidateFacts, evaluation: EvaluationResult) -> Self {
        Self {
            candidate_id: Uuid::new_v4(),
            filename,
            decision: Decision::from(evaluation.verdict),
            facts,
            evaluation,
        }
    }
}

/// A resume that could not be screened; recorded without aborting the round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResumeError {
    pub filename: String,
    pub error: String,
}

/// One hiring round. Candidates are kept in rank order.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub session_id: Uuid,
    pub job_title: String,
    pub criteria: Criteria,
    pub candidates: Vec<Candidate>,
    pub errors: Vec<ResumeError>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecisionSummary {
    pub interview: usize,
    pub hold: usize,
    pub reject: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailPreview {
    pub candidate_id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub decision: Decision,
    pub email_subject: String,
    pub email_body: String,
    /// Nothing is ever sent.
    pub simulated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalizeReport {
    pub session_id: Uuid,
    pub job_title: String,
    pub simulated: bool,
    pub summary: DecisionSummary,
    pub email_previews: Vec<EmailPreview>,
}

impl Session {
    /// Read-only projection over the current decisions.
    pub fn finalize_report(&self) -> FinalizeReport {
        let mut summary = DecisionSummary::default();
        let mut email_previews = Vec::new();

        for candidate in &self.candidates {
            match candidate.decision {
                Decision::Interview => {
                    summary.interview += 1;
                    email_previews.push(interview_preview(&self.job_title, candidate));
                }
                Decision::Hold => summary.hold += 1,
                Decision::Reject => summary.reject += 1,
            }
        }

        FinalizeReport {
            session_id: self.session_id,
            job_title: self.job_title.clone(),
            simulated: true,
            summary,
            email_previews,
        }
    }
}

fn interview_preview(job_title: &str, candidate: &Candidate) -> EmailPreview {
    let greeting_name = candidate.facts.name.as_deref().unwrap_or("Candidate");
    EmailPreview {
        candidate_id: candidate.candidate_id,
        name: candidate.facts.name.clone(),
        email: candidate.facts.email.clone(),
        decision: Decision::Interview,
        email_subject: format!("Interview Invitation — {job_title}"),
        email_body: format!(
            "Dear {greeting_name},\n\n\
             Thank you for your interest in the {job_title} position. \
             We were impressed with your background and would like to invite you for an interview.\n\n\
             Please confirm your availability for the proposed time below.\n\n\
             Best regards,\nHiring Team"
        ),
        simulated: true,
    }
}
