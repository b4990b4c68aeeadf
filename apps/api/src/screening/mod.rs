//! Screening core: criteria extraction, candidate extraction, evaluation.
//! Every entry point tries the provider first and falls back to the deterministic
//! synthesizer; only quota exhaustion escapes as an error.

pub mod evaluation;
pub mod extraction;
pub mod fallback;
pub mod models;
pub mod prompts;
pub mod resilience;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::screening::models::{CandidateFacts, Criteria, EvaluationResult};

/// The provider is globally unusable for this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("provider quota exceeded")]
pub struct QuotaExceeded;

/// Seam between the session pipeline and the screening core.
///
/// Carried in the pipeline as `Arc<dyn Screener>`.
#[async_trait]
pub trait Screener: Send + Sync {
    async fn extract_criteria(&self, jd_text: &str) -> Result<Criteria, QuotaExceeded>;

    async fn extract_candidate(
        &self,
        resume_text: &str,
        identity: &str,
    ) -> Result<CandidateFacts, QuotaExceeded>;

    async fn evaluate(
        &self,
        criteria: &Criteria,
        facts: &CandidateFacts,
        identity: &str,
    ) -> Result<EvaluationResult, QuotaExceeded>;
}

/// Live screener: provider when available, synthesizer otherwise.
#[derive(Clone)]
pub struct ScreeningEngine {
    llm: Option<LlmClient>,
    force_fallback: bool,
}

impl ScreeningEngine {
    pub fn new(llm: Option<LlmClient>, force_fallback: bool) -> Self {
        Self {
            llm,
            force_fallback,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let llm = config
            .gemini_api_key
            .clone()
            .map(|key| LlmClient::gemini(key, config.gemini_model.clone()));
        Self::new(llm, config.force_fallback)
    }

    /// `None` means every call goes straight to the synthesizer.
    fn live(&self) -> Option<&LlmClient> {
        if self.force_fallback {
            None
        } else {
            self.llm.as_ref()
        }
    }

    pub fn mode(&self) -> &'static str {
        if self.live().is_some() {
            "provider"
        } else {
            "fallback"
        }
    }
}

#[async_trait]
impl Screener for ScreeningEngine {
    async fn extract_criteria(&self, jd_text: &str) -> Result<Criteria, QuotaExceeded> {
        extraction::extract_criteria(self.live(), jd_text).await
    }

    async fn extract_candidate(
        &self,
        resume_text: &str,
        identity: &str,
    ) -> Result<CandidateFacts, QuotaExceeded> {
        extraction::extract_candidate(self.live(), resume_text, identity).await
    }

    async fn evaluate(
        &self,
        criteria: &Criteria,
        facts: &CandidateFacts,
        identity: &str,
    ) -> Result<EvaluationResult, QuotaExceeded> {
        evaluation::evaluate(self.live(), criteria, facts, identity).await
    }
}
