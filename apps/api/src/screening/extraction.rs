//! Extraction Service — job criteria and candidate facts, provider first, synthesizer second.

use std::borrow::Cow;

use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::LlmClient;
use crate::screening::fallback::{synthesize_candidate, synthesize_criteria};
use crate::screening::models::{CandidateFacts, Criteria};
use crate::screening::prompts::{render, CANDIDATE_PROMPT_TEMPLATE, CRITERIA_PROMPT_TEMPLATE};
use crate::screening::resilience::provider_or_fallback;
use crate::screening::QuotaExceeded;

/// Character budgets applied to provider prompts only.
pub const JD_CHAR_LIMIT: usize = 2800;
pub const RESUME_CHAR_LIMIT: usize = 2200;

const TRUNCATION_MARKER: &str = "\n[truncated]";

/// Cuts `text` to `limit` chars and marks the cut. Never splits a code point.
pub fn truncate(text: &str, limit: usize) -> Cow<'_, str> {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => Cow::Owned(format!("{}{TRUNCATION_MARKER}", &text[..byte_idx])),
        None => Cow::Borrowed(text),
    }
}

pub async fn extract_criteria(
    llm: Option<&LlmClient>,
    jd_text: &str,
) -> Result<Criteria, QuotaExceeded> {
    let jd_excerpt = truncate(jd_text, JD_CHAR_LIMIT);
    let prompt = render(
        CRITERIA_PROMPT_TEMPLATE,
        &[("json_only", JSON_ONLY_INSTRUCTION), ("jd_text", &*jd_excerpt)],
    );

    // The synthesizer sees the full text; truncation only bounds prompt cost.
    provider_or_fallback(
        "JD",
        llm.map(|llm| llm.call_json::<Criteria>(&prompt, "JD")),
        || synthesize_criteria(jd_text),
    )
    .await
}

pub async fn extract_candidate(
    llm: Option<&LlmClient>,
    resume_text: &str,
    identity: &str,
) -> Result<CandidateFacts, QuotaExceeded> {
    let resume_excerpt = truncate(resume_text, RESUME_CHAR_LIMIT);
    let prompt = render(
        CANDIDATE_PROMPT_TEMPLATE,
        &[
            ("json_only", JSON_ONLY_INSTRUCTION),
            ("resume_text", &*resume_excerpt),
        ],
    );
    let label = format!("RESUME {identity}");

    let facts = provider_or_fallback(
        &label,
        llm.map(|llm| llm.call_json::<CandidateFacts>(&prompt, &label)),
        || synthesize_candidate(identity, resume_text),
    )
    .await?;

    Ok(facts.normalized())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::llm_client::testing::{failed, rate_limited, ScriptedTransport};
    use crate::llm_client::RetryPolicy;

    fn llm(transport: &Arc<ScriptedTransport>) -> LlmClient {
        LlmClient::new(transport.clone(), RetryPolicy::default())
    }

    #[test]
    fn test_truncate_short_text_is_borrowed() {
        assert!(matches!(truncate("abc", 5), Cow::Borrowed("abc")));
        assert!(matches!(truncate("abcde", 5), Cow::Borrowed(_)));
    }

    #[test]
    fn test_truncate_marks_the_cut() {
        assert_eq!(truncate("abcdef", 3), "abc\n[truncated]");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("ééééé", 2), "éé\n[truncated]");
    }

    #[tokio::test]
    async fn test_force_fallback_never_calls_provider() {
        let criteria = extract_criteria(None, "React frontend developer").await.unwrap();
        assert_eq!(criteria, synthesize_criteria("React frontend developer"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_criteria_are_used_when_available() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(r#"{
            "required_skills": ["Rust", "Tokio"],
            "nice_to_have_skills": ["Kafka"],
            "min_experience": 3,
            "max_experience": 6,
            "role_level": "Senior"
        }"#
        .to_string())]));
        let criteria = extract_criteria(Some(&llm(&transport)), "Rust engineer")
            .await
            .unwrap();
        assert_eq!(criteria.required_skills, vec!["Rust", "Tokio"]);
        assert_eq!(criteria.role_level.as_deref(), Some("Senior"));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_fall_back_to_synthesized_facts() {
        let transport = Arc::new(ScriptedTransport::new(vec![failed(), failed()]));
        let text = "Jane Roe\njane.roe@example.org";
        let facts = extract_candidate(Some(&llm(&transport)), text, "Resume_Jane_Roe.pdf")
            .await
            .unwrap();
        assert_eq!(facts, synthesize_candidate("Resume_Jane_Roe.pdf", text));
        assert_eq!(facts.email.as_deref(), Some("jane.roe@example.org"));
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quota_exhaustion_is_not_masked() {
        let transport = Arc::new(ScriptedTransport::new(vec![rate_limited(), rate_limited()]));
        let result = extract_candidate(Some(&llm(&transport)), "text", "cv.pdf").await;
        assert_eq!(result, Err(QuotaExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_truncation_does_not_change_fallback_output() {
        let long_text = format!("{} contact: someone@example.net", "x".repeat(5000));
        let transport = Arc::new(ScriptedTransport::new(vec![failed(), failed()]));
        let facts = extract_candidate(Some(&llm(&transport)), &long_text, "a.pdf")
            .await
            .unwrap();
        // The email sits past the prompt budget but the synthesizer still finds it.
        assert_eq!(facts.email.as_deref(), Some("someone@example.net"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_provider_fields_become_unknown() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(
            r#"{"name": "Ada", "email": "", "total_experience_years": 4, "skills": ["C"], "education": " "}"#
                .to_string(),
        )]));
        let facts = extract_candidate(Some(&llm(&transport)), "text", "ada.pdf")
            .await
            .unwrap();
        assert_eq!(facts.name.as_deref(), Some("Ada"));
        assert_eq!(facts.email, None);
        assert_eq!(facts.education, None);
        assert_eq!(facts.total_experience_years, Some(4));
    }
}
