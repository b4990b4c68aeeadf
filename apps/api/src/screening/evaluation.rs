//! Evaluation Engine — scores one candidate against the round's criteria.

use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::LlmClient;
use crate::screening::fallback::synthesize_evaluation;
use crate::screening::models::{CandidateFacts, Criteria, EvaluationResult, ProviderEvaluation};
use crate::screening::prompts::{render, EVALUATION_PROMPT_TEMPLATE};
use crate::screening::resilience::provider_or_fallback;
use crate::screening::QuotaExceeded;

const PROMPT_REQUIRED_SKILLS: usize = 6;
const PROMPT_CANDIDATE_SKILLS: usize = 8;
const PROMPT_EDUCATION_CHARS: usize = 100;

pub async fn evaluate(
    llm: Option<&LlmClient>,
    criteria: &Criteria,
    facts: &CandidateFacts,
    identity: &str,
) -> Result<EvaluationResult, QuotaExceeded> {
    let prompt = build_evaluation_prompt(criteria, facts);
    let label = format!("EVAL {identity}");

    let (prompt_ref, label_ref) = (&prompt, &label);
    let attempt = llm.map(|llm| async move {
        // Clamping and verdict derivation happen in the conversion.
        llm.call_json::<ProviderEvaluation>(prompt_ref, label_ref)
            .await
            .map(EvaluationResult::from)
    });

    provider_or_fallback(&label, attempt, || {
        synthesize_evaluation(criteria, facts, identity)
    })
    .await
}

fn build_evaluation_prompt(criteria: &Criteria, facts: &CandidateFacts) -> String {
    let unknown = || "?".to_string();

    let required = criteria
        .required_skills
        .iter()
        .take(PROMPT_REQUIRED_SKILLS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let skills = facts
        .skills
        .iter()
        .take(PROMPT_CANDIDATE_SKILLS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let education: String = facts
        .education
        .as_deref()
        .unwrap_or_default()
        .chars()
        .take(PROMPT_EDUCATION_CHARS)
        .collect();

    let known = |v: Option<u32>| v.map(|v| v.to_string()).unwrap_or_else(unknown);
    let min_exp = known(criteria.min_experience);
    let max_exp = known(criteria.max_experience);
    let experience = known(facts.total_experience_years);
    let level = criteria.role_level.clone().unwrap_or_else(unknown);

    render(
        EVALUATION_PROMPT_TEMPLATE,
        &[
            ("json_only", JSON_ONLY_INSTRUCTION),
            ("required", required.as_str()),
            ("min_exp", min_exp.as_str()),
            ("max_exp", max_exp.as_str()),
            ("level", level.as_str()),
            ("skills", skills.as_str()),
            ("experience", experience.as_str()),
            ("education", education.as_str()),
        ],
    )
}
