//! Structured records produced by extraction and evaluation.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const SKILL_MAX: u32 = 40;
pub const EXPERIENCE_MAX: u32 = 20;
pub const PROJECT_MAX: u32 = 15;
pub const EDUCATION_MAX: u32 = 10;
pub const ROLE_MAX: u32 = 15;

/// Hiring criteria extracted once per round from the job description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criteria {
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub nice_to_have_skills: Vec<String>,
    /// `min <= max` is not enforced; an inverted band is just a weak signal.
    #[serde(default, deserialize_with = "lenient_years")]
    pub min_experience: Option<u32>,
    #[serde(default, deserialize_with = "lenient_years")]
    pub max_experience: Option<u32>,
    #[serde(default)]
    pub role_level: Option<String>,
}

/// Facts extracted from one resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFacts {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_years")]
    pub total_experience_years: Option<u32>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub education: Option<String>,
}

impl CandidateFacts {
    /// Blank strings from the provider mean "unknown".
    pub fn normalized(mut self) -> Self {
        self.name = non_blank(self.name);
        self.email = non_blank(self.email);
        self.education = non_blank(self.education);
        self
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Four-level judgment derived from the total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "Strong Yes")]
    StrongYes,
    Yes,
    Maybe,
    No,
}

impl Verdict {
    /// `>=80` Strong Yes, `>=65` Yes, `>=50` Maybe, else No.
    /// Shared by the provider and fallback paths.
    pub fn from_total(total: u32) -> Self {
        if total >= 80 {
            Verdict::StrongYes
        } else if total >= 65 {
            Verdict::Yes
        } else if total >= 50 {
            Verdict::Maybe
        } else {
            Verdict::No
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::StrongYes => "Strong Yes",
            Verdict::Yes => "Yes",
            Verdict::Maybe => "Maybe",
            Verdict::No => "No",
        }
    }
}

/// Raw sub-scores before clamping. Signed so out-of-range provider output survives parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubScores {
    pub skill: i64,
    pub experience: i64,
    pub project: i64,
    pub education: i64,
    pub role: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationResult {
    pub skill_score: u32,
    pub experience_score: u32,
    pub project_score: u32,
    pub education_score: u32,
    pub role_score: u32,
    pub total_score: u32,
    pub verdict: Verdict,
    pub flags: String,
    pub reasoning: String,
}

impl EvaluationResult {
    /// The only constructor: clamps every sub-score, then derives total and verdict.
    pub fn from_sub_scores(scores: SubScores, flags: String, reasoning: String) -> Self {
        let skill_score = clamp_score(scores.skill, SKILL_MAX);
        let experience_score = clamp_score(scores.experience, EXPERIENCE_MAX);
        let project_score = clamp_score(scores.project, PROJECT_MAX);
        let education_score = clamp_score(scores.education, EDUCATION_MAX);
        let role_score = clamp_score(scores.role, ROLE_MAX);
        let total_score =
            skill_score + experience_score + project_score + education_score + role_score;

        Self {
            skill_score,
            experience_score,
            project_score,
            education_score,
            role_score,
            total_score,
            verdict: Verdict::from_total(total_score),
            flags,
            reasoning,
        }
    }
}

fn clamp_score(value: i64, max: u32) -> u32 {
    value.clamp(0, max as i64) as u32
}

/// Evaluation as returned by the provider. Its own total/verdict are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderEvaluation {
    #[serde(default, deserialize_with = "lenient_int")]
    pub skill_score: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub experience_score: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub project_score: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub education_score: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub role_score: Option<i64>,
    #[serde(default)]
    pub flags: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

impl From<ProviderEvaluation> for EvaluationResult {
    fn from(raw: ProviderEvaluation) -> Self {
        let scores = SubScores {
            skill: raw.skill_score.unwrap_or(0),
            experience: raw.experience_score.unwrap_or(0),
            project: raw.project_score.unwrap_or(0),
            education: raw.education_score.unwrap_or(0),
            role: raw.role_score.unwrap_or(0),
        };
        EvaluationResult::from_sub_scores(
            scores,
            raw.flags.unwrap_or_default(),
            raw.reasoning.unwrap_or_default(),
        )
    }
}

/// Accepts integers, floats and numeric strings; anything else is unknown.
fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    })
}

fn lenient_years<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_int(deserializer)?.map(|v| v.clamp(0, u32::MAX as i64) as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_boundaries_have_no_gap_or_overlap() {
        for total in 0..=100 {
            let expected = match total {
                80..=100 => Verdict::StrongYes,
                65..=79 => Verdict::Yes,
                50..=64 => Verdict::Maybe,
                _ => Verdict::No,
            };
            assert_eq!(Verdict::from_total(total), expected, "total={total}");
        }
    }

    #[test]
    fn test_verdict_serde_uses_display_labels() {
        assert_eq!(
            serde_json::to_string(&Verdict::StrongYes).unwrap(),
            r#""Strong Yes""#
        );
        let parsed: Verdict = serde_json::from_str(r#""Maybe""#).unwrap();
        assert_eq!(parsed, Verdict::Maybe);
    }

    #[test]
    fn test_out_of_range_sub_scores_are_clamped_before_totalling() {
        let result = EvaluationResult::from_sub_scores(
            SubScores {
                skill: 55,
                experience: -4,
                project: 15,
                education: 99,
                role: 7,
            },
            String::new(),
            String::new(),
        );
        assert_eq!(result.skill_score, 40);
        assert_eq!(result.experience_score, 0);
        assert_eq!(result.education_score, 10);
        assert_eq!(result.total_score, 40 + 15 + 10 + 7);
        assert_eq!(result.verdict, Verdict::StrongYes);
    }

    #[test]
    fn test_provider_total_and_verdict_are_ignored() {
        let raw: ProviderEvaluation = serde_json::from_str(
            r#"{
                "skill_score": 30, "experience_score": 15, "project_score": 10,
                "education_score": 7, "role_score": 10,
                "total_score": 99, "verdict": "Strong Yes",
                "flags": "", "reasoning": "Good fit."
            }"#,
        )
        .unwrap();
        let result = EvaluationResult::from(raw);
        assert_eq!(result.total_score, 72);
        assert_eq!(result.verdict, Verdict::Yes);
        assert_eq!(result.reasoning, "Good fit.");
    }

    #[test]
    fn test_lenient_numbers_in_provider_output() {
        let raw: ProviderEvaluation = serde_json::from_str(
            r#"{"skill_score": "31", "experience_score": 12.6, "project_score": null}"#,
        )
        .unwrap();
        assert_eq!(raw.skill_score, Some(31));
        assert_eq!(raw.experience_score, Some(13));
        assert_eq!(raw.project_score, None);
        assert_eq!(raw.role_score, None);
    }

    #[test]
    fn test_criteria_tolerates_missing_fields() {
        let criteria: Criteria =
            serde_json::from_str(r#"{"required_skills": ["Rust"], "max_experience": "5"}"#)
                .unwrap();
        assert_eq!(criteria.required_skills, vec!["Rust"]);
        assert!(criteria.nice_to_have_skills.is_empty());
        assert_eq!(criteria.min_experience, None);
        assert_eq!(criteria.max_experience, Some(5));
    }

    #[test]
    fn test_candidate_facts_negative_years_floor_at_zero() {
        let facts: CandidateFacts =
            serde_json::from_str(r#"{"name": "  ", "total_experience_years": -3}"#).unwrap();
        let facts = facts.normalized();
        assert_eq!(facts.total_experience_years, Some(0));
        assert_eq!(facts.name, None);
    }
}
