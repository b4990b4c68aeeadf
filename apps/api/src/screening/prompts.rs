//! Provider prompt templates for the screening module.
//!
//! Placeholders in `{braces}` are filled by [`render`] before sending.

/// Criteria extraction. Replace `{jd_text}`.
pub const CRITERIA_PROMPT_TEMPLATE: &str = r#"Extract the hiring criteria from this job description.

Return a JSON object with this EXACT schema:
{"required_skills": [], "nice_to_have_skills": [], "min_experience": 2, "max_experience": 5, "role_level": "Mid"}

{json_only}

Job description:
{jd_text}"#;

/// Candidate fact extraction. Replace `{resume_text}`.
pub const CANDIDATE_PROMPT_TEMPLATE: &str = r#"Extract the candidate's details from this resume.

Return a JSON object with this EXACT schema:
{"name": "", "email": "", "total_experience_years": 0, "skills": [], "education": ""}

{json_only}

Resume:
{resume_text}"#;

/// Candidate scoring. Replace every `{placeholder}`.
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"Score this candidate against the job.

Scoring bands: skill 0-40, experience 0-20, project 0-15, education 0-10, role 0-15.
Verdict: "Strong Yes" >= 80, "Yes" >= 65, "Maybe" >= 50, "No" < 50.

Job: required skills = {required}; experience = {min_exp}-{max_exp} years; level = {level}
Candidate: skills = {skills}; experience = {experience} years; education = {education}

Return a JSON object with this EXACT schema:
{"skill_score": 0, "experience_score": 0, "project_score": 0, "education_score": 0, "role_score": 0, "total_score": 0, "verdict": "No", "flags": "", "reasoning": ""}

{json_only}"#;

/// Fills `{name}` placeholders in one pass over `template`.
///
/// Substituted text is never rescanned, so resume or provider text that happens
/// to contain `{skills}` stays literal. Braces that do not name a known
/// placeholder (the JSON schemas above) are copied through unchanged.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
