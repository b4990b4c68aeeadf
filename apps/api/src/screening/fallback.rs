//! Deterministic Fallback Synthesizer — network-free stand-ins for every provider call.
//!
//! Every numeric field and categorical choice is derived from a stable hash of the
//! identity (the resume filename, lower-cased), never from time or randomness, so the
//! same file always gets the same facts and scores, in any process.
//!
//! Pinned contract:
//! - `stable_hash(seed)` = the 16-byte MD5 digest of `seed` as a big-endian `u128`
//! - `stable_range(seed, lo, hi)` = `lo + stable_hash(seed) % (hi - lo + 1)`
//! - per-field seeds are `identity + suffix` (`"exp"`, `"skill"`, `"proj"`, `"edu"`, `"role"`)

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use md5::{Digest, Md5};

use crate::screening::models::{CandidateFacts, Criteria, EvaluationResult, SubScores, Verdict};

const SKILL_POOL: &[&str] = &[
    "Python",
    "JavaScript",
    "SQL",
    "Machine Learning",
    "React",
    "Docker",
    "AWS",
    "TensorFlow",
    "PyTorch",
    "Node.js",
    "Git",
    "REST APIs",
    "Data Analysis",
    "Kubernetes",
    "FastAPI",
    "TypeScript",
    "PostgreSQL",
    "CI/CD",
    "Agile",
    "Communication",
];

const DEGREES: &[&str] = &[
    "B.Sc. Computer Science",
    "B.Tech. Information Technology",
    "M.Sc. Data Science",
    "B.E. Computer Engineering",
    "M.Tech. Machine Learning",
];

/// Experience above `max_experience + OVERQUALIFIED_MARGIN` is flagged.
const OVERQUALIFIED_MARGIN: u32 = 2;
/// Skill sub-scores below this are flagged.
const SKILL_FLOOR: u32 = 18;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\w.+-]+@[\w-]+\.[a-z]{2,}").expect("valid email regex"));

static RESUME_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(resume|cv|curriculum_vitae|candidate)[_\-\s]*")
        .expect("valid prefix regex")
});

// ────────────────────────────────────────────────────────────────────────────
// Stable hashing
// ────────────────────────────────────────────────────────────────────────────

pub fn stable_hash(seed: &str) -> u128 {
    let digest = Md5::digest(seed.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest);
    u128::from_be_bytes(bytes)
}

/// Deterministic integer in `[lo, hi]`.
pub fn stable_range(seed: &str, lo: u32, hi: u32) -> u32 {
    debug_assert!(lo <= hi);
    let span = (hi - lo) as u128 + 1;
    lo + (stable_hash(seed) % span) as u32
}

// ────────────────────────────────────────────────────────────────────────────
// Job criteria
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Archetype {
    DataMl,
    Frontend,
    Backend,
    Infra,
    Generalist,
}

impl Archetype {
    /// First archetype whose keywords appear as substrings of the lower-cased text.
    pub fn classify(jd_text: &str) -> Self {
        let text = jd_text.to_lowercase();

        if contains_any(&text, &["machine learning", "ml", "deep learning", "data scientist"]) {
            Archetype::DataMl
        } else if contains_any(&text, &["frontend", "react", "vue", "angular", "ui/ux"]) {
            Archetype::Frontend
        } else if contains_any(&text, &["backend", "java", "spring", "node", "golang"]) {
            Archetype::Backend
        } else if contains_any(&text, &["devops", "cloud", "aws", "azure", "infrastructure"]) {
            Archetype::Infra
        } else {
            Archetype::Generalist
        }
    }

    pub fn criteria(self) -> Criteria {
        match self {
            Archetype::DataMl => template(
                &["Python", "Machine Learning", "TensorFlow/PyTorch", "Data Analysis", "SQL"],
                &["MLflow", "AWS SageMaker", "Kubernetes", "Spark"],
                "Mid",
                (2, 6),
            ),
            Archetype::Frontend => template(
                &["JavaScript", "React", "HTML/CSS", "REST APIs", "Git"],
                &["TypeScript", "Next.js", "TailwindCSS", "Testing"],
                "Mid",
                (1, 5),
            ),
            Archetype::Backend => template(
                &["Backend Development", "REST APIs", "SQL", "Git", "Docker"],
                &["Microservices", "Kafka", "Redis", "CI/CD"],
                "Mid",
                (2, 6),
            ),
            Archetype::Infra => template(
                &["Cloud (AWS/Azure/GCP)", "Docker", "Kubernetes", "CI/CD", "Linux"],
                &["Terraform", "Ansible", "Prometheus", "Helm"],
                "Senior",
                (3, 7),
            ),
            Archetype::Generalist => template(
                &["Python", "Problem Solving", "Communication", "Git", "REST APIs"],
                &["Cloud", "Docker", "Agile", "Testing"],
                "Mid",
                (2, 5),
            ),
        }
    }
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

fn template(required: &[&str], nice: &[&str], level: &str, band: (u32, u32)) -> Criteria {
    Criteria {
        required_skills: to_owned_vec(required),
        nice_to_have_skills: to_owned_vec(nice),
        min_experience: Some(band.0),
        max_experience: Some(band.1),
        role_level: Some(level.to_string()),
    }
}

pub fn synthesize_criteria(jd_text: &str) -> Criteria {
    Archetype::classify(jd_text).criteria()
}

fn to_owned_vec(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Candidate facts
// ────────────────────────────────────────────────────────────────────────────

/// `Resume_Ahmed_Khan.pdf` → `Ahmed Khan`, `cv.pdf` → `Candidate`.
pub fn display_name_from_filename(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stripped = RESUME_PREFIX_RE.replace(&stem, "");
    let spaced = stripped.replace(['_', '-'], " ");
    let name = title_case(spaced.trim());

    if name.is_empty() {
        "Candidate".to_string()
    } else {
        name
    }
}

fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

pub fn find_email(text: &str) -> Option<String> {
    EMAIL_RE.find(text).map(|m| m.as_str().to_string())
}

pub fn synthesize_candidate(identity: &str, resume_text: &str) -> CandidateFacts {
    let name = display_name_from_filename(identity);
    let seed = identity.to_lowercase();
    let h = stable_hash(&seed);

    let skill_count = 4 + (h % 5) as u32;
    let mut skills: Vec<String> = Vec::new();
    for i in 0..skill_count {
        let skill = SKILL_POOL[((h >> i) % SKILL_POOL.len() as u128) as usize];
        if !skills.iter().any(|s| s == skill) {
            skills.push(skill.to_string());
        }
    }

    let email = find_email(resume_text)
        .unwrap_or_else(|| format!("{}@email.com", name.to_lowercase().replace(' ', ".")));

    CandidateFacts {
        email: Some(email),
        total_experience_years: Some(stable_range(&format!("{seed}exp"), 1, 8)),
        skills,
        education: Some(DEGREES[(h % DEGREES.len() as u128) as usize].to_string()),
        name: Some(name),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Evaluation
// ────────────────────────────────────────────────────────────────────────────

fn canned_reasoning(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::StrongYes => {
            "Strong technical alignment with required skills and good experience fit. \
             Recommended for fast-tracking."
        }
        Verdict::Yes => {
            "Solid candidate with most required skills present. \
             Experience level aligns well with the role."
        }
        Verdict::Maybe => {
            "Partially meets requirements. \
             Worth a screening call to assess gaps in key skill areas."
        }
        Verdict::No => {
            "Significant gaps in required technical skills or experience level. \
             Does not meet minimum criteria."
        }
    }
}

pub fn synthesize_evaluation(
    criteria: &Criteria,
    facts: &CandidateFacts,
    identity: &str,
) -> EvaluationResult {
    let seed = identity.to_lowercase();
    let score =
        |suffix: &str, lo: u32, hi: u32| stable_range(&format!("{seed}{suffix}"), lo, hi) as i64;

    let scores = SubScores {
        skill: score("skill", 14, 36),
        experience: score("exp", 8, 18),
        project: score("proj", 5, 13),
        education: score("edu", 5, 9),
        role: score("role", 6, 13),
    };

    let overqualified = matches!(
        (facts.total_experience_years, criteria.max_experience),
        (Some(years), Some(max))
            if years > 0 && max > 0 && years.saturating_sub(max) > OVERQUALIFIED_MARGIN
    );
    let flags = if overqualified {
        "Overqualified"
    } else if (scores.skill as u32) < SKILL_FLOOR {
        "Missing Required Skills"
    } else {
        ""
    };

    let total = (scores.skill + scores.experience + scores.project + scores.education + scores.role)
        as u32;
    let reasoning = canned_reasoning(Verdict::from_total(total));

    EvaluationResult::from_sub_scores(scores, flags.to_string(), reasoning.to_string())
}
