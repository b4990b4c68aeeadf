//! Shared prompt fragments. Each service that calls the LLM keeps its own
//! prompts.rs alongside it and builds on these.

/// Appended to every prompt; the transport also requests `application/json`.
pub const JSON_ONLY_INSTRUCTION: &str = "Respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";
