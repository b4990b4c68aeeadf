//! Provider-then-synthesizer combinator shared by extraction and evaluation.

use std::future::Future;

use tracing::{debug, warn};

use crate::llm_client::LlmError;
use crate::screening::QuotaExceeded;

/// Runs the provider attempt if there is one, substituting `fallback` on any failure
/// except quota exhaustion, which is systemic and must reach the caller.
///
/// `attempt` is `None` when force-fallback mode is on (or no provider is configured).
pub async fn provider_or_fallback<T, Fut, F>(
    label: &str,
    attempt: Option<Fut>,
    fallback: F,
) -> Result<T, QuotaExceeded>
where
    Fut: Future<Output = Result<T, LlmError>>,
    F: FnOnce() -> T,
{
    let Some(attempt) = attempt else {
        debug!("{label}: provider disabled, synthesizing");
        return Ok(fallback());
    };

    match attempt.await {
        Ok(value) => Ok(value),
        Err(LlmError::QuotaExceeded) => Err(QuotaExceeded),
        Err(e) => {
            warn!("{label}: provider failed ({e}), using deterministic fallback");
            Ok(fallback())
        }
    }
}
