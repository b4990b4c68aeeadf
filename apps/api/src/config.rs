use anyhow::{Context, Result};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Application configuration loaded from environment variables.
/// Read once at startup and treated as immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct Config {
    /// Provider credential. When absent the service runs in force-fallback mode.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    /// When set, the provider is never consulted and every result is synthesized.
    pub force_fallback: bool,
    pub max_upload_size_mb: usize,
    /// Max resumes screened concurrently within one analyze request.
    pub screening_concurrency: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let gemini_api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        let force_fallback = match std::env::var("FORCE_FALLBACK")
            .or_else(|_| std::env::var("DEMO_MODE"))
        {
            Ok(raw) => parse_bool(&raw)
                .with_context(|| format!("FORCE_FALLBACK must be a boolean, got '{raw}'"))?,
            Err(_) => false,
        };

        Ok(Config {
            // No credential means there is nothing to call.
            force_fallback: force_fallback || gemini_api_key.is_none(),
            gemini_api_key,
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            max_upload_size_mb: parse_env("MAX_UPLOAD_SIZE_MB", 10)?,
            screening_concurrency: parse_env::<usize>("SCREENING_CONCURRENCY", 4)?.max(1),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_size_mb * 1024 * 1024
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
