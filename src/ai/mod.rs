//! Text-generation client used by the recommendation orchestrator.
//!
//! The orchestrator only sees [`AiClient`]; the production implementation is
//! [`GeminiClient`]. Each call is a single attempt: no retries, no backoff.

mod gemini;

use async_trait::async_trait;
use thiserror::Error;

pub use gemini::GeminiClient;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("model returned no text")]
    EmptyContent,
}

#[async_trait]
pub trait AiClient: Send + Sync {
    /// Identifier recorded on every recommendation this client produced.
    fn model(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, AiError>;
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(inner) = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
    else {
        return text;
    };
    let inner = inner.trim_start();
    inner
        .strip_suffix("```")
        .map(str::trim)
        .unwrap_or(inner)
}

#[cfg(test)]
pub use scripted::ScriptedAi;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fences_with_language_tag() {
        assert_eq!(strip_json_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[test]
    fn fences_without_tag() {
        assert_eq!(strip_json_fences("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[test]
    fn plain_text_untouched() {
        assert_eq!(strip_json_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }
}
