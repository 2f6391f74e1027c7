use async_trait::async_trait;
use thiserror::Error;

pub mod gemini;
pub mod groq;

pub use self::gemini::GeminiProvider;
pub use self::groq::GroqProvider;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{provider} api key is missing")]
    MissingApiKey { provider: &'static str },
    #[error("{provider} api key is invalid")]
    InvalidApiKey { provider: &'static str },
    #[error("network error: {0}")]
    Network(String),
    #[error("api error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("provider returned no content")]
    EmptyResponse,
    #[error("failed to decode provider response: {0}")]
    Decode(String),
}

/// A hosted model that turns a single user prompt into text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(10))
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| LlmError::Network(e.to_string()))
}

/// Models frequently wrap JSON answers in markdown fences; peel them off.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::strip_code_fences;

    #[test]
    fn strip_code_fences_handles_language_tag() {
        let text = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(text), "{\"a\": 1}");
    }

    #[test]
    fn strip_code_fences_leaves_plain_text() {
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn strip_code_fences_without_closing_fence() {
        assert_eq!(strip_code_fences("```\n{}"), "{}");
    }
}
