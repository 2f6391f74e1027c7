use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::llm::{CompletionProvider, LlmError};

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Empty message received.")]
    EmptyMessage,
    #[error("chat is unavailable: {0}")]
    Unavailable(String),
    #[error("chat provider failed: {0}")]
    Provider(#[from] LlmError),
}

pub fn chat_prompt(user_message: &str) -> String {
    format!(
        r#"
You are an expert digital health assistant trained in cancer awareness and women's health.

Your task is to answer user questions specifically about **breast cancer** in a conversational yet medically reliable way.
Please follow these principles:

1. Only rely on credible and peer-reviewed medical sources such as:
   - American Cancer Society (https://www.cancer.org)
   - National Cancer Institute (https://www.cancer.gov)
   - Mayo Clinic (https://www.mayoclinic.org)
   - World Health Organization (https://www.who.int)
   - Susan G. Komen Foundation (https://komen.org)

2. Answer clearly, concisely, and empathetically. Avoid overly complex medical jargon.
3. If you don't have a certain answer, politely guide the user to speak with a certified healthcare provider.
4. Always prioritize patient safety and emotional support.
5. If u are unable to find satisfying results from the website then answer according to your knowledge or search over the web
6. Output format is just a paragraph of a maximum 100 words with no special characters paragraph change is good but do not exceed word limit of 100 keep it as concise as possible.

User question: "{user_message}"

Your response:
"#
    )
}

pub struct ChatAssistant {
    provider: Option<Arc<dyn CompletionProvider>>,
}

impl ChatAssistant {
    pub fn new(provider: Option<Arc<dyn CompletionProvider>>) -> Self {
        Self { provider }
    }

    pub async fn reply(&self, message: &str) -> Result<String, ChatError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| ChatError::Unavailable("no chat provider configured".to_string()))?;

        debug!("forwarding chat message to {}", provider.name());
        Ok(provider.complete(&chat_prompt(message)).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::quiz::test_support::ScriptedProvider;

    #[test]
    fn chat_prompt_quotes_question() {
        let prompt = chat_prompt("Is a lump always cancer?");
        assert!(prompt.contains("User question: \"Is a lump always cancer?\""));
        assert!(prompt.contains("https://www.cancer.gov"));
        assert!(prompt.contains("6. Output format is just a paragraph of a maximum 100 words"));
        assert!(prompt.trim_end().ends_with("Your response:"));
    }

    #[tokio::test]
    async fn reply_forwards_trimmed_message() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok("Not always.".to_string())]));
        let assistant = ChatAssistant::new(Some(provider.clone()));

        let reply = assistant.reply("  Is a lump always cancer?  ").await.expect("reply");

        assert_eq!(reply, "Not always.");
        assert!(provider.prompts.lock().unwrap()[0].contains("\"Is a lump always cancer?\""));
    }

    #[tokio::test]
    async fn reply_rejects_blank_message_without_calling_provider() {
        let provider = Arc::new(ScriptedProvider::new(Vec::new()));
        let assistant = ChatAssistant::new(Some(provider.clone()));

        let err = assistant.reply("   ").await.expect_err("blank");

        assert!(matches!(err, ChatError::EmptyMessage));
        assert_eq!(provider.prompt_count(), 0);
    }

    #[tokio::test]
    async fn reply_propagates_provider_errors() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(LlmError::Api {
            status: 503,
            message: "overloaded".to_string(),
        })]));
        let assistant = ChatAssistant::new(Some(provider));

        let err = assistant.reply("hello").await.expect_err("provider error");
        assert!(matches!(err, ChatError::Provider(LlmError::Api { status: 503, .. })));
    }
}
