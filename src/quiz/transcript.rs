use serde::{Deserialize, Serialize};

use super::script::{QuizQuestion, QuizScript};

pub const DEFAULT_USER_NAME: &str = "User";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: String,
    pub content: String,
}

impl ConversationMessage {
    pub fn is_assistant(&self) -> bool {
        self.role == "assistant"
    }

    pub fn is_user(&self) -> bool {
        self.role == "user"
    }
}

/// A quiz question paired with the user message that answered it.
#[derive(Debug, Clone)]
pub struct TranscriptAnswer<'a> {
    pub question: &'a QuizQuestion,
    pub answer: &'a str,
}

/// Name from the first user message saying "... name is X".
pub fn extract_user_name(conversation: &[ConversationMessage]) -> String {
    const MARKER: &str = "name is";

    conversation
        .iter()
        .filter(|msg| msg.is_user())
        .find_map(|msg| {
            // ASCII lowering keeps byte offsets stable for slicing the message.
            let idx = msg.content.to_ascii_lowercase().rfind(MARKER)?;
            let name = msg.content[idx + MARKER.len()..]
                .trim()
                .trim_matches(|c| c == '.' || c == '!')
                .trim();
            Some(name.to_string())
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_USER_NAME.to_string())
}

/// Walks the transcript once, pairing each scripted question with the user
/// reply that immediately follows the assistant message asking it.
///
/// Questions are consumed strictly in script order: an assistant message
/// that asks a later question before the current one is answered is skipped.
pub fn match_transcript<'a>(
    script: &'a QuizScript,
    conversation: &'a [ConversationMessage],
) -> Vec<TranscriptAnswer<'a>> {
    let mut answers = Vec::new();
    let mut q_index = 0;
    let mut i = 0;

    while q_index < script.questions.len() && i + 1 < conversation.len() {
        let asked = &conversation[i];
        let reply = &conversation[i + 1];
        let question = &script.questions[q_index];

        if asked.is_assistant() && asked.content.contains(&question.question) && reply.is_user() {
            answers.push(TranscriptAnswer {
                question,
                answer: reply.content.as_str(),
            });
            q_index += 1;
            i += 1;
        }
        i += 1;
    }

    answers
}
