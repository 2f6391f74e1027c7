use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::llm::{CompletionProvider, strip_code_fences};

pub mod prompts;
pub mod script;
pub mod transcript;

pub use self::script::QuizScript;
pub use self::transcript::{ConversationMessage, extract_user_name, match_transcript};

use self::prompts::{NarrativeInput, answer_mapping_prompt, narrative_prompt};

pub const UNMATCHED_OPTION: &str = "N/A";

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("failed to read quiz script: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse quiz script: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid quiz script: {0}")]
    InvalidScript(String),
    #[error("invalid scoring range: {0}")]
    InvalidRange(String),
    #[error("risk assessment is unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub question: String,
    pub user_answer: String,
    pub matched_option: String,
    pub score: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    #[serde(default)]
    pub quiz_analysis: String,
    #[serde(default)]
    pub system_recommendation: String,
    #[serde(default)]
    pub credible_sources: Vec<String>,
    #[serde(default)]
    pub motivational_note: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssessmentReport {
    pub user_name: String,
    pub total_score: i64,
    pub risk_level: String,
    pub interpretation: String,
    pub detailed_results: Vec<AnswerResult>,
    pub insights: Option<Insights>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionSelection {
    pub selected_option: String,
    pub score: i64,
}

impl Default for OptionSelection {
    fn default() -> Self {
        Self {
            selected_option: UNMATCHED_OPTION.to_string(),
            score: 0,
        }
    }
}

/// Pulls the first JSON object out of a model reply, tolerating code fences
/// and chatter around it.
fn extract_json_object(text: &str) -> Option<Value> {
    let unfenced = strip_code_fences(text);
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(unfenced) {
        return Some(value);
    }
    let start = unfenced.find('{')?;
    let end = unfenced.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&unfenced[start..=end]) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

/// Reads `{"selected_option": "B", "score": 3}`; anything unreadable maps to
/// `N/A` with zero points.
pub fn parse_option_selection(text: &str) -> OptionSelection {
    let Some(value) = extract_json_object(text) else {
        warn!("could not parse answer mapping reply as JSON");
        return OptionSelection::default();
    };

    let selected_option = match value.get("selected_option") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => UNMATCHED_OPTION.to_string(),
    };

    let score = match value.get("score") {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<f64>().map(|f| f.round() as i64).unwrap_or(0),
        _ => 0,
    };

    OptionSelection {
        selected_option,
        score,
    }
}

fn text_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Null) | None => String::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| text_field(Some(item)))
            .filter(|item| !item.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Some(other) => other.to_string(),
    }
}

fn list_field(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| text_field(Some(item)))
            .filter(|item| !item.is_empty())
            .collect(),
        other => {
            let single = text_field(other);
            if single.is_empty() {
                Vec::new()
            } else {
                vec![single]
            }
        }
    }
}

/// Reads the four narrative keys field by field. A key that is missing or of
/// an unexpected shape becomes empty; `None` only when the reply holds no JSON
/// object at all.
pub fn parse_insights(text: &str) -> Option<Insights> {
    let Some(value) = extract_json_object(text) else {
        warn!("could not parse narrative output as JSON");
        return None;
    };

    Some(Insights {
        quiz_analysis: text_field(value.get("quiz_analysis")),
        system_recommendation: text_field(value.get("system_recommendation")),
        credible_sources: list_field(value.get("credible_sources")),
        motivational_note: text_field(value.get("motivational_note")),
    })
}

/// Scores a quiz transcript and asks a second model for a narrative summary.
pub struct RiskAssessor {
    script: Arc<QuizScript>,
    answer_mapper: Option<Arc<dyn CompletionProvider>>,
    narrator: Option<Arc<dyn CompletionProvider>>,
}

impl RiskAssessor {
    pub fn new(
        script: Arc<QuizScript>,
        answer_mapper: Option<Arc<dyn CompletionProvider>>,
        narrator: Option<Arc<dyn CompletionProvider>>,
    ) -> Self {
        Self {
            script,
            answer_mapper,
            narrator,
        }
    }

    pub fn script(&self) -> &QuizScript {
        &self.script
    }

    pub async fn assess(
        &self,
        conversation: &[ConversationMessage],
    ) -> Result<AssessmentReport, QuizError> {
        let answer_mapper = self.answer_mapper.as_ref().ok_or_else(|| {
            QuizError::Unavailable("missing or invalid answer-mapping API key".to_string())
        })?;

        let user_name = extract_user_name(conversation);
        let matched = match_transcript(&self.script, conversation);
        debug!(
            "matched {} of {} quiz questions",
            matched.len(),
            self.script.questions.len()
        );

        let mut total_score = 0i64;
        let mut detailed_results = Vec::with_capacity(matched.len());

        for entry in matched {
            let prompt = answer_mapping_prompt(
                &entry.question.question,
                &entry.question.options,
                entry.answer,
            );

            let selection = match answer_mapper.complete(&prompt).await {
                Ok(reply) => parse_option_selection(&reply),
                Err(e) => {
                    warn!(
                        "{} failed to map answer for question {}: {}",
                        answer_mapper.name(),
                        entry.question.id,
                        e
                    );
                    OptionSelection::default()
                }
            };

            total_score = total_score.saturating_add(selection.score);
            detailed_results.push(AnswerResult {
                question: entry.question.question.clone(),
                user_answer: entry.answer.to_string(),
                matched_option: selection.selected_option,
                score: selection.score,
            });
        }

        let (risk_level, interpretation) = self.script.risk_level(total_score);
        info!(
            "risk assessment scored {} ({}) over {} answers",
            total_score,
            risk_level,
            detailed_results.len()
        );

        let insights = self
            .narrate(&NarrativeInput {
                user_name: &user_name,
                total_score,
                risk_level: &risk_level,
                interpretation: &interpretation,
                answers: &detailed_results,
            })
            .await;

        Ok(AssessmentReport {
            user_name,
            total_score,
            risk_level,
            interpretation,
            detailed_results,
            insights,
        })
    }

    async fn narrate(&self, input: &NarrativeInput<'_>) -> Option<Insights> {
        let Some(narrator) = self.narrator.as_ref() else {
            warn!("no narrative provider configured; skipping insights");
            return None;
        };

        match narrator.complete(&narrative_prompt(input)).await {
            Ok(reply) => parse_insights(&reply),
            Err(e) => {
                warn!("{} narrative call failed: {}", narrator.name(), e);
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::llm::{CompletionProvider, LlmError};

    /// Replays canned replies in order and records every prompt it sees.
    pub struct ScriptedProvider {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        pub fn new(replies: Vec<Result<String, LlmError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn prompt_count(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyResponse))
        }
    }
}
