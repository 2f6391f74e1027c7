use std::ops::RangeInclusive;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::QuizError;

const BUNDLED_QUIZ: &str = include_str!("default_quiz.json");

pub const UNKNOWN_RISK_LEVEL: &str = "Unknown";
pub const UNKNOWN_INTERPRETATION: &str = "Unable to determine risk level.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizScript {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub disclaimer: String,
    pub questions: Vec<QuizQuestion>,
    pub scoring: Vec<ScoringRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    #[serde(default)]
    pub id: u32,
    pub question: String,
    pub options: Vec<QuizOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizOption {
    pub text: String,
    pub points: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringRule {
    pub range: String,
    pub risk_level: String,
    pub interpretation: String,
}

/// Inclusive score bounds written as `"a-b"`, `"a+"` (open-ended) or `"a"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRange(RangeInclusive<i64>);

impl ScoreRange {
    pub fn parse(raw: &str) -> Result<Self, QuizError> {
        let invalid = || QuizError::InvalidRange(raw.to_string());
        let raw_trimmed = raw.trim();

        if let Some(min) = raw_trimmed.strip_suffix('+') {
            let min = min.trim().parse::<i64>().map_err(|_| invalid())?;
            return Ok(Self(min..=i64::MAX));
        }

        let (min, max) = match raw_trimmed.split_once('-') {
            Some((min, max)) => (min.trim(), max.trim()),
            None => (raw_trimmed, raw_trimmed),
        };
        let min = min.parse::<i64>().map_err(|_| invalid())?;
        let max = max.parse::<i64>().map_err(|_| invalid())?;
        if min > max {
            return Err(invalid());
        }
        Ok(Self(min..=max))
    }

    pub fn contains(&self, score: i64) -> bool {
        self.0.contains(&score)
    }
}

impl ScoringRule {
    pub fn bounds(&self) -> Result<ScoreRange, QuizError> {
        ScoreRange::parse(&self.range)
    }
}

/// Questions and option texts only; points stay server-side.
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuiz {
    pub title: String,
    pub description: String,
    pub disclaimer: String,
    pub questions: Vec<PublicQuestion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: u32,
    pub question: String,
    pub options: Vec<String>,
}

impl QuizScript {
    pub fn bundled() -> Result<Self, QuizError> {
        Self::from_json(BUNDLED_QUIZ)
    }

    pub fn load(path: &Path) -> Result<Self, QuizError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, QuizError> {
        let script: QuizScript = serde_json::from_str(content)?;
        script.validate()?;
        Ok(script)
    }

    fn validate(&self) -> Result<(), QuizError> {
        if self.questions.is_empty() {
            return Err(QuizError::InvalidScript(
                "quiz has no questions".to_string(),
            ));
        }
        if let Some(q) = self.questions.iter().find(|q| q.question.trim().is_empty()) {
            return Err(QuizError::InvalidScript(format!(
                "question {} has empty text",
                q.id
            )));
        }
        if let Some(q) = self.questions.iter().find(|q| q.options.is_empty()) {
            return Err(QuizError::InvalidScript(format!(
                "question {} has no options",
                q.id
            )));
        }
        for rule in &self.scoring {
            rule.bounds()?;
        }
        Ok(())
    }

    /// First rule whose range contains `score`.
    pub fn risk_level(&self, score: i64) -> (String, String) {
        self.scoring
            .iter()
            .find(|rule| rule.bounds().is_ok_and(|range| range.contains(score)))
            .map(|rule| (rule.risk_level.clone(), rule.interpretation.clone()))
            .unwrap_or_else(|| {
                (
                    UNKNOWN_RISK_LEVEL.to_string(),
                    UNKNOWN_INTERPRETATION.to_string(),
                )
            })
    }

    pub fn public_view(&self) -> PublicQuiz {
        PublicQuiz {
            title: self.title.clone(),
            description: self.description.clone(),
            disclaimer: self.disclaimer.clone(),
            questions: self
                .questions
                .iter()
                .map(|q| PublicQuestion {
                    id: q.id,
                    question: q.question.clone(),
                    options: q.options.iter().map(|o| o.text.clone()).collect(),
                })
                .collect(),
        }
    }
}
