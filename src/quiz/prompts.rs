use std::fmt::Write;

use super::AnswerResult;
use super::script::QuizOption;

/// Letter label for the option at `index` (`A`, `B`, ...).
pub fn option_label(index: usize) -> String {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map(|i| char::from(b'A' + i).to_string())
        .unwrap_or_else(|| (index + 1).to_string())
}

pub fn answer_mapping_prompt(question: &str, options: &[QuizOption], user_response: &str) -> String {
    let options_text = options
        .iter()
        .enumerate()
        .map(|(i, opt)| format!("{}: {} - {} points", option_label(i), opt.text, opt.points))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"
You are a helpful assistant categorizing health quiz answers.

Given the question and the user's free-text response, match it to the most appropriate option from the list. Return only a JSON in the format:
{{
  "selected_option": "A"/"B"/"C"/...,
  "score": number
}}

Question: "{question}"

Options:
{options_text}

User response: "{user_response}"
"#
    )
}

pub struct NarrativeInput<'a> {
    pub user_name: &'a str,
    pub total_score: i64,
    pub risk_level: &'a str,
    pub interpretation: &'a str,
    pub answers: &'a [AnswerResult],
}

pub fn narrative_prompt(input: &NarrativeInput<'_>) -> String {
    let mut answer_summary = String::new();
    for (i, a) in input.answers.iter().enumerate() {
        if i > 0 {
            answer_summary.push('\n');
        }
        let _ = write!(
            answer_summary,
            "{}. {}\n   → You answered: {}\n   → Mapped to: {} (Score: {})",
            i + 1,
            a.question,
            a.user_answer,
            a.matched_option,
            a.score
        );
    }

    format!(
        r#"
You are a trusted health assistant tasked with analyzing breast cancer self-assessment results for a user named {user_name}. Your response must be clear, empathetic, and educational.

Here are the key results from the user's quiz:
- Total Score: {score}
- Risk Level: {risk_level}
- Interpretation: {interpretation}

Below is a summary of the user's responses:
{answer_summary}

Based on this, please produce a structured JSON output that strictly follows this schema:

{{
  "quiz_analysis": "<Provide an educational summary including an explanation of the risk factors and any red flags>",
  "system_recommendation": "<State whether the user should see a doctor urgently or if routine follow-up is sufficient>",
  "credible_sources": [ "<Name or URL of credible resource 1>", "<Name or URL of credible resource 2>", "<Name or URL of credible resource 3>" ],
  "motivational_note": "<Include a kind, motivational closing message with a signature>"
}}

Please make sure your output adheres exactly to this JSON structure. Do not include any extra text or keys.
"#,
        user_name = input.user_name,
        score = input.total_score,
        risk_level = input.risk_level,
        interpretation = input.interpretation,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_label_is_alphabetic() {
        assert_eq!(option_label(0), "A");
        assert_eq!(option_label(2), "C");
        assert_eq!(option_label(25), "Z");
        assert_eq!(option_label(26), "27");
    }

    #[test]
    fn answer_mapping_prompt_lists_options_with_points() {
        let options = vec![
            QuizOption {
                text: "No".to_string(),
                points: 0,
            },
            QuizOption {
                text: "Yes".to_string(),
                points: 5,
            },
        ];

        let prompt = answer_mapping_prompt("Have you smoked?", &options, "a little in college");

        assert!(prompt.contains("Question: \"Have you smoked?\""));
        assert!(prompt.contains("A: No - 0 points\nB: Yes - 5 points"));
        assert!(prompt.contains("User response: \"a little in college\""));
        assert!(prompt.contains("\"selected_option\""));
    }

    #[test]
    fn narrative_prompt_embeds_numbered_summary() {
        let answers = vec![
            AnswerResult {
                question: "What is your current age?".to_string(),
                user_answer: "52".to_string(),
                matched_option: "C".to_string(),
                score: 2,
            },
            AnswerResult {
                question: "Do you smoke?".to_string(),
                user_answer: "no".to_string(),
                matched_option: "A".to_string(),
                score: 0,
            },
        ];

        let prompt = narrative_prompt(&NarrativeInput {
            user_name: "Amina",
            total_score: 2,
            risk_level: "Low",
            interpretation: "Keep screening.",
            answers: &answers,
        });

        assert!(prompt.contains("for a user named Amina."));
        assert!(prompt.contains("- Total Score: 2"));
        assert!(prompt.contains("- Risk Level: Low"));
        assert!(prompt.contains(
            "1. What is your current age?\n   → You answered: 52\n   → Mapped to: C (Score: 2)\n2. Do you smoke?"
        ));
        assert!(prompt.contains("\"motivational_note\""));
    }
}
