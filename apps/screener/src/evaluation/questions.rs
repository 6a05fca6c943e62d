use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::evaluation::prompts::{
    fill_template, QUESTIONS_PROMPT_TEMPLATE, QUESTIONS_WITH_PURPOSE_PROMPT_TEMPLATE,
};
use crate::evaluation::validator::parse_json_reply;
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_MARKDOWN_INSTRUCTION};
use crate::llm_client::LanguageModel;
use crate::models::{Candidate, InterviewQuestion};

pub const MIN_QUESTIONS: u8 = 1;
pub const MAX_QUESTIONS: u8 = 20;
pub const DEFAULT_QUESTIONS: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionMode {
    /// Plain question strings.
    #[default]
    Plain,
    /// `{question, purpose}` objects.
    WithPurpose,
}

pub fn check_question_count(count: u32) -> Result<u8, AppError> {
    match u8::try_from(count) {
        Ok(count) if (MIN_QUESTIONS..=MAX_QUESTIONS).contains(&count) => Ok(count),
        _ => Err(AppError::Validation(format!(
            "question count must be between {MIN_QUESTIONS} and {MAX_QUESTIONS}, got {count}"
        ))),
    }
}

fn candidate_summary(candidate: &Candidate) -> String {
    let name = candidate.name.as_deref().unwrap_or(&candidate.file_name);
    let summary = candidate.critical_analysis.as_deref().unwrap_or("Not available");
    let strengths = if candidate.strengths.is_empty() {
        "Not specified".to_string()
    } else {
        candidate.strengths.join(", ")
    };
    let weaknesses = if candidate.weaknesses.is_empty() {
        "Not specified".to_string()
    } else {
        candidate.weaknesses.join(", ")
    };
    format!(
        "{name}\nSummary: {summary}\nStrengths: {strengths}\nDetected weaknesses: {weaknesses}\n\nCV:\n{}",
        candidate.cv_text
    )
}

pub fn build_questions_prompt(
    candidate: &Candidate,
    job_description: &str,
    count: u8,
    mode: QuestionMode,
) -> String {
    let template = match mode {
        QuestionMode::Plain => QUESTIONS_PROMPT_TEMPLATE,
        QuestionMode::WithPurpose => QUESTIONS_WITH_PURPOSE_PROMPT_TEMPLATE,
    };
    let count = count.to_string();
    let summary = candidate_summary(candidate);
    let prompt = fill_template(
        template,
        &[
            ("count", &count),
            ("job_description", job_description.trim()),
            ("candidate", &summary),
        ],
    );
    format!("{prompt}\n\n{NO_MARKDOWN_INSTRUCTION}")
}

/// Validates a questions reply. Accepts a bare array or `{"questions": [...]}`;
/// items must match the requested mode. Empty lists are rejected.
pub fn validate_questions(reply: &str, mode: QuestionMode) -> Result<Vec<InterviewQuestion>, AppError> {
    let value = parse_json_reply(reply)?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("questions") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(AppError::ResponseFormat(
                    "expected a 'questions' array".to_string(),
                ))
            }
        },
        _ => {
            return Err(AppError::ResponseFormat(
                "expected a JSON array of questions".to_string(),
            ))
        }
    };

    if items.is_empty() {
        return Err(AppError::ResponseFormat("no questions returned".to_string()));
    }

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| parse_question(item, mode).ok_or_else(|| {
            AppError::ResponseFormat(format!("question {} has the wrong shape", i + 1))
        }))
        .collect()
}

fn parse_question(item: Value, mode: QuestionMode) -> Option<InterviewQuestion> {
    match (mode, item) {
        (QuestionMode::Plain, Value::String(question)) if !question.trim().is_empty() => {
            Some(InterviewQuestion {
                question,
                purpose: None,
            })
        }
        (QuestionMode::WithPurpose, Value::Object(obj)) => {
            let question = obj.get("question")?.as_str()?.trim();
            let purpose = obj.get("purpose")?.as_str()?;
            if question.is_empty() {
                return None;
            }
            Some(InterviewQuestion {
                question: question.to_string(),
                purpose: Some(purpose.to_string()),
            })
        }
        _ => None,
    }
}

/// Generates interview questions for one candidate.
pub async fn generate_questions(
    llm: &dyn LanguageModel,
    model: &str,
    candidate: &Candidate,
    job_description: &str,
    count: u32,
    mode: QuestionMode,
) -> Result<Vec<InterviewQuestion>, AppError> {
    let count = check_question_count(count)?;
    let prompt = build_questions_prompt(candidate, job_description, count, mode);
    let reply = llm.complete(JSON_ONLY_SYSTEM, &prompt, model).await?;
    let questions = validate_questions(&reply, mode)?;

    info!(
        "Generated {} interview questions for candidate {}",
        questions.len(),
        candidate.id
    );
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_candidate, ScriptedModel};
    use uuid::Uuid;

    #[test]
    fn test_count_bounds() {
        assert!(check_question_count(0).is_err());
        assert!(check_question_count(21).is_err());
        assert_eq!(check_question_count(1).unwrap(), 1);
        assert_eq!(check_question_count(20).unwrap(), 20);
    }

    #[test]
    fn test_plain_questions_from_wrapped_object() {
        let reply = r#"{"questions": ["Tell me about a hard bug.", "Why Rust?"]}"#;
        let questions = validate_questions(reply, QuestionMode::Plain).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[1].question, "Why Rust?");
        assert!(questions[1].purpose.is_none());
    }

    #[test]
    fn test_questions_with_purpose_from_bare_array() {
        let reply = "```json\n[{\"question\": \"Walk me through your last migration.\", \"purpose\": \"Depth of ownership\"}]\n```";
        let questions = validate_questions(reply, QuestionMode::WithPurpose).unwrap();
        assert_eq!(questions[0].purpose.as_deref(), Some("Depth of ownership"));
    }

    #[test]
    fn test_empty_or_malformed_lists_are_rejected() {
        assert!(matches!(
            validate_questions("[]", QuestionMode::Plain),
            Err(AppError::ResponseFormat(_))
        ));
        assert!(matches!(
            validate_questions(r#"{"questions": [1, 2]}"#, QuestionMode::Plain),
            Err(AppError::ResponseFormat(_))
        ));
        assert!(matches!(
            validate_questions(r#"["plain string"]"#, QuestionMode::WithPurpose),
            Err(AppError::ResponseFormat(_))
        ));
        assert!(matches!(
            validate_questions(r#"{"items": []}"#, QuestionMode::Plain),
            Err(AppError::ResponseFormat(_))
        ));
    }

    #[test]
    fn test_prompt_carries_count_and_weaknesses() {
        let mut candidate = sample_candidate(Uuid::new_v4(), "jane.pdf", [7.0; 4]);
        candidate.weaknesses = vec!["Little cloud experience".into()];
        let prompt = build_questions_prompt(&candidate, "Platform engineer", 7, QuestionMode::Plain);
        assert!(prompt.contains("Generate 7 personalised"));
        assert!(prompt.contains("Little cloud experience"));
        assert!(prompt.contains("Platform engineer"));
    }

    #[tokio::test]
    async fn test_generate_rejects_count_before_calling_model() {
        let llm = ScriptedModel::always(r#"["q"]"#);
        let candidate = sample_candidate(Uuid::new_v4(), "a.pdf", [5.0; 4]);
        let err = generate_questions(&llm, "m", &candidate, "jd", 0, QuestionMode::Plain)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(llm.calls().is_empty());
    }
}
