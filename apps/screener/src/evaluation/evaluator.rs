use tracing::{debug, info};

use crate::errors::AppError;
use crate::evaluation::prompts::{fill_template, EVALUATION_PROMPT_TEMPLATE};
use crate::evaluation::validator::{validate_evaluation, AnalysisResult};
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_MARKDOWN_INSTRUCTION};
use crate::llm_client::LanguageModel;
use crate::models::{EvaluationCriteria, Search};

/// Builds the evaluation request for one CV against a Search's job
/// description, criteria text and optional personalised instructions.
pub fn build_evaluation_prompt(cv_text: &str, search: &Search) -> String {
    let instructions = search
        .personalized_instructions
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("\nADDITIONAL INSTRUCTIONS:\n{s}\n"))
        .unwrap_or_default();

    let criteria = criteria_section(&search.evaluation_criteria);
    let prompt = fill_template(
        EVALUATION_PROMPT_TEMPLATE,
        &[
            ("job_description", search.job_description.trim()),
            ("instructions", &instructions),
            ("criteria", &criteria),
            ("cv_text", cv_text),
        ],
    );

    format!("{prompt}\n\n{NO_MARKDOWN_INSTRUCTION}")
}

fn criteria_section(criteria: &EvaluationCriteria) -> String {
    criteria
        .iter()
        .enumerate()
        .map(|(i, (dimension, criterion))| {
            format!(
                "{}. {} (JSON key \"{}\", 0-10): {}",
                i + 1,
                criterion.display_name,
                dimension.key(),
                criterion.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Sends one CV for scoring and validates the reply.
pub async fn evaluate_cv(
    llm: &dyn LanguageModel,
    model: &str,
    cv_text: &str,
    search: &Search,
) -> Result<AnalysisResult, AppError> {
    let prompt = build_evaluation_prompt(cv_text, search);
    debug!("Evaluation prompt: {} chars, model={model}", prompt.len());

    let reply = llm.complete(JSON_ONLY_SYSTEM, &prompt, model).await?;
    let result = validate_evaluation(&reply)?;

    info!(
        "CV evaluated for search {}: total score {:.1}",
        search.id,
        result.scores.total()
    );
    Ok(result)
}
