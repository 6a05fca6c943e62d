use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::criteria::EvaluationCriteria;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    #[default]
    Active,
    Archived,
}

impl SearchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchStatus::Active => "active",
            SearchStatus::Archived => "archived",
        }
    }
}

/// One hiring campaign: a job description, its evaluation criteria and the
/// candidates evaluated against them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Search {
    pub id: Uuid,
    pub name: String,
    pub job_description: String,
    #[serde(default)]
    pub personalized_instructions: Option<String>,
    pub evaluation_criteria: EvaluationCriteria,
    pub status: SearchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
