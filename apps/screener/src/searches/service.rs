use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::candidates::CandidateStore;
use crate::errors::AppError;
use crate::evaluation::chat::ChatSessions;
use crate::models::{EvaluationCriteria, Search, SearchStatus};
use crate::pipeline::DocumentArchive;
use crate::settings::load_settings;
use crate::store::{IndexName, Repository};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewSearch {
    pub name: String,
    pub job_description: String,
    #[serde(default)]
    pub personalized_instructions: Option<String>,
    /// Falls back to `criteria_preset`, then to the settings' default
    /// criteria, when absent.
    #[serde(default)]
    pub evaluation_criteria: Option<EvaluationCriteria>,
    /// Name of a preset stored in the settings.
    #[serde(default)]
    pub criteria_preset: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchPatch {
    pub name: Option<String>,
    pub job_description: Option<String>,
    /// An empty string clears the instructions.
    pub personalized_instructions: Option<String>,
    pub evaluation_criteria: Option<EvaluationCriteria>,
    pub status: Option<SearchStatus>,
}

fn required_text(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Search lifecycle. Deleting a search cascades to everything that hangs
/// off it.
pub struct SearchService {
    repo: Repository,
    candidates: Arc<CandidateStore>,
    archive: Arc<dyn DocumentArchive>,
    chats: Arc<ChatSessions>,
}

impl SearchService {
    pub fn new(
        repo: Repository,
        candidates: Arc<CandidateStore>,
        archive: Arc<dyn DocumentArchive>,
        chats: Arc<ChatSessions>,
    ) -> Self {
        Self {
            repo,
            candidates,
            archive,
            chats,
        }
    }

    pub async fn create(&self, request: NewSearch) -> Result<Search, AppError> {
        let name = required_text("name", &request.name)?;
        let job_description = required_text("job_description", &request.job_description)?;
        let evaluation_criteria = match request.evaluation_criteria {
            Some(criteria) => criteria,
            None => {
                let preset = request.criteria_preset.as_deref();
                load_settings(&self.repo)
                    .await?
                    .criteria_for_new_search(preset)
                    .ok_or_else(|| {
                        AppError::Validation(format!(
                            "unknown criteria preset '{}'",
                            preset.unwrap_or_default()
                        ))
                    })?
            }
        };

        let now = Utc::now();
        let search = Search {
            id: Uuid::new_v4(),
            name,
            job_description,
            personalized_instructions: optional_text(request.personalized_instructions),
            evaluation_criteria,
            status: SearchStatus::Active,
            created_at: now,
            updated_at: now,
        };
        self.repo.put(&search).await?;

        info!("Search {} created: {}", search.id, search.name);
        Ok(search)
    }

    pub async fn get(&self, id: Uuid) -> Result<Search, AppError> {
        self.repo
            .get::<Search>(&id.to_string())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Search {id} not found")))
    }

    /// Newest first.
    pub async fn list(&self, status: Option<SearchStatus>) -> Result<Vec<Search>, AppError> {
        let mut searches: Vec<Search> = match status {
            Some(status) => self.repo.by_index(IndexName::ByStatus, status.as_str()).await?,
            None => self.repo.all().await?,
        };
        searches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(searches)
    }

    pub async fn update(&self, id: Uuid, patch: SearchPatch) -> Result<Search, AppError> {
        let mut search = self.get(id).await?;

        if let Some(name) = patch.name {
            search.name = required_text("name", &name)?;
        }
        if let Some(job_description) = patch.job_description {
            search.job_description = required_text("job_description", &job_description)?;
        }
        if patch.personalized_instructions.is_some() {
            search.personalized_instructions = optional_text(patch.personalized_instructions);
        }
        if let Some(criteria) = patch.evaluation_criteria {
            search.evaluation_criteria = criteria;
        }
        if let Some(status) = patch.status {
            search.status = status;
        }
        search.updated_at = Utc::now();

        self.repo.put(&search).await?;
        info!("Search {id} updated");
        Ok(search)
    }

    /// Deletes the search, its candidates, their archived PDFs, its
    /// selections and its chat transcript.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.get(id).await?;

        let removed = self.candidates.delete_search(id).await?;
        for candidate in &removed {
            if let Some(key) = &candidate.pdf_key {
                if let Err(e) = self.archive.delete(key).await {
                    warn!("Could not delete archived PDF {key}: {e}");
                }
            }
        }
        self.chats.clear(id).await;

        info!("Search {id} deleted with {} candidates", removed.len());
        Ok(())
    }
}
