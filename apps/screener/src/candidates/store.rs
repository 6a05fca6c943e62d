//! Candidate persistence and the hiring-pipeline state machine.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use super::selection::{SelectionSet, Selections, Workflow};
use super::sorting::{sort_candidates, SortKey};
use crate::errors::AppError;
use crate::models::{Candidate, Dimension, InterviewQuestion, Note, PipelineStatus, Search};
use crate::store::{IndexName, Repository};

/// Partial edit of a candidate. Absent fields are left untouched; an empty
/// contact string clears the field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CandidatePatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub tags: Option<Vec<String>>,
    pub interview_date: Option<DateTime<Utc>>,
    pub clear_interview_date: bool,
    pub scores: Option<ScorePatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ScorePatch {
    pub relevance: Option<f64>,
    pub education: Option<f64>,
    pub previous_jobs: Option<f64>,
    pub proactivity: Option<f64>,
}

impl ScorePatch {
    fn entries(&self) -> [(Dimension, Option<f64>); 4] {
        [
            (Dimension::Relevance, self.relevance),
            (Dimension::Education, self.education),
            (Dimension::PreviousJobs, self.previous_jobs),
            (Dimension::Proactivity, self.proactivity),
        ]
    }
}

fn contact_field(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// The one stateful component over candidates.
///
/// Every mutation is a read-modify-write of one record, serialised behind a
/// single lock so concurrent edits of the same candidate cannot interleave.
pub struct CandidateStore {
    repo: Repository,
    write_lock: Mutex<()>,
    selections: Selections,
}

impl CandidateStore {
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            write_lock: Mutex::new(()),
            selections: Selections::default(),
        }
    }

    /// Inserts a new candidate. Fails with NotFound once its search is gone;
    /// the check shares the lock with [`Self::delete_search`].
    pub async fn create(&self, candidate: &Candidate) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let search_id = candidate.search_id;
        if self.repo.get::<Search>(&search_id.to_string()).await?.is_none() {
            return Err(AppError::NotFound(format!("Search {search_id} not found")));
        }
        self.repo.put(candidate).await?;
        info!(
            "Candidate {} created in search {} ({})",
            candidate.id, candidate.search_id, candidate.file_name
        );
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Candidate, AppError> {
        self.repo
            .get::<Candidate>(&id.to_string())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Candidate {id} not found")))
    }

    pub async fn list_by_search(
        &self,
        search_id: Uuid,
        sort_by: SortKey,
    ) -> Result<Vec<Candidate>, AppError> {
        let mut candidates: Vec<Candidate> = self
            .repo
            .by_index(IndexName::BySearch, &search_id.to_string())
            .await?;
        // Scan order is engine-defined; give ties a deterministic base order.
        candidates.sort_by_key(|c| c.created_at);
        sort_candidates(&mut candidates, sort_by);
        Ok(candidates)
    }

    /// Loads, mutates and writes back one candidate. `apply` returns whether
    /// it changed anything; unchanged records are not written.
    async fn mutate<F>(&self, id: Uuid, apply: F) -> Result<Candidate, AppError>
    where
        F: FnOnce(&mut Candidate) -> Result<bool, AppError>,
    {
        let _guard = self.write_lock.lock().await;
        let mut candidate = self.get(id).await?;
        if apply(&mut candidate)? {
            candidate.touch();
            self.repo.put(&candidate).await?;
        }
        Ok(candidate)
    }

    /// Moves a candidate to any pipeline state. Moving to the current state
    /// is a no-op.
    pub async fn move_candidate(
        &self,
        id: Uuid,
        status: PipelineStatus,
    ) -> Result<Candidate, AppError> {
        self.mutate(id, |candidate| {
            if candidate.status == status {
                debug!("Candidate {id} already in {}", status.as_str());
                return Ok(false);
            }
            info!(
                "Candidate {id} moved {} -> {}",
                candidate.status.as_str(),
                status.as_str()
            );
            candidate.status = status;
            Ok(true)
        })
        .await
    }

    pub async fn add_note(&self, id: Uuid, content: &str) -> Result<Note, AppError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("note content must not be empty".to_string()));
        }
        let note = Note {
            id: Uuid::new_v4(),
            content: content.to_string(),
            timestamp: Utc::now(),
        };
        let appended = note.clone();
        self.mutate(id, move |candidate| {
            candidate.notes.push(appended);
            Ok(true)
        })
        .await?;
        Ok(note)
    }

    pub async fn toggle_favorite(&self, id: Uuid) -> Result<Candidate, AppError> {
        self.mutate(id, |candidate| {
            candidate.is_favorite = !candidate.is_favorite;
            Ok(true)
        })
        .await
    }

    pub async fn apply_patch(&self, id: Uuid, patch: CandidatePatch) -> Result<Candidate, AppError> {
        self.mutate(id, move |candidate| {
            if let Some(name) = patch.name {
                candidate.name = contact_field(name);
            }
            if let Some(email) = patch.email {
                candidate.email = contact_field(email);
            }
            if let Some(phone) = patch.phone {
                candidate.phone = contact_field(phone);
            }
            if let Some(tags) = patch.tags {
                candidate.tags = tags
                    .into_iter()
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect();
            }
            if patch.clear_interview_date {
                candidate.interview_date = None;
            } else if let Some(date) = patch.interview_date {
                candidate.interview_date = Some(date);
            }
            if let Some(scores) = patch.scores {
                let mut updated = candidate.scores;
                for (dimension, value) in scores.entries() {
                    if let Some(value) = value {
                        updated = updated.with(dimension, value)?;
                    }
                }
                candidate.scores = updated;
            }
            Ok(true)
        })
        .await
    }

    /// Replaces the cached interview questions.
    pub async fn cache_questions(
        &self,
        id: Uuid,
        questions: Vec<InterviewQuestion>,
    ) -> Result<Candidate, AppError> {
        self.mutate(id, move |candidate| {
            candidate.interview_questions = questions;
            Ok(true)
        })
        .await
    }

    /// Deletes a candidate and drops it from every selection. Returns the
    /// removed record so callers can clean up what it references.
    pub async fn delete(&self, id: Uuid) -> Result<Candidate, AppError> {
        let _guard = self.write_lock.lock().await;
        let candidate = self.get(id).await?;
        self.repo.delete::<Candidate>(&id.to_string()).await?;
        self.selections
            .forget_candidate(candidate.search_id, candidate.id)
            .await;
        info!("Candidate {id} deleted");
        Ok(candidate)
    }

    /// Deletes a search record together with every candidate and selection
    /// set it owns. Returns the removed candidates.
    pub async fn delete_search(&self, search_id: Uuid) -> Result<Vec<Candidate>, AppError> {
        let _guard = self.write_lock.lock().await;
        let candidates: Vec<Candidate> = self
            .repo
            .by_index(IndexName::BySearch, &search_id.to_string())
            .await?;
        for candidate in &candidates {
            self.repo.delete::<Candidate>(&candidate.id.to_string()).await?;
        }
        self.selections.clear_search(search_id).await;
        self.repo.delete::<Search>(&search_id.to_string()).await?;
        info!(
            "Deleted {} candidates of search {search_id}",
            candidates.len()
        );
        Ok(candidates)
    }

    // ─── Selections ──────────────────────────────────────────────────────────

    pub async fn selection(&self, search_id: Uuid, workflow: Workflow) -> SelectionSet {
        self.selections.get(search_id, workflow).await
    }

    /// Adds a candidate of `search_id` to a workflow's selection. A full set
    /// is returned unchanged.
    pub async fn select(
        &self,
        search_id: Uuid,
        workflow: Workflow,
        candidate_id: Uuid,
    ) -> Result<SelectionSet, AppError> {
        let candidate = self.get(candidate_id).await?;
        if candidate.search_id != search_id {
            return Err(AppError::NotFound(format!(
                "Candidate {candidate_id} not found in search {search_id}"
            )));
        }
        let set = self.selections.add(search_id, workflow, candidate_id).await;
        if !set.contains(candidate_id) {
            debug!("Selection for {workflow:?} in search {search_id} is full");
        }
        Ok(set)
    }

    pub async fn deselect(
        &self,
        search_id: Uuid,
        workflow: Workflow,
        candidate_id: Uuid,
    ) -> SelectionSet {
        self.selections.remove(search_id, workflow, candidate_id).await
    }

    /// The selected candidates, in selection order.
    pub async fn selected_candidates(
        &self,
        search_id: Uuid,
        workflow: Workflow,
    ) -> Result<Vec<Candidate>, AppError> {
        let set = self.selection(search_id, workflow).await;
        let mut candidates = Vec::with_capacity(set.len());
        for id in set.members() {
            if let Some(candidate) = self.repo.get::<Candidate>(&id.to_string()).await? {
                candidates.push(candidate);
            }
        }
        Ok(candidates)
    }
}
