use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Hard cap on the members of one selection set.
pub const MAX_SELECTION: usize = 10;

/// Bulk workflows that operate on a selection of candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Workflow {
    Chat,
    InterviewQuestions,
}

impl Workflow {
    pub const ALL: [Workflow; 2] = [Workflow::Chat, Workflow::InterviewQuestions];
}

/// Ordered set of selected candidate ids, at most [`MAX_SELECTION`] long.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelectionSet {
    members: Vec<Uuid>,
}

impl SelectionSet {
    /// Adds a member. Returns `false` without changing the set when the id is
    /// already present or the set is full.
    pub fn add(&mut self, id: Uuid) -> bool {
        if self.members.contains(&id) || self.is_full() {
            return false;
        }
        self.members.push(id);
        true
    }

    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.members.len();
        self.members.retain(|m| *m != id);
        self.members.len() != before
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.members.contains(&id)
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= MAX_SELECTION
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[Uuid] {
        &self.members
    }
}

/// Selection sets keyed by (search, workflow).
#[derive(Default)]
pub struct Selections {
    sets: RwLock<HashMap<(Uuid, Workflow), SelectionSet>>,
}

impl Selections {
    pub async fn get(&self, search_id: Uuid, workflow: Workflow) -> SelectionSet {
        self.sets
            .read()
            .await
            .get(&(search_id, workflow))
            .cloned()
            .unwrap_or_default()
    }

    pub async fn add(&self, search_id: Uuid, workflow: Workflow, id: Uuid) -> SelectionSet {
        let mut sets = self.sets.write().await;
        let set = sets.entry((search_id, workflow)).or_default();
        set.add(id);
        set.clone()
    }

    pub async fn remove(&self, search_id: Uuid, workflow: Workflow, id: Uuid) -> SelectionSet {
        let mut sets = self.sets.write().await;
        match sets.get_mut(&(search_id, workflow)) {
            Some(set) => {
                set.remove(id);
                set.clone()
            }
            None => SelectionSet::default(),
        }
    }

    /// Drops a candidate from every workflow of its search.
    pub async fn forget_candidate(&self, search_id: Uuid, id: Uuid) {
        let mut sets = self.sets.write().await;
        for workflow in Workflow::ALL {
            if let Some(set) = sets.get_mut(&(search_id, workflow)) {
                set.remove(id);
            }
        }
    }

    pub async fn clear_search(&self, search_id: Uuid) {
        self.sets
            .write()
            .await
            .retain(|(search, _), _| *search != search_id);
    }
}
