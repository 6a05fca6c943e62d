use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::criteria::EvaluationCriteria;

/// Fixed key of the single settings record.
pub const SETTINGS_KEY: &str = "app-settings";

/// Persisted user-facing settings. The API credential is deliberately not
/// part of this record; it lives in process configuration only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Model identifier used for every generation call. Falls back to the
    /// configured default when unset.
    #[serde(default)]
    pub selected_model: Option<String>,
    /// Criteria applied to new searches that do not bring their own.
    #[serde(default)]
    pub default_evaluation_criteria: Option<EvaluationCriteria>,
    /// Named criteria a new search can pick by name.
    #[serde(default)]
    pub criteria_presets: BTreeMap<String, EvaluationCriteria>,
}

impl AppSettings {
    pub fn model_or<'a>(&'a self, default_model: &'a str) -> &'a str {
        self.selected_model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(default_model)
    }

    /// Criteria for a search created without explicit criteria: the named
    /// preset when one is given, otherwise the default. `None` means the
    /// preset does not exist.
    pub fn criteria_for_new_search(&self, preset: Option<&str>) -> Option<EvaluationCriteria> {
        match preset {
            Some(name) => self.criteria_presets.get(name.trim()).cloned(),
            None => Some(self.default_evaluation_criteria.clone().unwrap_or_default()),
        }
    }
}
