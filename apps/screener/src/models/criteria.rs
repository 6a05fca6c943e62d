use serde::{Deserialize, Serialize};

use crate::models::scores::Dimension;

/// User-editable display text for one dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub display_name: String,
    pub description: String,
}

impl Criterion {
    fn new(display_name: &str, description: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            description: description.to_string(),
        }
    }
}

/// Display text for the four canonical dimensions.
///
/// The struct shape is the invariant: exactly the four keys `relevance`,
/// `education`, `previousJobs`, `proactivity`, no more and no fewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EvaluationCriteria {
    pub relevance: Criterion,
    pub education: Criterion,
    pub previous_jobs: Criterion,
    pub proactivity: Criterion,
}

impl EvaluationCriteria {
    pub fn get(&self, dimension: Dimension) -> &Criterion {
        match dimension {
            Dimension::Relevance => &self.relevance,
            Dimension::Education => &self.education,
            Dimension::PreviousJobs => &self.previous_jobs,
            Dimension::Proactivity => &self.proactivity,
        }
    }

    /// Criteria in canonical dimension order.
    pub fn iter(&self) -> impl Iterator<Item = (Dimension, &Criterion)> {
        Dimension::ALL.into_iter().map(move |d| (d, self.get(d)))
    }
}

impl Default for EvaluationCriteria {
    fn default() -> Self {
        Self {
            relevance: Criterion::new(
                "Profile Relevance",
                "Compare the CV with the job description. Consider skills, experience and overall fit for the position.",
            ),
            education: Criterion::new(
                "Education Level",
                "Evaluate the educational institutions and degrees. The main degree counts for 80% of the value; certifications, exchange programs and similar count for 20%.",
            ),
            previous_jobs: Criterion::new(
                "Previous Jobs",
                "Assess the standing of previous employers and the level of the most recent position held.",
            ),
            proactivity: Criterion::new(
                "Proactivity",
                "Evaluate extracurricular activities, certifications, continuous learning and initiative beyond basic job requirements.",
            ),
        }
    }
}
