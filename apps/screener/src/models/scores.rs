//! The four canonical evaluation dimensions and their range-checked scores.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest score a dimension may carry.
pub const MIN_SCORE: f64 = 0.0;
/// Highest score a dimension may carry.
pub const MAX_SCORE: f64 = 10.0;

/// One of the four fixed evaluation axes. The keys are not configurable; only
/// their display text is (see [`EvaluationCriteria`](super::criteria::EvaluationCriteria)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    Relevance,
    Education,
    PreviousJobs,
    Proactivity,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Relevance,
        Dimension::Education,
        Dimension::PreviousJobs,
        Dimension::Proactivity,
    ];

    /// The canonical JSON key for this dimension.
    pub fn key(&self) -> &'static str {
        match self {
            Dimension::Relevance => "relevance",
            Dimension::Education => "education",
            Dimension::PreviousJobs => "previousJobs",
            Dimension::Proactivity => "proactivity",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A dimension score outside `[0, 10]` (or not a finite number).
#[derive(Debug, Clone, PartialEq, Error)]
#[error("score for {dimension} out of range [0, 10]: {value}")]
pub struct OutOfRange {
    pub dimension: Dimension,
    pub value: f64,
}

/// Checks a single score against the closed `[0, 10]` interval.
pub fn check_score(dimension: Dimension, value: f64) -> Result<f64, OutOfRange> {
    if value.is_finite() && (MIN_SCORE..=MAX_SCORE).contains(&value) {
        Ok(value)
    } else {
        Err(OutOfRange { dimension, value })
    }
}

/// Scores for all four dimensions. Every value is guaranteed to lie in
/// `[0, 10]`; the total is always derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawScores", into = "RawScores")]
pub struct DimensionScores {
    relevance: f64,
    education: f64,
    previous_jobs: f64,
    proactivity: f64,
}

impl DimensionScores {
    pub fn new(
        relevance: f64,
        education: f64,
        previous_jobs: f64,
        proactivity: f64,
    ) -> Result<Self, OutOfRange> {
        Ok(Self {
            relevance: check_score(Dimension::Relevance, relevance)?,
            education: check_score(Dimension::Education, education)?,
            previous_jobs: check_score(Dimension::PreviousJobs, previous_jobs)?,
            proactivity: check_score(Dimension::Proactivity, proactivity)?,
        })
    }

    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Relevance => self.relevance,
            Dimension::Education => self.education,
            Dimension::PreviousJobs => self.previous_jobs,
            Dimension::Proactivity => self.proactivity,
        }
    }

    /// Returns a copy with one dimension replaced, range-checked.
    pub fn with(mut self, dimension: Dimension, value: f64) -> Result<Self, OutOfRange> {
        let value = check_score(dimension, value)?;
        match dimension {
            Dimension::Relevance => self.relevance = value,
            Dimension::Education => self.education = value,
            Dimension::PreviousJobs => self.previous_jobs = value,
            Dimension::Proactivity => self.proactivity = value,
        }
        Ok(self)
    }

    /// Sum of the four dimensions, in `[0, 40]`.
    pub fn total(&self) -> f64 {
        self.relevance + self.education + self.previous_jobs + self.proactivity
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawScores {
    relevance: f64,
    education: f64,
    previous_jobs: f64,
    proactivity: f64,
}

impl TryFrom<RawScores> for DimensionScores {
    type Error = OutOfRange;

    fn try_from(raw: RawScores) -> Result<Self, Self::Error> {
        DimensionScores::new(raw.relevance, raw.education, raw.previous_jobs, raw.proactivity)
    }
}

impl From<DimensionScores> for RawScores {
    fn from(scores: DimensionScores) -> Self {
        RawScores {
            relevance: scores.relevance,
            education: scores.education,
            previous_jobs: scores.previous_jobs,
            proactivity: scores.proactivity,
        }
    }
}

/// Free-text rationale, one string per dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionAnalysis {
    pub relevance: String,
    pub education: String,
    pub previous_jobs: String,
    pub proactivity: String,
}

impl DimensionAnalysis {
    pub fn get(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Relevance => &self.relevance,
            Dimension::Education => &self.education,
            Dimension::PreviousJobs => &self.previous_jobs,
            Dimension::Proactivity => &self.proactivity,
        }
    }

    pub fn set(&mut self, dimension: Dimension, text: String) {
        match dimension {
            Dimension::Relevance => self.relevance = text,
            Dimension::Education => self.education = text,
            Dimension::PreviousJobs => self.previous_jobs = text,
            Dimension::Proactivity => self.proactivity = text,
        }
    }
}
