use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::scores::{DimensionAnalysis, DimensionScores};

/// Position of a candidate in the hiring workflow.
///
/// No ordering is enforced between states: any state may move to any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    #[default]
    New,
    Review,
    Preselected,
    InterviewScheduled,
    Interviewing,
    Approved,
    OfferSent,
    Hired,
    Rejected,
    Declined,
    Archived,
}

impl PipelineStatus {
    pub const ALL: [PipelineStatus; 11] = [
        PipelineStatus::New,
        PipelineStatus::Review,
        PipelineStatus::Preselected,
        PipelineStatus::InterviewScheduled,
        PipelineStatus::Interviewing,
        PipelineStatus::Approved,
        PipelineStatus::OfferSent,
        PipelineStatus::Hired,
        PipelineStatus::Rejected,
        PipelineStatus::Declined,
        PipelineStatus::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStatus::New => "new",
            PipelineStatus::Review => "review",
            PipelineStatus::Preselected => "preselected",
            PipelineStatus::InterviewScheduled => "interview_scheduled",
            PipelineStatus::Interviewing => "interviewing",
            PipelineStatus::Approved => "approved",
            PipelineStatus::OfferSent => "offer_sent",
            PipelineStatus::Hired => "hired",
            PipelineStatus::Rejected => "rejected",
            PipelineStatus::Declined => "declined",
            PipelineStatus::Archived => "archived",
        }
    }
}

/// An append-only recruiter note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A generated interview question. `purpose` is only present when the
/// questions were requested with their rationale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewQuestion {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

/// Heuristically inferred contact fields. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// One evaluated résumé within a Search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: Uuid,
    pub search_id: Uuid,
    pub file_name: String,
    pub cv_text: String,
    /// Archive key of the original PDF, if it was stored.
    #[serde(default)]
    pub pdf_key: Option<String>,

    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,

    pub scores: DimensionScores,
    pub analysis: DimensionAnalysis,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub critical_analysis: Option<String>,

    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub interview_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub interview_questions: Vec<InterviewQuestion>,

    pub status: PipelineStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Candidate {
    pub fn total_score(&self) -> f64 {
        self.scores.total()
    }

    pub fn contact(&self) -> ContactInfo {
        ContactInfo {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }

    /// Marks the record as mutated now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Rewrites a stored candidate whose `notes` field is a single legacy string
/// into the note-list shape. The note carries the candidate's creation
/// timestamp and the candidate id as a stable note id.
pub fn upgrade_legacy_notes(record: &mut Value) {
    let Some(obj) = record.as_object_mut() else {
        return;
    };
    let legacy = match obj.get("notes") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) => {
            obj.insert("notes".to_string(), Value::Array(vec![]));
            return;
        }
        _ => return,
    };

    let notes = if legacy.trim().is_empty() {
        vec![]
    } else {
        vec![serde_json::json!({
            "id": obj.get("id").cloned().unwrap_or(Value::Null),
            "content": legacy,
            "timestamp": obj.get("created_at").cloned().unwrap_or(Value::Null),
        })]
    };
    obj.insert("notes".to_string(), Value::Array(notes));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_candidate;

    #[test]
    fn test_status_serde_is_snake_case() {
        let json = serde_json::to_string(&PipelineStatus::InterviewScheduled).unwrap();
        assert_eq!(json, r#""interview_scheduled""#);
        for status in PipelineStatus::ALL {
            let json = format!("\"{}\"", status.as_str());
            let parsed: PipelineStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_default_status_is_new() {
        assert_eq!(PipelineStatus::default(), PipelineStatus::New);
    }

    #[test]
    fn test_legacy_string_note_becomes_single_note() {
        let candidate = sample_candidate(Uuid::new_v4(), "legacy.pdf", [5.0, 5.0, 5.0, 5.0]);
        let mut value = serde_json::to_value(&candidate).unwrap();
        value["notes"] = Value::String("Called on Monday".to_string());

        upgrade_legacy_notes(&mut value);
        let upgraded: Candidate = serde_json::from_value(value).unwrap();

        assert_eq!(upgraded.notes.len(), 1);
        assert_eq!(upgraded.notes[0].content, "Called on Monday");
        assert_eq!(upgraded.notes[0].timestamp, candidate.created_at);
        assert_eq!(upgraded.notes[0].id, candidate.id);
    }

    #[test]
    fn test_legacy_empty_note_becomes_empty_list() {
        let candidate = sample_candidate(Uuid::new_v4(), "legacy.pdf", [5.0, 5.0, 5.0, 5.0]);
        let mut value = serde_json::to_value(&candidate).unwrap();
        value["notes"] = Value::String("   ".to_string());

        upgrade_legacy_notes(&mut value);
        let upgraded: Candidate = serde_json::from_value(value).unwrap();
        assert!(upgraded.notes.is_empty());
    }

    #[test]
    fn test_note_list_is_left_alone() {
        let candidate = sample_candidate(Uuid::new_v4(), "cv.pdf", [1.0, 2.0, 3.0, 4.0]);
        let mut value = serde_json::to_value(&candidate).unwrap();
        let before = value.clone();
        upgrade_legacy_notes(&mut value);
        assert_eq!(value, before);
    }

    #[test]
    fn test_total_score_matches_dimensions() {
        let candidate = sample_candidate(Uuid::new_v4(), "cv.pdf", [7.0, 6.0, 8.0, 4.5]);
        assert_eq!(candidate.total_score(), 25.5);
    }
}
