use serde::Deserialize;

use crate::models::{Candidate, Dimension};

/// Field a candidate list is ordered by, always descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    #[serde(alias = "totalScore")]
    TotalScore,
    Relevance,
    Education,
    #[serde(alias = "previousJobs")]
    PreviousJobs,
    Proactivity,
}

impl SortKey {
    fn value(&self, candidate: &Candidate) -> f64 {
        match self {
            SortKey::TotalScore => candidate.total_score(),
            SortKey::Relevance => candidate.scores.get(Dimension::Relevance),
            SortKey::Education => candidate.scores.get(Dimension::Education),
            SortKey::PreviousJobs => candidate.scores.get(Dimension::PreviousJobs),
            SortKey::Proactivity => candidate.scores.get(Dimension::Proactivity),
        }
    }
}

/// Stable descending sort; ties keep their current relative order.
pub fn sort_candidates(candidates: &mut [Candidate], key: SortKey) {
    candidates.sort_by(|a, b| key.value(b).total_cmp(&key.value(a)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_candidate;
    use uuid::Uuid;

    fn names(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.file_name.as_str()).collect()
    }

    #[test]
    fn test_sort_by_total_is_descending_and_stable() {
        let search = Uuid::new_v4();
        let mut candidates = vec![
            sample_candidate(search, "a.pdf", [5.0, 5.0, 5.0, 5.0]),
            sample_candidate(search, "b.pdf", [9.0, 9.0, 9.0, 9.0]),
            sample_candidate(search, "c.pdf", [8.0, 4.0, 4.0, 4.0]),
            sample_candidate(search, "d.pdf", [2.0, 6.0, 6.0, 6.0]),
        ];

        sort_candidates(&mut candidates, SortKey::TotalScore);
        // a, c and d all total 20 and keep their input order.
        assert_eq!(names(&candidates), vec!["b.pdf", "a.pdf", "c.pdf", "d.pdf"]);

        let first = names(&candidates).join(",");
        sort_candidates(&mut candidates, SortKey::TotalScore);
        assert_eq!(names(&candidates).join(","), first);
    }

    #[test]
    fn test_sort_by_single_dimension() {
        let search = Uuid::new_v4();
        let mut candidates = vec![
            sample_candidate(search, "a.pdf", [1.0, 9.0, 0.0, 0.0]),
            sample_candidate(search, "b.pdf", [9.0, 1.0, 0.0, 0.0]),
        ];
        sort_candidates(&mut candidates, SortKey::Relevance);
        assert_eq!(names(&candidates), vec!["b.pdf", "a.pdf"]);
        sort_candidates(&mut candidates, SortKey::Education);
        assert_eq!(names(&candidates), vec!["a.pdf", "b.pdf"]);
    }

    #[test]
    fn test_sort_key_accepts_both_spellings() {
        let key: SortKey = serde_json::from_str(r#""previous_jobs""#).unwrap();
        assert_eq!(key, SortKey::PreviousJobs);
        let key: SortKey = serde_json::from_str(r#""totalScore""#).unwrap();
        assert_eq!(key, SortKey::TotalScore);
    }
}
