pub mod candidate;
pub mod criteria;
pub mod scores;
pub mod search;
pub mod settings;

pub use candidate::{Candidate, ContactInfo, InterviewQuestion, Note, PipelineStatus};
pub use criteria::{Criterion, EvaluationCriteria};
pub use scores::{Dimension, DimensionAnalysis, DimensionScores, OutOfRange};
pub use search::{Search, SearchStatus};
pub use settings::AppSettings;
