pub mod handlers;
pub mod selection;
pub mod sorting;
pub mod store;

pub use selection::{SelectionSet, Workflow, MAX_SELECTION};
pub use sorting::SortKey;
pub use store::CandidateStore;
