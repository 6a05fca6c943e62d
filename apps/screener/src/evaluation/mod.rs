//! Everything that talks to the language model: the CV evaluation, interview
//! questions and recruiter chat, plus the validator guarding their replies.

pub mod chat;
pub mod evaluator;
pub mod handlers;
pub mod prompts;
pub mod questions;
pub mod validator;

pub use validator::AnalysisResult;
