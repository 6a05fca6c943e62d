use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::evaluation::prompts::{fill_template, CANDIDATE_SEPARATOR, CHAT_PROMPT_TEMPLATE};
use crate::llm_client::prompts::RECRUITER_ASSISTANT_SYSTEM;
use crate::llm_client::LanguageModel;
use crate::models::Candidate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: ChatRole, content: String) -> Self {
        Self {
            role,
            content,
            timestamp: Utc::now(),
        }
    }
}

/// Messages kept per transcript; older ones are dropped first.
pub const MAX_TRANSCRIPT_MESSAGES: usize = 50;

/// In-memory chat transcripts, one per Search. Never persisted.
#[derive(Default)]
pub struct ChatSessions {
    transcripts: RwLock<HashMap<Uuid, Vec<ChatMessage>>>,
}

impl ChatSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn transcript(&self, search_id: Uuid) -> Vec<ChatMessage> {
        self.transcripts
            .read()
            .await
            .get(&search_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn append(&self, search_id: Uuid, messages: [ChatMessage; 2]) {
        let mut transcripts = self.transcripts.write().await;
        let transcript = transcripts.entry(search_id).or_default();
        transcript.extend(messages);
        let excess = transcript.len().saturating_sub(MAX_TRANSCRIPT_MESSAGES);
        transcript.drain(..excess);
    }

    pub async fn clear(&self, search_id: Uuid) {
        self.transcripts.write().await.remove(&search_id);
    }
}

/// Concatenates what the assistant may know about each candidate.
pub fn build_chat_context(candidates: &[Candidate]) -> String {
    candidates
        .iter()
        .map(|c| {
            let notes = c
                .notes
                .iter()
                .map(|n| n.content.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            format!(
                "CANDIDATE: {}\nTOTAL SCORE: {:.1}/40\nSUMMARY: {}\nNOTES: {}\nCV:\n{}",
                c.name.as_deref().unwrap_or(&c.file_name),
                c.total_score(),
                c.critical_analysis.as_deref().unwrap_or("Not available"),
                if notes.is_empty() { "None" } else { notes.as_str() },
                c.cv_text
            )
        })
        .collect::<Vec<_>>()
        .join(CANDIDATE_SEPARATOR)
}

/// Asks a free-text question about the given candidates. The reply is opaque
/// text; both sides are appended to the Search's transcript only on success.
pub async fn ask(
    llm: &dyn LanguageModel,
    model: &str,
    sessions: &ChatSessions,
    search_id: Uuid,
    candidates: &[Candidate],
    question: &str,
) -> Result<ChatMessage, AppError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(AppError::Validation("question must not be empty".to_string()));
    }
    if candidates.is_empty() {
        return Err(AppError::Validation(
            "select at least one candidate to chat about".to_string(),
        ));
    }

    let context = build_chat_context(candidates);
    let prompt = fill_template(
        CHAT_PROMPT_TEMPLATE,
        &[("candidates", &context), ("question", question)],
    );
    let reply = llm.complete(RECRUITER_ASSISTANT_SYSTEM, &prompt, model).await?;

    let answer = ChatMessage::new(ChatRole::Assistant, reply);
    sessions
        .append(
            search_id,
            [
                ChatMessage::new(ChatRole::User, question.to_string()),
                answer.clone(),
            ],
        )
        .await;

    info!(
        "Chat answered for search {search_id} over {} candidates",
        candidates.len()
    );
    Ok(answer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_candidate, ScriptedModel};

    #[test]
    fn test_context_separates_candidates() {
        let search_id = Uuid::new_v4();
        let mut a = sample_candidate(search_id, "a.pdf", [8.0, 8.0, 8.0, 8.0]);
        a.name = Some("Ana Ruiz".into());
        a.critical_analysis = Some("Strong lead".into());
        let b = sample_candidate(search_id, "b.pdf", [1.0, 2.0, 3.0, 4.0]);

        let context = build_chat_context(&[a, b]);
        let parts: Vec<_> = context.split(CANDIDATE_SEPARATOR).collect();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].contains("CANDIDATE: Ana Ruiz"));
        assert!(parts[0].contains("TOTAL SCORE: 32.0/40"));
        assert!(parts[0].contains("Strong lead"));
        assert!(parts[1].contains("CANDIDATE: b.pdf"));
        assert!(parts[1].contains("TOTAL SCORE: 10.0/40"));
    }

    #[tokio::test]
    async fn test_ask_appends_to_transcript() {
        let sessions = ChatSessions::new();
        let llm = ScriptedModel::always("Ana has the stronger background.");
        let search_id = Uuid::new_v4();
        let candidate = sample_candidate(search_id, "a.pdf", [5.0; 4]);

        let answer = ask(&llm, "m", &sessions, search_id, &[candidate], "Who is stronger?")
            .await
            .unwrap();
        assert_eq!(answer.content, "Ana has the stronger background.");

        let transcript = sessions.transcript(search_id).await;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, ChatRole::User);
        assert_eq!(transcript[0].content, "Who is stronger?");
        assert_eq!(transcript[1].role, ChatRole::Assistant);
    }

    #[tokio::test]
    async fn test_cv_text_cannot_inject_the_question() {
        let sessions = ChatSessions::new();
        let llm = ScriptedModel::always("ok");
        let search_id = Uuid::new_v4();
        let mut candidate = sample_candidate(search_id, "a.pdf", [5.0; 4]);
        candidate.cv_text = "Skills: templating with {question} markers".into();

        ask(&llm, "m", &sessions, search_id, &[candidate], "Who leads?")
            .await
            .unwrap();
        let prompt = &llm.calls()[0].prompt;
        assert!(prompt.contains("templating with {question} markers"));
        assert_eq!(prompt.matches("Who leads?").count(), 1);
    }

    #[tokio::test]
    async fn test_transcript_keeps_most_recent_messages() {
        let sessions = ChatSessions::new();
        let llm = ScriptedModel::always("answer");
        let search_id = Uuid::new_v4();
        let candidate = sample_candidate(search_id, "a.pdf", [5.0; 4]);

        let turns = MAX_TRANSCRIPT_MESSAGES / 2 + 3;
        for turn in 0..turns {
            let question = format!("question {turn}");
            ask(&llm, "m", &sessions, search_id, std::slice::from_ref(&candidate), &question)
                .await
                .unwrap();
        }

        let transcript = sessions.transcript(search_id).await;
        assert_eq!(transcript.len(), MAX_TRANSCRIPT_MESSAGES);
        assert_eq!(transcript[0].role, ChatRole::User);
        assert_eq!(transcript[0].content, "question 3");
        assert_eq!(
            transcript[MAX_TRANSCRIPT_MESSAGES - 2].content,
            format!("question {}", turns - 1)
        );
    }

    #[tokio::test]
    async fn test_failed_ask_leaves_transcript_untouched() {
        let sessions = ChatSessions::new();
        let llm = ScriptedModel::failing(500, "upstream down");
        let search_id = Uuid::new_v4();
        let candidate = sample_candidate(search_id, "a.pdf", [5.0; 4]);

        let err = ask(&llm, "m", &sessions, search_id, &[candidate], "Anything?")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ModelRequest { status: Some(500), .. }));
        assert!(sessions.transcript(search_id).await.is_empty());
    }

    #[tokio::test]
    async fn test_ask_requires_candidates() {
        let sessions = ChatSessions::new();
        let llm = ScriptedModel::always("x");
        let err = ask(&llm, "m", &sessions, Uuid::new_v4(), &[], "Hi?")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
