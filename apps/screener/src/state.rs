use std::sync::Arc;

use crate::candidates::CandidateStore;
use crate::config::Config;
use crate::errors::AppError;
use crate::evaluation::chat::ChatSessions;
use crate::llm_client::LanguageModel;
use crate::pipeline::{DocumentArchive, Ingestor};
use crate::searches::SearchService;
use crate::settings::load_settings;
use crate::store::{RecordStore, Repository};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub repo: Repository,
    pub searches: Arc<SearchService>,
    pub candidates: Arc<CandidateStore>,
    pub ingestor: Ingestor,
    /// Pluggable model backend. Production: `LlmClient`.
    pub llm: Arc<dyn LanguageModel>,
    pub archive: Arc<dyn DocumentArchive>,
    /// Chat transcripts live only as long as the process.
    pub chats: Arc<ChatSessions>,
    pub config: Config,
}

impl AppState {
    /// Wires every service over one record store, archive and model.
    pub fn new(
        config: Config,
        store: Arc<dyn RecordStore>,
        archive: Arc<dyn DocumentArchive>,
        llm: Arc<dyn LanguageModel>,
    ) -> Self {
        let repo = Repository::new(store);
        let candidates = Arc::new(CandidateStore::new(repo.clone()));
        let chats = Arc::new(ChatSessions::new());
        let searches = Arc::new(SearchService::new(
            repo.clone(),
            candidates.clone(),
            archive.clone(),
            chats.clone(),
        ));
        let ingestor = Ingestor::new(
            candidates.clone(),
            llm.clone(),
            archive.clone(),
            config.ingest_concurrency,
        );

        Self {
            repo,
            searches,
            candidates,
            ingestor,
            llm,
            archive,
            chats,
            config,
        }
    }

    /// Model used for generation calls: the user's selection, else the
    /// configured default.
    pub async fn model_id(&self) -> Result<String, AppError> {
        let settings = load_settings(&self.repo).await?;
        Ok(settings.model_or(&self.config.llm_default_model).to_string())
    }
}
