//! Batch ingestion: extract → infer → evaluate → persist, per file, with a
//! bounded number of files in flight.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::candidates::CandidateStore;
use crate::errors::AppError;
use crate::evaluation::evaluator::evaluate_cv;
use crate::evaluation::validator::AnalysisResult;
use crate::extraction::{extract_pdf, infer_contact_info};
use crate::llm_client::LanguageModel;
use crate::models::{Candidate, ContactInfo, PipelineStatus, Search};
use crate::pipeline::archive::{pdf_key, DocumentArchive};

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestFailure {
    /// Zero-based position of the file in the upload.
    pub index: usize,
    pub file_name: String,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub created: Vec<Candidate>,
    pub failures: Vec<IngestFailure>,
}

/// Builds the candidate record from a successful pipeline run.
pub fn new_candidate(
    search_id: Uuid,
    file_name: String,
    cv_text: String,
    contact: ContactInfo,
    result: AnalysisResult,
) -> Candidate {
    let now = Utc::now();
    Candidate {
        id: Uuid::new_v4(),
        search_id,
        file_name,
        cv_text,
        pdf_key: None,
        name: contact.name,
        email: contact.email,
        phone: contact.phone,
        scores: result.scores,
        analysis: result.analysis,
        strengths: result.strengths,
        weaknesses: result.weaknesses,
        critical_analysis: result.critical_analysis,
        notes: Vec::new(),
        is_favorite: false,
        interview_date: None,
        tags: Vec::new(),
        interview_questions: Vec::new(),
        status: PipelineStatus::New,
        created_at: now,
        updated_at: now,
    }
}

#[derive(Clone)]
pub struct Ingestor {
    candidates: Arc<CandidateStore>,
    llm: Arc<dyn LanguageModel>,
    archive: Arc<dyn DocumentArchive>,
    concurrency: usize,
}

impl Ingestor {
    pub fn new(
        candidates: Arc<CandidateStore>,
        llm: Arc<dyn LanguageModel>,
        archive: Arc<dyn DocumentArchive>,
        concurrency: usize,
    ) -> Self {
        Self {
            candidates,
            llm,
            archive,
            concurrency: concurrency.max(1),
        }
    }

    /// Runs every file through the pipeline. A failing file never aborts its
    /// siblings; failures are collected and reported once the batch is done.
    pub async fn ingest_batch(
        &self,
        search: Search,
        model: String,
        files: Vec<UploadedFile>,
    ) -> BatchReport {
        let total = files.len();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let search = Arc::new(search);
        let model: Arc<str> = Arc::from(model);

        let mut pending: BTreeMap<usize, String> = BTreeMap::new();
        let mut set = JoinSet::new();

        for (index, file) in files.into_iter().enumerate() {
            pending.insert(index, file.file_name.clone());
            let ingestor = self.clone();
            let semaphore = semaphore.clone();
            let search = search.clone();
            let model = model.clone();

            set.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => ingestor.ingest_one(&search, &model, file).await,
                    Err(e) => Err(AppError::Internal(anyhow::anyhow!(
                        "ingest semaphore closed: {e}"
                    ))),
                };
                (index, result)
            });
        }

        let mut report = BatchReport::default();
        let mut crashes = Vec::new();

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, result)) => {
                    let file_name = pending.remove(&index).unwrap_or_default();
                    match result {
                        Ok(candidate) => report.created.push(candidate),
                        Err(e) => {
                            warn!("Failed to ingest '{file_name}': {e}");
                            report.failures.push(IngestFailure {
                                index,
                                file_name,
                                code: e.code().to_string(),
                                message: e.to_string(),
                            });
                        }
                    }
                }
                Err(e) => crashes.push(e.to_string()),
            }
        }

        // Whatever is still pending belongs to a task that never reported back.
        let crash_message = if crashes.is_empty() {
            "ingest task did not complete".to_string()
        } else {
            format!("ingest task failed: {}", crashes.join("; "))
        };
        for (index, file_name) in pending {
            warn!("Failed to ingest '{file_name}': {crash_message}");
            report.failures.push(IngestFailure {
                index,
                file_name,
                code: "INTERNAL_ERROR".to_string(),
                message: crash_message.clone(),
            });
        }
        report.failures.sort_by_key(|f| f.index);

        info!(
            "Batch for search {} finished: {} of {total} files ingested, {} failed",
            search.id,
            report.created.len(),
            report.failures.len()
        );
        report
    }

    async fn ingest_one(
        &self,
        search: &Search,
        model: &str,
        file: UploadedFile,
    ) -> Result<Candidate, AppError> {
        let UploadedFile { file_name, bytes } = file;

        // PDF decoding is CPU-bound.
        let decode_bytes = bytes.clone();
        let extracted = tokio::task::spawn_blocking(move || extract_pdf(&decode_bytes))
            .await
            .map_err(|e| AppError::PdfParse(format!("decoder crashed: {e}")))??;

        if extracted.text.trim().is_empty() {
            return Err(AppError::PdfParse("no extractable text".to_string()));
        }

        let contact = infer_contact_info(&extracted.text, Some(&extracted.positions));
        let result = evaluate_cv(self.llm.as_ref(), model, &extracted.text, search).await?;

        let mut candidate = new_candidate(search.id, file_name, extracted.text, contact, result);

        let key = pdf_key(search.id, candidate.id);
        match self.archive.put(&key, bytes).await {
            Ok(()) => candidate.pdf_key = Some(key),
            Err(e) => warn!(
                "Candidate {} created without its original PDF: {e}",
                candidate.id
            ),
        }

        if let Err(e) = self.candidates.create(&candidate).await {
            if let Some(key) = &candidate.pdf_key {
                if let Err(cleanup) = self.archive.delete(key).await {
                    warn!("Could not delete archived PDF {key}: {cleanup}");
                }
            }
            return Err(e);
        }
        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::llm_client::LlmError;
    use crate::pipeline::archive::MemoryArchive;
    use crate::store::{MemoryRecordStore, Repository};
    use crate::test_support::{pdf_with_pages, sample_search, ScriptedModel, VALID_EVALUATION};

    struct BrokenArchive;

    #[async_trait]
    impl DocumentArchive for BrokenArchive {
        async fn put(&self, _key: &str, _bytes: Bytes) -> Result<(), AppError> {
            Err(AppError::Archive("bucket unreachable".to_string()))
        }

        async fn get(&self, _key: &str) -> Result<Option<Bytes>, AppError> {
            Ok(None)
        }

        async fn delete(&self, _key: &str) -> Result<(), AppError> {
            Ok(())
        }
    }

    /// Holds every call for a while and records how many overlap.
    #[derive(Default)]
    struct SlowModel {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl LanguageModel for SlowModel {
        async fn complete(&self, _system: &str, _prompt: &str, _model: &str) -> Result<String, LlmError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(VALID_EVALUATION.to_string())
        }
    }

    /// Deletes the search being ingested before answering, as a user
    /// deleting it while the batch is still running would.
    struct SearchDeletingModel {
        store: Arc<CandidateStore>,
        search_id: Uuid,
    }

    #[async_trait]
    impl LanguageModel for SearchDeletingModel {
        async fn complete(&self, _system: &str, _prompt: &str, _model: &str) -> Result<String, LlmError> {
            self.store
                .delete_search(self.search_id)
                .await
                .map_err(|e| LlmError::Api {
                    status: 500,
                    message: e.to_string(),
                })?;
            Ok(VALID_EVALUATION.to_string())
        }
    }

    fn cv_pdf(name: &str) -> Bytes {
        Bytes::from(pdf_with_pages(&[&[
            (name, 400, 750),
            ("Senior engineer, 8 years of Rust", 72, 650),
            ("jane@example.com", 72, 630),
        ]]))
    }

    fn file(name: &str, bytes: Bytes) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            bytes,
        }
    }

    /// Candidate store holding one saved search.
    async fn store_with_search() -> (Arc<CandidateStore>, Search) {
        let repo = Repository::new(Arc::new(MemoryRecordStore::new()));
        let search = sample_search("Rust backend engineer");
        repo.put(&search).await.unwrap();
        (Arc::new(CandidateStore::new(repo)), search)
    }

    async fn ingestor(
        llm: Arc<dyn LanguageModel>,
        archive: Arc<dyn DocumentArchive>,
    ) -> (Ingestor, Arc<CandidateStore>, Search) {
        let (store, search) = store_with_search().await;
        (Ingestor::new(store.clone(), llm, archive, 3), store, search)
    }

    #[tokio::test]
    async fn test_corrupt_file_does_not_abort_batch() {
        let llm = Arc::new(ScriptedModel::always(VALID_EVALUATION));
        let archive = Arc::new(MemoryArchive::new());
        let (ingestor, store, search) = ingestor(llm, archive.clone()).await;
        let search_id = search.id;

        let files = vec![
            file("cv1.pdf", cv_pdf("Ana Ruiz")),
            file("cv2.pdf", cv_pdf("Ben Cole")),
            file("cv3.pdf", Bytes::from_static(b"this is not a pdf at all")),
            file("cv4.pdf", cv_pdf("Dan Ortiz")),
            file("cv5.pdf", cv_pdf("Eva Lind")),
        ];

        let report = ingestor.ingest_batch(search, "gpt-4o-mini".into(), files).await;

        assert_eq!(report.created.len(), 4);
        assert_eq!(report.failures.len(), 1);
        let failure = &report.failures[0];
        assert_eq!(failure.index, 2);
        assert_eq!(failure.file_name, "cv3.pdf");
        assert_eq!(failure.code, "PDF_PARSE_ERROR");

        let stored = store
            .list_by_search(search_id, Default::default())
            .await
            .unwrap();
        assert_eq!(stored.len(), 4);
        assert!(stored.iter().all(|c| c.status == PipelineStatus::New));
        assert!(stored.iter().all(|c| c.pdf_key.is_some()));
        assert_eq!(archive.len().await, 4);
    }

    #[tokio::test]
    async fn test_contact_fields_are_inferred() {
        let llm = Arc::new(ScriptedModel::always(VALID_EVALUATION));
        let (ingestor, _, search) = ingestor(llm, Arc::new(MemoryArchive::new())).await;

        let report = ingestor
            .ingest_batch(search, "m".into(), vec![file("ana.pdf", cv_pdf("Ana Ruiz"))])
            .await;

        let candidate = &report.created[0];
        assert_eq!(candidate.name.as_deref(), Some("Ana Ruiz"));
        assert_eq!(candidate.email.as_deref(), Some("jane@example.com"));
        assert_eq!(candidate.total_score(), 25.0);
    }

    #[tokio::test]
    async fn test_model_failure_is_recorded_per_file() {
        let llm = Arc::new(ScriptedModel::failing(401, "Incorrect API key provided"));
        let (ingestor, store, search) = ingestor(llm, Arc::new(MemoryArchive::new())).await;
        let search_id = search.id;

        let report = ingestor
            .ingest_batch(search, "m".into(), vec![file("a.pdf", cv_pdf("Ana Ruiz"))])
            .await;

        assert!(report.created.is_empty());
        assert_eq!(report.failures[0].code, "MODEL_REQUEST_ERROR");
        assert!(store
            .list_by_search(search_id, Default::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_malformed_reply_is_distinguished() {
        let llm = Arc::new(ScriptedModel::always("Sure! Here is my analysis..."));
        let (ingestor, _, search) = ingestor(llm, Arc::new(MemoryArchive::new())).await;
        let report = ingestor
            .ingest_batch(search, "m".into(), vec![file("a.pdf", cv_pdf("Ana Ruiz"))])
            .await;
        assert_eq!(report.failures[0].code, "RESPONSE_FORMAT_ERROR");
    }

    #[tokio::test]
    async fn test_pdf_without_text_is_rejected_before_model_call() {
        let llm = Arc::new(ScriptedModel::always(VALID_EVALUATION));
        let (ingestor, _, search) = ingestor(llm.clone(), Arc::new(MemoryArchive::new())).await;
        let blank = Bytes::from(pdf_with_pages(&[&[]]));

        let report = ingestor
            .ingest_batch(search, "m".into(), vec![file("blank.pdf", blank)])
            .await;

        assert_eq!(report.failures[0].code, "PDF_PARSE_ERROR");
        assert!(report.failures[0].message.contains("no extractable text"));
        assert!(llm.calls().is_empty());
    }

    #[tokio::test]
    async fn test_archive_failure_still_creates_candidate() {
        let llm = Arc::new(ScriptedModel::always(VALID_EVALUATION));
        let (ingestor, _, search) = ingestor(llm, Arc::new(BrokenArchive)).await;
        let report = ingestor
            .ingest_batch(search, "m".into(), vec![file("a.pdf", cv_pdf("Ana Ruiz"))])
            .await;

        assert_eq!(report.created.len(), 1);
        assert!(report.created[0].pdf_key.is_none());
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn test_files_in_flight_never_exceed_concurrency() {
        let llm = Arc::new(SlowModel::default());
        let (store, search) = store_with_search().await;
        let ingestor = Ingestor::new(store, llm.clone(), Arc::new(MemoryArchive::new()), 2);

        let files = (0..6)
            .map(|i| file(&format!("cv{i}.pdf"), cv_pdf("Ana Ruiz")))
            .collect();
        let report = ingestor.ingest_batch(search, "m".into(), files).await;

        assert_eq!(report.created.len(), 6);
        assert_eq!(llm.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_search_deleted_mid_batch_leaves_no_orphans() {
        let (store, search) = store_with_search().await;
        let search_id = search.id;
        let llm = Arc::new(SearchDeletingModel {
            store: store.clone(),
            search_id,
        });
        let archive = Arc::new(MemoryArchive::new());
        let ingestor = Ingestor::new(store.clone(), llm, archive.clone(), 2);

        let files = vec![
            file("cv1.pdf", cv_pdf("Ana Ruiz")),
            file("cv2.pdf", cv_pdf("Ben Cole")),
            file("cv3.pdf", cv_pdf("Dan Ortiz")),
        ];
        let report = ingestor.ingest_batch(search, "m".into(), files).await;

        assert!(report.created.is_empty());
        assert_eq!(report.failures.len(), 3);
        assert!(report.failures.iter().all(|f| f.code == "NOT_FOUND"));
        assert!(store
            .list_by_search(search_id, Default::default())
            .await
            .unwrap()
            .is_empty());
        // PDFs archived before the insert was refused are removed again.
        assert_eq!(archive.len().await, 0);
    }
}
