//! Fixtures shared by the unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use uuid::Uuid;

use crate::config::{Config, StoreBackend};
use crate::llm_client::{LanguageModel, LlmError};
use crate::models::{
    Candidate, DimensionAnalysis, DimensionScores, EvaluationCriteria, PipelineStatus, Search,
    SearchStatus,
};
use crate::pipeline::MemoryArchive;
use crate::state::AppState;
use crate::store::MemoryRecordStore;

/// A well-formed evaluation reply totalling 25.
pub const VALID_EVALUATION: &str = r#"{
  "relevance": 8,
  "education": 6,
  "previousJobs": 7,
  "proactivity": 4,
  "analysis": {
    "relevance": "Years of Rust on backend services.",
    "education": "BSc in Computer Science.",
    "previousJobs": "Two relevant engineering roles.",
    "proactivity": "Few side projects."
  },
  "strengths": ["Rust", "Distributed systems"],
  "weaknesses": ["No cloud certifications"],
  "criticalAnalysis": "Solid fit for the role."
}"#;

/// Candidate with no inferred name and the given dimension scores.
pub fn sample_candidate(search_id: Uuid, file_name: &str, scores: [f64; 4]) -> Candidate {
    let now = Utc::now();
    Candidate {
        id: Uuid::new_v4(),
        search_id,
        file_name: file_name.to_string(),
        cv_text: format!("Curriculum of {file_name}"),
        pdf_key: None,
        name: None,
        email: Some("candidate@example.com".to_string()),
        phone: None,
        scores: DimensionScores::new(scores[0], scores[1], scores[2], scores[3])
            .expect("sample scores in range"),
        analysis: DimensionAnalysis::default(),
        strengths: vec![],
        weaknesses: vec![],
        critical_analysis: None,
        notes: vec![],
        is_favorite: false,
        interview_date: None,
        tags: vec![],
        interview_questions: vec![],
        status: PipelineStatus::New,
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_search(job_description: &str) -> Search {
    let now = Utc::now();
    Search {
        id: Uuid::new_v4(),
        name: "Sample search".to_string(),
        job_description: job_description.to_string(),
        personalized_instructions: None,
        evaluation_criteria: EvaluationCriteria::default(),
        status: SearchStatus::Active,
        created_at: now,
        updated_at: now,
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: String,
    pub prompt: String,
    pub model: String,
}

enum Script {
    Reply(String),
    Fail { status: u16, message: String },
}

/// A `LanguageModel` that answers every call the same way and records what
/// it was asked.
pub struct ScriptedModel {
    script: Script,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedModel {
    pub fn always(reply: &str) -> Self {
        Self {
            script: Script::Reply(reply.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: u16, message: &str) -> Self {
        Self {
            script: Script::Fail {
                status,
                message: message.to_string(),
            },
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model_id: &str,
    ) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(RecordedCall {
            system: system_prompt.to_string(),
            prompt: user_prompt.to_string(),
            model: model_id.to_string(),
        });
        match &self.script {
            Script::Reply(reply) => Ok(reply.clone()),
            Script::Fail { status, message } => Err(LlmError::Api {
                status: *status,
                message: message.clone(),
            }),
        }
    }
}

pub fn test_config() -> Config {
    Config {
        backend: StoreBackend::Memory,
        llm_api_key: "test-key".to_string(),
        llm_api_url: "http://localhost:0".to_string(),
        llm_default_model: "gpt-4o-mini".to_string(),
        ingest_concurrency: 3,
        max_upload_mb: 25,
        port: 0,
        rust_log: "debug".to_string(),
    }
}

/// Full application state over in-memory backends.
pub fn test_state(llm: ScriptedModel) -> (AppState, Arc<ScriptedModel>) {
    let llm = Arc::new(llm);
    let state = AppState::new(
        test_config(),
        Arc::new(MemoryRecordStore::new()),
        Arc::new(MemoryArchive::new()),
        llm.clone(),
    );
    (state, llm)
}

/// Builds a US Letter PDF, one entry per page, each placing `(text, x, y)`
/// runs in 12pt Helvetica.
pub fn pdf_with_pages(pages: &[&[(&str, i64, i64)]]) -> Vec<u8> {
    let contents = pages
        .iter()
        .map(|fragments| {
            fragments
                .iter()
                .flat_map(|(text, x, y)| {
                    [
                        Operation::new("BT", vec![]),
                        Operation::new("Tf", vec!["F1".into(), 12.into()]),
                        Operation::new("Td", vec![(*x).into(), (*y).into()]),
                        Operation::new("Tj", vec![Object::string_literal(*text)]),
                        Operation::new("ET", vec![]),
                    ]
                })
                .collect()
        })
        .collect();

    let mut doc = Document::with_version("1.5");
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    finish_pdf(doc, font_id, contents)
}

/// One-page PDF whose content stream is exactly `operations`, with Helvetica
/// available as `F1`.
pub fn pdf_from_operations(operations: Vec<Operation>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    finish_pdf(doc, font_id, vec![operations])
}

/// One-page PDF drawing `codes` in a Type0 / Identity-H font, the way word
/// processors embed subset fonts. Glyph ids only become text through the
/// font's ToUnicode map, given as `(glyph id, char)` pairs.
pub fn pdf_with_identity_font(to_unicode: &[(u16, char)], codes: &[u16]) -> Vec<u8> {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
         /CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );
    cmap.push_str(&format!("{} beginbfchar\n", to_unicode.len()));
    for (glyph, ch) in to_unicode {
        cmap.push_str(&format!("<{glyph:04X}> <{:04X}>\n", *ch as u32));
    }
    cmap.push_str(
        "endbfchar\nendcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n",
    );

    let mut doc = Document::with_version("1.5");
    let to_unicode_id = doc.add_object(Stream::new(dictionary! {}, cmap.into_bytes()));
    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => "AAAAAA+Calibri",
        "Flags" => 32,
        "FontBBox" => vec![0.into(), (-250).into(), 1000.into(), 750.into()],
        "ItalicAngle" => 0,
        "Ascent" => 750,
        "Descent" => -250,
        "CapHeight" => 700,
        "StemV" => 80,
    });
    let cid_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => "AAAAAA+Calibri",
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => descriptor_id,
        "DW" => 500,
    });
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => "AAAAAA+Calibri",
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![cid_font_id.into()],
        "ToUnicode" => to_unicode_id,
    });

    let glyphs: Vec<u8> = codes.iter().flat_map(|c| c.to_be_bytes()).collect();
    let operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 12.into()]),
        Operation::new("Td", vec![72.into(), 700.into()]),
        Operation::new("Tj", vec![Object::String(glyphs, StringFormat::Hexadecimal)]),
        Operation::new("ET", vec![]),
    ];
    finish_pdf(doc, font_id, vec![operations])
}

/// Adds pages (one content stream each), the page tree and the catalog, all
/// sharing `font_id` as `F1`, and serialises the document.
fn finish_pdf(mut doc: Document, font_id: ObjectId, pages: Vec<Vec<Operation>>) -> Vec<u8> {
    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("write pdf");
    bytes
}
