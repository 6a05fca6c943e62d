//! PDF text extraction: full plain text plus positioned text runs.
//!
//! Font decoding (simple encodings, `/Differences`, `/ToUnicode` CMaps and
//! CID fonts) is left to `pdf_extract`; this module only collects the glyphs
//! it emits into runs. Positions are in page space (origin bottom-left, y
//! grows upwards).

use std::panic::{self, AssertUnwindSafe};

use pdf_extract::{Document, MediaBox, OutputDev, OutputError, Transform};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AppError;

/// Horizontal gap (in ems) between glyphs that reads as a word break.
const WORD_GAP: f64 = 0.2;
/// Horizontal gap (in ems) past which glyphs on one baseline start a new run.
const RUN_GAP: f64 = 0.5;
/// Vertical drift (in ems) that still counts as the same baseline.
const BASELINE_TOLERANCE: f64 = 0.5;

/// One low-level text run with its on-page start position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedFragment {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub page_width: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedDocument {
    /// Runs joined by spaces per page, pages separated by a newline.
    pub text: String,
    /// Every run of every page, in document order.
    pub positions: Vec<PositionedFragment>,
    pub num_pages: usize,
}

/// Decodes a PDF payload. Fails with [`AppError::PdfParse`] if the bytes are
/// not a PDF or a page cannot be decoded; no partial output is returned in
/// that case.
pub fn extract_pdf(bytes: &[u8]) -> Result<ExtractedDocument, AppError> {
    let doc = Document::load_mem(bytes).map_err(|e| AppError::PdfParse(e.to_string()))?;
    let num_pages = doc.get_pages().len();

    let mut collector = RunCollector::default();
    // pdf_extract panics on some malformed font and page dictionaries.
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::output_doc(&doc, &mut collector)
    }));
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(AppError::PdfParse(output_error_message(&e))),
        Err(_) => {
            return Err(AppError::PdfParse(
                "unsupported or malformed PDF structure".to_string(),
            ))
        }
    }

    let mut page_texts = Vec::with_capacity(collector.pages.len());
    let mut positions = Vec::new();
    for (page_num, runs) in collector.pages.into_iter().enumerate() {
        let text = runs
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        debug!("Page {}: {} runs, {} chars", page_num + 1, runs.len(), text.len());
        page_texts.push(text);
        positions.extend(runs);
    }

    Ok(ExtractedDocument {
        text: page_texts.join("\n"),
        positions,
        num_pages,
    })
}

fn output_error_message(err: &OutputError) -> String {
    match err {
        OutputError::FormatError(e) => e.to_string(),
        OutputError::IoError(e) => e.to_string(),
        OutputError::PdfError(e) => e.to_string(),
    }
}

/// A run being assembled from consecutive glyphs.
struct OpenRun {
    text: String,
    x: f64,
    y: f64,
    /// Where the last glyph ended on the baseline.
    end_x: f64,
    em: f64,
}

/// Groups decoded glyphs into runs: glyphs stay in one run while they share
/// a baseline and follow each other closely.
#[derive(Default)]
struct RunCollector {
    pages: Vec<Vec<PositionedFragment>>,
    page_width: f64,
    open: Option<OpenRun>,
}

impl RunCollector {
    fn close_run(&mut self) {
        let Some(run) = self.open.take() else {
            return;
        };
        let text = run.text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            return;
        }
        if let Some(page) = self.pages.last_mut() {
            page.push(PositionedFragment {
                text,
                x: run.x,
                y: run.y,
                page_width: self.page_width,
            });
        }
    }
}

/// Rendered size of one em under the text rendering matrix.
fn em_size(trm: &Transform, font_size: f64) -> f64 {
    let scale = (trm.m11 * trm.m22 - trm.m12 * trm.m21).abs().sqrt();
    let em = font_size * scale;
    if em > 0.0 {
        em
    } else {
        font_size.abs().max(1.0)
    }
}

impl OutputDev for RunCollector {
    fn begin_page(
        &mut self,
        _page_num: u32,
        media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> Result<(), OutputError> {
        self.pages.push(Vec::new());
        self.page_width = media_box.urx - media_box.llx;
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), OutputError> {
        self.close_run();
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        _spacing: f64,
        font_size: f64,
        char: &str,
    ) -> Result<(), OutputError> {
        let (x, y) = (trm.m31, trm.m32);
        let em = em_size(trm, font_size);

        let continues = self.open.as_ref().is_some_and(|run| {
            (y - run.y).abs() <= BASELINE_TOLERANCE * run.em
                && x >= run.end_x - RUN_GAP * run.em
                && x - run.end_x <= RUN_GAP * run.em
        });
        if !continues {
            self.close_run();
            self.open = Some(OpenRun {
                text: String::new(),
                x,
                y,
                end_x: x,
                em,
            });
        }

        if let Some(run) = self.open.as_mut() {
            if x - run.end_x > WORD_GAP * run.em && !run.text.ends_with(' ') {
                run.text.push(' ');
            }
            run.text.push_str(char);
            run.end_x = x + width * em;
        }
        Ok(())
    }

    fn begin_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}
