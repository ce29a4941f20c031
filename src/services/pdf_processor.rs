use lopdf::Document;
use std::time::Instant;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::UploadedDocument;

pub struct PdfProcessor;

#[derive(Debug)]
pub struct ExtractionResult {
    pub text: String,
    pub pages: usize,
    pub pages_with_text: usize,
    pub processing_time_ms: u64,
}

impl PdfProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Decodes the upload off the async workers; lopdf parsing is CPU-bound.
    pub async fn extract_text(&self, document: &UploadedDocument) -> AppResult<ExtractionResult> {
        info!(
            "Starting PDF text extraction for file: {} ({} bytes)",
            document.file_name,
            document.size()
        );

        let content = document.content.clone();
        let span = tracing::Span::current();
        tokio::task::spawn_blocking(move || span.in_scope(|| Self::extract_from_bytes(&content)))
            .await?
    }

    pub fn extract_from_bytes(content: &[u8]) -> AppResult<ExtractionResult> {
        let start = Instant::now();

        let doc = Document::load_mem(content).map_err(|e| {
            debug!("PDF structure could not be decoded: {}", e);
            AppError::from(e)
        })?;

        // get_pages is keyed by page number, so iteration follows document order.
        let pages = doc.get_pages();
        let page_texts: Vec<String> = pages
            .keys()
            .map(|&page_number| match doc.extract_text(&[page_number]) {
                Ok(text) => text,
                Err(e) => {
                    debug!(page = page_number, "No extractable text on page: {}", e);
                    String::new()
                }
            })
            .collect();

        let pages_with_text = page_texts.iter().filter(|t| !t.trim().is_empty()).count();
        let text = join_pages(&page_texts);

        if text.trim().is_empty() {
            info!(pages = pages.len(), "PDF decoded but no page yielded text");
            return Err(AppError::NoExtractableText);
        }

        let processing_time = start.elapsed().as_millis() as u64;

        info!(
            "PDF processing completed in {}ms, extracted {} characters from {}/{} pages",
            processing_time,
            text.chars().count(),
            pages_with_text,
            pages.len()
        );

        Ok(ExtractionResult {
            text,
            pages: pages.len(),
            pages_with_text,
            processing_time_ms: processing_time,
        })
    }
}

impl Default for PdfProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Joins per-page text in order, one newline after each page. Blank pages are
/// dropped entirely rather than leaving an empty line behind.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    let mut joined = String::new();
    for page in pages {
        let page = page.as_ref().trim_end_matches(|c| c == '\n' || c == '\r');
        if page.trim().is_empty() {
            continue;
        }
        joined.push_str(page);
        joined.push('\n');
    }
    joined
}
