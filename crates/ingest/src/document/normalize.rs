//! Text normalization and Document construction.

use chrono::Utc;
use mytuts_core::{DocId, Document, PageBoundary, SkippedPage};

use super::chunker::ChunkError;
use super::ExtractedDocument;

/// Collapse whitespace runs to a single space, replace control and invisible
/// characters with whitespace, and trim both ends.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.chars() {
        if c.is_whitespace() || is_artifact(c) {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(c);
    }
    out
}

/// Characters that survive PDF extraction but carry no text.
fn is_artifact(c: char) -> bool {
    c.is_control()
        || matches!(
            c,
            '\u{FFFD}' | '\u{00AD}' | '\u{200B}'..='\u{200D}' | '\u{2060}' | '\u{FEFF}'
        )
}

/// Normalize every page and join them into one Document, recording where
/// each page starts. Pages that normalize to nothing join the skipped list.
pub fn build_document(id: DocId, extracted: &ExtractedDocument) -> Result<Document, ChunkError> {
    let mut raw_text = String::new();
    let mut page_boundaries = Vec::with_capacity(extracted.pages.len());
    let mut skipped_pages = extracted.skipped_pages.clone();

    for page in &extracted.pages {
        let normalized = normalize_text(&page.text);
        if normalized.is_empty() {
            skipped_pages.push(SkippedPage {
                page_number: page.page_number,
                reason: "no text left after normalization".to_string(),
            });
            continue;
        }
        if !raw_text.is_empty() {
            raw_text.push(' ');
        }
        page_boundaries.push(PageBoundary {
            page_number: page.page_number,
            offset: raw_text.len(),
        });
        raw_text.push_str(&normalized);
    }

    if raw_text.is_empty() {
        return Err(ChunkError::EmptyDocument {
            document: extracted.filename.clone(),
        });
    }

    skipped_pages.sort_by_key(|p| p.page_number);

    Ok(Document {
        id,
        filename: extracted.filename.clone(),
        file_type: extracted.file_type.clone(),
        raw_text,
        page_boundaries,
        skipped_pages,
        ingested_at: Utc::now(),
    })
}
