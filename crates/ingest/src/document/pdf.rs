use super::{empty_page, ExtractionError, PageContent, PageOutcome};

/// Extract a PDF page by page. Pages are separated by form feeds in the
/// `pdf-extract` output; a page without text is reported as skipped rather
/// than aborting the whole document.
pub fn extract_pdf(bytes: &[u8]) -> Result<Vec<PageOutcome>, ExtractionError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| ExtractionError::PdfError(e.to_string()))?;

    Ok(split_pages(&text))
}

fn split_pages(text: &str) -> Vec<PageOutcome> {
    let mut segments: Vec<&str> = text.split('\x0C').collect();
    // A trailing form feed closes the last page rather than opening a new one.
    if segments.len() > 1 && segments.last().is_some_and(|s| s.trim().is_empty()) {
        segments.pop();
    }

    segments
        .into_iter()
        .enumerate()
        .map(|(i, page_text)| {
            let page_text = page_text.trim();
            if page_text.is_empty() {
                empty_page(i + 1)
            } else {
                PageOutcome::Extracted(PageContent {
                    page_number: i + 1,
                    text: page_text.to_string(),
                    headings: Vec::new(),
                })
            }
        })
        .collect()
}
