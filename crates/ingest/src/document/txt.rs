use super::{empty_page, PageContent, PageOutcome};

pub fn extract_txt(bytes: &[u8]) -> Vec<PageOutcome> {
    // Try UTF-8 first, fall back to lossy conversion
    let text = String::from_utf8(bytes.to_vec())
        .unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned());

    let text = text.trim();
    if text.is_empty() {
        return vec![empty_page(1)];
    }

    vec![PageOutcome::Extracted(PageContent {
        page_number: 1,
        text: text.to_string(),
        headings: Vec::new(),
    })]
}
