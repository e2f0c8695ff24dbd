pub mod chunker;
mod md;
pub mod normalize;
mod pdf;
mod txt;

use std::path::Path;

use mytuts_core::SkippedPage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("PDF extraction failed: {0}")]
    PdfError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A page of extracted text with metadata.
#[derive(Debug, Clone)]
pub struct PageContent {
    /// 1-based page number (for PDFs). For TXT/MD, always 1.
    pub page_number: usize,
    /// The extracted text content.
    pub text: String,
    /// Headings found on this page (for MD files).
    pub headings: Vec<String>,
}

/// Outcome of extracting a single page.
#[derive(Debug, Clone)]
pub enum PageOutcome {
    Extracted(PageContent),
    Skipped(SkippedPage),
}

/// Result of extracting text from a document.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    /// Original filename.
    pub filename: String,
    /// File type: "pdf", "txt", "md"
    pub file_type: String,
    /// Extracted pages with text and metadata.
    pub pages: Vec<PageContent>,
    /// Pages that yielded no text, in page order.
    pub skipped_pages: Vec<SkippedPage>,
}

impl ExtractedDocument {
    fn from_outcomes(filename: &str, file_type: &str, outcomes: Vec<PageOutcome>) -> Self {
        let mut pages = Vec::new();
        let mut skipped_pages = Vec::new();
        for outcome in outcomes {
            match outcome {
                PageOutcome::Extracted(page) => pages.push(page),
                PageOutcome::Skipped(skipped) => skipped_pages.push(skipped),
            }
        }
        Self {
            filename: filename.to_string(),
            file_type: file_type.to_string(),
            pages,
            skipped_pages,
        }
    }

    /// Headings collected across all pages.
    pub fn headings(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(|p| p.headings.iter().map(String::as_str))
    }
}

/// Extract text from file bytes based on file type.
pub fn extract_text(bytes: &[u8], filename: &str) -> Result<ExtractedDocument, ExtractionError> {
    let ext = filename.rsplit('.').next().unwrap_or("").to_lowercase();
    let file_type = ext.as_str();

    let outcomes = match file_type {
        "pdf" => pdf::extract_pdf(bytes)?,
        "txt" | "text" => txt::extract_txt(bytes),
        "md" | "markdown" => md::extract_md(bytes),
        other => return Err(ExtractionError::UnsupportedType(other.to_string())),
    };

    let doc = ExtractedDocument::from_outcomes(filename, file_type, outcomes);
    for skipped in &doc.skipped_pages {
        tracing::warn!(
            filename,
            page = skipped.page_number,
            reason = %skipped.reason,
            "skipping unreadable page"
        );
    }
    Ok(doc)
}

/// Read a file from disk and extract its text. The file name (not the full
/// path) becomes the document's filename.
pub fn extract_file(path: &Path) -> Result<ExtractedDocument, ExtractionError> {
    let bytes = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    extract_text(&bytes, &filename)
}

fn empty_page(page_number: usize) -> PageOutcome {
    PageOutcome::Skipped(SkippedPage {
        page_number,
        reason: "no extractable text".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn dispatches_on_extension() {
        let doc = extract_text(b"Plain notes.", "Notes.TXT").unwrap();
        assert_eq!(doc.file_type, "txt");
        assert_eq!(doc.pages.len(), 1);

        let doc = extract_text(b"# Title\n\nBody.", "readme.md").unwrap();
        assert_eq!(doc.file_type, "md");
        assert_eq!(doc.headings().collect::<Vec<_>>(), vec!["Title"]);
    }

    #[test]
    fn rejects_unknown_extension() {
        let err = extract_text(b"data", "slides.pptx").unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedType(ref t) if t == "pptx"));
    }

    #[test]
    fn empty_text_file_is_reported_as_skipped_page() {
        let doc = extract_text(b"   \n ", "blank.txt").unwrap();
        assert!(doc.pages.is_empty());
        assert_eq!(doc.skipped_pages.len(), 1);
        assert_eq!(doc.skipped_pages[0].page_number, 1);
    }

    #[test]
    fn extract_file_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("physics.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Newton's first law states that an object stays at rest.").unwrap();

        let doc = extract_file(&path).unwrap();
        assert_eq!(doc.filename, "physics.txt");
        assert!(doc.pages[0].text.contains("Newton's first law"));
    }

    #[test]
    fn extract_file_missing_path_is_io_error() {
        let err = extract_file(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, ExtractionError::Io(_)));
    }
}
