use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Stable document identifier, `"{upload_order}-{filename}"`.
pub type DocId = String;

/// Position of a chunk within its document (0-based, ordered by start offset).
pub type ChunkId = usize;

/// Start of a page inside a document's normalized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageBoundary {
    /// 1-based page number as reported by extraction.
    pub page_number: usize,
    /// Byte offset of the page's first character in `Document::raw_text`.
    pub offset: usize,
}

/// A page the extractor could not read. Surfaced to the caller, never dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedPage {
    pub page_number: usize,
    pub reason: String,
}

/// A normalized document ready for chunking.
///
/// Immutable once built. All offsets are byte offsets into `raw_text` and
/// always fall on `char` boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub filename: String,
    /// "pdf", "txt", "md"
    pub file_type: String,
    pub raw_text: String,
    /// Ordered by offset; the first entry always starts at 0.
    pub page_boundaries: Vec<PageBoundary>,
    pub skipped_pages: Vec<SkippedPage>,
    pub ingested_at: DateTime<Utc>,
}

impl Document {
    pub fn len(&self) -> usize {
        self.raw_text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw_text.is_empty()
    }

    /// Page number containing `offset`.
    pub fn page_at(&self, offset: usize) -> usize {
        page_for_offset(&self.page_boundaries, offset)
    }

    /// First `max_chars` characters, with an ellipsis when truncated.
    pub fn preview(&self, max_chars: usize) -> String {
        match self.raw_text.char_indices().nth(max_chars) {
            Some((cut, _)) => format!("{}...", &self.raw_text[..cut]),
            None => self.raw_text.clone(),
        }
    }
}

/// Locate the page containing `offset`: the last boundary whose start is
/// `<= offset`. Offsets before the first boundary belong to the first page.
pub fn page_for_offset(boundaries: &[PageBoundary], offset: usize) -> usize {
    match boundaries.partition_point(|b| b.offset <= offset) {
        0 => boundaries.first().map_or(1, |b| b.page_number),
        i => boundaries[i - 1].page_number,
    }
}

/// A contiguous slice of a document's normalized text.
///
/// `text == raw_text[start_offset..end_offset]`. The first `overlap_len`
/// bytes repeat the tail of the previous chunk; everything after that
/// (the body) is new.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: ChunkId,
    pub document_id: DocId,
    pub text: String,
    pub overlap_len: usize,
    pub start_offset: usize,
    pub end_offset: usize,
    pub page_number: usize,
    /// Sentences that end inside this chunk (at least 1).
    pub sentence_count: usize,
}

impl Chunk {
    /// The prefix repeated from the end of the previous chunk.
    pub fn overlap_prefix(&self) -> &str {
        &self.text[..self.overlap_len]
    }

    /// The part of the chunk not covered by the previous one.
    pub fn body(&self) -> &str {
        &self.text[self.overlap_len..]
    }

    /// Length in characters; context budgets are measured in these.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A chunk paired with its relevance to one query. Lives for one query only.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Arc<Chunk>,
    pub score: f32,
    /// Query terms found in the chunk, in query order.
    pub matching_terms: Vec<String>,
}

/// How the generated explanation should be pitched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityMode {
    #[default]
    Beginner,
    Advanced,
}

impl ComplexityMode {
    pub const ALL: [ComplexityMode; 2] = [ComplexityMode::Beginner, ComplexityMode::Advanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplexityMode::Beginner => "beginner",
            ComplexityMode::Advanced => "advanced",
        }
    }
}

impl fmt::Display for ComplexityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplexityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" | "basic" | "simple" => Ok(ComplexityMode::Beginner),
            "advanced" | "technical" | "expert" => Ok(ComplexityMode::Advanced),
            other => Err(format!(
                "unknown complexity mode '{other}' (expected 'beginner' or 'advanced')"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boundaries() -> Vec<PageBoundary> {
        vec![
            PageBoundary { page_number: 1, offset: 0 },
            PageBoundary { page_number: 2, offset: 100 },
            PageBoundary { page_number: 4, offset: 250 },
        ]
    }

    #[test]
    fn page_lookup_uses_last_boundary_at_or_before_offset() {
        let b = boundaries();
        assert_eq!(page_for_offset(&b, 0), 1);
        assert_eq!(page_for_offset(&b, 99), 1);
        assert_eq!(page_for_offset(&b, 100), 2);
        assert_eq!(page_for_offset(&b, 249), 2);
        // Page 3 was skipped during extraction.
        assert_eq!(page_for_offset(&b, 250), 4);
        assert_eq!(page_for_offset(&b, 10_000), 4);
    }

    #[test]
    fn page_lookup_without_boundaries_defaults_to_first_page() {
        assert_eq!(page_for_offset(&[], 42), 1);
    }

    #[test]
    fn chunk_body_excludes_overlap() {
        let chunk = Chunk {
            chunk_id: 1,
            document_id: "1-notes.txt".into(),
            text: "tail. Fresh text.".into(),
            overlap_len: 6,
            start_offset: 10,
            end_offset: 27,
            page_number: 1,
            sentence_count: 1,
        };
        assert_eq!(chunk.overlap_prefix(), "tail. ");
        assert_eq!(chunk.body(), "Fresh text.");
        assert_eq!(chunk.len(), 17);
    }

    #[test]
    fn chunk_length_counts_characters() {
        let text = "ज्ञान शक्ति है";
        let chunk = Chunk {
            chunk_id: 0,
            document_id: "1-hi.txt".into(),
            text: text.into(),
            overlap_len: 0,
            start_offset: 0,
            end_offset: text.len(),
            page_number: 1,
            sentence_count: 1,
        };
        assert_eq!(chunk.len(), text.chars().count());
        assert!(chunk.len() < text.len());
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let doc = Document {
            id: "1-a.txt".into(),
            filename: "a.txt".into(),
            file_type: "txt".into(),
            raw_text: "héllo wörld".into(),
            page_boundaries: vec![PageBoundary { page_number: 1, offset: 0 }],
            skipped_pages: vec![],
            ingested_at: Utc::now(),
        };
        assert_eq!(doc.preview(4), "héll...");
        assert_eq!(doc.preview(50), "héllo wörld");
    }

    #[test]
    fn complexity_mode_parses_case_insensitively() {
        assert_eq!("Advanced".parse::<ComplexityMode>().unwrap(), ComplexityMode::Advanced);
        assert_eq!(" beginner ".parse::<ComplexityMode>().unwrap(), ComplexityMode::Beginner);
        assert!("expertise".parse::<ComplexityMode>().is_err());
        assert_eq!(ComplexityMode::default(), ComplexityMode::Beginner);
    }
}
