//! Document ingestion: text extraction, normalization and chunking.

pub mod document;

pub use document::chunker::{chunk_document, ChunkConfig, ChunkError, Chunked};
pub use document::normalize::{build_document, normalize_text};
pub use document::{extract_file, extract_text, ExtractedDocument, ExtractionError, PageContent, PageOutcome};
