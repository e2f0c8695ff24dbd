//! The in-memory knowledge base.
//!
//! Readers take an immutable [`Snapshot`] and score against it without
//! holding any lock. Ingestion extracts and chunks outside the lock, then
//! publishes a new snapshot in one pointer swap, so a query never sees a
//! document with only part of its chunks.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use mytuts_core::{Chunk, DocId, Document, SkippedPage};
use mytuts_ingest::{
    build_document, chunk_document, extract_file, extract_text, ChunkConfig, ChunkError,
    ExtractedDocument, ExtractionError,
};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

const PREVIEW_CHARS: usize = 300;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Chunking(#[from] ChunkError),
}

/// What the knowledge base keeps about an ingested document once its text
/// has been chunked.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub id: DocId,
    pub filename: String,
    pub file_type: String,
    pub chunk_count: usize,
    pub total_chars: usize,
    pub preview: String,
    /// Markdown headings in page order; empty for other formats.
    pub headings: Vec<String>,
    pub skipped_pages: Vec<SkippedPage>,
    pub ingested_at: DateTime<Utc>,
    /// Why chunking fell back to fixed-size splits, if it did.
    pub degraded: Option<String>,
}

impl DocumentSummary {
    fn new(
        document: &Document,
        extracted: &ExtractedDocument,
        chunk_count: usize,
        degraded: Option<&ChunkError>,
    ) -> Self {
        Self {
            id: document.id.clone(),
            filename: document.filename.clone(),
            file_type: document.file_type.clone(),
            chunk_count,
            total_chars: document.raw_text.chars().count(),
            preview: document.preview(PREVIEW_CHARS),
            headings: extracted.headings().map(str::to_string).collect(),
            skipped_pages: document.skipped_pages.clone(),
            ingested_at: document.ingested_at,
            degraded: degraded.map(ToString::to_string),
        }
    }
}

/// Outcome of one successful ingestion.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub document_id: DocId,
    pub filename: String,
    pub chunk_count: usize,
    pub total_chars: usize,
    pub skipped_pages: Vec<SkippedPage>,
    pub degraded: Option<ChunkError>,
}

/// An immutable view of the knowledge base.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    documents: Vec<Arc<DocumentSummary>>,
    /// Laid out by upload order, then chunk id.
    chunks: Vec<Arc<Chunk>>,
}

impl Snapshot {
    pub fn chunks(&self) -> &[Arc<Chunk>] {
        &self.chunks
    }

    pub fn documents(&self) -> &[Arc<DocumentSummary>] {
        &self.documents
    }

    pub fn document(&self, id: &str) -> Option<&DocumentSummary> {
        self.documents.iter().find(|d| d.id == id).map(Arc::as_ref)
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeBaseStats {
    pub total_documents: usize,
    pub total_chunks: usize,
    pub documents: Vec<DocumentSummary>,
}

#[derive(Debug, Default)]
pub struct KnowledgeBase {
    current: RwLock<Arc<Snapshot>>,
    uploads: AtomicUsize,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot. Later ingestion does not affect it.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn ingest_file(&self, path: &Path, config: &ChunkConfig) -> Result<IngestReport, IngestError> {
        let extracted = extract_file(path)?;
        self.ingest_extracted(&extracted, config)
    }

    pub fn ingest_bytes(
        &self,
        bytes: &[u8],
        filename: &str,
        config: &ChunkConfig,
    ) -> Result<IngestReport, IngestError> {
        let extracted = extract_text(bytes, filename)?;
        self.ingest_extracted(&extracted, config)
    }

    /// Normalize, chunk and publish one extracted document. Its id is
    /// `"{upload number}-{filename}"`, so re-uploading a file adds a new
    /// document instead of replacing the old one. Upload numbers are handed
    /// out at publish time, so they follow store order and a failed ingest
    /// does not use one up.
    pub fn ingest_extracted(
        &self,
        extracted: &ExtractedDocument,
        config: &ChunkConfig,
    ) -> Result<IngestReport, IngestError> {
        let document = build_document(extracted.filename.clone(), extracted)?;
        let chunked = chunk_document(&document, config)?;

        let summary = DocumentSummary::new(
            &document,
            extracted,
            chunked.chunks.len(),
            chunked.degraded.as_ref(),
        );
        let mut report = IngestReport {
            document_id: String::new(),
            filename: summary.filename.clone(),
            chunk_count: summary.chunk_count,
            total_chars: summary.total_chars,
            skipped_pages: summary.skipped_pages.clone(),
            degraded: chunked.degraded,
        };

        report.document_id = self.publish(summary, chunked.chunks);
        info!(
            document = %report.document_id,
            chunks = report.chunk_count,
            chars = report.total_chars,
            skipped_pages = report.skipped_pages.len(),
            "document ingested"
        );
        Ok(report)
    }

    /// Assign the next upload number and swap in a snapshot holding the
    /// document. Returns the document's id.
    fn publish(&self, mut summary: DocumentSummary, mut chunks: Vec<Chunk>) -> DocId {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let upload = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("{upload}-{}", summary.filename);
        summary.id = id.clone();
        for chunk in &mut chunks {
            chunk.document_id = id.clone();
        }

        let mut next = Snapshot::clone(&current);
        next.documents.push(Arc::new(summary));
        next.chunks.extend(chunks.into_iter().map(Arc::new));
        *current = Arc::new(next);
        id
    }

    /// Drop every document. Snapshots already handed out stay intact.
    pub fn clear(&self) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Arc::new(Snapshot::default());
        info!("knowledge base cleared");
    }

    pub fn stats(&self) -> KnowledgeBaseStats {
        let snapshot = self.snapshot();
        KnowledgeBaseStats {
            total_documents: snapshot.documents.len(),
            total_chunks: snapshot.chunks.len(),
            documents: snapshot.documents.iter().map(|d| DocumentSummary::clone(d)).collect(),
        }
    }
}
