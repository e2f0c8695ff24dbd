//! Chunk configuration, output and error types.

use mytuts_core::Chunk;
use thiserror::Error;

/// Configuration for the chunking engine.
pub use mytuts_core::config::ChunkingConfig as ChunkConfig;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChunkError {
    #[error("document '{document}' contains no readable text")]
    EmptyDocument { document: String },

    /// No sentence boundary could be found; the chunker fell back to
    /// fixed-size splitting.
    #[error("no sentence boundaries detected in '{document}', split into fixed-size chunks")]
    UnreadableContent { document: String },

    #[error("invalid chunking configuration: {0}")]
    InvalidConfig(String),
}

/// Chunks of one document, in `start_offset` order.
#[derive(Debug, Clone)]
pub struct Chunked {
    pub chunks: Vec<Chunk>,
    /// Set when chunking succeeded only by degrading to fixed-size splits.
    pub degraded: Option<ChunkError>,
}

/// How a chunk's end position was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CutKind {
    /// End of the document.
    End,
    /// Start of the next sentence.
    Sentence,
    /// After the last space inside the lookback window.
    Word,
    /// Raw character position.
    Hard,
}
