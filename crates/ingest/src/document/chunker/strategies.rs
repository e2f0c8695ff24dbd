//! Sentence-aware splitting with fixed-size fallback.

use mytuts_core::{Chunk, Document};
use tracing::{debug, warn};

use super::helpers::{advance_chars, count_sentences, find_cut, overlap_start, sentence_starts};
use super::types::{ChunkConfig, ChunkError, Chunked, CutKind};

/// Chunk a normalized document. Sizes in `config` count characters;
/// offsets in the produced chunks are byte positions in `doc.raw_text`.
///
/// Chunks are ordered by `start_offset`; the body of each chunk (text after
/// its overlap prefix) starts where the previous chunk ended, so the bodies
/// concatenate back to `doc.raw_text` exactly.
pub fn chunk_document(doc: &Document, config: &ChunkConfig) -> Result<Chunked, ChunkError> {
    config
        .validate()
        .map_err(|e| ChunkError::InvalidConfig(e.to_string()))?;

    let text = doc.raw_text.as_str();
    if text.trim().is_empty() {
        return Err(ChunkError::EmptyDocument {
            document: doc.filename.clone(),
        });
    }

    let starts = sentence_starts(text);
    let len = text.len();

    let mut chunks = Vec::with_capacity(len / config.chunk_size.max(1) + 1);
    let mut window_start = 0;
    let mut own_start = 0;
    let mut fixed_size_cuts = 0usize;

    loop {
        let target = advance_chars(text, window_start, config.chunk_size);
        let (end, kind) = if target >= len {
            (len, CutKind::End)
        } else {
            find_cut(text, &starts, own_start, target, config.lookback)
        };
        if matches!(kind, CutKind::Word | CutKind::Hard) {
            fixed_size_cuts += 1;
        }

        chunks.push(Chunk {
            chunk_id: chunks.len(),
            document_id: doc.id.clone(),
            text: text[window_start..end].to_string(),
            overlap_len: own_start - window_start,
            start_offset: window_start,
            end_offset: end,
            page_number: doc.page_at(window_start),
            sentence_count: count_sentences(&starts, window_start, end),
        });

        if end >= len {
            break;
        }
        window_start = overlap_start(text, window_start, end, config.overlap);
        own_start = end;
    }

    let degraded = if starts.is_empty() && chunks.len() > 1 {
        let err = ChunkError::UnreadableContent {
            document: doc.filename.clone(),
        };
        warn!(document = %doc.id, chunks = chunks.len(), "{err}");
        Some(err)
    } else {
        None
    };

    debug!(
        document = %doc.id,
        chars = len,
        chunks = chunks.len(),
        sentences = starts.len(),
        fixed_size_cuts,
        "chunked document"
    );

    Ok(Chunked { chunks, degraded })
}
