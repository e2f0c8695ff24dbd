//! Sentence-aware chunking engine.
//!
//! Splits a normalized Document into overlapping chunks of roughly
//! `chunk_size` bytes, closing each chunk at the nearest preceding sentence
//! boundary. Each chunk after the first begins with the tail of the previous
//! one so that text spanning a boundary stays retrievable from both.

mod helpers;
mod strategies;
mod types;

pub use strategies::chunk_document;
pub use types::{ChunkConfig, ChunkError, Chunked};
