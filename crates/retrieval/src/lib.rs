//! Lexical retrieval over an in-memory knowledge base.

pub mod retriever;
pub mod scorer;
pub mod store;
pub mod tokenize;

pub use retriever::Retriever;
pub use scorer::{LexicalScorer, QueryTerms, ScoreBreakdown};
pub use store::{DocumentSummary, IngestError, IngestReport, KnowledgeBase, KnowledgeBaseStats, Snapshot};
