//! Top-k selection under a context budget.

use std::cmp::Ordering;
use std::sync::Arc;

use mytuts_core::config::{Config, RetrievalConfig, ScoringConfig};
use mytuts_core::{Chunk, ScoredChunk};
use rayon::prelude::*;
use tracing::debug;

use crate::scorer::{LexicalScorer, QueryTerms};

#[derive(Debug, Clone)]
pub struct Retriever {
    scorer: LexicalScorer,
    top_k: usize,
    budget_chars: usize,
}

impl Default for Retriever {
    fn default() -> Self {
        Self::new(ScoringConfig::default(), &RetrievalConfig::default())
    }
}

impl Retriever {
    pub fn new(scoring: ScoringConfig, retrieval: &RetrievalConfig) -> Self {
        Self {
            scorer: LexicalScorer::new(scoring),
            top_k: retrieval.top_k,
            budget_chars: retrieval.budget_chars,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.scoring.clone(), &config.retrieval)
    }

    pub fn scorer(&self) -> &LexicalScorer {
        &self.scorer
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Retrieve with the configured `top_k` and budget.
    pub fn retrieve(&self, query: &str, chunks: &[Arc<Chunk>]) -> Vec<ScoredChunk> {
        self.retrieve_with(query, chunks, self.top_k, self.budget_chars)
    }

    /// Up to `k` highest-scoring chunks whose combined text length stays
    /// within `budget_chars`.
    ///
    /// Candidates are visited in rank order; one that would overflow the
    /// budget is skipped and smaller ones further down may still fit.
    /// Chunks with zero score are never returned.
    pub fn retrieve_with(
        &self,
        query: &str,
        chunks: &[Arc<Chunk>],
        k: usize,
        budget_chars: usize,
    ) -> Vec<ScoredChunk> {
        let ranked = self.rank(query, chunks);
        let candidates = ranked.len();

        let mut used = 0usize;
        let mut selected = Vec::with_capacity(k.min(candidates));
        for scored in ranked {
            if selected.len() >= k {
                break;
            }
            let len = scored.chunk.len();
            if used + len > budget_chars {
                continue;
            }
            used += len;
            selected.push(scored);
        }

        debug!(
            chunks = chunks.len(),
            candidates,
            selected = selected.len(),
            context_chars = used,
            budget_chars,
            "retrieved context"
        );
        selected
    }

    /// Every chunk with a positive score, best first. Equal scores keep the
    /// order of `chunks`, which the knowledge base lays out by upload order
    /// and then chunk id.
    pub fn rank(&self, query: &str, chunks: &[Arc<Chunk>]) -> Vec<ScoredChunk> {
        let terms = QueryTerms::parse(query);
        if terms.is_empty() || chunks.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, ScoredChunk)> = chunks
            .par_iter()
            .enumerate()
            .filter_map(|(idx, chunk)| {
                let breakdown = self.scorer.score_terms(&terms, chunk);
                let score = breakdown.total();
                (score > 0.0).then(|| {
                    (
                        idx,
                        ScoredChunk {
                            chunk: Arc::clone(chunk),
                            score,
                            matching_terms: breakdown.matching_terms,
                        },
                    )
                })
            })
            .collect();

        scored.sort_by(|(ia, a), (ib, b)| match b.score.total_cmp(&a.score) {
            Ordering::Equal => ia.cmp(ib),
            other => other,
        });
        scored.into_iter().map(|(_, s)| s).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chunk(document_id: &str, chunk_id: usize, text: &str) -> Arc<Chunk> {
        Arc::new(Chunk {
            chunk_id,
            document_id: document_id.into(),
            text: text.into(),
            overlap_len: 0,
            start_offset: 0,
            end_offset: text.len(),
            page_number: 1,
            sentence_count: 1,
        })
    }

    #[test]
    fn newtons_first_law_ranks_matching_chunk_first() {
        let a = chunk(
            "1-physics.pdf",
            0,
            "Newton's first law states that an object at rest stays at rest unless acted on by a force.",
        );
        let b = chunk(
            "1-physics.pdf",
            1,
            "Thermodynamics studies heat and energy transfer between systems.",
        );
        let r = Retriever::default();
        let out = r.retrieve("What is Newton's first law?", &[b.clone(), a.clone()]);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].chunk, a);
        assert!(out[0].score > 0.0);
        assert_eq!(out[0].matching_terms, ["newtons", "first", "law"]);
        assert_eq!(r.scorer().score("What is Newton's first law?", &b), 0.0);
    }

    #[test]
    fn empty_knowledge_base_returns_nothing() {
        assert!(Retriever::default().retrieve("anything", &[]).is_empty());
    }

    #[test]
    fn stop_word_query_returns_nothing() {
        let chunks = vec![chunk("1-a.txt", 0, "what is the meaning of this")];
        assert!(Retriever::default().retrieve("what is the", &chunks).is_empty());
    }

    #[test]
    fn ties_break_by_store_order() {
        let chunks = vec![
            chunk("1-a.txt", 0, "gravity"),
            chunk("1-a.txt", 1, "gravity"),
            chunk("2-b.txt", 0, "gravity"),
        ];
        let out = Retriever::default().retrieve_with("gravity", &chunks, 3, 10_000);
        let ids: Vec<_> = out
            .iter()
            .map(|s| (s.chunk.document_id.as_str(), s.chunk.chunk_id))
            .collect();
        assert_eq!(ids, vec![("1-a.txt", 0), ("1-a.txt", 1), ("2-b.txt", 0)]);
    }

    #[test]
    fn repeated_queries_are_identical() {
        let chunks: Vec<_> = (0..50)
            .map(|i| chunk("1-a.txt", i, &format!("energy {} momentum {}", i % 7, i % 3)))
            .collect();
        let r = Retriever::default();
        let first = r.retrieve_with("energy momentum 3", &chunks, 10, 100_000);
        for _ in 0..5 {
            assert_eq!(r.retrieve_with("energy momentum 3", &chunks, 10, 100_000), first);
        }
    }

    #[test]
    fn oversized_chunk_is_skipped_for_a_smaller_one() {
        let big = "entropy ".repeat(100);
        let chunks = vec![
            chunk("1-a.txt", 0, &format!("entropy heat {big}")),
            chunk("1-a.txt", 1, "entropy is disorder"),
        ];
        let out = Retriever::default().retrieve_with("entropy heat", &chunks, 3, 50);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].chunk.chunk_id, 1);
    }

    #[test]
    fn budget_counts_characters_not_bytes() {
        // 17 characters, 32 bytes.
        let chunks = vec![chunk("1-ru.txt", 0, "энергия и импульс")];
        let out = Retriever::default().retrieve_with("импульс", &chunks, 3, 20);
        assert_eq!(out.len(), 1);
        assert!(Retriever::default().retrieve_with("импульс", &chunks, 3, 16).is_empty());
    }

    #[test]
    fn respects_k() {
        let chunks: Vec<_> = (0..10).map(|i| chunk("1-a.txt", i, "cell membrane")).collect();
        assert_eq!(Retriever::default().retrieve_with("membrane", &chunks, 3, 10_000).len(), 3);
    }

    proptest! {
        #[test]
        fn selection_never_exceeds_k_or_budget(
            texts in prop::collection::vec("(alpha|beta|gamma|delta| ){1,60}", 0..40),
            k in 1usize..8,
            budget in 0usize..400,
        ) {
            let chunks: Vec<_> = texts
                .iter()
                .enumerate()
                .map(|(i, t)| chunk("1-p.txt", i, t))
                .collect();
            let out = Retriever::default().retrieve_with("alpha gamma", &chunks, k, budget);

            prop_assert!(out.len() <= k);
            let total: usize = out.iter().map(|s| s.chunk.len()).sum();
            prop_assert!(total <= budget);
            prop_assert!(out.iter().all(|s| s.score > 0.0));
            prop_assert!(out.windows(2).all(|w| w[0].score >= w[1].score));
        }
    }
}
