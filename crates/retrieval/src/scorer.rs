//! Lexical relevance of a chunk to a query.
//!
//! A score combines three signals, each weighted by [`ScoringConfig`]:
//! the share of distinct query terms present in the chunk, a bonus for the
//! query phrase (or a long run of it) appearing verbatim, and a bonus for
//! query terms appearing in query order. A chunk sharing no query term
//! scores exactly zero.

use std::collections::HashMap;

use mytuts_core::config::ScoringConfig;
use mytuts_core::Chunk;

use crate::tokenize::{is_stop_word, tokenize};

/// A query reduced to the tokens scoring needs. Parse once, score many.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTerms {
    /// Query tokens in order with leading and trailing stop words removed.
    phrase: Vec<String>,
    /// Distinct non-stop-word tokens in first-appearance order.
    terms: Vec<String>,
}

impl QueryTerms {
    pub fn parse(query: &str) -> Self {
        let tokens = tokenize(query);

        let mut terms: Vec<String> = Vec::new();
        for token in tokens.iter().filter(|t| !is_stop_word(t)) {
            if !terms.contains(token) {
                terms.push(token.clone());
            }
        }

        let first = tokens.iter().position(|t| !is_stop_word(t));
        let last = tokens.iter().rposition(|t| !is_stop_word(t));
        let phrase = match (first, last) {
            (Some(first), Some(last)) => tokens[first..=last].to_vec(),
            _ => Vec::new(),
        };

        Self { phrase, terms }
    }

    /// True when the query has no content words; nothing can match it.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn phrase(&self) -> &[String] {
        &self.phrase
    }
}

/// Per-signal contributions to a chunk's score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreBreakdown {
    pub overlap: f32,
    pub phrase: f32,
    pub sequence: f32,
    /// Query terms found in the chunk, in query order.
    pub matching_terms: Vec<String>,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f32 {
        self.overlap + self.phrase + self.sequence
    }
}

#[derive(Debug, Clone, Default)]
pub struct LexicalScorer {
    config: ScoringConfig,
}

impl LexicalScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Relevance of `chunk` to a raw query string.
    pub fn score(&self, query: &str, chunk: &Chunk) -> f32 {
        self.score_terms(&QueryTerms::parse(query), chunk).total()
    }

    pub fn score_terms(&self, query: &QueryTerms, chunk: &Chunk) -> ScoreBreakdown {
        self.score_text(query, &chunk.text)
    }

    pub fn score_text(&self, query: &QueryTerms, text: &str) -> ScoreBreakdown {
        if query.is_empty() {
            return ScoreBreakdown::default();
        }

        let tokens = tokenize(text);
        let mut first_seen: HashMap<&str, usize> = HashMap::with_capacity(tokens.len());
        for (pos, token) in tokens.iter().enumerate() {
            first_seen.entry(token.as_str()).or_insert(pos);
        }

        let mut matching_terms = Vec::new();
        let mut positions = Vec::new();
        for term in &query.terms {
            if let Some(&pos) = first_seen.get(term.as_str()) {
                matching_terms.push(term.clone());
                positions.push(pos);
            }
        }
        if matching_terms.is_empty() {
            return ScoreBreakdown::default();
        }

        let term_count = query.terms.len();
        let overlap = self.config.overlap_weight * matching_terms.len() as f32 / term_count as f32;

        let run = longest_phrase_run(&query.phrase, &tokens);
        let phrase = if run == query.phrase.len() {
            self.config.phrase_bonus
        } else if run >= self.config.min_phrase_words.max(1) {
            self.config.phrase_bonus * run as f32 / query.phrase.len() as f32
        } else {
            0.0
        };

        let ordered = longest_increasing_run(&positions);
        let sequence = if term_count > 1 && ordered >= 2 {
            self.config.sequence_bonus * (ordered - 1) as f32 / (term_count - 1) as f32
        } else {
            0.0
        };

        ScoreBreakdown {
            overlap,
            phrase,
            sequence,
            matching_terms,
        }
    }
}

/// Length of the longest contiguous slice of `phrase` that also appears
/// contiguously in `tokens`. Runs must end on a content word, so a bare
/// "of the" never counts.
fn longest_phrase_run(phrase: &[String], tokens: &[String]) -> usize {
    if phrase.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; phrase.len() + 1];
    let mut cur = vec![0usize; phrase.len() + 1];
    let mut best = 0;

    for token in tokens {
        for (j, word) in phrase.iter().enumerate() {
            cur[j + 1] = if word == token { prev[j] + 1 } else { 0 };
            if cur[j + 1] > best && !is_stop_word(word) {
                best = cur[j + 1];
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    best
}

/// Length of the longest strictly increasing subsequence.
fn longest_increasing_run(values: &[usize]) -> usize {
    let mut tails: Vec<usize> = Vec::new();
    for &v in values {
        let idx = tails.partition_point(|&t| t < v);
        if idx == tails.len() {
            tails.push(v);
        } else {
            tails[idx] = v;
        }
    }
    tails.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> LexicalScorer {
        LexicalScorer::default()
    }

    fn chunk(text: &str) -> Chunk {
        Chunk {
            chunk_id: 0,
            document_id: "1-notes.txt".into(),
            text: text.into(),
            overlap_len: 0,
            start_offset: 0,
            end_offset: text.len(),
            page_number: 1,
            sentence_count: 1,
        }
    }

    #[test]
    fn parse_drops_stop_words_and_duplicates() {
        let q = QueryTerms::parse("What is the law of inertia and the law of motion?");
        assert_eq!(q.terms(), ["law", "inertia", "motion"]);
        assert_eq!(
            q.phrase(),
            ["law", "of", "inertia", "and", "the", "law", "of", "motion"]
        );
    }

    #[test]
    fn stop_word_only_query_is_empty() {
        let q = QueryTerms::parse("what is the");
        assert!(q.is_empty());
        assert!(q.phrase().is_empty());
        assert_eq!(scorer().score("what is the", &chunk("what is the answer")), 0.0);
    }

    #[test]
    fn no_shared_terms_scores_exactly_zero() {
        let s = scorer().score("photosynthesis chlorophyll", &chunk("Newton's laws of motion."));
        assert_eq!(s, 0.0);
    }

    #[test]
    fn exact_phrase_beats_shuffled_words() {
        let query = "Newton's first law of motion";
        let exact = chunk("Newton's first law of motion describes inertia.");
        let shuffled = chunk("Motion of law first Newton's describes inertia.");

        let s = scorer();
        let a = s.score_terms(&QueryTerms::parse(query), &exact);
        let b = s.score_terms(&QueryTerms::parse(query), &shuffled);
        assert_eq!(a.overlap, b.overlap);
        assert!(a.total() > b.total(), "{a:?} vs {b:?}");
        assert_eq!(a.phrase, 0.3);
        assert_eq!(b.phrase, 0.0);
    }

    #[test]
    fn partial_phrase_earns_partial_bonus() {
        let q = QueryTerms::parse("conservation of angular momentum");
        let b = scorer().score_text(&q, "the angular momentum of a rigid body");
        // "angular momentum" is a 2-token run of a 4-token phrase.
        assert!((b.phrase - 0.15).abs() < 1e-6, "{b:?}");
    }

    #[test]
    fn more_matching_terms_score_higher() {
        let s = scorer();
        let query = "entropy temperature pressure";
        let one = s.score(query, &chunk("entropy rises"));
        let two = s.score(query, &chunk("entropy rises with temperature"));
        assert!(two > one);
        assert!(one > 0.0);
    }

    #[test]
    fn sequence_bonus_rewards_query_order() {
        let q = QueryTerms::parse("mitochondria produce energy");
        let ordered = scorer().score_text(&q, "mitochondria in cells produce usable energy");
        let reversed = scorer().score_text(&q, "energy usable cells produce in mitochondria");
        assert_eq!(ordered.sequence, 0.2);
        assert_eq!(reversed.sequence, 0.0);
        assert_eq!(ordered.matching_terms, ["mitochondria", "produce", "energy"]);
    }

    #[test]
    fn weights_come_from_config() {
        let s = LexicalScorer::new(ScoringConfig {
            overlap_weight: 2.0,
            phrase_bonus: 0.0,
            sequence_bonus: 0.0,
            min_phrase_words: 2,
        });
        assert_eq!(s.score("gravity waves", &chunk("gravity pulls, waves crash")), 2.0);
    }

    #[test]
    fn lis_lengths() {
        assert_eq!(longest_increasing_run(&[]), 0);
        assert_eq!(longest_increasing_run(&[3, 1, 2, 5, 4]), 3);
        assert_eq!(longest_increasing_run(&[5, 4, 3]), 1);
    }
}
