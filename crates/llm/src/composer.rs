//! Builds grounded generation requests from retrieved chunks and maps the
//! citation markers in a response back to their sources.

use mytuts_core::config::Config;
use mytuts_core::{ComplexityMode, DocId, ScoredChunk};
use serde::Serialize;
use tracing::debug;

use crate::provider::Message;

const STYLE_PLACEHOLDER: &str = "<<<style>>>";
const CONTEXT_PLACEHOLDER: &str = "<<<context>>>";
const QUESTION_PLACEHOLDER: &str = "<<<question>>>";
const COUNT_PLACEHOLDER: &str = "<<<count>>>";
const MATERIAL_PLACEHOLDER: &str = "<<<material>>>";

const ANSWER_SYSTEM: &str = include_str!("../prompts/answer-system.md");
const ANSWER_USER: &str = include_str!("../prompts/answer-user.md");
const QUIZ: &str = include_str!("../prompts/quiz.md");

/// Matching terms reported per source.
const MAX_SOURCE_TERMS: usize = 5;

/// The explanation style for one complexity mode.
#[derive(Debug)]
pub struct PromptTemplate {
    pub mode: ComplexityMode,
    pub style: &'static str,
}

static BEGINNER: PromptTemplate = PromptTemplate {
    mode: ComplexityMode::Beginner,
    style: include_str!("../prompts/style-beginner.md"),
};

static ADVANCED: PromptTemplate = PromptTemplate {
    mode: ComplexityMode::Advanced,
    style: include_str!("../prompts/style-advanced.md"),
};

pub fn template_for(mode: ComplexityMode) -> &'static PromptTemplate {
    match mode {
        ComplexityMode::Beginner => &BEGINNER,
        ComplexityMode::Advanced => &ADVANCED,
    }
}

/// One context chunk as presented to the student alongside an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRef {
    /// 1-based marker number used in the prompt.
    pub source: usize,
    pub document_id: DocId,
    pub page_number: usize,
    pub confidence: f32,
    pub matching_terms: Vec<String>,
}

/// A citation marker resolved to the chunk it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Citation {
    pub source: usize,
    pub document_id: DocId,
    pub page_number: usize,
}

#[derive(Debug, Clone)]
pub struct PromptRequest {
    pub query: String,
    pub complexity_mode: ComplexityMode,
    /// Highest score first; combined text length is within the budget.
    pub context_chunks: Vec<ScoredChunk>,
    pub messages: Vec<Message>,
}

impl PromptRequest {
    pub fn context_chars(&self) -> usize {
        self.context_chunks.iter().map(|s| s.chunk.len()).sum()
    }

    pub fn sources(&self) -> Vec<SourceRef> {
        self.context_chunks
            .iter()
            .enumerate()
            .map(|(i, s)| SourceRef {
                source: i + 1,
                document_id: s.chunk.document_id.clone(),
                page_number: s.chunk.page_number,
                confidence: s.score,
                matching_terms: s.matching_terms.iter().take(MAX_SOURCE_TERMS).cloned().collect(),
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub enum ComposedPrompt {
    Grounded(PromptRequest),
    /// Nothing relevant was retrieved; no request should be sent.
    InsufficientContext {
        query: String,
        complexity_mode: ComplexityMode,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAnswer {
    pub text: String,
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone)]
pub struct PromptComposer {
    budget_chars: usize,
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self::new(mytuts_core::config::RetrievalConfig::default().budget_chars)
    }
}

impl PromptComposer {
    pub fn new(budget_chars: usize) -> Self {
        Self { budget_chars }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.retrieval.budget_chars)
    }

    pub fn compose(
        &self,
        query: &str,
        scored_chunks: Vec<ScoredChunk>,
        complexity_mode: ComplexityMode,
    ) -> ComposedPrompt {
        let mut used = 0;
        let context_chunks: Vec<ScoredChunk> = scored_chunks
            .into_iter()
            .filter(|s| {
                let fits = used + s.chunk.len() <= self.budget_chars;
                if fits {
                    used += s.chunk.len();
                }
                fits
            })
            .collect();

        if context_chunks.is_empty() {
            return ComposedPrompt::InsufficientContext {
                query: query.to_string(),
                complexity_mode,
            };
        }

        let context = context_chunks
            .iter()
            .enumerate()
            .map(|(i, s)| {
                format!(
                    "[Source {} | doc: {} | page {}]\n{}",
                    i + 1,
                    s.chunk.document_id,
                    s.chunk.page_number,
                    s.chunk.text.trim()
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let style = template_for(complexity_mode).style.trim_end();
        let system = render(ANSWER_SYSTEM, &[(STYLE_PLACEHOLDER, style)]);
        let user = render(
            ANSWER_USER,
            &[(CONTEXT_PLACEHOLDER, &context), (QUESTION_PLACEHOLDER, query.trim())],
        );

        debug!(
            mode = %complexity_mode,
            sources = context_chunks.len(),
            context_chars = used,
            "composed prompt"
        );

        ComposedPrompt::Grounded(PromptRequest {
            query: query.to_string(),
            complexity_mode,
            context_chunks,
            messages: vec![Message::system(system), Message::user(user)],
        })
    }

    /// Split a completion into answer text and resolved citations. Markers
    /// naming no source in `request` are ignored; a response without
    /// markers yields no citations.
    pub fn parse(&self, raw_response: &str, request: &PromptRequest) -> ParsedAnswer {
        let mut citations: Vec<Citation> = Vec::new();
        for source in citation_markers(raw_response) {
            let Some(scored) = source.checked_sub(1).and_then(|i| request.context_chunks.get(i)) else {
                continue;
            };
            if citations.iter().any(|c| c.source == source) {
                continue;
            }
            citations.push(Citation {
                source,
                document_id: scored.chunk.document_id.clone(),
                page_number: scored.chunk.page_number,
            });
        }

        ParsedAnswer {
            text: raw_response.trim().to_string(),
            citations,
        }
    }

    pub fn compose_quiz(&self, material: &[ScoredChunk], question_count: usize) -> Vec<Message> {
        let material = material
            .iter()
            .map(|s| s.chunk.text.trim())
            .collect::<Vec<_>>()
            .join("\n\n");
        let count = question_count.to_string();
        let prompt = render(QUIZ, &[(COUNT_PLACEHOLDER, &count), (MATERIAL_PLACEHOLDER, &material)]);
        vec![Message::user(prompt)]
    }
}

/// Substitute placeholders in one pass over `template`, so placeholder
/// text inside a substituted value is left alone.
fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + values.iter().map(|(_, v)| v.len()).sum::<usize>());
    let mut rest = template;
    loop {
        let next = values
            .iter()
            .filter_map(|(key, value)| rest.find(key).map(|pos| (pos, *key, *value)))
            .min_by_key(|(pos, _, _)| *pos);
        match next {
            Some((pos, key, value)) => {
                out.push_str(&rest[..pos]);
                out.push_str(value);
                rest = &rest[pos + key.len()..];
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}

/// Source numbers named by `[Source 1]`, `[Source 2, 3]`, `(Sources 1 and 4)`
/// and similar markers, in order of appearance. Every opening bracket is
/// tried on its own, so a marker nested inside a parenthetical is found.
fn citation_markers(text: &str) -> Vec<usize> {
    let mut numbers = Vec::new();

    for (open, opener) in text.match_indices(['[', '(']) {
        let close_char = if opener == "[" { ']' } else { ')' };
        let after = &text[open + 1..];
        let Some(close) = after.find(close_char) else {
            continue;
        };
        let inner = after[..close].trim().to_lowercase();

        let Some(list) = inner
            .strip_prefix("sources")
            .or_else(|| inner.strip_prefix("source"))
        else {
            continue;
        };
        let list = list.split('|').next().unwrap_or_default();
        for piece in list.split(|c: char| c == ',' || c == '&' || c.is_whitespace()) {
            match piece {
                "" | "and" => {}
                p if p.chars().all(|c| c.is_ascii_digit()) => {
                    if let Ok(n) = p.parse() {
                        numbers.push(n);
                    }
                }
                _ => break,
            }
        }
    }
    numbers
}
