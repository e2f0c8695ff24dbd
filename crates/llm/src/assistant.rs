//! End-to-end question answering and quiz generation over a knowledge base.

use mytuts_core::config::Config;
use mytuts_core::{ComplexityMode, DocId};
use mytuts_retrieval::{KnowledgeBase, Retriever};
use serde::Serialize;
use tracing::{info, warn};

use crate::composer::{Citation, ComposedPrompt, PromptComposer, SourceRef};
use crate::generation::{GenerationClient, GenerationError};
use crate::provider::LlmError;

pub const NO_CONTEXT_ANSWER: &str = "I couldn't find relevant information in your uploaded documents \
to answer this question. Please make sure you've uploaded materials that cover this topic, or try \
rephrasing your question with different keywords.";

/// Query used for a quiz when no topic is given.
const QUIZ_FALLBACK_QUERY: &str = "main concepts key points important";
const QUIZ_CANDIDATES: usize = 5;
const QUIZ_MATERIAL_CHUNKS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    Grounded,
    /// Nothing relevant was found; the generation service was not called.
    InsufficientContext,
    /// Context was found but generation failed; `text` explains why.
    Degraded,
}

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    pub citations: Vec<Citation>,
    pub sources: Vec<SourceRef>,
    /// Number of chunks sent as context.
    pub context_used: usize,
    pub mode: ComplexityMode,
    pub status: AnswerStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct Quiz {
    pub content: String,
    pub source_documents: Vec<DocId>,
    pub questions_requested: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    #[error("insufficient content available for quiz generation; upload more study materials")]
    InsufficientContent,
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

pub struct StudyAssistant {
    retriever: Retriever,
    composer: PromptComposer,
    generator: GenerationClient,
}

impl StudyAssistant {
    pub fn new(retriever: Retriever, composer: PromptComposer, generator: GenerationClient) -> Self {
        Self {
            retriever,
            composer,
            generator,
        }
    }

    /// Build from config, creating the appropriate provider.
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        Ok(Self::new(
            Retriever::from_config(config),
            PromptComposer::from_config(config),
            GenerationClient::from_config(config)?,
        ))
    }

    /// Retrieve, compose, generate and parse. Never fails: an empty
    /// retrieval or a generation error come back as the answer's status.
    pub async fn answer(&self, kb: &KnowledgeBase, query: &str, mode: ComplexityMode) -> Answer {
        let snapshot = kb.snapshot();
        let selected = self.retriever.retrieve(query, snapshot.chunks());

        let request = match self.composer.compose(query, selected, mode) {
            ComposedPrompt::Grounded(request) => request,
            ComposedPrompt::InsufficientContext { .. } => {
                info!(query, chunks = snapshot.chunks().len(), "no relevant context");
                return Answer {
                    text: NO_CONTEXT_ANSWER.to_string(),
                    citations: Vec::new(),
                    sources: Vec::new(),
                    context_used: 0,
                    mode,
                    status: AnswerStatus::InsufficientContext,
                };
            }
        };

        let sources = request.sources();
        let context_used = request.context_chunks.len();

        match self.generator.generate(request.messages.clone()).await {
            Ok(raw) => {
                let parsed = self.composer.parse(&raw, &request);
                info!(
                    query,
                    %mode,
                    context_used,
                    citations = parsed.citations.len(),
                    "answer generated"
                );
                Answer {
                    text: parsed.text,
                    citations: parsed.citations,
                    sources,
                    context_used,
                    mode,
                    status: AnswerStatus::Grounded,
                }
            }
            Err(err) => {
                warn!(query, error = %err, "answer degraded");
                Answer {
                    text: err.user_message(),
                    citations: Vec::new(),
                    sources,
                    context_used,
                    mode,
                    status: AnswerStatus::Degraded,
                }
            }
        }
    }

    /// Generate `question_count` study questions from the material most
    /// relevant to `topic`, or from broadly relevant material without one.
    pub async fn quiz(
        &self,
        kb: &KnowledgeBase,
        topic: Option<&str>,
        question_count: usize,
    ) -> Result<Quiz, QuizError> {
        let query = topic
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(QUIZ_FALLBACK_QUERY);

        let snapshot = kb.snapshot();
        let mut candidates = self
            .retriever
            .retrieve_with(query, snapshot.chunks(), QUIZ_CANDIDATES, usize::MAX);
        if candidates.is_empty() {
            return Err(QuizError::InsufficientContent);
        }
        candidates.truncate(QUIZ_MATERIAL_CHUNKS);

        let mut source_documents: Vec<DocId> = Vec::new();
        for scored in &candidates {
            if !source_documents.contains(&scored.chunk.document_id) {
                source_documents.push(scored.chunk.document_id.clone());
            }
        }

        let messages = self.composer.compose_quiz(&candidates, question_count);
        let content = self.generator.generate(messages).await?;
        info!(query, question_count, sources = source_documents.len(), "quiz generated");

        Ok(Quiz {
            content: content.trim().to_string(),
            source_documents,
            questions_requested: question_count,
        })
    }
}
