pub mod assistant;
pub mod composer;
pub mod generation;
pub mod provider;
pub mod providers;

#[cfg(test)]
mod testing;

pub use assistant::{Answer, AnswerStatus, Quiz, QuizError, StudyAssistant};
pub use composer::{Citation, ComposedPrompt, ParsedAnswer, PromptComposer, PromptRequest, SourceRef};
pub use generation::{GenerationClient, GenerationError};
pub use provider::{LlmError, LlmProvider, Message, Role};
