pub mod gemini;
pub mod ollama;
pub mod openai;

use mytuts_core::config::{LlmConfig, OllamaConfig};
use serde_json::json;

use crate::provider::{LlmError, LlmProvider, Message, Role};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Create the appropriate LLM provider based on config.
pub fn create_provider(
    llm_config: &LlmConfig,
    ollama_config: &OllamaConfig,
) -> Result<Box<dyn LlmProvider>, LlmError> {
    match llm_config.provider.as_str() {
        "gemini" | "google" => {
            let api_key = llm_config
                .gemini_api_key
                .as_ref()
                .ok_or_else(|| LlmError::NotConfigured("GOOGLE_AI_API_KEY not set".into()))?;
            let base_url = llm_config.gemini_base_url.as_deref().unwrap_or(GEMINI_BASE_URL);
            Ok(Box::new(gemini::GeminiProvider::new(
                api_key.clone(),
                llm_config.gemini_model.clone(),
                base_url.to_string(),
            )))
        }
        "openai" => {
            let api_key = llm_config
                .openai_api_key
                .as_ref()
                .ok_or_else(|| LlmError::NotConfigured("OPENAI_API_KEY not set".into()))?;
            let base_url = llm_config.openai_base_url.as_deref().unwrap_or(OPENAI_BASE_URL);
            Ok(Box::new(openai::OpenAiProvider::new(
                api_key.clone(),
                llm_config.openai_model.clone(),
                base_url.to_string(),
            )))
        }
        "ollama" => Ok(Box::new(ollama::OllamaProvider::new(
            ollama_config.url.clone(),
            ollama_config.model.clone(),
        ))),
        other => Err(LlmError::NotConfigured(format!(
            "unknown LLM provider: '{}'",
            other
        ))),
    }
}

/// Turn a non-success HTTP status into the matching error.
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(LlmError::RateLimited(body));
    }
    Err(LlmError::ApiError {
        status: status.as_u16(),
        body,
    })
}

/// Messages in the `{role, content}` shape shared by OpenAI and Ollama.
pub(crate) fn chat_messages(messages: &[Message]) -> Vec<serde_json::Value> {
    messages
        .iter()
        .map(|m| {
            json!({
                "role": match m.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                "content": m.content,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn llm(provider: &str) -> LlmConfig {
        LlmConfig {
            provider: provider.into(),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn gemini_requires_api_key() {
        let err = create_provider(&llm("gemini"), &OllamaConfig::default()).err().unwrap();
        assert!(matches!(err, LlmError::NotConfigured(msg) if msg.contains("GOOGLE_AI_API_KEY")));
    }

    #[test]
    fn builds_each_known_provider() {
        let mut config = llm("gemini");
        config.gemini_api_key = Some("k".into());
        assert_eq!(create_provider(&config, &OllamaConfig::default()).unwrap().name(), "gemini");

        let mut config = llm("openai");
        config.openai_api_key = Some("k".into());
        assert_eq!(create_provider(&config, &OllamaConfig::default()).unwrap().name(), "openai");

        assert_eq!(
            create_provider(&llm("ollama"), &OllamaConfig::default()).unwrap().name(),
            "ollama"
        );
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let err = create_provider(&llm("palm"), &OllamaConfig::default()).err().unwrap();
        assert!(err.to_string().contains("palm"));
    }

    #[test]
    fn chat_messages_keep_roles() {
        let body = chat_messages(&[Message::system("rules"), Message::user("question")]);
        assert_eq!(body[0]["role"], "system");
        assert_eq!(body[1]["role"], "user");
        assert_eq!(body[1]["content"], "question");
    }
}
