use std::env;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

/// Parse a profiled env var, falling back to `default` when unset or malformed.
fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub chunking: ChunkingConfig,
    pub scoring: ScoringConfig,
    pub retrieval: RetrievalConfig,
    pub llm: LlmConfig,
    pub ollama: OllamaConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `MYTUTS_PROFILE` env var. When set (e.g. `EXAM`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("MYTUTS_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            chunking: ChunkingConfig::from_env_profiled(p),
            scoring: ScoringConfig::from_env_profiled(p),
            retrieval: RetrievalConfig::from_env_profiled(p),
            llm: LlmConfig::from_env_profiled(p),
            ollama: OllamaConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Reject combinations the engine cannot run with.
    pub fn validate(&self) -> Result<(), CoreError> {
        self.chunking.validate()?;
        self.scoring.validate()?;
        self.retrieval.validate()?;
        self.llm.validate()?;
        if let Some(warning) = self.budget_warning() {
            tracing::warn!("{warning}");
        }
        Ok(())
    }

    /// Set when a full-size chunk cannot fit the retrieval budget, so only
    /// short trailing chunks can ever be selected.
    pub fn budget_warning(&self) -> Option<String> {
        (self.retrieval.budget_chars < self.chunking.chunk_size).then(|| {
            format!(
                "RETRIEVAL_BUDGET_CHARS ({}) is smaller than CHUNK_SIZE ({}); most chunks will never be selected",
                self.retrieval.budget_chars, self.chunking.chunk_size
            )
        })
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  chunking:  size={}, overlap={}, lookback={}",
            self.chunking.chunk_size,
            self.chunking.overlap,
            self.chunking.lookback
        );
        tracing::info!(
            "  scoring:   overlap_weight={}, phrase_bonus={}, sequence_bonus={}",
            self.scoring.overlap_weight,
            self.scoring.phrase_bonus,
            self.scoring.sequence_bonus
        );
        tracing::info!(
            "  retrieval: top_k={}, budget_chars={}",
            self.retrieval.top_k,
            self.retrieval.budget_chars
        );
        tracing::info!(
            "  llm:       provider={}, timeout={}s, retries={}",
            self.llm.provider,
            self.llm.timeout_secs,
            self.llm.max_retries
        );
        tracing::info!("  ollama:    url={}", self.ollama.url);
    }

    /// Return a redacted view safe for display (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "chunking": {
                "chunk_size": self.chunking.chunk_size,
                "overlap": self.chunking.overlap,
                "lookback": self.chunking.lookback,
            },
            "scoring": {
                "overlap_weight": self.scoring.overlap_weight,
                "phrase_bonus": self.scoring.phrase_bonus,
                "sequence_bonus": self.scoring.sequence_bonus,
                "min_phrase_words": self.scoring.min_phrase_words,
            },
            "retrieval": {
                "top_k": self.retrieval.top_k,
                "budget_chars": self.retrieval.budget_chars,
            },
            "llm": {
                "provider": self.llm.provider,
                "model": self.llm.active_model(&self.ollama),
                "configured": self.llm.is_configured(),
                "timeout_secs": self.llm.timeout_secs,
                "max_retries": self.llm.max_retries,
            },
            "ollama": { "url": self.ollama.url, "model": self.ollama.model },
        })
    }
}

// ── Chunking ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk length in characters, including the overlap prefix.
    pub chunk_size: usize,
    /// Characters repeated from the end of the previous chunk.
    pub overlap: usize,
    /// How many characters back from the target end a sentence boundary may be.
    pub lookback: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 100,
            lookback: 200,
        }
    }
}

impl ChunkingConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            chunk_size: profiled_env_parse(p, "CHUNK_SIZE", d.chunk_size),
            overlap: profiled_env_parse(p, "CHUNK_OVERLAP", d.overlap),
            lookback: profiled_env_parse(p, "CHUNK_LOOKBACK", d.lookback),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.chunk_size == 0 {
            return Err(CoreError::InvalidConfig("CHUNK_SIZE must be positive".into()));
        }
        if self.overlap >= self.chunk_size {
            return Err(CoreError::InvalidConfig(format!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

// ── Scoring ───────────────────────────────────────────────────

/// Weights of the lexical relevance signals. Tunable because no calibration
/// data fixes their ratio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Multiplier on the query-term overlap ratio.
    pub overlap_weight: f32,
    /// Awarded in full when the whole query phrase appears verbatim.
    pub phrase_bonus: f32,
    /// Awarded in full when every query term appears in query order.
    pub sequence_bonus: f32,
    /// Shortest contiguous query run that earns a partial phrase bonus.
    pub min_phrase_words: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            overlap_weight: 1.0,
            phrase_bonus: 0.3,
            sequence_bonus: 0.2,
            min_phrase_words: 2,
        }
    }
}

impl ScoringConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            overlap_weight: profiled_env_parse(p, "SCORE_OVERLAP_WEIGHT", d.overlap_weight),
            phrase_bonus: profiled_env_parse(p, "SCORE_PHRASE_BONUS", d.phrase_bonus),
            sequence_bonus: profiled_env_parse(p, "SCORE_SEQUENCE_BONUS", d.sequence_bonus),
            min_phrase_words: profiled_env_parse(p, "SCORE_MIN_PHRASE_WORDS", d.min_phrase_words),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let weights = [
            ("SCORE_OVERLAP_WEIGHT", self.overlap_weight),
            ("SCORE_PHRASE_BONUS", self.phrase_bonus),
            ("SCORE_SEQUENCE_BONUS", self.sequence_bonus),
        ];
        for (key, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(CoreError::InvalidConfig(format!(
                    "{key} must be a non-negative number, got {value}"
                )));
            }
        }
        if self.overlap_weight == 0.0 {
            return Err(CoreError::InvalidConfig(
                "SCORE_OVERLAP_WEIGHT must be positive".into(),
            ));
        }
        Ok(())
    }
}

// ── Retrieval ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub top_k: usize,
    /// Upper bound on the summed length of selected chunk texts.
    pub budget_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            budget_chars: 3300,
        }
    }
}

impl RetrievalConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            top_k: profiled_env_parse(p, "RETRIEVAL_TOP_K", d.top_k),
            budget_chars: profiled_env_parse(p, "RETRIEVAL_BUDGET_CHARS", d.budget_chars),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.top_k == 0 {
            return Err(CoreError::InvalidConfig("RETRIEVAL_TOP_K must be positive".into()));
        }
        Ok(())
    }
}

// ── LLM (Gemini / OpenAI / Ollama) ───────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "gemini", "openai", "ollama"
    pub provider: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Per-attempt timeout for one generation call.
    pub timeout_secs: u64,
    /// Extra attempts after a transient failure.
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            gemini_api_key: None,
            gemini_model: "gemini-1.5-flash-latest".to_string(),
            gemini_base_url: None,
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            openai_base_url: None,
            temperature: 0.3,
            max_tokens: 2048,
            timeout_secs: 30,
            max_retries: 1,
            retry_backoff_ms: 500,
        }
    }
}

impl LlmConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            provider: profiled_env_or(p, "LLM_PROVIDER", &d.provider).to_lowercase(),
            gemini_api_key: profiled_env_opt(p, "GOOGLE_AI_API_KEY"),
            gemini_model: profiled_env_or(p, "GEMINI_MODEL", &d.gemini_model),
            gemini_base_url: profiled_env_opt(p, "GEMINI_BASE_URL"),
            openai_api_key: profiled_env_opt(p, "OPENAI_API_KEY"),
            openai_model: profiled_env_or(p, "OPENAI_MODEL", &d.openai_model),
            openai_base_url: profiled_env_opt(p, "OPENAI_BASE_URL"),
            temperature: profiled_env_parse(p, "LLM_TEMPERATURE", d.temperature),
            max_tokens: profiled_env_parse(p, "LLM_MAX_TOKENS", d.max_tokens),
            timeout_secs: profiled_env_parse(p, "LLM_TIMEOUT_SECS", d.timeout_secs),
            max_retries: profiled_env_parse(p, "LLM_MAX_RETRIES", d.max_retries),
            retry_backoff_ms: profiled_env_parse(p, "LLM_RETRY_BACKOFF_MS", d.retry_backoff_ms),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.timeout_secs == 0 {
            return Err(CoreError::InvalidConfig("LLM_TIMEOUT_SECS must be positive".into()));
        }
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        match self.provider.as_str() {
            "gemini" | "google" => self.gemini_api_key.is_some(),
            "openai" => self.openai_api_key.is_some(),
            "ollama" => true,
            _ => false,
        }
    }

    /// Model name of the selected provider.
    pub fn active_model<'a>(&'a self, ollama: &'a OllamaConfig) -> &'a str {
        match self.provider.as_str() {
            "openai" => &self.openai_model,
            "ollama" => &ollama.model,
            _ => &self.gemini_model,
        }
    }
}

// ── Ollama (local models) ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
        }
    }
}

impl OllamaConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            url: profiled_env_or(p, "OLLAMA_URL", &d.url),
            model: profiled_env_or(p, "OLLAMA_MODEL", &d.model),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.overlap, 100);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.llm.provider, "gemini");
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        let mut config = Config::default();
        config.chunking.overlap = 1000;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("CHUNK_OVERLAP"));
    }

    #[test]
    fn negative_weights_are_rejected() {
        let mut config = Config::default();
        config.scoring.phrase_bonus = -0.1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.scoring.sequence_bonus = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let mut config = Config::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut config = Config::default();
        config.llm.timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("LLM_TIMEOUT_SECS"));
    }

    #[test]
    fn budget_below_chunk_size_warns_but_validates() {
        let mut config = Config::default();
        assert!(config.budget_warning().is_none());

        config.retrieval.budget_chars = 500;
        assert!(config.validate().is_ok());
        let warning = config.budget_warning().unwrap();
        assert!(warning.contains("RETRIEVAL_BUDGET_CHARS (500)"));
    }

    #[test]
    fn profiled_lookup_prefers_prefixed_key() {
        // Unique key names keep this test independent of the real environment.
        env::set_var("MYTUTS_TEST_CHUNK_SIZE", "640");
        env::set_var("TESTPROFILE_MYTUTS_TEST_CHUNK_SIZE", "480");
        assert_eq!(profiled_env_parse("TESTPROFILE", "MYTUTS_TEST_CHUNK_SIZE", 0usize), 480);
        assert_eq!(profiled_env_parse("", "MYTUTS_TEST_CHUNK_SIZE", 0usize), 640);
        assert_eq!(profiled_env_parse("OTHER", "MYTUTS_TEST_CHUNK_SIZE", 0usize), 640);
    }

    #[test]
    fn malformed_numbers_fall_back_to_default() {
        env::set_var("MYTUTS_TEST_BAD_NUMBER", "twelve");
        assert_eq!(profiled_env_parse("", "MYTUTS_TEST_BAD_NUMBER", 7u32), 7);
    }

    #[test]
    fn redacted_summary_hides_secrets() {
        let mut config = Config::default();
        config.llm.gemini_api_key = Some("super-secret".into());
        let summary = config.redacted_summary().to_string();
        assert!(!summary.contains("super-secret"));
        assert!(summary.contains("\"configured\":true"));
    }
}
