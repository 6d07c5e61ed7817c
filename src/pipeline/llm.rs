//! Model interaction: send the prompt and return the raw response text.
//!
//! All prompt engineering lives in [`crate::prompts`] and all response
//! recovery in [`crate::pipeline::parse`]; this module only owns the network
//! call. The provider sits behind [`CompletionBackend`] so the web shell and
//! the tests can swap in something other than `edgequake-llm`.
//!
//! Exactly one request is made per analysis. A failed call is reported and
//! ends the attempt; nothing is retried.

use crate::config::AnalysisConfig;
use crate::error::DetectaError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

/// Response format requested from every provider.
const JSON_RESPONSE_FORMAT: &str = "json_object";

/// Text returned by the model plus token accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// One-shot text completion.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Short label used in logs and error messages (e.g. `gemini/gemini-2.5-flash`).
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<Completion, DetectaError>;
}

/// [`CompletionBackend`] over any `edgequake-llm` provider.
pub struct ProviderBackend {
    label: String,
    provider: Arc<dyn LLMProvider>,
    temperature: Option<f32>,
    max_tokens: usize,
}

impl ProviderBackend {
    pub fn new(label: impl Into<String>, provider: Arc<dyn LLMProvider>, config: &AnalysisConfig) -> Self {
        Self {
            label: label.into(),
            provider,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Request options: JSON output mode plus the configured sampling limits.
    ///
    /// `json_object` is mapped by each provider to its native switch (Gemini:
    /// `response_mime_type = "application/json"`).
    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
            response_format: Some(JSON_RESPONSE_FORMAT.to_string()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl CompletionBackend for ProviderBackend {
    fn name(&self) -> &str {
        &self.label
    }

    async fn complete(&self, prompt: &str) -> Result<Completion, DetectaError> {
        let messages = vec![ChatMessage::user(prompt)];
        let options = self.options();

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| DetectaError::LlmApiError {
                message: e.to_string(),
            })?;

        Ok(Completion {
            text: response.content,
            input_tokens: response.prompt_tokens,
            output_tokens: response.completion_tokens,
        })
    }
}

/// Environment variable holding the API key of a known provider.
///
/// `None` for providers that need no key (local Ollama, LM Studio) or that
/// `edgequake-llm` configures some other way.
pub fn credential_env_var(provider: &str) -> Option<&'static str> {
    match provider.to_ascii_lowercase().as_str() {
        "gemini" | "google" => Some("GEMINI_API_KEY"),
        "openai" => Some("OPENAI_API_KEY"),
        "anthropic" | "claude" => Some("ANTHROPIC_API_KEY"),
        "mistral" => Some("MISTRAL_API_KEY"),
        "openrouter" => Some("OPENROUTER_API_KEY"),
        _ => None,
    }
}

/// Resolve the completion backend, from most-specific to least-specific.
///
/// 1. **Pre-built backend** (`config.backend`): used as-is.
/// 2. **Named provider + model**: the API key is checked up front so a
///    missing credential is reported once at startup with a precise hint,
///    then [`ProviderFactory::create_llm_provider`] builds the provider.
pub fn resolve_backend(config: &AnalysisConfig) -> Result<Arc<dyn CompletionBackend>, DetectaError> {
    if let Some(ref backend) = config.backend {
        return Ok(Arc::clone(backend));
    }

    let provider_name = config.provider_name.as_str();
    if let Some(var) = credential_env_var(provider_name) {
        let present = std::env::var(var).map(|v| !v.trim().is_empty()).unwrap_or(false);
        if !present {
            return Err(DetectaError::ProviderNotConfigured {
                provider: provider_name.to_string(),
                hint: format!(
                    "{var} was not found. Set it in the environment, in a .env file, \
                     or in secrets.toml. AI analysis is disabled until then."
                ),
            });
        }
    }

    let provider = ProviderFactory::create_llm_provider(provider_name, &config.model).map_err(|e| {
        DetectaError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: e.to_string(),
        }
    })?;

    let label = format!("{}/{}", provider_name, config.model);
    info!("Using LLM backend {}", label);
    Ok(Arc::new(ProviderBackend::new(label, provider, config)))
}

/// Send `prompt` through `backend`, honouring the configured timeout.
pub async fn request_completion(
    backend: &dyn CompletionBackend,
    prompt: &str,
    config: &AnalysisConfig,
) -> Result<Completion, DetectaError> {
    let start = Instant::now();
    debug!("Sending {} prompt chars to {}", prompt.len(), backend.name());

    let result = match config.api_timeout_secs {
        Some(secs) => match timeout(Duration::from_secs(secs), backend.complete(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(DetectaError::ApiTimeout { secs }),
        },
        None => backend.complete(prompt).await,
    };

    match &result {
        Ok(c) => debug!(
            "{}: {} input tokens, {} output tokens, {:?}",
            backend.name(),
            c.input_tokens,
            c.output_tokens,
            start.elapsed()
        ),
        Err(e) => warn!("{}: request failed: {}", backend.name(), e),
    }
    result
}
