//! Configuration types for bias analysis and the web shell.
//!
//! All analysis behaviour is controlled through [`AnalysisConfig`], built via
//! its [`AnalysisConfigBuilder`]. The web server has its own small
//! [`ServerConfig`]; both are filled from CLI flags / environment variables by
//! the binary.

use crate::error::DetectaError;
use crate::pipeline::llm::CompletionBackend;
use crate::progress::ProgressCallback;
use crate::prompts::PromptTemplate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Default provider name passed to `edgequake_llm::ProviderFactory`.
pub const DEFAULT_PROVIDER: &str = "gemini";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Configuration for one bias analysis.
///
/// Built via [`AnalysisConfig::builder()`] or using
/// [`AnalysisConfig::default()`].
///
/// # Example
/// ```rust
/// use detectabias::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .model("gemini-2.5-pro")
///     .api_timeout_secs(120)
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "gemini-2.5-pro");
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// LLM provider name (e.g. "gemini", "openai", "anthropic", "ollama").
    /// Default: "gemini".
    pub provider_name: String,

    /// LLM model identifier. Default: "gemini-2.5-flash".
    pub model: String,

    /// Pre-constructed completion backend. Takes precedence over
    /// `provider_name` / `model`.
    pub backend: Option<Arc<dyn CompletionBackend>>,

    /// Sampling temperature. `None` leaves the provider default in place.
    pub temperature: Option<f32>,

    /// Maximum tokens the model may generate. Default: 32768.
    ///
    /// The response embeds a full rewrite of the decision, so it is roughly
    /// as long as the input plus the findings.
    pub max_tokens: usize,

    /// Per-call timeout in seconds. `None` (default) relies on the
    /// provider client's own timeout.
    pub api_timeout_secs: Option<u64>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Prompt template sent with every request.
    pub prompt: PromptTemplate,

    /// Path to a pdfium shared library (file or directory).
    /// `None` binds the system library.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Optional stage-progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            provider_name: DEFAULT_PROVIDER.to_string(),
            model: DEFAULT_MODEL.to_string(),
            backend: None,
            temperature: None,
            max_tokens: 32_768,
            api_timeout_secs: None,
            download_timeout_secs: 120,
            prompt: PromptTemplate::default(),
            pdfium_lib_path: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("backend", &self.backend.as_ref().map(|b| b.name().to_string()))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("prompt_version", &self.prompt.version())
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("progress_callback", &self.progress_callback.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AnalysisConfig`].
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl fmt::Debug for AnalysisConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl AnalysisConfigBuilder {
    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn backend(mut self, backend: Arc<dyn CompletionBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn prompt(mut self, prompt: PromptTemplate) -> Self {
        self.config.prompt = prompt;
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, DetectaError> {
        let c = &self.config;
        if c.backend.is_none() && c.provider_name.trim().is_empty() {
            return Err(DetectaError::InvalidConfig(
                "provider name must not be empty".into(),
            ));
        }
        if c.backend.is_none() && c.model.trim().is_empty() {
            return Err(DetectaError::InvalidConfig("model must not be empty".into()));
        }
        if c.max_tokens == 0 {
            return Err(DetectaError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if c.api_timeout_secs == Some(0) {
            return Err(DetectaError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Settings of the web shell.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to listen on. Default: `127.0.0.1:8501`.
    pub bind: SocketAddr,

    /// Largest accepted request body (the uploaded PDF). Default: 25 MiB.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8501)),
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Thematic classification chosen by the user in the sidebar.
///
/// Purely descriptive: it is shown on the report and never sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    #[default]
    Unclassified,
    CriminalLaw,
    Family,
    Labor,
    Civil,
    Administrative,
    Other,
}

impl Classification {
    /// Every selectable value, in sidebar order.
    pub const ALL: [Classification; 7] = [
        Classification::Unclassified,
        Classification::CriminalLaw,
        Classification::Family,
        Classification::Labor,
        Classification::Civil,
        Classification::Administrative,
        Classification::Other,
    ];

    /// Stable machine key used in forms and the CLI.
    pub fn key(self) -> &'static str {
        match self {
            Classification::Unclassified => "unclassified",
            Classification::CriminalLaw => "criminal_law",
            Classification::Family => "family",
            Classification::Labor => "labor",
            Classification::Civil => "civil",
            Classification::Administrative => "administrative",
            Classification::Other => "other",
        }
    }

    /// Human-readable label shown on the report.
    pub fn label(self) -> &'static str {
        match self {
            Classification::Unclassified => "Unclassified",
            Classification::CriminalLaw => "Criminal Law",
            Classification::Family => "Family",
            Classification::Labor => "Labor",
            Classification::Civil => "Civil",
            Classification::Administrative => "Administrative",
            Classification::Other => "Other",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Classification {
    type Err = DetectaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Classification::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(wanted) || c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DetectaError::InvalidConfig(format!("unknown classification '{wanted}'")))
    }
}
