//! # detectabias
//!
//! Detect linguistic and argumentative bias in judicial decisions.
//!
//! A decision is uploaded as a PDF, its text layer is extracted, and one
//! language-model request asks for a structured critique: an overall bias
//! percentage, a summary, a list of findings (category, excerpt, explanation,
//! suggested rewrite) and a neutral rewrite of the whole document. The answer
//! is recovered leniently from whatever the model returned and rendered as a
//! report that can be printed to PDF from the browser.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    uploaded bytes, local file or URL; %PDF magic check
//!  ├─ 2. Extract  text layer via pdfium (spawn_blocking)
//!  ├─ 3. Guard    empty text stops here, nothing is sent
//!  ├─ 4. Prompt   versioned template + JSON schema example
//!  ├─ 5. Model    one call through edgequake-llm (gemini by default)
//!  ├─ 6. Parse    strict JSON, then outermost {...} recovery
//!  └─ 7. Report   percentage, tally chart, findings, rewrite
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use detectabias::{analyze_file, AnalysisConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads GEMINI_API_KEY from the environment
//!     let config = AnalysisConfig::default();
//!     let output = analyze_file("decision.pdf", &config).await?;
//!     match output.record() {
//!         Some(record) => println!("bias: {:?}%", record.bias_percentage),
//!         None => eprintln!("the model answer could not be parsed"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `web`   | on      | The browser UI ([`web`]: axum + tera) |
//! | `cli`   | on      | The `detectabias` binary (clap + anyhow + tracing-subscriber) and [`secrets`] loading |
//!
//! Library-only use:
//! ```toml
//! detectabias = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analysis;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod record;
pub mod report;
#[cfg(feature = "cli")]
pub mod secrets;
pub mod session;
#[cfg(feature = "web")]
pub mod web;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analysis::{analyze_file, analyze_file_sync, analyze_pdf, analyze_text, analyze_with_backend};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, Classification, ServerConfig};
pub use error::DetectaError;
pub use output::{AnalysisOutput, AnalysisStats};
pub use pipeline::extract::{PdfiumExtractor, TextExtractor};
pub use pipeline::llm::{Completion, CompletionBackend};
pub use pipeline::parse::{parse_response, ParseOutcome, ParseStage};
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
pub use prompts::PromptTemplate;
pub use record::{AnalysisRecord, Finding};
pub use report::ReportView;
pub use session::{Session, SessionStore};
