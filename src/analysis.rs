//! Analysis entry points: text or PDF in, parsed record out.
//!
//! The flow is strictly sequential:
//!
//! ```text
//! PDF ──▶ extract ──▶ guard ──▶ prompt ──▶ model ──▶ parse
//! ```
//!
//! The guard rejects empty text before anything is sent, so a blank or
//! scanned document never reaches the model.

use crate::config::AnalysisConfig;
use crate::error::DetectaError;
use crate::output::{AnalysisOutput, AnalysisStats};
use crate::pipeline::extract::{self, PdfiumExtractor, TextExtractor};
use crate::pipeline::llm::{self, CompletionBackend};
use crate::pipeline::{input, parse};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Analyse already-extracted text with the backend resolved from `config`.
///
/// # Errors
/// - [`DetectaError::EmptyText`] if `text` is blank (no request is made)
/// - [`DetectaError::ProviderNotConfigured`] if no credential is available
/// - [`DetectaError::LlmApiError`] / [`DetectaError::ApiTimeout`] if the call fails
///
/// An unparseable response is *not* an error: it comes back as
/// [`parse::ParseOutcome::Unrecoverable`] inside the output.
pub async fn analyze_text(text: &str, config: &AnalysisConfig) -> Result<AnalysisOutput, DetectaError> {
    if text.trim().is_empty() {
        return Err(empty_text(config));
    }
    let backend = llm::resolve_backend(config)?;
    analyze_with_backend(backend.as_ref(), text, config).await
}

/// Analyse `text` with an explicit backend.
pub async fn analyze_with_backend(
    backend: &dyn CompletionBackend,
    text: &str,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, DetectaError> {
    let total_start = Instant::now();

    if text.trim().is_empty() {
        return Err(empty_text(config));
    }

    let prompt = config.prompt.render(text);
    info!(
        "Analysing {} chars with prompt {} via {}",
        text.chars().count(),
        config.prompt.version(),
        backend.name()
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_request_start(prompt.chars().count());
    }

    let llm_start = Instant::now();
    let completion = match llm::request_completion(backend, &prompt, config).await {
        Ok(c) => c,
        Err(e) => {
            if let Some(ref cb) = config.progress_callback {
                cb.on_analysis_complete(false);
            }
            return Err(e);
        }
    };
    let llm_duration_ms = llm_start.elapsed().as_millis() as u64;

    if let Some(ref cb) = config.progress_callback {
        cb.on_response(completion.text.chars().count(), llm_duration_ms);
    }

    let outcome = parse::parse_response(&completion.text);
    if let Some(ref cb) = config.progress_callback {
        cb.on_analysis_complete(outcome.is_parsed());
    }
    if !outcome.is_parsed() {
        warn!("Model response could not be parsed");
    }

    let stats = AnalysisStats {
        page_count: None,
        text_chars: text.chars().count(),
        prompt_version: config.prompt.version().to_string(),
        input_tokens: completion.input_tokens,
        output_tokens: completion.output_tokens,
        llm_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Analysis complete in {}ms (parsed: {})",
        stats.total_duration_ms,
        outcome.is_parsed()
    );

    Ok(AnalysisOutput { outcome, stats })
}

/// Extract the text of `pdf` with `extractor`, then analyse it.
pub async fn analyze_pdf(
    pdf: Vec<u8>,
    extractor: Arc<dyn TextExtractor>,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, DetectaError> {
    let start = Instant::now();
    let backend = llm::resolve_backend(config)?;

    let doc = extract::extract_text(extractor, pdf, config.progress_callback.as_ref()).await?;
    info!("Extracted {} chars from {} pages", doc.text.chars().count(), doc.page_count);

    let mut output = analyze_with_backend(backend.as_ref(), &doc.text, config).await?;
    output.stats.page_count = Some(doc.page_count);
    output.stats.total_duration_ms = start.elapsed().as_millis() as u64;
    Ok(output)
}

/// Analyse a PDF given as a local path or HTTP/HTTPS URL, using pdfium.
pub async fn analyze_file(
    input_str: impl AsRef<str>,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, DetectaError> {
    let input_str = input_str.as_ref();
    info!("Starting analysis: {}", input_str);

    let source = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let extractor = Arc::new(PdfiumExtractor::new(config.pdfium_lib_path.clone()));
    analyze_pdf(source.bytes, extractor, config).await
}

/// Synchronous wrapper around [`analyze_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_file_sync(
    input_str: impl AsRef<str>,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, DetectaError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DetectaError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(analyze_file(input_str, config))
}

fn empty_text(config: &AnalysisConfig) -> DetectaError {
    warn!("Extracted text is empty; not calling the model");
    if let Some(ref cb) = config.progress_callback {
        cb.on_analysis_complete(false);
    }
    DetectaError::EmptyText
}
