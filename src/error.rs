//! Error types for the detectabias library.
//!
//! Two distinct failure shapes reflect two distinct outcomes:
//!
//! * [`DetectaError`]: **Fatal** for the current attempt: the analysis cannot
//!   produce a record at all (no credential, unreadable PDF, the model call
//!   failed). Returned as `Err(DetectaError)` from the library entry points.
//!
//! * [`crate::pipeline::parse::ParseOutcome::Unrecoverable`]: the model
//!   answered but its text could not be decoded. This is a regular value, not
//!   an error, so the raw response travels with it and can be shown to the
//!   user for manual inspection.
//!
//! No variant is ever retried automatically; every failure ends the attempt
//! and waits for the next explicit user action.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the detectabias library.
#[derive(Debug, Error)]
pub enum DetectaError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// The bytes were read, but they are not a PDF.
    #[error("'{source_name}' is not a valid PDF\nFirst bytes: {magic:?}")]
    NotAPdf { source_name: String, magic: Vec<u8> },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium (or its directory) or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    /// pdfium could not open or read the document.
    #[error("PDF text extraction failed: {detail}")]
    ExtractionFailed { detail: String },

    /// Extraction succeeded but produced no text (scanned image, empty file).
    #[error("The text extracted from the PDF is empty.")]
    EmptyText,

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned an error.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// The LLM call did not answer within the configured timeout.
    #[error("LLM call timed out after {secs}s")]
    ApiTimeout { secs: u64 },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder or template validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Report errors ─────────────────────────────────────────────────────
    /// The report could not be rendered from an otherwise valid record.
    #[error("Unexpected error while rendering the report: {0}")]
    RenderFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
