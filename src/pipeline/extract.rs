//! PDF text extraction via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which is neither
//! async-aware nor cheap on large documents. [`extract_text`] moves the work
//! onto the blocking thread pool so a long decision does not stall the Tokio
//! worker serving other sessions.
//!
//! ## Failure model
//!
//! [`TextExtractor::extract`] returns a proper error. The web shell goes
//! through [`extract_lenient`], which turns any failure into empty text plus a
//! warning message: the user is told, and the flow halts before any model
//! call.

use crate::error::DetectaError;
use crate::progress::ProgressCallback;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Text of a whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText {
    /// Page texts in order, each followed by `\n`, the whole trimmed.
    pub text: String,
    pub page_count: usize,
}

/// Result of [`extract_lenient`]: text is empty whenever `warning` is set.
#[derive(Debug, Clone, Default)]
pub struct TextExtraction {
    pub text: String,
    pub page_count: usize,
    pub warning: Option<String>,
}

/// Anything that can turn PDF bytes into text.
///
/// Implementations are called from a blocking-pool thread.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, pdf: &[u8]) -> Result<ExtractedText, DetectaError>;
}

/// pdfium-backed extractor.
#[derive(Debug, Clone, Default)]
pub struct PdfiumExtractor {
    lib_path: Option<PathBuf>,
}

impl PdfiumExtractor {
    /// `lib_path` may name the shared library itself or the directory holding
    /// it. `None` binds the system library.
    pub fn new(lib_path: Option<PathBuf>) -> Self {
        Self { lib_path }
    }
}

impl TextExtractor for PdfiumExtractor {
    fn extract(&self, pdf: &[u8]) -> Result<ExtractedText, DetectaError> {
        let pdfium = bind_pdfium(self.lib_path.as_deref())?;

        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|e| DetectaError::ExtractionFailed {
                detail: e.to_string(),
            })?;

        let pages = document.pages();
        let page_count = pages.len() as usize;
        info!("PDF loaded: {} pages", page_count);

        let mut text = String::new();
        for (idx, page) in pages.iter().enumerate() {
            let page_text = page.text().map_err(|e| DetectaError::ExtractionFailed {
                detail: format!("page {}: {e}", idx + 1),
            })?;
            let content = page_text.all();
            debug!("Page {} → {} chars", idx + 1, content.chars().count());
            text.push_str(&content);
            text.push('\n');
        }

        Ok(ExtractedText {
            text: text.trim().to_string(),
            page_count,
        })
    }
}

/// Shared-library file name of pdfium on this platform.
fn platform_library_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "pdfium.dll"
    } else if cfg!(target_os = "macos") {
        "libpdfium.dylib"
    } else {
        "libpdfium.so"
    }
}

fn bind_pdfium(lib_path: Option<&Path>) -> Result<Pdfium, DetectaError> {
    let bindings = match lib_path {
        Some(dir) if dir.is_dir() => Pdfium::bind_to_library(dir.join(platform_library_name())),
        Some(file) => Pdfium::bind_to_library(file),
        None => Pdfium::bind_to_system_library(),
    };
    bindings
        .map(Pdfium::new)
        .map_err(|e| DetectaError::PdfiumBindingFailed(e.to_string()))
}

/// Extract the text of `pdf` on the blocking pool.
pub async fn extract_text(
    extractor: Arc<dyn TextExtractor>,
    pdf: Vec<u8>,
    progress: Option<&ProgressCallback>,
) -> Result<ExtractedText, DetectaError> {
    if let Some(cb) = progress {
        cb.on_extraction_start(pdf.len());
    }

    let result = tokio::task::spawn_blocking(move || extractor.extract(&pdf))
        .await
        .map_err(|e| DetectaError::Internal(format!("Extraction task panicked: {e}")))?;

    if let Some(cb) = progress {
        match &result {
            Ok(doc) => cb.on_extraction_complete(doc.page_count, doc.text.chars().count()),
            Err(_) => cb.on_extraction_complete(0, 0),
        }
    }
    result
}

/// Like [`extract_text`] but never fails: errors become empty text plus a
/// user-facing warning.
pub async fn extract_lenient(
    extractor: Arc<dyn TextExtractor>,
    pdf: Vec<u8>,
    progress: Option<&ProgressCallback>,
) -> TextExtraction {
    match extract_text(extractor, pdf, progress).await {
        Ok(doc) => TextExtraction {
            text: doc.text,
            page_count: doc.page_count,
            warning: None,
        },
        Err(e) => {
            warn!("Text extraction failed: {}", e);
            TextExtraction {
                text: String::new(),
                page_count: 0,
                warning: Some(format!("Could not extract text from the PDF: {e}")),
            }
        }
    }
}
