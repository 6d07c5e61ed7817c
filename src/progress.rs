//! Progress-callback trait for analysis stage events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalysisConfigBuilder::progress_callback`] to be told when
//! each stage of an analysis starts and ends. The CLI uses it to drive a
//! spinner; the web shell does not need it because every request blocks until
//! the stage is done.
//!
//! # Example
//!
//! ```rust
//! use detectabias::{AnalysisConfig, AnalysisProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     requests: AtomicUsize,
//! }
//!
//! impl AnalysisProgressCallback for CountingCallback {
//!     fn on_request_start(&self, prompt_chars: usize) {
//!         self.requests.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("sending {prompt_chars} chars");
//!     }
//! }
//!
//! let config = AnalysisConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { requests: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the analysis pipeline as it moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync` because the
/// extraction stage runs on a blocking-pool thread.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called before the PDF is handed to the text extractor.
    fn on_extraction_start(&self, pdf_bytes: usize) {
        let _ = pdf_bytes;
    }

    /// Called after text extraction, successful or not.
    ///
    /// # Arguments
    /// * `pages`: pages read (0 on failure)
    /// * `chars`: characters of extracted text (0 on failure)
    fn on_extraction_complete(&self, pages: usize, chars: usize) {
        let _ = (pages, chars);
    }

    /// Called just before the model request is sent.
    fn on_request_start(&self, prompt_chars: usize) {
        let _ = prompt_chars;
    }

    /// Called when the model answered (before parsing).
    fn on_response(&self, response_chars: usize, elapsed_ms: u64) {
        let _ = (response_chars, elapsed_ms);
    }

    /// Called once the attempt is over.
    ///
    /// `parsed` is `false` for an unrecoverable response and for every fatal
    /// error that stopped the attempt earlier.
    fn on_analysis_complete(&self, parsed: bool) {
        let _ = parsed;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalysisConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;
