//! Result types of a completed analysis attempt.

use crate::pipeline::parse::ParseOutcome;
use crate::record::AnalysisRecord;
use serde::{Deserialize, Serialize};

/// Everything an analysis attempt produced.
///
/// Returned even when the response could not be parsed: check
/// [`AnalysisOutput::outcome`] before using the record.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub outcome: ParseOutcome,
    pub stats: AnalysisStats,
}

impl AnalysisOutput {
    pub fn record(&self) -> Option<&AnalysisRecord> {
        self.outcome.record()
    }
}

/// Timing and token accounting for one attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// Pages read from the PDF; `None` when the caller supplied text.
    pub page_count: Option<usize>,
    /// Characters of extracted text sent to the model.
    pub text_chars: usize,
    pub prompt_version: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
}
