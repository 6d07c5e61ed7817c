//! Response recovery: decode the model's answer into an [`AnalysisRecord`].
//!
//! Models asked for JSON do not always return clean JSON. Two failure shapes
//! are common: prose around the object ("Here you go: {…} thanks") and broken
//! escaping inside string fields. This module fixes only the first:
//!
//! 1. strict decode of the whole response;
//! 2. on failure, decode the span from the first `{` to the last `}`
//!    (greedy, across newlines);
//! 3. on failure or no span, give up with [`ParseOutcome::Unrecoverable`],
//!    carrying the raw text for manual inspection.
//!
//! There is no bracket balancing, trailing-comma removal or quote repair.

use crate::record::AnalysisRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::error::Category;
use tracing::{debug, warn};

static RE_OUTER_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Which attempt produced the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseStage {
    /// The whole response was valid JSON.
    Strict,
    /// The embedded object decoded after the strict attempt failed with
    /// `first_error`.
    Extracted { first_error: String },
}

/// Terminal result of parsing one response.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Parsed {
        record: AnalysisRecord,
        stage: ParseStage,
    },
    Unrecoverable {
        raw: String,
        reason: String,
    },
}

impl ParseOutcome {
    pub fn record(&self) -> Option<&AnalysisRecord> {
        match self {
            ParseOutcome::Parsed { record, .. } => Some(record),
            ParseOutcome::Unrecoverable { .. } => None,
        }
    }

    pub fn into_record(self) -> Option<AnalysisRecord> {
        match self {
            ParseOutcome::Parsed { record, .. } => Some(record),
            ParseOutcome::Unrecoverable { .. } => None,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, ParseOutcome::Parsed { .. })
    }
}

/// Parse a raw model response.
pub fn parse_response(raw: &str) -> ParseOutcome {
    let first_error = match serde_json::from_str::<AnalysisRecord>(raw) {
        Ok(record) => {
            debug!("Response decoded on the strict attempt");
            return ParseOutcome::Parsed {
                record,
                stage: ParseStage::Strict,
            };
        }
        Err(e) => e.to_string(),
    };
    warn!("Response is not clean JSON ({}); extracting the embedded object", first_error);

    let Some(span) = RE_OUTER_OBJECT.find(raw) else {
        return ParseOutcome::Unrecoverable {
            raw: raw.to_string(),
            reason: "No JSON object was found in the model response.".to_string(),
        };
    };

    match serde_json::from_str::<AnalysisRecord>(span.as_str()) {
        Ok(record) => ParseOutcome::Parsed {
            record,
            stage: ParseStage::Extracted { first_error },
        },
        Err(e) => ParseOutcome::Unrecoverable {
            raw: raw.to_string(),
            reason: match e.classify() {
                Category::Syntax | Category::Eof => {
                    format!("The model returned corrupted JSON (probably unescaped quotes): {e}")
                }
                Category::Data | Category::Io => {
                    format!("The model returned JSON of an unexpected shape: {e}")
                }
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "bias_percentage": 40,
        "summary": "Moderate gender bias.",
        "findings": [
            {
                "type": "gender, moral",
                "excerpt": "as a woman she should have known",
                "explanation": "Assigns duties by gender.",
                "suggested_rewrite": "the party should have known"
            }
        ],
        "rewritten_document": "Neutral text."
    }"#;

    #[test]
    fn strict_json_parses_on_first_attempt() {
        match parse_response(MINIMAL) {
            ParseOutcome::Parsed { record, stage } => {
                assert_eq!(stage, ParseStage::Strict);
                assert_eq!(record.bias_percentage, Some(40));
                assert_eq!(record.summary.as_deref(), Some("Moderate gender bias."));
                assert_eq!(record.findings.len(), 1);
                assert_eq!(record.findings[0].bias_type.as_deref(), Some("gender, moral"));
                assert_eq!(record.rewritten_document.as_deref(), Some("Neutral text."));
            }
            other => panic!("expected Parsed, got {other:?}"),
        }
    }

    #[test]
    fn prose_wrapped_object_is_extracted() {
        let raw = format!("Here you go: {MINIMAL} thanks");
        match parse_response(&raw) {
            ParseOutcome::Parsed { record, stage } => {
                assert!(matches!(stage, ParseStage::Extracted { .. }));
                assert_eq!(record.bias_percentage, Some(40));
            }
            other => panic!("expected Parsed, got {other:?}"),
        }
    }

    #[test]
    fn markdown_fenced_object_is_extracted() {
        let raw = format!("```json\n{MINIMAL}\n```");
        assert!(parse_response(&raw).is_parsed());
    }

    #[test]
    fn no_braces_is_unrecoverable() {
        let raw = "I cannot analyse this document.";
        match parse_response(raw) {
            ParseOutcome::Unrecoverable { raw: kept, reason } => {
                assert_eq!(kept, raw);
                assert!(reason.contains("No JSON object"));
            }
            other => panic!("expected Unrecoverable, got {other:?}"),
        }
        assert!(parse_response(raw).record().is_none());
    }

    #[test]
    fn unescaped_quotes_are_not_repaired() {
        let raw = r#"Result: {"summary": "the judge said "enough" twice"}"#;
        match parse_response(raw) {
            ParseOutcome::Unrecoverable { raw: kept, reason } => {
                assert_eq!(kept, raw);
                assert!(reason.contains("corrupted JSON"));
            }
            other => panic!("expected Unrecoverable, got {other:?}"),
        }
    }

    #[test]
    fn greedy_span_covers_first_to_last_brace() {
        // Two objects: the greedy span is not valid JSON, so this fails.
        let raw = r#"{"summary": "a"} and {"summary": "b"}"#;
        assert!(!parse_response(raw).is_parsed());
    }

    #[test]
    fn missing_fields_default() {
        match parse_response("{}") {
            ParseOutcome::Parsed { record, .. } => {
                assert_eq!(record.bias_percentage, None);
                assert!(record.summary.is_none());
                assert!(record.findings.is_empty());
                assert!(record.rewritten_document.is_none());
            }
            other => panic!("expected Parsed, got {other:?}"),
        }
    }

    #[test]
    fn wrong_shape_is_unrecoverable() {
        assert!(!parse_response(r#"{"findings": "none"}"#).is_parsed());
        assert!(!parse_response("[1, 2, 3]").is_parsed());
    }

    #[test]
    fn null_findings_mean_no_findings() {
        let raw = r#"{"bias_percentage": 0, "summary": "No bias.", "findings": null, "rewritten_document": "Same."}"#;
        match parse_response(raw) {
            ParseOutcome::Parsed { record, stage } => {
                assert_eq!(stage, ParseStage::Strict);
                assert!(record.findings.is_empty());
                assert_eq!(record.bias_percentage, Some(0));
                assert_eq!(record.summary.as_deref(), Some("No bias."));
            }
            other => panic!("expected Parsed, got {other:?}"),
        }
    }

    #[test]
    fn shape_error_is_not_blamed_on_quotes() {
        let raw = r#"Answer: {"findings": [{"type": ["gender"]}]}"#;
        match parse_response(raw) {
            ParseOutcome::Unrecoverable { reason, .. } => {
                assert!(reason.contains("unexpected shape"), "got: {reason}");
                assert!(!reason.contains("unescaped quotes"));
            }
            other => panic!("expected Unrecoverable, got {other:?}"),
        }
    }
}
