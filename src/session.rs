//! Per-user session context.
//!
//! Everything the UI remembers between requests lives in one [`Session`]
//! value: the last record, the last extracted text, the chosen
//! classification and the print flag. Handlers receive the session explicitly
//! and call its transition methods, so the whole flow can be exercised
//! without a browser.
//!
//! Sessions are held in memory only ([`SessionStore`]) and vanish after an
//! idle period or a restart.

use crate::config::Classification;
use crate::error::DetectaError;
use crate::output::AnalysisOutput;
use crate::pipeline::extract::TextExtraction;
use crate::pipeline::parse::{ParseOutcome, ParseStage};
use crate::record::AnalysisRecord;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A message shown on the next render only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// A response that could not be parsed, kept for manual inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawFailure {
    pub reason: String,
    pub raw: String,
}

/// State of one browser session.
#[derive(Debug, Clone)]
pub struct Session {
    pub record: Option<AnalysisRecord>,
    pub original_text: Option<String>,
    pub document_name: Option<String>,
    pub classification: Classification,
    pub printing: bool,
    pub last_failure: Option<RawFailure>,
    notices: Vec<Notice>,
    last_seen: Instant,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            record: None,
            original_text: None,
            document_name: None,
            classification: Classification::default(),
            printing: false,
            last_failure: None,
            notices: Vec::new(),
            last_seen: Instant::now(),
        }
    }
}

impl Session {
    pub fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice {
            level,
            message: message.into(),
        });
    }

    /// Flash messages queued since the last render; clears the queue.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Store the text of a freshly uploaded document.
    ///
    /// Any previous analysis is dropped. An empty extraction is kept as empty
    /// text with a warning, which hides the analyze action.
    pub fn load_document(&mut self, name: impl Into<String>, extraction: TextExtraction) {
        self.record = None;
        self.last_failure = None;
        self.printing = false;
        self.document_name = Some(name.into());

        if let Some(warning) = extraction.warning {
            self.notify(NoticeLevel::Error, warning);
        }
        if extraction.text.trim().is_empty() {
            self.notify(NoticeLevel::Warning, DetectaError::EmptyText.to_string());
        } else {
            self.notify(NoticeLevel::Success, "Text extracted successfully!");
        }
        self.original_text = Some(extraction.text);
    }

    /// Whether there is non-empty text to analyse.
    pub fn has_text(&self) -> bool {
        self.original_text
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }

    /// Start an analysis: clear the previous result and hand out the text.
    ///
    /// Returns `None` (with a warning queued) when there is nothing to send.
    pub fn begin_analysis(&mut self) -> Option<String> {
        self.record = None;
        self.last_failure = None;
        self.printing = false;
        if self.has_text() {
            self.original_text.clone()
        } else {
            self.notify(
                NoticeLevel::Warning,
                "Upload a PDF with extractable text before running the analysis.",
            );
            None
        }
    }

    /// Record the result of an analysis attempt.
    pub fn finish_analysis(&mut self, result: Result<AnalysisOutput, DetectaError>) {
        match result {
            Ok(output) => match output.outcome {
                ParseOutcome::Parsed { record, stage } => {
                    if let ParseStage::Extracted { first_error } = stage {
                        self.notify(
                            NoticeLevel::Warning,
                            format!(
                                "The response was not clean JSON ({first_error}). \
                                 The embedded JSON object was extracted instead."
                            ),
                        );
                    }
                    self.record = Some(record);
                }
                ParseOutcome::Unrecoverable { raw, reason } => {
                    self.notify(NoticeLevel::Error, reason.clone());
                    self.last_failure = Some(RawFailure { reason, raw });
                }
            },
            Err(DetectaError::EmptyText) => {
                self.notify(NoticeLevel::Warning, DetectaError::EmptyText.to_string());
            }
            Err(e) => self.notify(NoticeLevel::Error, e.to_string()),
        }
    }

    /// Drop the record after the report failed to render.
    pub fn discard_record(&mut self, error: &DetectaError) {
        self.record = None;
        self.printing = false;
        self.notify(NoticeLevel::Error, error.to_string());
    }

    /// "Save as PDF" was clicked. Ignored when there is no report to print.
    pub fn request_print(&mut self) -> bool {
        self.printing = self.record.is_some();
        self.printing
    }

    /// Read the print flag for this render and reset it.
    ///
    /// Returns `true` for exactly one render after [`Session::request_print`].
    pub fn take_print_mode(&mut self) -> bool {
        std::mem::replace(&mut self.printing, false)
    }
}

/// In-memory session table keyed by an opaque session id.
#[derive(Debug)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    idle_ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(60 * 60))
    }
}

impl SessionStore {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_ttl,
        }
    }

    /// Run `f` on the session `id`, creating it if needed.
    ///
    /// The lock is held only for the duration of `f`; never call this across
    /// an `.await`.
    pub fn with_session<R>(&self, id: &str, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let now = Instant::now();
        let ttl = self.idle_ttl;
        let before = sessions.len();
        sessions.retain(|key, s| key == id || now.duration_since(s.last_seen) < ttl);
        if sessions.len() != before {
            debug!("Expired {} idle sessions", before - sessions.len());
        }

        let session = sessions.entry(id.to_string()).or_default();
        session.last_seen = now;
        f(session)
    }

    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
