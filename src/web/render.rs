//! HTML rendering with Tera.
//!
//! Templates are embedded at compile time and autoescaped (their names end in
//! `.html`). The report is rendered on its own first so a failure there can
//! discard the record while the rest of the page still renders.

use crate::config::Classification;
use crate::error::DetectaError;
use crate::report::{print_script, ReportView, PRINT_CSS};
use crate::session::{Notice, RawFailure, Session};
use serde::Serialize;
use tera::{Context, Tera};

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");
const REPORT_TEMPLATE: &str = include_str!("../../templates/report.html");

#[derive(Debug, Clone, Serialize)]
pub struct ClassificationOption {
    pub key: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Template context of the main page.
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub startup_error: Option<String>,
    pub notices: Vec<Notice>,
    pub classifications: Vec<ClassificationOption>,
    pub document_name: Option<String>,
    pub has_document: bool,
    pub original_text: Option<String>,
    pub can_analyze: bool,
    pub analysis_available: bool,
    pub report_html: Option<String>,
    pub last_failure: Option<RawFailure>,
    pub printing: bool,
    pub print_css: &'static str,
    pub print_script: String,
}

impl PageView {
    /// Snapshot `session` for one render.
    ///
    /// Drains the flash messages and consumes the print flag, so this must be
    /// called exactly once per page render.
    pub fn from_session(session: &mut Session, startup_error: Option<&str>) -> (Self, Option<ReportView>) {
        let report = session
            .record
            .as_ref()
            .map(|r| ReportView::new(r, session.classification));

        let view = Self {
            startup_error: startup_error.map(str::to_string),
            notices: session.drain_notices(),
            classifications: classification_options(session.classification),
            document_name: session.document_name.clone(),
            has_document: session.original_text.is_some(),
            original_text: session.original_text.clone(),
            can_analyze: session.has_text(),
            analysis_available: startup_error.is_none(),
            report_html: None,
            last_failure: session.last_failure.clone(),
            printing: session.take_print_mode(),
            print_css: PRINT_CSS,
            print_script: print_script(),
        };
        (view, report)
    }

    /// Drop the report from this render after it failed, showing `notices`.
    pub fn report_failed(&mut self, notices: Vec<Notice>) {
        self.report_html = None;
        self.printing = false;
        self.notices.extend(notices);
    }
}

fn classification_options(selected: Classification) -> Vec<ClassificationOption> {
    Classification::ALL
        .into_iter()
        .map(|c| ClassificationOption {
            key: c.key(),
            label: c.label(),
            selected: c == selected,
        })
        .collect()
}

/// Compiled page templates.
#[derive(Debug)]
pub struct PageRenderer {
    tera: Tera,
}

impl PageRenderer {
    pub fn new() -> Result<Self, DetectaError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("index.html", INDEX_TEMPLATE),
            ("report.html", REPORT_TEMPLATE),
        ])
        .map_err(|e| DetectaError::Internal(format!("template compilation failed: {e}")))?;
        Ok(Self { tera })
    }

    pub fn render_report(&self, report: &ReportView) -> Result<String, DetectaError> {
        let context = Context::from_serialize(report).map_err(|e| DetectaError::RenderFailed(e.to_string()))?;
        self.tera
            .render("report.html", &context)
            .map_err(|e| DetectaError::RenderFailed(e.to_string()))
    }

    pub fn render_page(&self, page: &PageView) -> Result<String, DetectaError> {
        let context = Context::from_serialize(page).map_err(|e| DetectaError::RenderFailed(e.to_string()))?;
        self.tera
            .render("index.html", &context)
            .map_err(|e| DetectaError::RenderFailed(e.to_string()))
    }
}
