//! HTTP handlers.
//!
//! Every state-changing action is a `POST` answered with a `303 See Other`
//! back to `/`, so a browser refresh never repeats an upload or a model call.
//! The page itself is rendered only by [`index`].

use crate::analysis;
use crate::config::Classification;
use crate::pipeline::extract::{self, TextExtraction};
use crate::pipeline::input::PdfSource;
use crate::record::AnalysisRecord;
use crate::session::NoticeLevel;
use crate::web::error::WebError;
use crate::web::render::PageView;
use crate::web::AppState;
use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "detectabias_session";

/// Session id from the request cookie, or a fresh one.
fn session_id(headers: &HeaderMap) -> String {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
        .unwrap_or_else(Uuid::new_v4)
        .to_string()
}

fn with_session_cookie(id: &str, response: impl IntoResponse) -> Response {
    let mut response = response.into_response();
    let cookie = format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax");
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

fn back_home(id: &str) -> Response {
    with_session_cookie(id, Redirect::to("/"))
}

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Render the page for the caller's session.
pub async fn index(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<Response, WebError> {
    let id = session_id(&headers);
    let startup_error = state.startup_error();

    let (mut page, report) = state
        .sessions
        .with_session(&id, |s| PageView::from_session(s, startup_error));

    if let Some(report) = report {
        match state.pages.render_report(&report) {
            Ok(html) => page.report_html = Some(html),
            Err(e) => {
                let notices = state.sessions.with_session(&id, |s| {
                    s.discard_record(&e);
                    s.drain_notices()
                });
                page.report_failed(notices);
            }
        }
    }

    let html = state.pages.render_page(&page)?;
    Ok(with_session_cookie(&id, Html(html)))
}

/// Accept a PDF upload and extract its text.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, WebError> {
    let id = session_id(&headers);

    let mut file: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| WebError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("document.pdf").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| WebError::BadRequest(e.to_string()))?;
        file = Some((name, bytes.to_vec()));
    }

    let Some((name, bytes)) = file else {
        state.sessions.with_session(&id, |s| {
            s.notify(NoticeLevel::Warning, "Choose a PDF file to upload.")
        });
        return Ok(back_home(&id));
    };

    info!("Upload '{}' ({} bytes)", name, bytes.len());
    let extraction = match PdfSource::from_upload(name.clone(), bytes) {
        Ok(source) => extract::extract_lenient(state.extractor.clone(), source.bytes, None).await,
        Err(e) => TextExtraction {
            warning: Some(e.to_string()),
            ..Default::default()
        },
    };
    debug!("Extracted {} chars from '{}'", extraction.text.len(), name);

    state
        .sessions
        .with_session(&id, |s| s.load_document(name, extraction));
    Ok(back_home(&id))
}

/// Run the analysis on the session's text.
pub async fn analyze(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<Response, WebError> {
    let id = session_id(&headers);

    let backend = match &state.backend {
        Ok(backend) => Arc::clone(backend),
        Err(message) => {
            let message = message.clone();
            state
                .sessions
                .with_session(&id, |s| s.notify(NoticeLevel::Error, message));
            return Ok(back_home(&id));
        }
    };

    let Some(text) = state.sessions.with_session(&id, |s| s.begin_analysis()) else {
        return Ok(back_home(&id));
    };

    let result = analysis::analyze_with_backend(backend.as_ref(), &text, &state.config).await;
    state
        .sessions
        .with_session(&id, |s| s.finish_analysis(result));
    Ok(back_home(&id))
}

#[derive(Debug, Deserialize)]
pub struct ClassificationForm {
    pub classification: String,
}

/// Change the thematic classification shown on the report.
pub async fn set_classification(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<ClassificationForm>,
) -> Result<Response, WebError> {
    let id = session_id(&headers);
    let parsed = form.classification.parse::<Classification>();
    state.sessions.with_session(&id, |s| match parsed {
        Ok(c) => s.classification = c,
        Err(e) => s.notify(NoticeLevel::Warning, e.to_string()),
    });
    Ok(back_home(&id))
}

/// "Save as PDF": arm print mode for the next render.
pub async fn print(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<Response, WebError> {
    let id = session_id(&headers);
    state.sessions.with_session(&id, |s| s.request_print());
    Ok(back_home(&id))
}

/// The session's current record as JSON.
pub async fn report_json(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AnalysisRecord>, WebError> {
    let id = session_id(&headers);
    state
        .sessions
        .with_session(&id, |s| s.record.clone())
        .map(Json)
        .ok_or(WebError::NoReport)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_reads_cookie() {
        let id = Uuid::new_v4().to_string();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {SESSION_COOKIE}={id}")).unwrap(),
        );
        assert_eq!(session_id(&headers), id);
    }

    #[test]
    fn invalid_cookie_gets_fresh_id() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("detectabias_session=not-a-uuid"),
        );
        let id = session_id(&headers);
        assert_ne!(id, "not-a-uuid");
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn cookie_is_set_on_responses() {
        let response = back_home("abc");
        let cookie = response.headers().get(header::SET_COOKIE).unwrap();
        assert!(cookie.to_str().unwrap().starts_with("detectabias_session=abc;"));
    }
}
