//! Router-level tests for the web UI.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`; the
//! model and pdfium are replaced by scripted fakes, so these tests need no
//! network and no native library.

#![cfg(feature = "web")]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use detectabias::config::ServerConfig;
use detectabias::pipeline::extract::ExtractedText;
use detectabias::session::SessionStore;
use detectabias::web::render::PageRenderer;
use detectabias::web::{self, AppState};
use detectabias::{AnalysisConfig, Completion, CompletionBackend, DetectaError, TextExtractor};
use http_body_util::BodyExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

const CLEAN_RESPONSE: &str = r#"{
  "bias_percentage": 40,
  "summary": "Moderate bias in the description of the parties.",
  "findings": [
    {
      "type": "gender, moral",
      "excerpt": "the hysterical mother",
      "explanation": "Gendered stereotype about emotional state.",
      "suggested_rewrite": "the mother"
    }
  ],
  "rewritten_document": "The court heard the mother."
}"#;

const BOUNDARY: &str = "detectabias-test-boundary";

// ── Fakes ────────────────────────────────────────────────────────────────────

struct Scripted {
    response: String,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(response: &str) -> Arc<Self> {
        Arc::new(Self {
            response: response.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionBackend for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _prompt: &str) -> Result<Completion, DetectaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Completion {
            text: self.response.clone(),
            input_tokens: 100,
            output_tokens: 50,
        })
    }
}

struct FixedText {
    text: String,
    calls: AtomicUsize,
}

impl FixedText {
    fn new(text: &str) -> Arc<Self> {
        Arc::new(Self {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
        })
    }
}

impl TextExtractor for FixedText {
    fn extract(&self, _pdf: &[u8]) -> Result<ExtractedText, DetectaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ExtractedText {
            text: self.text.clone(),
            page_count: 1,
        })
    }
}

// ── Harness ──────────────────────────────────────────────────────────────────

struct Harness {
    app: Router,
    cookie: String,
}

impl Harness {
    fn with_backend(backend: Result<Arc<dyn CompletionBackend>, String>, extractor: Arc<dyn TextExtractor>) -> Self {
        let state = AppState {
            config: AnalysisConfig::default(),
            backend,
            extractor,
            sessions: SessionStore::default(),
            pages: PageRenderer::new().unwrap(),
        };
        let app = web::router(Arc::new(state), &ServerConfig::default());
        Self {
            app,
            cookie: format!("detectabias_session={}", "6f1c1d2e-8a4b-4c3d-9e5f-0a1b2c3d4e5f"),
        }
    }

    fn new(backend: Arc<Scripted>, extractor: Arc<FixedText>) -> Self {
        Self::with_backend(Ok(backend as Arc<dyn CompletionBackend>), extractor)
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    async fn get(&self, uri: &str) -> (StatusCode, String) {
        let request = Request::get(uri)
            .header(header::COOKIE, &self.cookie)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    async fn post(&self, uri: &str) -> StatusCode {
        let request = Request::post(uri)
            .header(header::COOKIE, &self.cookie)
            .body(Body::empty())
            .unwrap();
        self.send(request).await.0
    }

    async fn post_form(&self, uri: &str, form: &str) -> StatusCode {
        let request = Request::post(uri)
            .header(header::COOKIE, &self.cookie)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        self.send(request).await.0
    }

    async fn upload(&self, file_name: &str, bytes: &[u8]) -> StatusCode {
        let mut body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/pdf\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::post("/upload")
            .header(header::COOKIE, &self.cookie)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await.0
    }
}

const FAKE_PDF: &[u8] = b"%PDF-1.7\n% fake body, the extractor is scripted\n";

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_check() {
    let h = Harness::new(Scripted::new(CLEAN_RESPONSE), FixedText::new("text"));
    let (status, body) = h.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn first_visit_sets_cookie_and_asks_for_upload() {
    let h = Harness::new(Scripted::new(CLEAN_RESPONSE), FixedText::new("text"));
    let response = h
        .app
        .clone()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("detectabias_session="));
    assert!(cookie.contains("HttpOnly"));

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&body).contains("Upload a PDF file to start the analysis."));
}

#[tokio::test]
async fn upload_then_analyze_renders_report() {
    let backend = Scripted::new(CLEAN_RESPONSE);
    let h = Harness::new(backend.clone(), FixedText::new("The hysterical mother shouted."));

    assert_eq!(h.upload("decision.pdf", FAKE_PDF).await, StatusCode::SEE_OTHER);
    let (_, page) = h.get("/").await;
    assert!(page.contains("Text extracted successfully!"));
    assert!(page.contains("Analyze with AI"));
    assert!(page.contains("decision.pdf"));

    assert_eq!(h.post("/analyze").await, StatusCode::SEE_OTHER);
    assert_eq!(backend.calls(), 1);

    let (_, page) = h.get("/").await;
    assert!(page.contains("40%"));
    assert!(page.contains("the hysterical mother"));
    assert!(page.contains("Gender, moral"));
    assert!(page.contains("Bias Type Distribution"));
    assert!(page.contains("Save Analysis as PDF"));

    let (status, json) = h.get("/report.json").await;
    assert_eq!(status, StatusCode::OK);
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["bias_percentage"], 40);
    assert_eq!(value["findings"][0]["type"], "gender, moral");
}

#[tokio::test]
async fn print_mode_lasts_one_render() {
    let h = Harness::new(Scripted::new(CLEAN_RESPONSE), FixedText::new("Some decision text."));
    h.upload("decision.pdf", FAKE_PDF).await;
    h.post("/analyze").await;

    assert_eq!(h.post("/print").await, StatusCode::SEE_OTHER);
    let (_, first) = h.get("/").await;
    assert!(first.contains("@media print"));
    assert!(first.contains("window.print"));

    let (_, second) = h.get("/").await;
    assert!(!second.contains("window.print"));
    assert!(second.contains("40%"));
}

#[tokio::test]
async fn print_without_report_does_nothing() {
    let h = Harness::new(Scripted::new(CLEAN_RESPONSE), FixedText::new("Some decision text."));
    h.post("/print").await;
    let (_, page) = h.get("/").await;
    assert!(!page.contains("window.print"));
}

#[tokio::test]
async fn empty_extraction_never_calls_model() {
    let backend = Scripted::new(CLEAN_RESPONSE);
    let h = Harness::new(backend.clone(), FixedText::new("   \n  "));

    h.upload("scanned.pdf", FAKE_PDF).await;
    let (_, page) = h.get("/").await;
    assert!(page.contains("The text extracted from the PDF is empty."));
    assert!(!page.contains("Analyze with AI"));

    h.post("/analyze").await;
    assert_eq!(backend.calls(), 0);
    let (status, _) = h.get("/report.json").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_pdf_upload_is_rejected_before_extraction() {
    let extractor = FixedText::new("never read");
    let h = Harness::new(Scripted::new(CLEAN_RESPONSE), extractor.clone());

    h.upload("notes.txt", b"just some text").await;
    let (_, page) = h.get("/").await;
    assert!(page.contains("is not a valid PDF"));
    assert!(!page.contains("Analyze with AI"));
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_credential_shows_banner_and_disables_analysis() {
    let message = "Error: GEMINI_API_KEY was not found.".to_string();
    let h = Harness::with_backend(Err(message), FixedText::new("Some decision text."));

    let (_, page) = h.get("/").await;
    assert!(page.contains("GEMINI_API_KEY was not found."));

    h.upload("decision.pdf", FAKE_PDF).await;
    let (_, page) = h.get("/").await;
    assert!(page.contains("GEMINI_API_KEY was not found."));
    assert!(page.contains(" disabled>Analyze with AI"));

    assert_eq!(h.post("/analyze").await, StatusCode::SEE_OTHER);
    let (status, _) = h.get("/report.json").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn prose_wrapped_response_is_recovered_with_warning() {
    let wrapped = format!("Here is the analysis you asked for:\n```json\n{CLEAN_RESPONSE}\n```\nHope it helps.");
    let h = Harness::new(Scripted::new(&wrapped), FixedText::new("Some decision text."));
    h.upload("decision.pdf", FAKE_PDF).await;
    h.post("/analyze").await;

    let (_, page) = h.get("/").await;
    assert!(page.contains("was not clean JSON"));
    assert!(page.contains("40%"));
}

#[tokio::test]
async fn unrecoverable_response_shows_raw_text() {
    let h = Harness::new(
        Scripted::new("I cannot analyse this document."),
        FixedText::new("Some decision text."),
    );
    h.upload("decision.pdf", FAKE_PDF).await;
    h.post("/analyze").await;

    let (_, page) = h.get("/").await;
    assert!(page.contains("Raw model response"));
    assert!(page.contains("I cannot analyse this document."));
    assert!(!page.contains("Save Analysis as PDF"));
}

#[tokio::test]
async fn new_upload_clears_previous_report() {
    let h = Harness::new(Scripted::new(CLEAN_RESPONSE), FixedText::new("Some decision text."));
    h.upload("first.pdf", FAKE_PDF).await;
    h.post("/analyze").await;
    h.upload("second.pdf", FAKE_PDF).await;

    let (_, page) = h.get("/").await;
    assert!(page.contains("second.pdf"));
    assert!(!page.contains("40%"));
}

#[tokio::test]
async fn classification_is_shown_on_report() {
    let h = Harness::new(Scripted::new(CLEAN_RESPONSE), FixedText::new("Some decision text."));
    h.upload("decision.pdf", FAKE_PDF).await;
    h.post("/analyze").await;

    assert_eq!(
        h.post_form("/classification", "classification=criminal_law").await,
        StatusCode::SEE_OTHER
    );
    let (_, page) = h.get("/").await;
    assert!(page.contains("Thematic Classification: <strong>Criminal Law</strong>"));
}

#[tokio::test]
async fn sessions_are_isolated_by_cookie() {
    let h = Harness::new(Scripted::new(CLEAN_RESPONSE), FixedText::new("Some decision text."));
    h.upload("decision.pdf", FAKE_PDF).await;
    h.post("/analyze").await;

    let other = Harness {
        app: h.app.clone(),
        cookie: "detectabias_session=0b6a2f39-1d7e-4a55-8c90-3e2f1a4b5c6d".to_string(),
    };
    let (status, _) = other.get("/report.json").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = h.get("/report.json").await;
    assert_eq!(status, StatusCode::OK);
}
