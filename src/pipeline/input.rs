//! Input resolution: turn a path, URL or upload into validated PDF bytes.
//!
//! pdfium reads from a byte slice, so every source ends up in memory. The
//! `%PDF` magic bytes are checked before anything is handed to pdfium so
//! callers get a meaningful error instead of an opaque library failure.

use crate::error::DetectaError;
use std::path::PathBuf;
use tracing::{debug, info};

/// A PDF held in memory, tagged with where it came from.
#[derive(Debug, Clone)]
pub struct PdfSource {
    /// File name, path or URL, for messages only.
    pub name: String,
    pub bytes: Vec<u8>,
}

impl PdfSource {
    /// Wrap uploaded bytes after validating the PDF header.
    pub fn from_upload(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, DetectaError> {
        let name = name.into();
        check_pdf_magic(&name, &bytes)?;
        Ok(Self { name, bytes })
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Reject byte buffers that do not start with `%PDF`.
///
/// Buffers shorter than four bytes are rejected as well.
pub fn check_pdf_magic(name: &str, bytes: &[u8]) -> Result<(), DetectaError> {
    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        return Err(DetectaError::NotAPdf {
            source_name: name.to_string(),
            magic: bytes.iter().take(4).copied().collect(),
        });
    }
    Ok(())
}

/// Resolve the input string to PDF bytes.
///
/// If the input is a URL, download it. If the input is a local file, read it.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<PdfSource, DetectaError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(input).await
    }
}

async fn read_local(path_str: &str) -> Result<PdfSource, DetectaError> {
    let path = PathBuf::from(path_str);

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(DetectaError::PermissionDenied { path });
        }
        Err(_) => return Err(DetectaError::FileNotFound { path }),
    };

    check_pdf_magic(path_str, &bytes)?;
    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());

    Ok(PdfSource {
        name: path_str.to_string(),
        bytes,
    })
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<PdfSource, DetectaError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DetectaError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            DetectaError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            DetectaError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(DetectaError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| DetectaError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    check_pdf_magic(url, &bytes)?;
    info!("Downloaded {} bytes", bytes.len());

    Ok(PdfSource {
        name: url.to_string(),
        bytes: bytes.to_vec(),
    })
}
