//! Pipeline stages for bias analysis.
//!
//! Each submodule implements exactly one step.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ llm ──▶ parse
//! (bytes)   (pdfium)    (one call) (JSON recovery)
//! ```
//!
//! 1. [`input`]: accept an upload, or read a path / download a URL; the
//!    `%PDF` magic is checked before anything else touches the bytes
//! 2. [`extract`]: concatenate the text layer of every page; pdfium is not
//!    async-safe so this runs in `spawn_blocking`
//! 3. [`llm`]: the only stage with network I/O; no retry
//! 4. [`parse`]: turn the raw answer into an [`crate::record::AnalysisRecord`]
//!    or an explicit unrecoverable outcome

pub mod extract;
pub mod input;
pub mod llm;
pub mod parse;
