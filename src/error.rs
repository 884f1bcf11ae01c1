//! Error types for the html2pdf library.
//!
//! A conversion either produces exactly one PDF or fails with exactly one
//! [`Html2PdfError`]. There is no partial success: the pipeline has a single
//! document flowing through it, so there is nothing to salvage once a stage
//! fails.
//!
//! Every variant maps onto a user-facing category through
//! [`Html2PdfError::category`], which is what front ends use to pick a
//! message style or an exit code.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the html2pdf library.
#[derive(Debug, Error)]
pub enum Html2PdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The upload or file was empty (or whitespace only).
    #[error("Input '{name}' is empty; nothing to convert")]
    EmptyInput { name: String },

    /// The input bytes are not valid UTF-8 text.
    #[error("Input '{name}' is not UTF-8 text (invalid byte at offset {offset})")]
    NotUtf8 { name: String, offset: usize },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': {reason}")]
    InvalidInput { input: String, reason: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Markup errors ─────────────────────────────────────────────────────
    /// The input cannot be treated as markup at all (binary data).
    #[error("Input '{name}' is not HTML markup: {detail}")]
    MalformedMarkup { name: String, detail: String },

    // ── Rendering errors ──────────────────────────────────────────────────
    /// The PDF engine rejected the document or produced no output.
    #[error("PDF rendering failed: {detail}")]
    RenderingFailed { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("HTML file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but reading it failed.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation or settings-file parsing failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// The failure classes a user can tell apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Missing, empty or undecodable input.
    InvalidInput,
    /// Input that cannot be parsed as markup.
    MalformedMarkup,
    /// The rendering engine failed.
    RenderingFailure,
    /// Reading the input or writing the output failed.
    FileIo,
    /// Configuration or internal errors; not caused by the document.
    Other,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCategory::InvalidInput => "invalid input",
            ErrorCategory::MalformedMarkup => "malformed markup",
            ErrorCategory::RenderingFailure => "rendering failure",
            ErrorCategory::FileIo => "file I/O error",
            ErrorCategory::Other => "error",
        };
        f.write_str(s)
    }
}

impl Html2PdfError {
    /// Classify this error for presentation.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Html2PdfError::EmptyInput { .. }
            | Html2PdfError::NotUtf8 { .. }
            | Html2PdfError::InvalidInput { .. }
            | Html2PdfError::DownloadFailed { .. }
            | Html2PdfError::DownloadTimeout { .. } => ErrorCategory::InvalidInput,
            Html2PdfError::MalformedMarkup { .. } => ErrorCategory::MalformedMarkup,
            Html2PdfError::RenderingFailed { .. } => ErrorCategory::RenderingFailure,
            Html2PdfError::FileNotFound { .. }
            | Html2PdfError::PermissionDenied { .. }
            | Html2PdfError::ReadFailed { .. }
            | Html2PdfError::OutputWriteFailed { .. } => ErrorCategory::FileIo,
            Html2PdfError::InvalidConfig(_) | Html2PdfError::Internal(_) => ErrorCategory::Other,
        }
    }
}
