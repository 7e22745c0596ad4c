//! Error types for the edgequake-pdftext library.
//!
//! Every stage of the pipeline returns [`PdfTextError`]. The variants are
//! descriptive (they carry the URL, status or parser detail needed to act on
//! them) while [`ErrorKind`] collapses them into the six classes callers
//! branch on:
//!
//! | Kind | Raised by | HTTP |
//! |------|-----------|------|
//! | `ValidationError` | request checks, URL parsing | 400 |
//! | `TransportError` | fetcher (DNS, connect, timeout, body read) | 500 |
//! | `HTTPError` | fetcher (non-2xx download) | 500 |
//! | `ParseError` | block extractor (not a PDF, corrupt, password) | 400 |
//! | `ConfigError` | config builder, chunker | 500 |
//! | `InternalError` | pdfium binding or download, panicked tasks | 500 |
//!
//! The first error raised wins; nothing is retried inside the pipeline.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// All errors returned by the edgequake-pdftext library.
#[derive(Debug, Error)]
pub enum PdfTextError {
    // ── Request errors ────────────────────────────────────────────────────
    /// The request carried no URL, or only whitespace.
    #[error("No PDF URL was provided")]
    MissingUrl,

    /// The URL could not be parsed as an absolute URL.
    #[error("Invalid URL '{input}': {reason}")]
    InvalidUrl { input: String, reason: String },

    // ── Download errors ───────────────────────────────────────────────────
    /// DNS, connection or body-read failure while downloading.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// The remote server answered with a non-success status.
    #[error("Download of '{url}' failed with HTTP {status}")]
    HttpStatus {
        url: String,
        status: u16,
        body_excerpt: String,
    },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The bytes do not carry a PDF signature.
    #[error("Downloaded content is not a PDF (first bytes: {magic:?})")]
    NotAPdf { magic: Vec<u8> },

    /// The parser rejected the document.
    #[error("PDF could not be parsed: {detail}")]
    CorruptPdf { detail: String },

    /// The PDF is encrypted and no password was configured.
    #[error("PDF is encrypted and requires a password")]
    PasswordRequired,

    /// A password was configured but the PDF rejected it.
    #[error("Wrong password for encrypted PDF")]
    WrongPassword,

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder or chunker validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not load the pdfium shared library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    /// The pdfium library could not be downloaded into the local cache.
    #[error("Failed to provision pdfium library: {0}")]
    PdfiumProvisionFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse failure class of a [`PdfTextError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    #[serde(rename = "ValidationError")]
    Validation,
    #[serde(rename = "TransportError")]
    Transport,
    #[serde(rename = "HTTPError")]
    Http,
    #[serde(rename = "ParseError")]
    Parse,
    #[serde(rename = "ConfigError")]
    Config,
    #[serde(rename = "InternalError")]
    Internal,
}

impl ErrorKind {
    /// Stable name used in logs and diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Transport => "TransportError",
            ErrorKind::Http => "HTTPError",
            ErrorKind::Parse => "ParseError",
            ErrorKind::Config => "ConfigError",
            ErrorKind::Internal => "InternalError",
        }
    }

    /// Whether the caller can fix the failure by changing the request
    /// (as opposed to a fault on our side or the remote host's).
    pub fn is_client_error(self) -> bool {
        matches!(self, ErrorKind::Validation | ErrorKind::Parse)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PdfTextError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PdfTextError::MissingUrl | PdfTextError::InvalidUrl { .. } => ErrorKind::Validation,
            PdfTextError::DownloadFailed { .. } | PdfTextError::DownloadTimeout { .. } => {
                ErrorKind::Transport
            }
            PdfTextError::HttpStatus { .. } => ErrorKind::Http,
            PdfTextError::NotAPdf { .. }
            | PdfTextError::CorruptPdf { .. }
            | PdfTextError::PasswordRequired
            | PdfTextError::WrongPassword => ErrorKind::Parse,
            PdfTextError::InvalidConfig(_) => ErrorKind::Config,
            PdfTextError::PdfiumBindingFailed(_)
            | PdfTextError::PdfiumProvisionFailed(_)
            | PdfTextError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Remote status code for [`ErrorKind::Http`] failures.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            PdfTextError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Bounded excerpt of the remote response body for [`ErrorKind::Http`] failures.
    pub fn body_excerpt(&self) -> Option<&str> {
        match self {
            PdfTextError::HttpStatus { body_excerpt, .. } => Some(body_excerpt),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_display_and_accessors() {
        let e = PdfTextError::HttpStatus {
            url: "https://example.com/a.pdf".into(),
            status: 404,
            body_excerpt: "not here".into(),
        };
        assert!(e.to_string().contains("404"), "got: {e}");
        assert_eq!(e.kind(), ErrorKind::Http);
        assert_eq!(e.status_code(), Some(404));
        assert_eq!(e.body_excerpt(), Some("not here"));
    }

    #[test]
    fn timeout_is_transport() {
        let e = PdfTextError::DownloadTimeout {
            url: "https://example.com".into(),
            secs: 30,
        };
        assert_eq!(e.kind(), ErrorKind::Transport);
        assert!(e.to_string().contains("30s"));
        assert_eq!(e.status_code(), None);
    }

    #[test]
    fn pdf_failures_are_client_errors() {
        for e in [
            PdfTextError::NotAPdf { magic: b"hell".to_vec() },
            PdfTextError::CorruptPdf { detail: "xref".into() },
            PdfTextError::PasswordRequired,
            PdfTextError::WrongPassword,
        ] {
            assert_eq!(e.kind(), ErrorKind::Parse, "{e}");
            assert!(e.kind().is_client_error());
        }
    }

    #[test]
    fn server_side_kinds_are_not_client_errors() {
        assert!(!PdfTextError::InvalidConfig("x".into()).kind().is_client_error());
        assert!(!PdfTextError::PdfiumBindingFailed("x".into()).kind().is_client_error());
        assert!(!PdfTextError::PdfiumProvisionFailed("x".into()).kind().is_client_error());
        assert!(!PdfTextError::Internal("x".into()).kind().is_client_error());
        assert!(PdfTextError::MissingUrl.kind().is_client_error());
    }

    #[test]
    fn kind_names_match_serde_names() {
        let json = serde_json::to_string(&ErrorKind::Http).unwrap();
        assert_eq!(json, "\"HTTPError\"");
        assert_eq!(ErrorKind::Http.to_string(), "HTTPError");
        assert_eq!(ErrorKind::Validation.as_str(), "ValidationError");
    }
}
