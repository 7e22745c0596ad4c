//! Fetcher: download the PDF bytes over HTTP.
//!
//! ## Failure classes
//!
//! The fetcher is the only stage that touches the network, so it is also the
//! only stage that has to tell "we could not reach the host" apart from "the
//! host answered, but not with a document":
//!
//! - unparsable URL or non-HTTP scheme → [`PdfTextError::InvalidUrl`]
//!   (nothing is sent)
//! - DNS, connect, TLS, body read → [`PdfTextError::DownloadFailed`]
//! - timeout → [`PdfTextError::DownloadTimeout`]
//! - non-2xx → [`PdfTextError::HttpStatus`] with a body excerpt
//!
//! The body is kept in memory; nothing is written to disk.

use crate::config::PipelineConfig;
use crate::error::PdfTextError;
use crate::model::RawDocument;
use futures::future::BoxFuture;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Source of document bytes.
///
/// [`HttpFetcher`] is the production implementation; tests and embedders
/// can supply their own.
pub trait DocumentFetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<RawDocument, PdfTextError>>;
}

/// Downloads documents with a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout_secs: u64,
    excerpt_chars: usize,
}

impl HttpFetcher {
    /// Build a fetcher whose client enforces the configured timeout.
    pub fn new(config: &PipelineConfig) -> Result<Self, PdfTextError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.download_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| PdfTextError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            timeout_secs: config.download_timeout_secs,
            excerpt_chars: config.error_excerpt_chars,
        })
    }

    /// GET `url` and return its body.
    pub async fn download(&self, url: &str) -> Result<RawDocument, PdfTextError> {
        let parsed = parse_url(url)?;
        info!("Downloading PDF from: {}", parsed);

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| self.classify(url, e))?;

        let status = response.status();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !status.is_success() {
            // The body is diagnostic only; a failed read leaves the excerpt empty.
            let body = response.text().await.unwrap_or_default();
            let body_excerpt = excerpt(&body, self.excerpt_chars);
            warn!(url = %url, status = status.as_u16(), "Download returned non-success status");
            return Err(PdfTextError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
                body_excerpt,
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.classify(url, e))?;
        debug!(
            "Downloaded {} bytes (content-type: {})",
            bytes.len(),
            content_type.as_deref().unwrap_or("unknown")
        );

        Ok(RawDocument {
            bytes: bytes.to_vec(),
            content_type,
            source_url: Some(final_url),
        })
    }

    fn classify(&self, url: &str, e: reqwest::Error) -> PdfTextError {
        if e.is_timeout() {
            PdfTextError::DownloadTimeout {
                url: url.to_string(),
                secs: self.timeout_secs,
            }
        } else {
            PdfTextError::DownloadFailed {
                url: url.to_string(),
                reason: error_chain(&e),
            }
        }
    }
}

impl DocumentFetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<RawDocument, PdfTextError>> {
        Box::pin(self.download(url))
    }
}

/// Parse the user-supplied URL; surrounding whitespace is ignored.
/// Only `http` and `https` are accepted.
pub fn parse_url(input: &str) -> Result<Url, PdfTextError> {
    let url = Url::parse(input.trim()).map_err(|e| PdfTextError::InvalidUrl {
        input: input.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(PdfTextError::InvalidUrl {
            input: input.to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

/// The first `max_chars` characters of `text`.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}

/// `reqwest` buries the root cause (refused, DNS) in the source chain.
fn error_chain(e: &dyn std::error::Error) -> String {
    let mut msg = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}
