//! Data types flowing through the pipeline.
//!
//! Everything here is scoped to a single request: created by one stage,
//! consumed by the next, dropped when the request completes.

use serde::{Deserialize, Serialize};

/// A request to process one remote PDF.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRequest {
    /// URL of the PDF. Must be present and non-blank.
    pub source_url: Option<String>,
}

impl DocumentRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            source_url: Some(url.into()),
        }
    }
}

/// Downloaded bytes, held in memory for the duration of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub bytes: Vec<u8>,
    /// `Content-Type` as declared by the remote server. Informational only.
    pub content_type: Option<String>,
    /// URL the bytes were finally served from (after redirects).
    pub source_url: Option<String>,
}

impl RawDocument {
    /// Wrap in-memory bytes that did not come from a download.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: None,
            source_url: None,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// One contiguous run of text on a page.
///
/// Coordinates are in document space with the origin at the top-left
/// corner of the page and `y` growing downward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// 0-indexed page number.
    pub page: usize,
    pub x: f32,
    pub y: f32,
    pub text: String,
}

impl TextBlock {
    pub fn new(page: usize, x: f32, y: f32, text: impl Into<String>) -> Self {
        Self {
            page,
            x,
            y,
            text: text.into(),
        }
    }
}

/// The blocks of one page, in whatever order the parser emitted them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageBlockSet {
    /// 0-indexed page number.
    pub page: usize,
    pub blocks: Vec<TextBlock>,
}

impl PageBlockSet {
    pub fn new(page: usize, blocks: Vec<TextBlock>) -> Self {
        Self { page, blocks }
    }
}

/// Text after ordering and encoding normalisation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedText {
    pub text: String,
    /// Characters dropped because the target encoding cannot represent them.
    pub dropped_chars: usize,
}

/// Counters and timings for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub bytes_downloaded: usize,
    pub page_count: usize,
    /// Blocks emitted by the parser, before filtering.
    pub blocks_seen: usize,
    /// Blocks that contributed text.
    pub blocks_kept: usize,
    pub dropped_chars: usize,
    /// Length of the normalised text, in characters.
    pub text_chars: usize,
    pub chunk_count: usize,
    pub fetch_duration_ms: u64,
    pub extract_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Successful result of a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOutput {
    /// Ordered chunks; concatenated they reproduce the normalised text.
    pub chunks: Vec<String>,
    pub stats: PipelineStats,
}

impl PipelineOutput {
    /// Reassemble the full normalised text.
    pub fn text(&self) -> String {
        self.chunks.concat()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_deserialises_without_url() {
        let req: DocumentRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.source_url, None);
    }

    #[test]
    fn output_text_concatenates_chunks() {
        let out = PipelineOutput {
            chunks: vec!["ab".into(), "c".into()],
            stats: PipelineStats::default(),
        };
        assert_eq!(out.text(), "abc");
    }

    #[test]
    fn stats_serialise_to_json() {
        let stats = PipelineStats {
            page_count: 2,
            chunk_count: 1,
            ..Default::default()
        };
        let v = serde_json::to_value(&stats).unwrap();
        assert_eq!(v["page_count"], 2);
        assert_eq!(v["chunk_count"], 1);
    }
}
