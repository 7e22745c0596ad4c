//! Block extraction: PDF bytes → per-page positioned text blocks.
//!
//! The parser is a capability behind [`BlockSource`]. The production source,
//! [`PdfiumBlockSource`], reads the text segments pdfium exposes for each
//! page together with their bounding boxes.
//!
//! pdfium starts a new segment whenever the font changes, so a bold word or
//! a superscript mid-sentence arrives as its own segment. [`coalesce_lines`]
//! merges segments whose vertical extents overlap into one block per line
//! before anything downstream sorts them.
//!
//! ## Threading
//!
//! pdfium keeps process-global state and its bindings are not `Send`, so a
//! bound `Pdfium` cannot be shared between Tokio's blocking threads. The
//! source owns one worker thread that binds the library on first use and
//! serves extraction jobs one at a time over a channel. Callers still run
//! [`extract_blocks`] inside `spawn_blocking`, because waiting for the
//! worker is blocking.

use crate::error::PdfTextError;
use crate::model::{PageBlockSet, RawDocument, TextBlock};
use pdfium_render::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use tracing::{debug, info, warn};

/// The PDF header may be preceded by junk; readers scan this far for it.
const SIGNATURE_WINDOW: usize = 1024;
const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Parser capability: PDF bytes in, one [`PageBlockSet`] per page out.
///
/// The bytes are handed over by value; a source that moves work to another
/// thread can take them without copying.
pub trait BlockSource: Send + Sync {
    fn extract(
        &self,
        bytes: Vec<u8>,
        password: Option<&str>,
    ) -> Result<Vec<PageBlockSet>, PdfTextError>;
}

/// Validate the signature, then delegate to `source`.
///
/// Returned sets are in ascending page order whatever order the source
/// produced them in.
pub fn extract_blocks(
    source: &dyn BlockSource,
    document: RawDocument,
    password: Option<&str>,
) -> Result<Vec<PageBlockSet>, PdfTextError> {
    check_signature(&document.bytes)?;

    let mut pages = source.extract(document.bytes, password)?;
    pages.sort_by_key(|p| p.page);

    info!(
        "Extracted {} pages, {} blocks",
        pages.len(),
        pages.iter().map(|p| p.blocks.len()).sum::<usize>()
    );
    Ok(pages)
}

/// Reject bytes that carry no `%PDF-` header.
pub fn check_signature(bytes: &[u8]) -> Result<(), PdfTextError> {
    let window = &bytes[..bytes.len().min(SIGNATURE_WINDOW)];
    if window
        .windows(PDF_SIGNATURE.len())
        .any(|w| w == PDF_SIGNATURE)
    {
        return Ok(());
    }
    Err(PdfTextError::NotAPdf {
        magic: bytes.iter().take(4).copied().collect(),
    })
}

// ── Line grouping ────────────────────────────────────────────────────────

/// One run of same-style text in top-left page coordinates (y grows
/// downward), so `top <= bottom`.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub left: f32,
    pub top: f32,
    pub bottom: f32,
    pub text: String,
}

impl Segment {
    /// Convert from PDF user space, where the origin is the bottom-left
    /// corner and y grows upward.
    pub fn from_pdf_bounds(
        page_height: f32,
        left: f32,
        top: f32,
        bottom: f32,
        text: impl Into<String>,
    ) -> Self {
        let (a, b) = (page_height - top, page_height - bottom);
        Self {
            left,
            top: a.min(b),
            bottom: a.max(b),
            text: text.into(),
        }
    }
}

/// Merge segments that share a line into one [`TextBlock`] per line.
///
/// Segments are taken top-down; a segment joins the current line when its
/// top lies above the line's lowest bottom seen so far. Within a line the
/// pieces are ordered left to right, trimmed, and joined with one space.
/// The block sits at the line's leftmost `left` and topmost `top`, so a
/// raised superscript does not push the line below its neighbours.
pub fn coalesce_lines(page: usize, mut segments: Vec<Segment>) -> Vec<TextBlock> {
    segments.retain(|s| !s.text.trim().is_empty());
    segments.sort_by(|a, b| a.top.total_cmp(&b.top));

    let mut lines: Vec<(f32, Vec<Segment>)> = Vec::new();
    for segment in segments {
        match lines.last_mut() {
            Some((bottom, members))
                if segment.top < *bottom || members.iter().any(|m| m.top == segment.top) =>
            {
                *bottom = bottom.max(segment.bottom);
                members.push(segment);
            }
            _ => lines.push((segment.bottom, vec![segment])),
        }
    }

    lines
        .into_iter()
        .map(|(_, mut members)| {
            members.sort_by(|a, b| a.left.total_cmp(&b.left));
            let x = members.iter().map(|m| m.left).fold(f32::INFINITY, f32::min);
            let y = members.iter().map(|m| m.top).fold(f32::INFINITY, f32::min);
            let text = members
                .iter()
                .map(|m| m.text.trim())
                .collect::<Vec<_>>()
                .join(" ");
            TextBlock::new(page, x, y, text)
        })
        .collect()
}

// ── pdfium ───────────────────────────────────────────────────────────────


struct Job {
    bytes: Vec<u8>,
    password: Option<String>,
    reply: mpsc::Sender<Result<Vec<PageBlockSet>, PdfTextError>>,
}

/// [`BlockSource`] backed by the pdfium library.
pub struct PdfiumBlockSource {
    jobs: mpsc::Sender<Job>,
}

impl PdfiumBlockSource {
    /// Start the worker thread. The library itself is bound lazily, so a
    /// missing pdfium only fails the requests that need it.
    ///
    /// `library_path` points at the shared library file; if None, the
    /// working directory and then the system library path are searched.
    pub fn new(library_path: Option<PathBuf>) -> Result<Self, PdfTextError> {
        let (jobs, queue) = mpsc::channel::<Job>();
        thread::Builder::new()
            .name("pdfium".into())
            .spawn(move || run_worker(library_path, queue))
            .map_err(|e| PdfTextError::Internal(format!("Failed to start pdfium worker: {e}")))?;
        Ok(Self { jobs })
    }

    /// Bind pdfium once to report configuration problems early.
    pub fn check_binding(library_path: Option<&Path>) -> Result<(), PdfTextError> {
        bind_pdfium(library_path).map(drop)
    }
}

impl BlockSource for PdfiumBlockSource {
    fn extract(
        &self,
        bytes: Vec<u8>,
        password: Option<&str>,
    ) -> Result<Vec<PageBlockSet>, PdfTextError> {
        let (reply, response) = mpsc::channel();
        let job = Job {
            bytes,
            password: password.map(str::to_string),
            reply,
        };
        self.jobs
            .send(job)
            .map_err(|_| PdfTextError::Internal("pdfium worker has stopped".into()))?;
        response
            .recv()
            .map_err(|_| PdfTextError::Internal("pdfium worker dropped the job".into()))?
    }
}

fn run_worker(library_path: Option<PathBuf>, queue: mpsc::Receiver<Job>) {
    let mut pdfium: Option<Pdfium> = None;

    for job in queue {
        if pdfium.is_none() {
            match bind_pdfium(library_path.as_deref()) {
                Ok(bound) => pdfium = Some(bound),
                Err(e) => {
                    warn!("{}", e);
                    let _ = job.reply.send(Err(e));
                    continue;
                }
            }
        }
        let Some(bound) = pdfium.as_ref() else {
            continue;
        };

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            read_document(bound, &job.bytes, job.password.as_deref())
        }))
        .unwrap_or_else(|_| Err(PdfTextError::Internal("pdfium panicked while parsing".into())));

        // The requester may have gone away; nothing to do then.
        let _ = job.reply.send(result);
    }
    debug!("pdfium worker exiting");
}

fn bind_pdfium(library_path: Option<&Path>) -> Result<Pdfium, PdfTextError> {
    let bindings = match library_path {
        Some(path) => Pdfium::bind_to_library(path),
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| PdfTextError::PdfiumBindingFailed(format!("{e:?}")))?;

    Ok(Pdfium::new(bindings))
}

/// Read every page's text segments and group them into lines.
fn read_document(
    pdfium: &Pdfium,
    bytes: &[u8],
    password: Option<&str>,
) -> Result<Vec<PageBlockSet>, PdfTextError> {
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| classify_load_error(&format!("{e:?}"), password.is_some()))?;

    let pages = document.pages();
    debug!("PDF loaded: {} pages", pages.len());

    let mut sets = Vec::with_capacity(pages.len() as usize);
    for (idx, page) in pages.iter().enumerate() {
        let page_height = page.height().value;
        let text = page.text().map_err(|e| PdfTextError::CorruptPdf {
            detail: format!("page {}: {:?}", idx + 1, e),
        })?;

        let segments: Vec<Segment> = text
            .segments()
            .iter()
            .map(|segment| {
                let bounds = segment.bounds();
                Segment::from_pdf_bounds(
                    page_height,
                    bounds.left().value,
                    bounds.top().value,
                    bounds.bottom().value,
                    segment.text(),
                )
            })
            .collect();
        let segment_count = segments.len();
        let blocks = coalesce_lines(idx, segments);

        debug!(
            "Page {} → {} segments, {} lines",
            idx + 1,
            segment_count,
            blocks.len()
        );
        sets.push(PageBlockSet::new(idx, blocks));
    }

    Ok(sets)
}

fn classify_load_error(detail: &str, password_given: bool) -> PdfTextError {
    if detail.contains("Password") || detail.contains("password") {
        if password_given {
            PdfTextError::WrongPassword
        } else {
            PdfTextError::PasswordRequired
        }
    } else {
        PdfTextError::CorruptPdf {
            detail: detail.to_string(),
        }
    }
}
