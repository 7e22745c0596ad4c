//! # edgequake-pdftext
//!
//! Download a PDF by URL, extract its text in reading order, and split it into
//! fixed-length chunks ready for downstream consumers (search indexers,
//! embedding jobs, LLM prompts with a context budget).
//!
//! ## Pipeline Overview
//!
//! ```text
//! URL
//!  │
//!  ├─ 1. Fetch      HTTP GET with timeout (reqwest)
//!  ├─ 2. Extract    positioned text blocks per page (pdfium, spawn_blocking)
//!  ├─ 3. Order      sort each page by (y, x), drop blank blocks
//!  ├─ 4. Normalize  join blocks with '\n', drop chars the target encoding lacks
//!  └─ 5. Chunk      8000-character pieces
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdftext::{DocumentRequest, Pipeline, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = Pipeline::new(PipelineConfig::default())?;
//!     let output = pipeline
//!         .process(&DocumentRequest::new("https://example.com/paper.pdf"))
//!         .await?;
//!     for chunk in &output.chunks {
//!         println!("{chunk}");
//!     }
//!     eprintln!("{} pages, {} chunks", output.stats.page_count, output.stats.chunk_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Serving over HTTP
//!
//! [`server::build_router`] exposes the pipeline as `POST /procesar_pdf`
//! (`{"url": ...}` in, `{"partes": [...]}` out) plus a `GET /` liveness
//! check. The `pdftext serve` binary wraps it.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdftext` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdftext = { version = "0.1", default-features = false }
//! ```
//!
//! ## pdfium
//!
//! Extraction binds the pdfium shared library at runtime. It is looked up in
//! [`PipelineConfig::pdfium_library_path`] if set, then the working
//! directory, then the system library path. A missing library fails requests
//! with `InternalError`; it does not prevent the pipeline from being built.
//!
//! [`pdfium_cache::ensure_pdfium_library`] downloads a prebuilt library for
//! the running platform into a per-user cache; the `pdftext` binary calls it
//! at startup when no library can be bound.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod model;
pub mod observer;
pub mod pdfium_cache;
pub mod pipeline;
pub mod process;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PipelineConfig, PipelineConfigBuilder, DEFAULT_CHUNK_SIZE};
pub use error::{ErrorKind, PdfTextError};
pub use model::{
    DocumentRequest, NormalizedText, PageBlockSet, PipelineOutput, PipelineStats, RawDocument,
    TextBlock,
};
pub use observer::{NoopObserver, PipelineObserver, SharedObserver, Stage};
pub use pdfium_cache::{cached_pdfium_library, ensure_pdfium_library};
pub use pipeline::chunk::chunk_text;
pub use pipeline::extract::{coalesce_lines, BlockSource, PdfiumBlockSource, Segment};
pub use pipeline::fetch::{DocumentFetcher, HttpFetcher};
pub use pipeline::normalize::Normalizer;
pub use pipeline::order::order_blocks;
pub use process::Pipeline;
pub use server::{build_router, start_server, AppState};
