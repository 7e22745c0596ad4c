//! Pipeline stages for PDF text extraction.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and the parser can be swapped without touching the
//! others.
//!
//! ## Data Flow
//!
//! ```text
//! fetch ──▶ extract ──▶ order ──▶ normalize ──▶ chunk
//! (HTTP)    (pdfium)    (y, x)    (encoding)    (N chars)
//! ```
//!
//! 1. [`fetch`]: download the document; the only stage with network I/O
//! 2. [`extract`]: per-page text blocks with positions; blocking, runs on
//!    the pdfium worker thread
//! 3. [`order`]: sort each page's blocks top-to-bottom, left-to-right and
//!    drop blank ones
//! 4. [`normalize`]: join blocks into one string restricted to the target
//!    encoding
//! 5. [`chunk`]: cut the string into fixed-length pieces

pub mod chunk;
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod order;
