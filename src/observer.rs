//! Observer trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn PipelineObserver>`] via
//! [`crate::config::PipelineConfigBuilder::observer`] to receive events as a
//! request moves through the pipeline state machine:
//!
//! ```text
//! Start → Fetching → Extracting → Ordering → Chunking → Done
//!            │            │            │          │
//!            └────────────┴────────────┴──────────┴──▶ Failed(kind)
//! ```
//!
//! The library already logs every transition with `tracing`; the observer
//! exists for hosts that want the same events as data (metrics counters,
//! request audit trails, tests asserting stage order).
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdftext::{PipelineConfig, PipelineObserver, Stage};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct Recorder {
//!     stages: Mutex<Vec<Stage>>,
//! }
//!
//! impl PipelineObserver for Recorder {
//!     fn on_stage(&self, stage: Stage) {
//!         self.stages.lock().unwrap().push(stage);
//!     }
//! }
//!
//! let config = PipelineConfig::builder()
//!     .observer(Arc::new(Recorder::default()))
//!     .build()
//!     .unwrap();
//! ```

use crate::error::ErrorKind;
use crate::model::PipelineStats;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// A state of the per-request pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Start,
    Fetching,
    Extracting,
    /// Reading-order resolution and text normalisation.
    Ordering,
    Chunking,
    Done,
    Failed(ErrorKind),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Start => f.write_str("start"),
            Stage::Fetching => f.write_str("fetching"),
            Stage::Extracting => f.write_str("extracting"),
            Stage::Ordering => f.write_str("ordering"),
            Stage::Chunking => f.write_str("chunking"),
            Stage::Done => f.write_str("done"),
            Stage::Failed(kind) => write!(f, "failed({kind})"),
        }
    }
}

/// Receives pipeline events.
///
/// Implementations must be `Send + Sync`: one pipeline serves concurrent
/// requests, so events from different requests can interleave. All methods
/// default to no-ops.
pub trait PipelineObserver: Send + Sync {
    /// Called on every state transition, including the terminal one.
    fn on_stage(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called once per page after its blocks were extracted.
    ///
    /// # Arguments
    /// * `page_num`: 1-indexed page number
    /// * `blocks`: raw block count before ordering and filtering
    fn on_page_extracted(&self, page_num: usize, blocks: usize) {
        let _ = (page_num, blocks);
    }

    /// Called when a request finishes successfully.
    fn on_complete(&self, stats: &PipelineStats) {
        let _ = stats;
    }

    /// Called when a request fails, with the error's kind and message.
    fn on_failure(&self, kind: ErrorKind, message: &str) {
        let _ = (kind, message);
    }
}

/// Observer used when none is configured.
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type SharedObserver = Arc<dyn PipelineObserver>;
