//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::AnalyzerConfigBuilder::progress_callback`] to be told when
//! each stage starts and finishes. The CLI uses it to drive a spinner; library
//! callers can forward the events wherever they like.
//!
//! # Example
//!
//! ```rust
//! use gazette_report::{AnalyzerConfig, PipelineProgressCallback, Stage};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     finished: AtomicUsize,
//! }
//!
//! impl PipelineProgressCallback for CountingCallback {
//!     fn on_stage_complete(&self, stage: Stage, detail: &str) {
//!         self.finished.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{stage}: {detail}");
//!     }
//! }
//!
//! let cb = Arc::new(CountingCallback { finished: AtomicUsize::new(0) });
//! let config = AnalyzerConfig::builder()
//!     .progress_callback(cb as Arc<dyn PipelineProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// One step of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Pull the text out of the source PDF.
    ReadDocument,
    /// Split the text into pages.
    Segment,
    /// Remote structured extraction.
    Extract,
    /// Lay out and write the report.
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::ReadDocument => "read",
            Stage::Segment => "segment",
            Stage::Extract => "extract",
            Stage::Render => "render",
        })
    }
}

/// Called by the pipeline as it moves through its stages.
///
/// All methods default to no-ops so implementors override only what they
/// need. Stages run sequentially, so calls never overlap within one run.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called just before `stage` begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when `stage` finished; `detail` is a short human summary
    /// ("12 pages", "5 norms, 2 appointments", …).
    fn on_stage_complete(&self, stage: Stage, detail: &str) {
        let _ = (stage, detail);
    }

    /// Called once the report file is in place.
    fn on_run_complete(&self, report_path: &Path) {
        let _ = report_path;
    }
}

/// A no-op implementation, the default when no callback is configured.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalyzerConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;
