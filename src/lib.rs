//! # gazette-report
//!
//! Analyse an issue of the Peruvian official gazette *El Peruano* and write a
//! branded PDF report of what matters to the water and sanitation sector.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    named file, or newest PDF in the download directory
//!  ├─ 2. Text     per-page text via pdfium (spawn_blocking)
//!  ├─ 3. Segment  split on form feeds, keep physical page numbers
//!  ├─ 4. Extract  one schema-constrained completion → AnalysisResult
//!  └─ 5. Render   themed layout → PDF under reports/
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gazette_report::{analyze_latest, AnalyzerConfig, ServiceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential from GEMINI_API_KEY
//!     let config = AnalyzerConfig::builder()
//!         .service(ServiceConfig::from_env())
//!         .build()?;
//!     let out = analyze_latest("downloads", &config).await?;
//!     println!("{} ({} norms)", out.report_path.display(), out.analysis.norms.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `gazette-report` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! gazette-report = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze_file, analyze_latest, analyze_text, AnalysisOutput};
pub use config::{AnalyzerConfig, AnalyzerConfigBuilder, ReportConfig, ServiceConfig};
pub use error::{ErrorCategory, GazetteError};
pub use model::{AnalysisResult, Appointment, Norm, PageText, Relevance, GAZETTE_DATE_FALLBACK};
pub use pipeline::extract::{CompletionRequest, CompletionService, SchemaExtractor};
pub use pipeline::gemini::GeminiService;
pub use pipeline::layout::{HeadingStyle, ReportSurface, ReportTheme, SectionKind};
pub use pipeline::render::{report_file_name, ReportRenderer};
pub use pipeline::segment::segment_pages;
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback, Stage};
