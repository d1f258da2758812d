//! Error types for the gazette-report library.
//!
//! Every failure in the pipeline is fatal for the run, so there is a single
//! error type, [`GazetteError`], returned as `Err(..)` from each stage and
//! propagated unchanged to the top-level driver.
//!
//! Variants are grouped by [`ErrorCategory`]. The category, not the variant,
//! decides what the driver does (which exit code it returns); the variant
//! carries the detail for the diagnostic line.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`GazetteError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing credential, missing input directory, bad settings. Detected
    /// before any remote call or file write.
    Configuration,
    /// No eligible input document was located.
    NotFound,
    /// Remote call failed or returned something that is not a valid result.
    Extraction,
    /// Filesystem read, write or mkdir failed.
    Io,
}

impl ErrorCategory {
    /// Process exit code used by the CLI for this category.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorCategory::Configuration => 2,
            ErrorCategory::NotFound => 3,
            ErrorCategory::Extraction => 4,
            ErrorCategory::Io => 5,
        }
    }
}

/// All errors returned by the gazette-report library.
#[derive(Debug, Error)]
pub enum GazetteError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// The completion service credential is absent or blank.
    #[error("Missing credential: {var} is not set.\nExport it before running, e.g. export {var}=...")]
    MissingCredential { var: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The directory that should hold downloaded gazettes does not exist.
    #[error("Input directory not found: '{path}'\nRun the downloader first or pass --input-dir.")]
    InputDirMissing { path: PathBuf },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── Not-found errors ──────────────────────────────────────────────────
    /// The input directory exists but holds no PDF.
    #[error("No PDF files found in '{dir}'")]
    NoInputDocument { dir: PathBuf },

    /// A named input file does not exist.
    #[error("PDF file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The HTTP exchange with the completion service failed.
    #[error("Completion service request failed: {reason}")]
    ServiceRequest { reason: String },

    /// The completion service answered with a non-success status.
    #[error("Completion service returned HTTP {status}: {body}")]
    ServiceStatus { status: u16, body: String },

    /// The response text is not JSON, or does not match the expected shape.
    #[error("Malformed extraction response: {detail}")]
    MalformedResponse { detail: String },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// pdfium could not open the document.
    #[error("PDF '{path}' could not be opened: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Reading an input file or directory failed.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create the reports directory or write the report file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// lopdf failed to serialise the report document.
    #[error("Failed to encode report PDF: {0}")]
    PdfEncodeFailed(String),

    /// Unexpected internal error (task join failure and the like).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GazetteError {
    /// Which [`ErrorCategory`] this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            GazetteError::MissingCredential { .. }
            | GazetteError::InvalidConfig(_)
            | GazetteError::InputDirMissing { .. }
            | GazetteError::PdfiumBindingFailed(_) => ErrorCategory::Configuration,
            GazetteError::NoInputDocument { .. } | GazetteError::FileNotFound { .. } => {
                ErrorCategory::NotFound
            }
            GazetteError::ServiceRequest { .. }
            | GazetteError::ServiceStatus { .. }
            | GazetteError::MalformedResponse { .. }
            | GazetteError::NotAPdf { .. }
            | GazetteError::CorruptPdf { .. } => ErrorCategory::Extraction,
            GazetteError::ReadFailed { .. }
            | GazetteError::OutputWriteFailed { .. }
            | GazetteError::PdfEncodeFailed(_)
            | GazetteError::Internal(_) => ErrorCategory::Io,
        }
    }

    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        GazetteError::MalformedResponse {
            detail: detail.into(),
        }
    }
}
