//! Text extraction: pull the plain text of every page out of a PDF via pdfium.
//!
//! pdfium is not async-safe, so the work runs inside
//! `tokio::task::spawn_blocking`. Page texts are joined with a form feed so
//! [`crate::pipeline::segment::segment_pages`] can split them again.

use crate::error::GazetteError;
use crate::pipeline::segment::PAGE_BREAK;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming the pdfium library file or its directory.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Extracted document text plus the page count pdfium reported.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentText {
    /// All page texts joined by [`PAGE_BREAK`].
    pub text: String,
    pub page_count: usize,
}

/// Extract the text of every page of `pdf_path`.
pub async fn extract_text(pdf_path: &Path) -> Result<DocumentText, GazetteError> {
    let path = pdf_path.to_path_buf();
    tokio::task::spawn_blocking(move || extract_text_blocking(&path))
        .await
        .map_err(|e| GazetteError::Internal(format!("Text extraction task panicked: {e}")))?
}

fn bind_pdfium() -> Result<Pdfium, GazetteError> {
    let bindings = match std::env::var_os(PDFIUM_LIB_PATH_ENV) {
        Some(raw) => {
            let configured = PathBuf::from(raw);
            let library = if configured.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&configured)
            } else {
                configured
            };
            debug!("Binding pdfium from {}", library.display());
            Pdfium::bind_to_library(&library)
        }
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| GazetteError::PdfiumBindingFailed(format!("{e:?}")))?;
    Ok(Pdfium::new(bindings))
}

fn extract_text_blocking(pdf_path: &Path) -> Result<DocumentText, GazetteError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| GazetteError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: format!("{e:?}"),
        })?;

    let pages = document.pages();
    let page_count = pages.len() as usize;
    info!("PDF loaded: {} pages", page_count);

    let mut texts = Vec::with_capacity(page_count);
    for (idx, page) in pages.iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| GazetteError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: format!("page {}: {e:?}", idx + 1),
            })?
            .all();
        debug!("Page {} → {} chars", idx + 1, text.len());
        texts.push(text);
    }

    Ok(DocumentText {
        text: join_pages(&texts),
        page_count,
    })
}

/// Join page texts with the page-break marker.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    let mut out = String::new();
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            out.push(PAGE_BREAK);
        }
        out.push_str(page.as_ref());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::segment::segment_pages;

    #[test]
    fn join_then_segment_keeps_numbering() {
        let joined = join_pages(&["uno", "", "tres"]);
        assert_eq!(joined, "uno\u{000C}\u{000C}tres");
        let pages = segment_pages(&joined);
        let numbers: Vec<u32> = pages.iter().map(|p| p.page_number).collect();
        assert_eq!(numbers, vec![1, 3]);
    }

    #[test]
    fn join_of_nothing_is_empty() {
        assert_eq!(join_pages::<&str>(&[]), "");
    }
}
