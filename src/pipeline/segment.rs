//! Page segmentation: full document text → page-indexed blocks.
//!
//! Text extraction joins pages with a form feed, so splitting on `'\f'`
//! recovers the page boundaries. Page numbers are assigned *before* blank
//! pages are dropped: a norm the model reports on "page 7" must still be on
//! the seventh physical page of the gazette.

use crate::model::PageText;
use tracing::debug;

/// Page-break marker embedded in extracted document text.
pub const PAGE_BREAK: char = '\u{000C}';

/// Split `text` into trimmed, non-empty pages in document order.
///
/// Never fails. A text without markers is a single page; an empty or
/// whitespace-only text yields no pages at all.
pub fn segment_pages(text: &str) -> Vec<PageText> {
    let pages: Vec<PageText> = text
        .split(PAGE_BREAK)
        .enumerate()
        .filter_map(|(idx, chunk)| {
            let trimmed = chunk.trim();
            if trimmed.is_empty() {
                return None;
            }
            Some(PageText {
                page_number: u32::try_from(idx + 1).unwrap_or(u32::MAX),
                text: trimmed.to_string(),
            })
        })
        .collect();

    debug!(
        "Segmented {} chunks into {} non-empty pages",
        text.split(PAGE_BREAK).count(),
        pages.len()
    );
    pages
}
