//! Pipeline stages for gazette analysis.
//!
//! Each submodule implements exactly one transformation step, so each is
//! independently testable and the remote service or the drawing backend can
//! be swapped without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ text ──▶ segment ──▶ extract ──▶ render
//! (path)   (pdfium)  (pages)    (service)   (layout → pdf → file)
//! ```
//!
//! 1. [`input`]: locate the gazette PDF (explicit path or latest in a dir)
//! 2. [`text`]: plain text per page; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`segment`]: split on page-break markers, keep original page numbers
//! 4. [`extract`]: one schema-constrained completion, then normalization;
//!    [`gemini`] is the HTTP backend and [`schema`] the response schema
//! 5. [`render`]: [`layout`] draws onto a [`pdf`] surface, then an atomic
//!    write under the reports directory

pub mod extract;
pub mod gemini;
pub mod input;
pub mod layout;
pub mod pdf;
pub mod render;
pub mod schema;
pub mod segment;
pub mod text;
