//! Pipeline stages for thread-to-book compilation.
//!
//! Each submodule implements exactly one transformation step. Keeping
//! stages separate makes each independently testable: the pure stages
//! (extract, compose, index) run on strings with no tooling installed,
//! while the tool-backed stages (render, page_text) isolate the external
//! program plumbing.
//!
//! ## Data Flow
//!
//! ```text
//! acquire ──▶ extract ──▶ compose ──▶ render ──▶ page_text ──▶ index
//! (HTTP/cache) (scrape)   (HTML)   (wkhtmltopdf) (pdftotext)  (names)
//!                             ▲                                  │
//!                             └────────── final pass ◀───────────┘
//! ```
//!
//! 1. [`acquire`]   — cache-first fetch of the raw thread page
//! 2. [`typography`] — smart quotes/dashes over the raw markup, applied by
//!    extraction before any parsing
//! 3. [`extract`]   — parse the page into a [`crate::Thread`]
//! 4. [`compose`]   — assemble cover and body HTML from embedded templates
//! 5. [`render`]    — paginate HTML into a PDF via `wkhtmltopdf`
//! 6. [`page_text`] — read per-page text back out of the first-pass PDF
//! 7. [`index`]     — build the contributor index from authorship markers
//!
//! The compose→render→page_text→index→compose loop is why the book is
//! rendered twice: page numbers only exist after pagination, and the index
//! needs them.

pub mod acquire;
pub mod compose;
pub mod extract;
pub mod index;
pub mod page_text;
pub mod render;
pub mod typography;
