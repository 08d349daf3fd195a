//! # mefi2book
//!
//! Compile a MetaFilter discussion thread into a print-ready PDF book with
//! a generated contributor index.
//!
//! ## Why this crate?
//!
//! A long community thread already reads like a book; it just renders badly
//! on paper. This crate fetches a thread, strips the page down to its
//! content, typesets it with proper typography on small book pages, and adds
//! the one thing a printed thread needs that a browser doesn't: an index
//! telling you which pages each contributor appears on.
//!
//! ## Pipeline Overview
//!
//! ```text
//! thread id
//!  │
//!  ├─ 1. Acquire   cache-first fetch of the raw thread page
//!  ├─ 2. Extract   parse title, date, tags, post and comments
//!  ├─ 3. Compose   cover + body HTML from embedded templates
//!  ├─ 4. Render    first pass through wkhtmltopdf (pagination)
//!  ├─ 5. Read      per-page text back via pdftotext
//!  ├─ 6. Index     contributor → pages from authorship markers
//!  └─ 7. Render    final pass with the index bound in
//! ```
//!
//! Two passes because the index needs page numbers, and page numbers only
//! exist after pagination. The index is appended after the main text, so
//! adding it never shifts the pages it refers to.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mefi2book::{compile, BookConfig, Subsite};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BookConfig::default();
//!     let output = compile(Subsite::Ask, 123456, &config).await?;
//!     println!("book: {}", output.output_path.display());
//!     eprintln!(
//!         "{} pages, {} contributors indexed",
//!         output.page_count, output.contributor_count
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## External tools
//!
//! Rendering shells out to `wkhtmltopdf` and page-text recovery to
//! `pdftotext` (poppler); both must be on PATH for [`compile`]. The
//! acquisition and extraction stages — everything [`inspect`] touches —
//! run without them.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `mefi2book` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! mefi2book = { version = "1.0", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod compile;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod thread;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use compile::{compile, compile_sync, inspect};
pub use config::{BookConfig, BookConfigBuilder, PageGeometry};
pub use error::Mefi2BookError;
pub use output::{BookOutput, BookStats};
pub use pipeline::index::{build_index, ContributorIndex, IndexEntry};
pub use progress::{NoopStageCallback, PipelineStage, StageCallback, StageObserver};
pub use thread::{Comment, Post, Subsite, Thread};
