//! Error types for the mefi2book library.
//!
//! A single fatal error type covers the whole pipeline: the stages run
//! strictly in sequence with no retry policy and no partial-success output,
//! so the first failure at any stage halts the run as `Err(Mefi2BookError)`
//! from the top-level [`crate::compile`] entry points. Intermediate cache
//! artifacts are left on disk for diagnosis; the final output path is never
//! left holding a partial artifact.
//!
//! Messages favour actionable hints (what to check, which knob to raise)
//! because the binary prints them verbatim as its one terminal message.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the mefi2book library.
#[derive(Debug, Error)]
pub enum Mefi2BookError {
    // ── Acquisition errors ────────────────────────────────────────────────
    /// The site answered, but with HTTP 404: no such thread.
    #[error("Thread not found (HTTP 404): '{url}'\nCheck the post number and the --subsite flag.")]
    ThreadNotFound { url: String },

    /// HTTP fetch failed for a reason other than a missing thread.
    #[error("Failed to fetch '{url}': {reason}\nCheck your internet connection.")]
    FetchFailed { url: String, reason: String },

    /// Fetch exceeded the configured timeout.
    #[error("Fetch timed out after {secs}s for '{url}'")]
    FetchTimeout { url: String, secs: u64 },

    /// Reading or writing a cache artifact failed for a reason other than
    /// the file simply not existing yet.
    #[error("Cache I/O failed for '{path}': {source}")]
    CacheIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Source shape errors ───────────────────────────────────────────────
    /// The fetched markup does not have the structure of a discussion thread.
    ///
    /// Raised when no comment container exists at all, when the
    /// comment-total phrase cannot be found, or when the post date does not
    /// parse. A stale or truncated cached copy is the usual culprit.
    #[error("Source markup is malformed: {detail}\nRe-run with --no-cache in case the cached copy is stale.")]
    MalformedSource { detail: String },

    // ── Renderer errors ───────────────────────────────────────────────────
    /// The pagination renderer exited abnormally.
    ///
    /// `status` is the raw exit status display (includes the signal on
    /// Unix), `code` the numeric exit code when there is one, and `detail`
    /// the renderer's stderr.
    #[error("Pagination renderer failed ({status}): {detail}")]
    RenderFailed {
        status: String,
        code: Option<i32>,
        detail: String,
    },

    /// The pagination renderer exceeded the configured timeout.
    #[error("Pagination renderer timed out after {secs}s\nRaise --render-timeout; very long threads can take a while.")]
    RenderTimeout { secs: u64 },

    /// The pagination renderer could not be launched at all.
    #[error(
        "Could not launch '{program}': {source}\n\n\
wkhtmltopdf must be installed and on PATH.\n\
Downloads: https://wkhtmltopdf.org/downloads.html\n"
    )]
    RendererUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    // ── Page-text extraction errors ───────────────────────────────────────
    /// The page-text extractor exited abnormally.
    #[error("Page-text extraction failed ({status}): {detail}")]
    ExtractFailed { status: String, detail: String },

    /// The page-text extractor exceeded the configured timeout.
    #[error("Page-text extraction timed out after {secs}s")]
    ExtractTimeout { secs: u64 },

    /// The page-text extractor could not be launched at all.
    #[error(
        "Could not launch '{program}': {source}\n\n\
pdftotext must be installed and on PATH.\n\
It ships with poppler-utils (Linux), poppler (Homebrew), or Xpdf tools.\n"
    )]
    ExtractorUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not write or move the final PDF into place.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
