//! Page-text recovery: first-pass PDF in, per-page plain text out, via
//! `pdftotext`.
//!
//! Layout mode matters here: `-layout` preserves horizontal indentation, and
//! the authorship markers are recognised by their indent (see
//! [`super::index`]). The extractor writes to stdout so no scratch file is
//! involved; pages arrive separated by form feeds.

use crate::error::Mefi2BookError;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// The page-text extractor the pipeline shells out to.
pub const EXTRACTOR_PROGRAM: &str = "pdftotext";

/// Extract per-page text from `pdf`. Index 0 of the result is book page 1.
pub async fn extract_page_text(
    pdf: &Path,
    timeout_secs: u64,
) -> Result<Vec<String>, Mefi2BookError> {
    let mut cmd = Command::new(EXTRACTOR_PROGRAM);
    cmd.arg("-layout")
        .arg("-enc")
        .arg("UTF-8")
        .arg(pdf)
        .arg("-")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let result = tokio::time::timeout(Duration::from_secs(timeout_secs), cmd.output()).await;

    let run = match result {
        Err(_elapsed) => return Err(Mefi2BookError::ExtractTimeout { secs: timeout_secs }),
        Ok(Err(e)) => {
            return Err(Mefi2BookError::ExtractorUnavailable {
                program: EXTRACTOR_PROGRAM.to_string(),
                source: e,
            })
        }
        Ok(Ok(run)) => run,
    };

    if !run.status.success() {
        return Err(Mefi2BookError::ExtractFailed {
            status: run.status.to_string(),
            detail: super::render::stderr_excerpt(&run.stderr),
        });
    }

    let text = String::from_utf8_lossy(&run.stdout).into_owned();
    let pages = split_pages(&text);
    debug!("page text recovered for {} pages", pages.len());
    Ok(pages)
}

/// Split extractor output on form feeds into one string per page.
///
/// Only the final empty chunk (from the trailing form feed after the last
/// page) is dropped. A blank page in the middle of the book stays in the
/// vector, otherwise every page after it would be numbered off by one.
pub(crate) fn split_pages(raw: &str) -> Vec<String> {
    let mut pages: Vec<String> = raw.split('\u{c}').map(str::to_string).collect();
    if pages.last().is_some_and(|p| p.is_empty()) {
        pages.pop();
    }
    pages
}

// ── Tests ────────────────────────────────────────────────────────────────────
