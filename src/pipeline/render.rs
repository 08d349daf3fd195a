//! PDF rendering: composed HTML in, paginated PDF out, via `wkhtmltopdf`.
//!
//! The renderer is an external program rather than a library binding, so
//! this module is mostly about invoking it safely: a hard timeout, stderr
//! capture for diagnosable failures, and a distinct error when the binary
//! is missing entirely.
//!
//! ## Why a cover object?
//!
//! The cover page is passed through wkhtmltopdf's `cover` input object
//! instead of being concatenated into the body. Cover pages rendered that
//! way carry no footer, so the printed page numbering starts on the first
//! body page and stays aligned with what the page-text pass reads back.

use crate::config::PageGeometry;
use crate::error::Mefi2BookError;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// The paginating renderer the pipeline shells out to.
pub const RENDERER_PROGRAM: &str = "wkhtmltopdf";

/// Render `body` behind `cover` into `output`.
pub async fn render_pdf(
    body: &Path,
    cover: &Path,
    geometry: &PageGeometry,
    output: &Path,
    timeout_secs: u64,
) -> Result<(), Mefi2BookError> {
    let args = renderer_args(body, cover, geometry, output);
    debug!("running {} {}", RENDERER_PROGRAM, args.join(" "));

    let mut cmd = Command::new(RENDERER_PROGRAM);
    cmd.args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let result = tokio::time::timeout(Duration::from_secs(timeout_secs), cmd.output()).await;

    let run = match result {
        Err(_elapsed) => return Err(Mefi2BookError::RenderTimeout { secs: timeout_secs }),
        Ok(Err(e)) => {
            return Err(Mefi2BookError::RendererUnavailable {
                program: RENDERER_PROGRAM.to_string(),
                source: e,
            })
        }
        Ok(Ok(run)) => run,
    };

    if !run.status.success() {
        return Err(Mefi2BookError::RenderFailed {
            status: run.status.to_string(),
            code: run.status.code(),
            detail: stderr_excerpt(&run.stderr),
        });
    }
    Ok(())
}

/// Full renderer argument list: page geometry, footer numbering, then the
/// `cover <page>` object ahead of the body and output paths.
pub(crate) fn renderer_args(
    body: &Path,
    cover: &Path,
    geometry: &PageGeometry,
    output: &Path,
) -> Vec<String> {
    vec![
        "--quiet".to_string(),
        "--page-height".to_string(),
        geometry.page_height.clone(),
        "--page-width".to_string(),
        geometry.page_width.clone(),
        "--margin-top".to_string(),
        geometry.margin_top.clone(),
        "--margin-bottom".to_string(),
        geometry.margin_bottom.clone(),
        "--margin-left".to_string(),
        geometry.margin_left.clone(),
        "--margin-right".to_string(),
        geometry.margin_right.clone(),
        "--footer-center".to_string(),
        geometry.footer_center.clone(),
        "--footer-font-size".to_string(),
        geometry.footer_font_size.to_string(),
        "--footer-spacing".to_string(),
        geometry.footer_spacing.to_string(),
        "--encoding".to_string(),
        "utf-8".to_string(),
        "cover".to_string(),
        cover.display().to_string(),
        body.display().to_string(),
        output.display().to_string(),
    ]
}

/// Trimmed stderr, capped so a renderer that dumps page-by-page warnings
/// does not flood the error message.
pub(crate) fn stderr_excerpt(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    if trimmed.chars().count() > 800 {
        let mut out: String = trimmed.chars().take(800).collect();
        out.push('\u{2026}');
        out
    } else {
        trimmed.to_string()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
