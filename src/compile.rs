//! Whole-book compilation entry points.
//!
//! ## Why two render passes?
//!
//! The contributor index lists page numbers, and page numbers only exist
//! after pagination. So the book is rendered once without the index to find
//! out where every comment lands, the per-page text is read back, the index
//! is built from it, and the book is rendered again with the index section
//! filled in. Appending the index never moves the pages before it, so the
//! numbers stay true in the final book.
//!
//! Intermediate artifacts (staged HTML, the first-pass PDF) live in the
//! cache directory and are deliberately left behind after a run; when a
//! render misbehaves, opening the staged HTML is the fastest way to see
//! what the renderer was given. Two runs compiling the same thread against
//! the same cache directory will race on those files; give concurrent runs
//! separate cache directories.

use crate::config::BookConfig;
use crate::error::Mefi2BookError;
use crate::output::{BookOutput, BookStats};
use crate::pipeline::{acquire, compose, extract, index, page_text, render};
use crate::progress::PipelineStage;
use crate::thread::{Subsite, Thread};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Compile one thread into a print-ready PDF book.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `subsite`   — Which site section hosts the thread
/// * `thread_id` — Numeric thread id from the thread's URL
/// * `config`    — Compilation configuration
///
/// # Errors
/// The pipeline is strictly sequential and halts on the first failure; see
/// [`Mefi2BookError`] for the full taxonomy. The final output path never
/// holds a partial book: the last render goes to a scratch name and is
/// renamed into place only on success.
pub async fn compile(
    subsite: Subsite,
    thread_id: u64,
    config: &BookConfig,
) -> Result<BookOutput, Mefi2BookError> {
    let total_start = Instant::now();
    info!("Compiling {}.{}/{} into a book", subsite, config.domain, thread_id);

    let stage = |s: PipelineStage| {
        if let Some(ref cb) = config.progress {
            cb.on_stage(s);
        }
    };

    let paths = ArtifactPaths::new(config, subsite, thread_id);

    // ── Step 1: Acquire raw markup ───────────────────────────────────────
    stage(PipelineStage::Acquire);
    let acquire_start = Instant::now();
    let acquired = acquire::fetch_or_load(subsite, thread_id, config).await?;
    let from_cache = acquired.from_cache();
    let acquire_ms = ms(acquire_start);

    // ── Step 2: Extract the thread ───────────────────────────────────────
    stage(PipelineStage::Extract);
    let extract_start = Instant::now();
    let thread = extract::extract_thread(acquired.markup(), subsite, thread_id)?;
    let extract_ms = ms(extract_start);
    info!(
        "'{}' — {} comments, {} tags",
        thread.title,
        thread.authored_comment_count(),
        thread.tags.len()
    );

    // ── Step 3: Compose and stage the first-pass HTML ────────────────────
    stage(PipelineStage::ComposeFirstPass);
    let cover_html = compose::compose_cover(&thread, config);
    let body_html = compose::compose_body(&thread, None);
    write_artifact(&paths.cover, &cover_html).await?;
    write_artifact(&paths.body, &body_html).await?;

    // ── Step 4: First render pass (pagination only) ──────────────────────
    stage(PipelineStage::RenderFirstPass);
    let first_render_start = Instant::now();
    render::render_pdf(
        &paths.body,
        &paths.cover,
        &config.geometry,
        &paths.first_pass_pdf,
        config.render_timeout_secs,
    )
    .await?;
    let first_render_ms = ms(first_render_start);

    // ── Step 5: Read back per-page text ──────────────────────────────────
    stage(PipelineStage::ExtractText);
    let page_text_start = Instant::now();
    let pages =
        page_text::extract_page_text(&paths.first_pass_pdf, config.extract_timeout_secs).await?;
    let page_text_ms = ms(page_text_start);
    info!("first pass paginated to {} pages", pages.len());

    // ── Step 6: Build the contributor index ──────────────────────────────
    stage(PipelineStage::BuildIndex);
    let index_start = Instant::now();
    let contributor_index = index::build_index(&pages);
    let index_ms = ms(index_start);
    info!("{} contributors indexed", contributor_index.len());

    // ── Step 7: Re-compose the body with the index ───────────────────────
    stage(PipelineStage::ComposeFinal);
    let final_body_html = compose::compose_body(&thread, Some(&contributor_index));
    write_artifact(&paths.body, &final_body_html).await?;

    // ── Step 8: Final render into place ──────────────────────────────────
    stage(PipelineStage::RenderFinal);
    let final_render_start = Instant::now();
    tokio::fs::create_dir_all(&config.output_dir).await.map_err(|e| {
        Mefi2BookError::OutputWriteFailed {
            path: config.output_dir.clone(),
            source: e,
        }
    })?;
    let final_path = config
        .output_dir
        .join(format!("{}.pdf", subsite.artifact_stem(thread_id)));
    let tmp_path = final_path.with_extension("pdf.tmp");
    if let Err(e) = render::render_pdf(
        &paths.body,
        &paths.cover,
        &config.geometry,
        &tmp_path,
        config.render_timeout_secs,
    )
    .await
    {
        // never leave a half-written book behind
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(e);
    }
    tokio::fs::rename(&tmp_path, &final_path).await.map_err(|e| {
        Mefi2BookError::OutputWriteFailed {
            path: final_path.clone(),
            source: e,
        }
    })?;
    let final_render_ms = ms(final_render_start);

    stage(PipelineStage::Done);

    let stats = BookStats {
        acquire_ms,
        extract_ms,
        first_render_ms,
        page_text_ms,
        index_ms,
        final_render_ms,
        total_ms: ms(total_start),
        from_cache,
        comment_count: thread.authored_comment_count(),
        tag_count: thread.tags.len(),
    };
    info!(
        "book written to {} ({} main pages, {}ms total)",
        final_path.display(),
        pages.len(),
        stats.total_ms
    );

    Ok(BookOutput {
        output_path: final_path,
        page_count: pages.len(),
        contributor_count: contributor_index.len(),
        index: contributor_index,
        stats,
    })
}

/// Synchronous wrapper around [`compile`].
///
/// Creates a temporary tokio runtime internally.
pub fn compile_sync(
    subsite: Subsite,
    thread_id: u64,
    config: &BookConfig,
) -> Result<BookOutput, Mefi2BookError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Mefi2BookError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(compile(subsite, thread_id, config))
}

/// Acquire and extract a thread without rendering anything.
///
/// Needs neither `wkhtmltopdf` nor `pdftotext`; useful for checking what a
/// book would contain before committing to a render.
pub async fn inspect(
    subsite: Subsite,
    thread_id: u64,
    config: &BookConfig,
) -> Result<Thread, Mefi2BookError> {
    let stage = |s: PipelineStage| {
        if let Some(ref cb) = config.progress {
            cb.on_stage(s);
        }
    };

    stage(PipelineStage::Acquire);
    let acquired = acquire::fetch_or_load(subsite, thread_id, config).await?;
    stage(PipelineStage::Extract);
    extract::extract_thread(acquired.markup(), subsite, thread_id)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Per-thread scratch artifacts, all under the cache directory and all
/// named from the same stem as the final book.
struct ArtifactPaths {
    cover: PathBuf,
    body: PathBuf,
    first_pass_pdf: PathBuf,
}

impl ArtifactPaths {
    fn new(config: &BookConfig, subsite: Subsite, thread_id: u64) -> Self {
        let stem = subsite.artifact_stem(thread_id);
        let dir = &config.cache_dir;
        Self {
            cover: dir.join(format!("{stem}_cover.html")),
            body: dir.join(format!("{stem}_main.html")),
            first_pass_pdf: dir.join(format!("{stem}_first_pass.pdf")),
        }
    }
}

async fn write_artifact(path: &Path, contents: &str) -> Result<(), Mefi2BookError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Mefi2BookError::CacheIo {
                path: parent.to_path_buf(),
                source: e,
            })?;
    }
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| Mefi2BookError::CacheIo {
            path: path.to_path_buf(),
            source: e,
        })
}

fn ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
