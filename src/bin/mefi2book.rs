//! CLI binary for mefi2book.
//!
//! A thin shim over the library crate that maps CLI flags to `BookConfig`
//! and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use mefi2book::{
    compile, inspect, BookConfig, PipelineStage, StageCallback, StageObserver, Subsite,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Stage progress display using indicatif ───────────────────────────────────

/// Terminal stage display: a spinner naming the running stage, with a log
/// line printed for each stage as it completes.
struct CliStageCallback {
    bar: ProgressBar,
    /// The running stage and when it started, for elapsed reporting.
    current: Mutex<Option<(PipelineStage, Instant)>>,
}

impl CliStageCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Compiling");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            current: Mutex::new(None),
        })
    }

    /// Log the finished stage (if any) and remember the next one.
    fn roll_over(&self, next: Option<(PipelineStage, Instant)>) {
        let mut current = self.current.lock().unwrap();
        if let Some((stage, started)) = current.take() {
            self.bar.println(format!(
                "  {} {:<28} {}",
                green("✓"),
                stage.label(),
                dim(&format!("{:.1}s", started.elapsed().as_secs_f64())),
            ));
        }
        *current = next;
    }
}

impl StageCallback for CliStageCallback {
    fn on_stage(&self, stage: PipelineStage) {
        if stage == PipelineStage::Done {
            self.roll_over(None);
            self.bar.finish_and_clear();
            return;
        }
        self.roll_over(Some((stage, Instant::now())));
        self.bar.set_message(stage.label().to_string());
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Compile a front-page thread into a book
  mefi2book 137018

  # An Ask MetaFilter thread
  mefi2book --subsite ask 123456

  # Re-fetch even when a cached copy exists
  mefi2book --no-cache 137018

  # Write the book somewhere else
  mefi2book -o ~/books 137018

  # See what the book would contain, without rendering anything
  mefi2book --inspect-only 137018

  # Machine-readable result
  mefi2book --json 137018 > report.json

SUBSITES:
  www       the front page, www.metafilter.com (default)
  ask       Ask MetaFilter
  metatalk  MetaTalk

EXTERNAL TOOLS:
  wkhtmltopdf   paginates the book       https://wkhtmltopdf.org/downloads.html
  pdftotext     reads page text back     ships with poppler-utils

  Both must be on PATH. --inspect-only needs neither.

CACHE:
  The raw thread page and the intermediate artifacts (staged HTML, the
  first-pass PDF) are kept in ./mefi2book_cache/ so reruns skip the network
  and failed renders can be diagnosed. Override with --cache-dir; bypass
  the cached page with --no-cache.

  The final book lands in the output directory as
  {subsite}_metafilter_{id}.pdf.
"#;

/// Compile MetaFilter threads into print-ready PDF books.
#[derive(Parser, Debug)]
#[command(
    name = "mefi2book",
    version,
    about = "Compile a MetaFilter thread into a print-ready PDF book",
    long_about = "Fetch a MetaFilter discussion thread, typeset its post and comments for small \
book pages, and render a PDF with a cover and a generated index of contributors and the \
pages they appear on. The book is rendered twice: the first pass fixes the pagination, \
the second binds in the contributor index built from it.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Numeric thread id (the number in the thread's URL).
    thread_id: u64,

    /// Site section hosting the thread.
    #[arg(short, long, env = "MEFI2BOOK_SUBSITE", value_enum, default_value = "www")]
    subsite: SubsiteArg,

    /// Ignore any cached copy and re-fetch the thread.
    #[arg(long, env = "MEFI2BOOK_NO_CACHE")]
    no_cache: bool,

    /// Directory the final book is written to.
    #[arg(short, long, env = "MEFI2BOOK_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Directory for the cached page and intermediate artifacts.
    #[arg(long, env = "MEFI2BOOK_CACHE_DIR", default_value = "mefi2book_cache")]
    cache_dir: PathBuf,

    /// HTTP fetch timeout in seconds.
    #[arg(long, env = "MEFI2BOOK_FETCH_TIMEOUT", default_value_t = 30)]
    fetch_timeout: u64,

    /// Per-pass renderer timeout in seconds.
    #[arg(
        long,
        env = "MEFI2BOOK_RENDER_TIMEOUT",
        default_value_t = 180,
        long_help = "Per-pass renderer timeout in seconds. Each compilation renders twice; \
          the timeout applies to each pass separately. Threads with thousands of comments \
          can need more than the default."
    )]
    render_timeout: u64,

    /// Fetch and extract only; print what the book would contain.
    #[arg(long)]
    inspect_only: bool,

    /// Output the result as JSON instead of a summary line.
    #[arg(long, env = "MEFI2BOOK_JSON")]
    json: bool,

    /// Disable the stage progress display.
    #[arg(long, env = "MEFI2BOOK_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MEFI2BOOK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MEFI2BOOK_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SubsiteArg {
    Www,
    Ask,
    Metatalk,
}

impl From<SubsiteArg> for Subsite {
    fn from(v: SubsiteArg) -> Self {
        match v {
            SubsiteArg::Www => Subsite::Www,
            SubsiteArg::Ask => Subsite::Ask,
            SubsiteArg::Metatalk => Subsite::Metatalk,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the stage display is active;
    // the spinner lines carry the same information.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let subsite = Subsite::from(cli.subsite);

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let config = build_config(&cli, None)?;
        let thread = inspect(subsite, cli.thread_id, &config)
            .await
            .context("Inspection failed")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&thread).context("Failed to serialise thread")?
            );
        } else {
            println!("Thread:     {}", thread.canonical_url(&config.domain));
            println!("Title:      {}", thread.title);
            println!("Posted:     {}", thread.date);
            println!("Author:     {}", thread.post.author);
            println!(
                "Comments:   {} extracted / {} stated",
                thread.authored_comment_count(),
                thread.comment_total
            );
            println!("Tags:       {}", thread.tags.join(", "));
            let closed = thread.comments.last().is_some_and(|c| c.closes_thread);
            println!("Closed:     {}", if closed { "yes" } else { "no" });
        }
        return Ok(());
    }

    // ── Compile ──────────────────────────────────────────────────────────
    let progress: Option<StageObserver> = if show_progress {
        Some(CliStageCallback::new() as Arc<dyn StageCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress)?;

    let output = compile(subsite, cli.thread_id, &config)
        .await
        .context("Book compilation failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{}  {}  {}",
            green("✔"),
            bold(&output.output_path.display().to_string()),
            dim(&format!(
                "{} main pages, {} contributors, {}ms",
                output.page_count, output.contributor_count, output.stats.total_ms
            )),
        );
    }

    Ok(())
}

/// Map CLI args to `BookConfig`.
fn build_config(cli: &Cli, progress: Option<StageObserver>) -> Result<BookConfig> {
    let mut builder = BookConfig::builder()
        .cache_dir(&cli.cache_dir)
        .output_dir(&cli.output_dir)
        .force_refresh(cli.no_cache)
        .fetch_timeout_secs(cli.fetch_timeout)
        .render_timeout_secs(cli.render_timeout);

    if let Some(cb) = progress {
        builder = builder.progress(cb);
    }

    builder.build().context("Invalid configuration")
}
