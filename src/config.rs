//! Configuration types for thread-to-book compilation.
//!
//! All compilation behaviour is controlled through [`BookConfig`], built via
//! its [`BookConfigBuilder`]. Keeping every knob in one immutable struct
//! makes runs reproducible: two runs with equal configs over the same cached
//! markup produce the same book, and a config can be logged to explain why
//! two outputs differ. There is no ambient mutable state anywhere in the
//! library.

use crate::error::Mefi2BookError;
use crate::progress::StageCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for one thread-to-book compilation.
///
/// Built via [`BookConfig::builder()`] or using [`BookConfig::default()`].
///
/// # Example
/// ```rust
/// use mefi2book::BookConfig;
///
/// let config = BookConfig::builder()
///     .cache_dir("/tmp/mefi2book_cache")
///     .force_refresh(true)
///     .render_timeout_secs(300)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct BookConfig {
    /// Root domain of the site, without a subsite prefix or scheme.
    /// Default: `metafilter.com`.
    ///
    /// The fetch URL is assembled as `http://{subsite}.{domain}/{id}` and the
    /// cover prints the scheme-less form. Overridable so tests can point the
    /// pipeline at a local fixture server.
    pub domain: String,

    /// Directory holding per-thread cache artifacts (raw markup, composed
    /// cover and body, first-pass PDF). Default: `mefi2book_cache`.
    ///
    /// Created on first use. Artifacts are plain files named after the
    /// thread, so the directory can be inspected or deleted freely between
    /// runs; deleting it only costs a re-fetch and re-render.
    pub cache_dir: PathBuf,

    /// Directory the final PDF is written into. Default: current directory.
    pub output_dir: PathBuf,

    /// Ignore any cached raw markup and fetch fresh bytes. Default: false.
    ///
    /// The fresh copy still overwrites the cached one, so a later run
    /// without this flag picks it up. Composed artifacts are regenerated on
    /// every run either way; only the raw markup is ever read back.
    pub force_refresh: bool,

    /// Physical page geometry handed to the pagination renderer.
    /// Default: [`PageGeometry::default()`], a 6 in × 9 in trade book.
    pub geometry: PageGeometry,

    /// HTTP fetch timeout in seconds. Default: 30.
    pub fetch_timeout_secs: u64,

    /// Pagination renderer timeout in seconds, applied to each of the two
    /// render passes separately. Default: 180.
    ///
    /// Rendering time grows with comment count; threads with thousands of
    /// comments can legitimately take a couple of minutes per pass.
    pub render_timeout_secs: u64,

    /// Page-text extractor timeout in seconds. Default: 60.
    pub extract_timeout_secs: u64,

    /// Observer notified at each pipeline stage transition. Default: none.
    pub progress: Option<Arc<dyn StageCallback>>,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            domain: "metafilter.com".to_string(),
            cache_dir: PathBuf::from("mefi2book_cache"),
            output_dir: PathBuf::from("."),
            force_refresh: false,
            geometry: PageGeometry::default(),
            fetch_timeout_secs: 30,
            render_timeout_secs: 180,
            extract_timeout_secs: 60,
            progress: None,
        }
    }
}

impl fmt::Debug for BookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BookConfig")
            .field("domain", &self.domain)
            .field("cache_dir", &self.cache_dir)
            .field("output_dir", &self.output_dir)
            .field("force_refresh", &self.force_refresh)
            .field("geometry", &self.geometry)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("render_timeout_secs", &self.render_timeout_secs)
            .field("extract_timeout_secs", &self.extract_timeout_secs)
            .field("progress", &self.progress.as_ref().map(|_| "<dyn StageCallback>"))
            .finish()
    }
}

impl BookConfig {
    /// Create a new builder for `BookConfig`.
    pub fn builder() -> BookConfigBuilder {
        BookConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`BookConfig`].
#[derive(Debug)]
pub struct BookConfigBuilder {
    config: BookConfig,
}

impl BookConfigBuilder {
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.config.domain = domain.into();
        self
    }

    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn force_refresh(mut self, v: bool) -> Self {
        self.config.force_refresh = v;
        self
    }

    pub fn geometry(mut self, geometry: PageGeometry) -> Self {
        self.config.geometry = geometry;
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs.max(1);
        self
    }

    pub fn render_timeout_secs(mut self, secs: u64) -> Self {
        self.config.render_timeout_secs = secs.max(1);
        self
    }

    pub fn extract_timeout_secs(mut self, secs: u64) -> Self {
        self.config.extract_timeout_secs = secs.max(1);
        self
    }

    pub fn progress(mut self, callback: Arc<dyn StageCallback>) -> Self {
        self.config.progress = Some(callback);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BookConfig, Mefi2BookError> {
        let c = &self.config;
        if c.domain.trim().is_empty() {
            return Err(Mefi2BookError::InvalidConfig(
                "domain must not be empty".into(),
            ));
        }
        if c.domain.contains("://") {
            return Err(Mefi2BookError::InvalidConfig(format!(
                "domain must not include a scheme, got '{}'",
                c.domain
            )));
        }
        if c.geometry.page_height.trim().is_empty() || c.geometry.page_width.trim().is_empty() {
            return Err(Mefi2BookError::InvalidConfig(
                "page geometry must specify both height and width".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Page geometry ────────────────────────────────────────────────────────

/// Physical layout parameters passed through to the pagination renderer.
///
/// Dimensions are strings in whatever unit the renderer accepts (`9in`,
/// `152mm`, …) because they are forwarded verbatim as command-line flags.
/// The defaults describe a 6 in × 9 in trade book with a generous bottom
/// margin carrying a small centred page-number footer.
///
/// Geometry is part of the book's identity: the contributor index maps
/// authors to physical pages, so changing any of these between the two
/// render passes would silently invalidate the index. One immutable value
/// shared by both passes makes that impossible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageGeometry {
    /// Page height. Default: `9in`.
    pub page_height: String,
    /// Page width. Default: `6in`.
    pub page_width: String,
    /// Top margin. Default: `0.6in`.
    pub margin_top: String,
    /// Bottom margin. Default: `0.9in`, leaving room for the footer.
    pub margin_bottom: String,
    /// Left margin. Default: `0.7in`.
    pub margin_left: String,
    /// Right margin. Default: `0.7in`.
    pub margin_right: String,
    /// Footer template centred on every content page. Default: `[page]`,
    /// which the renderer substitutes with the current page number.
    pub footer_center: String,
    /// Footer font size in points. Default: 8.
    pub footer_font_size: u32,
    /// Spacing between footer and body in millimetres. Default: 8.
    pub footer_spacing: u32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            page_height: "9in".to_string(),
            page_width: "6in".to_string(),
            margin_top: "0.6in".to_string(),
            margin_bottom: "0.9in".to_string(),
            margin_left: "0.7in".to_string(),
            margin_right: "0.7in".to_string(),
            footer_center: "[page]".to_string(),
            footer_font_size: 8,
            footer_spacing: 8,
        }
    }
}
