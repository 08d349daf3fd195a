//! Stage-callback trait for pipeline progress events.
//!
//! Inject an [`Arc<dyn StageCallback>`] via
//! [`crate::config::BookConfigBuilder::progress`] to be notified as the
//! compilation pipeline enters each stage.
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a terminal spinner, a log, or a UI without the library
//! knowing anything about how the host application communicates. The trait is
//! `Send + Sync` so a callback can be shared with other tasks while a
//! compilation runs.
//!
//! # Example
//!
//! ```rust
//! use mefi2book::{BookConfig, PipelineStage, StageCallback};
//! use std::sync::Arc;
//!
//! struct PrintStages;
//!
//! impl StageCallback for PrintStages {
//!     fn on_stage(&self, stage: PipelineStage) {
//!         eprintln!("==> {stage}");
//!     }
//! }
//!
//! let config = BookConfig::builder()
//!     .progress(Arc::new(PrintStages) as Arc<dyn StageCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

/// The stages of one compilation run, in execution order.
///
/// The pipeline is strictly sequential; [`StageCallback::on_stage`] fires
/// exactly once per variant on a successful run, in this order. A failed run
/// stops partway with the error naming the stage that broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Loading the raw thread markup from cache or network.
    Acquire,
    /// Structural extraction of post, comments, tags, and totals.
    Extract,
    /// Composing the cover and the indexless body document.
    ComposeFirstPass,
    /// First pagination render, which fixes the page mapping.
    RenderFirstPass,
    /// Reading back per-page plain text from the first-pass PDF.
    ExtractText,
    /// Scanning the page text for authorship markers.
    BuildIndex,
    /// Re-composing the body with the contributor index injected.
    ComposeFinal,
    /// Final pagination render, producing the delivered artifact.
    RenderFinal,
    /// The finished book is in place.
    Done,
}

impl PipelineStage {
    /// Short human-readable label, suitable for a progress line.
    pub fn label(self) -> &'static str {
        match self {
            PipelineStage::Acquire => "fetching thread",
            PipelineStage::Extract => "extracting content",
            PipelineStage::ComposeFirstPass => "composing book",
            PipelineStage::RenderFirstPass => "rendering first pass",
            PipelineStage::ExtractText => "reading page text",
            PipelineStage::BuildIndex => "building contributor index",
            PipelineStage::ComposeFinal => "injecting contributor index",
            PipelineStage::RenderFinal => "rendering final book",
            PipelineStage::Done => "done",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Called by the pipeline as it enters each stage.
///
/// The single method has a default no-op implementation so implementors can
/// be unit structs when they only exist to satisfy the type.
pub trait StageCallback: Send + Sync {
    /// Called at each stage transition, [`PipelineStage::Done`] included.
    fn on_stage(&self, stage: PipelineStage) {
        let _ = stage;
    }
}

/// A no-op implementation for callers that don't need stage events.
pub struct NoopStageCallback;

impl StageCallback for NoopStageCallback {}

/// Convenience alias matching the type stored in [`crate::config::BookConfig`].
pub type StageObserver = Arc<dyn StageCallback>;
