//! Output types returned by the compilation entry points.

use crate::pipeline::index::ContributorIndex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of a successful book compilation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookOutput {
    /// Where the final PDF landed.
    pub output_path: PathBuf,
    /// Physical page count of the first render pass, cover included. The
    /// final book adds the contributor-index pages on top of this.
    pub page_count: usize,
    /// Distinct contributors in the index.
    pub contributor_count: usize,
    /// The contributor index exactly as printed in the book.
    pub index: ContributorIndex,
    /// Phase timings and source accounting.
    pub stats: BookStats,
}

/// Phase timings and source accounting for one compilation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookStats {
    pub acquire_ms: u64,
    pub extract_ms: u64,
    pub first_render_ms: u64,
    pub page_text_ms: u64,
    pub index_ms: u64,
    pub final_render_ms: u64,
    pub total_ms: u64,
    /// Whether the raw markup came from the on-disk cache.
    pub from_cache: bool,
    /// Comments carried into the book (the closing notice is not one).
    pub comment_count: usize,
    pub tag_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_survives_a_json_round_trip() {
        let output = BookOutput {
            output_path: PathBuf::from("www_metafilter_137018.pdf"),
            page_count: 58,
            contributor_count: 41,
            index: ContributorIndex::default(),
            stats: BookStats {
                total_ms: 12345,
                from_cache: true,
                comment_count: 212,
                tag_count: 6,
                ..BookStats::default()
            },
        };
        let json = serde_json::to_string(&output).unwrap();
        let back: BookOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(back.output_path, output.output_path);
        assert_eq!(back.page_count, 58);
        assert!(back.stats.from_cache);
        assert_eq!(back.stats.comment_count, 212);
    }
}
