//! Contributor index: per-page text in, alphabetised name→pages listing out.
//!
//! The index is built from the *rendered* book, not the thread data. Page
//! text from the first render pass is scanned for the authorship markers the
//! composer printed, so every page number in the index refers to a page the
//! reader can actually open. That also means the marker pattern here and the
//! marker markup in [`super::compose`] are two halves of one contract.
//!
//! Deduplication is adjacency-only by design: a contributor whose comments
//! span pages 4, 5 and 7 is listed as "4, 5, 7", and repeated markers on one
//! page collapse only while they are consecutive for that name. A name
//! returning to an earlier page after someone else's page never happens in
//! a paginated book, so the simple rule is enough.

use crate::pipeline::compose::escape_html;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The printed authorship marker as `pdftotext -layout` reproduces it: the
/// layout indent, an em dash, one space, then the name up to end of line.
static RE_AUTHOR_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new("   \u{2014} (.*)\n").unwrap());

/// One contributor and the 1-based book pages their comments start on,
/// ascending, without adjacent repeats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub name: String,
    pub pages: Vec<usize>,
}

/// The full contributor index, sorted case-insensitively by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorIndex {
    entries: Vec<IndexEntry>,
}

impl ContributorIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Pages recorded for one contributor, if they appear at all.
    pub fn pages_for(&self, name: &str) -> Option<&[usize]> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.pages.as_slice())
    }

    /// The index section markup the composer injects on the final pass.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str("<div class='indexItem'><span class='indexItemName'>");
            out.push_str(&escape_html(&entry.name));
            out.push_str("</span> ");
            let pages: Vec<String> = entry.pages.iter().map(|p| p.to_string()).collect();
            out.push_str(&pages.join(", "));
            out.push_str("</div>");
        }
        out
    }
}

/// Scan per-page text (index 0 = book page 1) for authorship markers and
/// build the index.
pub fn build_index(pages: &[String]) -> ContributorIndex {
    let mut order: Vec<String> = Vec::new();
    let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();

    for (i, page) in pages.iter().enumerate() {
        let page_number = i + 1;
        for caps in RE_AUTHOR_MARKER.captures_iter(page) {
            let name = caps[1].trim_end().to_string();
            if name.is_empty() {
                continue;
            }
            match by_name.get_mut(&name) {
                None => {
                    by_name.insert(name.clone(), vec![page_number]);
                    order.push(name);
                }
                Some(pages_list) => {
                    if pages_list.last() != Some(&page_number) {
                        pages_list.push(page_number);
                    }
                }
            }
        }
    }

    order.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()));

    let entries = order
        .into_iter()
        .map(|name| {
            let pages = by_name.remove(&name).unwrap_or_default();
            IndexEntry { name, pages }
        })
        .collect();

    ContributorIndex { entries }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn page(markers: &[&str]) -> String {
        let mut out = String::from("some page text\n");
        for m in markers {
            out.push_str("   \u{2014} ");
            out.push_str(m);
            out.push('\n');
            out.push_str("a comment line\n");
        }
        out
    }

    #[test]
    fn test_pages_across_the_book_are_listed_ascending() {
        let pages = vec![
            page(&["alpha"]),          // page 1
            page(&[]),                 // page 2
            page(&["beta", "alpha"]),  // page 3
            page(&["alpha"]),          // page 4
        ];
        let index = build_index(&pages);
        assert_eq!(index.pages_for("alpha"), Some(&[1, 3, 4][..]));
        assert_eq!(index.pages_for("beta"), Some(&[3][..]));
    }

    #[test]
    fn test_nonadjacent_repeats_of_a_page_stay_split() {
        // contributor on pages 4 and 7 with someone else in between
        let mut pages = vec![String::new(); 7];
        pages[3] = page(&["quoLibet"]);
        pages[6] = page(&["quoLibet"]);
        let index = build_index(&pages);
        assert_eq!(index.pages_for("quoLibet"), Some(&[4, 7][..]));
    }

    #[test]
    fn test_adjacent_repeats_on_one_page_collapse() {
        // two comments by the same contributor on page 4, someone else's
        // marker between them on the same page
        let mut pages = vec![String::new(); 4];
        pages[3] = page(&["quoLibet", "other", "quoLibet"]);
        let index = build_index(&pages);
        assert_eq!(index.pages_for("quoLibet"), Some(&[4][..]));
        assert_eq!(index.pages_for("other"), Some(&[4][..]));
    }

    #[test]
    fn test_sorted_case_insensitively() {
        let pages = vec![page(&["zebra", "Apple", "mango"])];
        let index = build_index(&pages);
        let names: Vec<&str> = index.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Apple", "mango", "zebra"]);
    }

    #[test]
    fn test_every_marker_name_is_indexed_once() {
        let pages = vec![
            page(&["a b c", "under_score", "123number"]),
            page(&["a b c"]),
        ];
        let index = build_index(&pages);
        assert_eq!(index.len(), 3);
        assert_eq!(index.pages_for("a b c"), Some(&[1, 2][..]));
        assert_eq!(index.pages_for("under_score"), Some(&[1][..]));
        assert_eq!(index.pages_for("123number"), Some(&[1][..]));
    }

    #[test]
    fn test_marker_shape_is_exact() {
        let loose = vec![
            "  \u{2014} twoSpaces\n".to_string(),
            "   \u{2014}noSpaceAfterDash\n".to_string(),
            "   - hyphenNotDash\n".to_string(),
        ];
        let index = build_index(&loose);
        assert!(index.is_empty());
    }

    #[test]
    fn test_empty_input_builds_an_empty_index() {
        assert!(build_index(&[]).is_empty());
        let blank = vec![String::new(), "no markers here\n".to_string()];
        assert!(build_index(&blank).is_empty());
    }

    #[test]
    fn test_html_listing_escapes_names_and_joins_pages() {
        let pages = vec![
            page(&["a<b"]),
            page(&[]),
            page(&["a<b"]),
        ];
        let html = build_index(&pages).to_html();
        assert_eq!(
            html,
            "<div class='indexItem'><span class='indexItemName'>a&lt;b</span> 1, 3</div>"
        );
    }
}
