//! Thread data model: the structured form of one discussion thread.
//!
//! A [`Thread`] is built exactly once per run by the content extractor and is
//! immutable afterwards. Composition and indexing read from it but never
//! write back; the page order captured here is the book order.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three MetaFilter subsites a thread can live on.
///
/// The subsite decides the host the thread is fetched from, the cover-page
/// branding, and the noun used by the thread's own total line ("answers" on
/// Ask, "comments" everywhere else).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subsite {
    /// The main site, www.metafilter.com. (default)
    #[default]
    Www,
    /// Ask MetaFilter: question threads.
    Ask,
    /// MetaTalk: the feature-request and policy subsite.
    Metatalk,
}

impl Subsite {
    /// Host prefix used for URLs and artifact names.
    pub fn host_prefix(self) -> &'static str {
        match self {
            Subsite::Www => "www",
            Subsite::Ask => "ask",
            Subsite::Metatalk => "metatalk",
        }
    }

    /// Cover text placed immediately before the site name.
    pub fn display_prefix(self) -> &'static str {
        match self {
            Subsite::Www => "",
            Subsite::Ask => "Ask ",
            Subsite::Metatalk => "Metatalk on ",
        }
    }

    /// Cover tagline under the site name.
    pub fn tagline(self) -> &'static str {
        match self {
            Subsite::Www => "community weblog",
            Subsite::Ask => "Querying the Hive Mind",
            Subsite::Metatalk => "Feature Requests, Bugs, Etc.",
        }
    }

    /// Noun the thread page uses in its "(N … total)" line.
    pub fn total_noun(self) -> &'static str {
        match self {
            Subsite::Ask => "answers",
            Subsite::Www | Subsite::Metatalk => "comments",
        }
    }

    /// Stem shared by every on-disk artifact for one thread:
    /// `{subsite}_metafilter_{id}`.
    pub fn artifact_stem(self, thread_id: u64) -> String {
        format!("{}_metafilter_{}", self.host_prefix(), thread_id)
    }
}

impl fmt::Display for Subsite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.host_prefix())
    }
}

impl FromStr for Subsite {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "www" | "metafilter" => Ok(Subsite::Www),
            "ask" => Ok(Subsite::Ask),
            "metatalk" => Ok(Subsite::Metatalk),
            other => Err(format!(
                "unknown subsite '{other}' (expected www, ask, or metatalk)"
            )),
        }
    }
}

/// One fully-extracted discussion thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub subsite: Subsite,
    pub id: u64,
    /// Post title, trimmed display text.
    pub title: String,
    /// Publication date, parsed from the "Month D, YYYY" byline form.
    pub date: NaiveDate,
    /// Tags in page order, taken from link targets rather than display text.
    pub tags: Vec<String>,
    /// Total comment/answer count as stated by the thread page itself.
    ///
    /// This is the site's figure, not `comments.len()`; the two can differ
    /// when comments were deleted after posting.
    pub comment_total: u64,
    pub post: Post,
    /// Comments in page order. Never re-sorted.
    pub comments: Vec<Comment>,
}

impl Thread {
    /// Canonical reader-facing URL, scheme-less: `ask.metafilter.com/12345`.
    pub fn canonical_url(&self, domain: &str) -> String {
        format!("{}.{}/{}", self.subsite.host_prefix(), domain, self.id)
    }

    /// Number of comments that carry an author (the closing notice has none).
    pub fn authored_comment_count(&self) -> usize {
        self.comments.iter().filter(|c| !c.closes_thread).count()
    }
}

/// The opening post: author plus sanitised body markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub author: String,
    pub body_html: String,
}

/// A single comment: author plus sanitised body markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Display name of the commenter. Empty for the closing notice.
    pub author: String,
    pub body_html: String,
    /// True when this entry is the platform's thread-closure notice rather
    /// than a contribution. It renders as a distinct block, gets no
    /// authorship marker, and never reaches the contributor index.
    pub closes_thread: bool,
}

impl Comment {
    /// An authored comment in page order.
    pub fn new(author: impl Into<String>, body_html: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            body_html: body_html.into(),
            closes_thread: false,
        }
    }

    /// The thread-closure notice block.
    pub fn closure(body_html: impl Into<String>) -> Self {
        Self {
            author: String::new(),
            body_html: body_html.into(),
            closes_thread: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subsite_round_trips_through_str() {
        for s in [Subsite::Www, Subsite::Ask, Subsite::Metatalk] {
            assert_eq!(s.to_string().parse::<Subsite>().unwrap(), s);
        }
    }

    #[test]
    fn subsite_rejects_unknown_names() {
        assert!("fanfare".parse::<Subsite>().is_err());
    }

    #[test]
    fn ask_counts_answers_everyone_else_counts_comments() {
        assert_eq!(Subsite::Ask.total_noun(), "answers");
        assert_eq!(Subsite::Www.total_noun(), "comments");
        assert_eq!(Subsite::Metatalk.total_noun(), "comments");
    }

    #[test]
    fn artifact_stem_format() {
        assert_eq!(
            Subsite::Ask.artifact_stem(123456),
            "ask_metafilter_123456"
        );
    }

    #[test]
    fn canonical_url_is_scheme_less() {
        let t = Thread {
            subsite: Subsite::Metatalk,
            id: 24000,
            title: "t".into(),
            date: NaiveDate::from_ymd_opt(2014, 1, 5).unwrap(),
            tags: vec![],
            comment_total: 0,
            post: Post {
                author: "a".into(),
                body_html: String::new(),
            },
            comments: vec![],
        };
        assert_eq!(t.canonical_url("metafilter.com"), "metatalk.metafilter.com/24000");
    }

    #[test]
    fn authored_count_skips_the_closure_notice() {
        let t = Thread {
            subsite: Subsite::Www,
            id: 1,
            title: "t".into(),
            date: NaiveDate::from_ymd_opt(2014, 1, 5).unwrap(),
            tags: vec![],
            comment_total: 2,
            post: Post {
                author: "a".into(),
                body_html: String::new(),
            },
            comments: vec![
                Comment::new("alpha", "<p>hi</p>"),
                Comment::new("beta", "<p>ho</p>"),
                Comment::closure("closed"),
            ],
        };
        assert_eq!(t.authored_comment_count(), 2);
    }
}
