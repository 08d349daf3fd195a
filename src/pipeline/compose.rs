//! Book composition: [`Thread`] in, print-ready cover and body HTML out.
//!
//! Composition is pure string assembly. Both templates are embedded in the
//! binary, so a build never depends on files lying around next to it. The
//! body is composed twice per run: once without the contributor index to
//! establish pagination, once with the index filled in.
//!
//! Two rendering details matter downstream:
//!
//! * every authored comment is preceded by an italic authorship marker
//!   (`— name`), and the page-text pass later recognises exactly that
//!   marker shape when attributing pages, so its markup and indentation
//!   stay in lockstep with [`super::index`];
//! * anchors keep their `href` but have their inner markup flattened to
//!   plain text, because ink cannot be clicked and nested markup inside
//!   links prints badly.

use crate::config::BookConfig;
use crate::pipeline::index::ContributorIndex;
use crate::thread::Thread;
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

static RE_ANCHOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)(<a\b[^>]*>)(.*?)(</a>)").unwrap());
static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

// ── Embedded templates ───────────────────────────────────────────────────────

const DEFAULT_COVER_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<style>
  body { font-family: Georgia, 'Times New Roman', serif; color: #000; text-align: center; margin: 0; }
  .bookCover { padding-top: 1.1in; }
  .threadNumber { font-size: 13px; letter-spacing: 0.25em; }
  .bookTitle { font-size: 26px; margin: 1.4em 0.8em 0.5em 0.8em; line-height: 1.25; }
  .bookDate { font-size: 13px; font-style: italic; }
  .rule { width: 1.6in; border-top: 1px solid #000; margin: 1.6em auto; }
  .siteName { font-size: 17px; letter-spacing: 0.12em; }
  .tagline { font-size: 11px; font-style: italic; margin-top: 0.4em; }
  .commentTotal { font-size: 11px; margin-top: 2.4em; }
  .topics { font-size: 10px; margin: 2em 0.8in 0 0.8in; line-height: 1.8; }
  .threadUrl { font-size: 9px; margin-top: 2.6em; color: #444; }
  .copyright { font-size: 9px; margin-top: 1.2em; color: #444; }
</style>
</head>
<body>
<div class="bookCover">
  <div class="threadNumber"><i>N&deg; {{THREAD_NUMBER}}</i></div>
  <div class="bookTitle">{{TITLE}}</div>
  <div class="bookDate">{{DATE_LONG}}</div>
  <div class="rule"></div>
  <div class="siteName">{{SUBSITE_PREFIX}}MetaFilter</div>
  <div class="tagline">{{SUBSITE_TAGLINE}}</div>
  <div class="commentTotal">{{COMMENT_TOTAL}} {{TOTAL_NOUN}} total</div>
  <div class="topics">{{TOPICS}}</div>
  <div class="threadUrl">{{THREAD_URL}}</div>
  <div class="copyright">&copy; {{COPYRIGHT_YEAR}} the contributors</div>
</div>
</body>
</html>
"#;

const DEFAULT_BODY_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<style>
  body { font-family: Georgia, 'Times New Roman', serif; font-size: 11px; line-height: 1.45; color: #000; margin: 0; }
  a { color: #000; text-decoration: none; }
  .linkfix { border-bottom: 1px dotted #555; }
  .sectionHead { text-align: center; font-size: 13px; margin: 2.2em 0 1.8em 0; }
  .circle { font-size: 11px; }
  .postAuthor { font-style: italic; margin-top: 1.1em; }
  .comments { margin-top: 1.1em; }
  .commentName { font-style: italic; margin: 0 0 0.35em 2em; }
  .spacer { text-align: center; font-size: 9px; margin: 1.3em 0; }
  .closedThread { text-align: center; font-style: italic; margin: 2.5em 1em; }
  .contributorIndex { page-break-before: always; }
  .indexItem { margin-bottom: 0.4em; }
  .indexItemName { font-style: italic; }
  img { max-width: 100%; }
  blockquote { margin: 0.8em 1.5em; }
</style>
</head>
<body>
<div class="main">{{MAIN}}</div>
<div class="contributorIndex">{{CONTRIBUTOR_INDEX}}</div>
</body>
</html>
"#;

const SECTION_HEAD_POST: &str = "<div class='sectionHead'><span class='circle'>\u{25e6}</span> \
     &nbsp; T H E &nbsp; P O S T &nbsp; <span class='circle'>\u{25e6}</span></div>";
const SECTION_HEAD_COMMENTS: &str = "<div class='sectionHead'><span class='circle'>\u{25e6}</span> \
     &nbsp; T H E &nbsp; C O M M E N T S &nbsp; <span class='circle'>\u{25e6}</span></div>";
const SECTION_HEAD_CONTRIBUTORS: &str =
    "<div class='sectionHead'><span class='circle'>\u{25e6}</span> \
     &nbsp; T H E &nbsp; C O N T R I B U T O R S &nbsp; <span class='circle'>\u{25e6}</span></div>";

// ── Cover ────────────────────────────────────────────────────────────────────

/// Fill the cover template from the thread's front matter.
pub fn compose_cover(thread: &Thread, config: &BookConfig) -> String {
    DEFAULT_COVER_TEMPLATE
        .replace("{{THREAD_NUMBER}}", &thread.id.to_string())
        .replace("{{TITLE}}", &escape_html(&thread.title))
        .replace("{{DATE_LONG}}", &long_date(thread.date))
        .replace("{{SUBSITE_PREFIX}}", thread.subsite.display_prefix())
        .replace("{{SUBSITE_TAGLINE}}", thread.subsite.tagline())
        .replace("{{COMMENT_TOTAL}}", &group_thousands(thread.comment_total))
        .replace("{{TOTAL_NOUN}}", thread.subsite.total_noun())
        .replace("{{TOPICS}}", &topic_line(&thread.tags))
        .replace("{{THREAD_URL}}", &thread.canonical_url(&config.domain))
        .replace("{{COPYRIGHT_YEAR}}", &thread.date.format("%Y").to_string())
}

/// Numbered topic list; each entry is kept on one line, the last drops the
/// trailing comma.
fn topic_line(tags: &[String]) -> String {
    let mut spans: Vec<String> = tags
        .iter()
        .enumerate()
        .map(|(i, tag)| {
            format!(
                "<span style='white-space:nowrap;'>{}. {},</span>",
                i + 1,
                escape_html(tag)
            )
        })
        .collect();
    if let Some(last) = spans.last_mut() {
        *last = last.replace(",</span>", "</span>");
    }
    spans.join(" ")
}

// ── Body ─────────────────────────────────────────────────────────────────────

/// Assemble the full book body. Pass `None` for the first render; pass the
/// built index for the final one. Everything else is identical between the
/// two calls, which is what keeps the main-text pagination stable.
pub fn compose_body(thread: &Thread, index: Option<&ContributorIndex>) -> String {
    let mut main = String::new();

    main.push_str(SECTION_HEAD_POST);
    main.push_str("<div class='copy'>");
    main.push_str(&thread.post.body_html);
    main.push_str("<div class='postAuthor'>&mdash; posted by ");
    main.push_str(&escape_html(&thread.post.author));
    main.push_str("</div></div>");
    main.push_str(SECTION_HEAD_COMMENTS);

    let mut first = true;
    for comment in &thread.comments {
        if comment.closes_thread {
            main.push_str("<div class='comments'><div class='closedThread'>");
            main.push_str(&escape_html(&comment.body_html));
            main.push_str("</div></div>");
            continue;
        }
        if !first {
            main.push_str("<div class='spacer'>\u{2738}</div>");
        }
        first = false;
        main.push_str("<div class='comments'>");
        if !comment.author.is_empty() {
            main.push_str("<div class='commentName'>&mdash; ");
            main.push_str(&escape_html(&comment.author));
            main.push_str("</div>");
        }
        main.push_str(&comment.body_html);
        main.push_str("</div>");
    }

    let main = flatten_links(&main);

    let index_html = match index {
        Some(idx) if !idx.is_empty() => {
            format!("{}{}", SECTION_HEAD_CONTRIBUTORS, idx.to_html())
        }
        _ => String::new(),
    };

    DEFAULT_BODY_TEMPLATE
        .replace("{{MAIN}}", &main)
        .replace("{{CONTRIBUTOR_INDEX}}", &index_html)
}

/// Rewrite every anchor so its visible content is the plain text of whatever
/// it used to contain, wrapped in a `linkfix` span.
fn flatten_links(html: &str) -> String {
    RE_ANCHOR
        .replace_all(html, |caps: &regex::Captures<'_>| {
            let inner_text = RE_TAG.replace_all(&caps[2], "");
            format!(
                "{}<span class='linkfix'>{}</span>{}",
                &caps[1], inner_text, &caps[3]
            )
        })
        .into_owned()
}

// ── Formatting helpers ───────────────────────────────────────────────────────

/// "January 5th, 2014" style long date for the cover.
pub(crate) fn long_date(date: NaiveDate) -> String {
    format!(
        "{} {}, {}",
        date.format("%B"),
        ordinal_day(date.day()),
        date.format("%Y")
    )
}

pub(crate) fn ordinal_day(day: u32) -> String {
    let suffix = if (11..=13).contains(&(day % 100)) {
        "th"
    } else {
        match day % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        }
    };
    format!("{day}{suffix}")
}

/// 1234567 -> "1,234,567".
pub(crate) fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub(crate) fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ── Tests ────────────────────────────────────────────────────────────────────
