//! Structural extraction: raw thread markup in, [`Thread`] out.
//!
//! The extractor owns every site-markup-specific rule in the system. It
//! parses the page read-only and assembles owned data; nothing downstream
//! ever touches the source markup again, which is what makes extraction
//! idempotent over identical cached bytes.
//!
//! Landmarks it relies on: comment containers (`.comments`), the post body
//! (`.copy`), the title block (`.posttitle`) with the date line in its span,
//! the tag list (`#taglist`), and the byline blocks (`.smallcopy`). A page
//! without comment containers, without the "(N comments total)" phrase, or
//! with an unparseable date is rejected as malformed rather than guessed at.
//!
//! Typographic smart-quoting runs over the whole raw document before any
//! parsing (see [`super::typography`]), so quote curling does not depend on
//! how the markup is sliced up afterwards.

use crate::error::Mefi2BookError;
use crate::pipeline::typography;
use crate::thread::{Comment, Post, Subsite, Thread};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, warn};

static SEL_COMMENTS: Lazy<Selector> = Lazy::new(|| Selector::parse(".comments").unwrap());
static SEL_COPY: Lazy<Selector> = Lazy::new(|| Selector::parse(".copy").unwrap());
static SEL_POSTTITLE: Lazy<Selector> = Lazy::new(|| Selector::parse(".posttitle").unwrap());
static SEL_SPAN: Lazy<Selector> = Lazy::new(|| Selector::parse("span").unwrap());
static SEL_TAG_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("#taglist a").unwrap());
static SEL_POSTBYLINE_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".postbyline a").unwrap());
static SEL_SMALLCOPY: Lazy<Selector> = Lazy::new(|| Selector::parse(".smallcopy").unwrap());
static SEL_ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());

static RE_ANSWERS_TOTAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((\d+) answers total\)").unwrap());
static RE_COMMENTS_TOTAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((\d+) comments total\)").unwrap());

/// Trailing site furniture shown to logged-out readers; never a comment.
const LOGIN_PROMPTS: [&str; 2] = ["You are not logged in", "You are not currently logged in"];

/// The three phrasings the platform has used for its closing notice.
const CLOSURE_PHRASINGS: [&str; 3] = [
    "This thread has been archived and is closed to new comments",
    "This thread is closed to new comments. ",
    "This thread is over 30 days old, and has been closed for archival purposes.",
];

/// The single normalized form every closing notice is rewritten to.
const CLOSURE_NOTICE: &str = "This thread has been archived and is closed to new comments";

/// Parse raw thread markup into a [`Thread`].
///
/// Pure: the same bytes always produce the same thread. Fails with
/// [`Mefi2BookError::MalformedSource`] when the page lacks the structural
/// landmarks a thread must have.
pub fn extract_thread(
    raw_markup: &str,
    subsite: Subsite,
    thread_id: u64,
) -> Result<Thread, Mefi2BookError> {
    let educated = typography::educate(raw_markup);
    let doc = Html::parse_document(&educated);

    if doc.select(&SEL_COMMENTS).next().is_none() {
        return Err(malformed("no comment containers found on the page"));
    }

    let comment_total = parse_comment_total(&doc, subsite)?;
    let (title, date) = parse_title_and_date(&doc)?;
    let tags = parse_tags(&doc);
    let post = parse_post(&doc)?;
    let comments = parse_comments(&doc);

    debug!(
        "extracted '{}': {} comments, {} tags, stated total {}",
        title,
        comments.len(),
        tags.len(),
        comment_total
    );

    Ok(Thread {
        subsite,
        id: thread_id,
        title,
        date,
        tags,
        comment_total,
        post,
        comments,
    })
}

fn malformed(detail: impl Into<String>) -> Mefi2BookError {
    Mefi2BookError::MalformedSource {
        detail: detail.into(),
    }
}

// ── Totals ───────────────────────────────────────────────────────────────────

/// The stated total from the "(N comments total)" phrase in the post
/// section; Ask threads phrase it as "answers".
fn parse_comment_total(doc: &Html, subsite: Subsite) -> Result<u64, Mefi2BookError> {
    let text: String = doc.select(&SEL_COPY).map(full_text).collect();
    let re = match subsite {
        Subsite::Ask => &RE_ANSWERS_TOTAL,
        Subsite::Www | Subsite::Metatalk => &RE_COMMENTS_TOTAL,
    };
    let caps = re.captures(&text).ok_or_else(|| {
        malformed(format!(
            "no '(N {} total)' phrase found in the post section",
            subsite.total_noun()
        ))
    })?;
    caps[1]
        .parse::<u64>()
        .map_err(|_| malformed("stated comment total is not a number"))
}

// ── Title and date ───────────────────────────────────────────────────────────

fn parse_title_and_date(doc: &Html) -> Result<(String, NaiveDate), Mefi2BookError> {
    let title_el = doc
        .select(&SEL_POSTTITLE)
        .next()
        .ok_or_else(|| malformed("no post title block found"))?;
    let date_span = title_el
        .select(&SEL_SPAN)
        .next()
        .ok_or_else(|| malformed("no date line inside the post title"))?;

    // The date line also carries favourite counts and feed links in nested
    // elements; only the span's own text is the date.
    let raw_date = text_excluding(date_span, &["span", "a"]);
    let date = parse_post_date(&raw_date).ok_or_else(|| {
        malformed(format!(
            "post date '{}' did not match the 'Month D, YYYY' form",
            raw_date.trim()
        ))
    })?;

    let title = text_excluding(title_el, &["span"]).trim().to_string();
    if title.is_empty() {
        return Err(malformed("post title is empty"));
    }
    Ok((title, date))
}

/// Parse "January 5, 2014 8:32 AM" down to its date; the time of day is
/// byline noise and is ignored.
fn parse_post_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = raw.replace('\u{a0}', " ");
    NaiveDate::parse_and_remainder(cleaned.trim(), "%B %d, %Y")
        .ok()
        .map(|(date, _rest)| date)
}

// ── Tags ─────────────────────────────────────────────────────────────────────

/// Tags come from the link targets, not the display text: the site truncates
/// long tag names visually but the href always carries the full slug.
fn parse_tags(doc: &Html) -> Vec<String> {
    doc.select(&SEL_TAG_LINK)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| {
            let last = href.trim_end_matches('/').rsplit('/').next().unwrap_or("");
            (!last.is_empty()).then(|| last.to_string())
        })
        .collect()
}

// ── Post ─────────────────────────────────────────────────────────────────────

fn parse_post(doc: &Html) -> Result<Post, Mefi2BookError> {
    let copy = doc
        .select(&SEL_COPY)
        .next()
        .ok_or_else(|| malformed("no post body container found"))?;
    let author = doc
        .select(&SEL_POSTBYLINE_LINK)
        .next()
        .map(|a| full_text(a).trim().to_string())
        .unwrap_or_default();
    if author.is_empty() {
        warn!("post byline missing; the author credit will be blank");
    }
    Ok(Post {
        author,
        body_html: clean_inner_html(copy, BodyKind::Post),
    })
}

// ── Comments ─────────────────────────────────────────────────────────────────

fn parse_comments(doc: &Html) -> Vec<Comment> {
    let mut divs: Vec<ElementRef<'_>> = doc.select(&SEL_COMMENTS).collect();

    // Trailing login/subscription prompts are site furniture, not comments.
    while let Some(last) = divs.last() {
        let text = full_text(*last);
        if LOGIN_PROMPTS.iter().any(|p| text.contains(p)) {
            divs.pop();
        } else {
            break;
        }
    }

    // Only the final container can be the closing notice, and the match is
    // exact: a comment merely quoting one of the phrasings stays a comment.
    let closure_at = divs.last().and_then(|last| {
        let text = full_text(*last);
        let trimmed = text.trim();
        CLOSURE_PHRASINGS
            .iter()
            .any(|p| p.trim() == trimmed)
            .then(|| divs.len() - 1)
    });

    let mut comments = Vec::with_capacity(divs.len());
    for (i, div) in divs.iter().enumerate() {
        if Some(i) == closure_at {
            comments.push(Comment::closure(CLOSURE_NOTICE));
            continue;
        }
        let author = div
            .select(&SEL_SMALLCOPY)
            .next()
            .and_then(|byline| byline.select(&SEL_ANCHOR).next())
            .map(|a| full_text(a).trim().to_string())
            .unwrap_or_default();
        if author.is_empty() {
            debug!("comment container {} has no byline; keeping it unattributed", i + 1);
        }
        comments.push(Comment {
            author,
            body_html: clean_inner_html(*div, BodyKind::Comment),
            closes_thread: false,
        });
    }
    comments
}

// ── Clean serialisation ──────────────────────────────────────────────────────
//
// scraper's DOM is read-only, so "remove the furniture" becomes "serialise
// everything except the furniture". The walker re-emits elements with their
// attributes and skips blacklisted subtrees wholesale.

#[derive(Clone, Copy)]
enum BodyKind {
    Post,
    Comment,
}

fn clean_inner_html(el: ElementRef<'_>, kind: BodyKind) -> String {
    let mut out = String::new();
    append_clean_children(el, kind, &mut out);
    out.trim().to_string()
}

fn append_clean_children(el: ElementRef<'_>, kind: BodyKind, out: &mut String) {
    for node in el.children() {
        match node.value() {
            Node::Text(t) => {
                let s: &str = t;
                push_escaped_text(s, out);
            }
            Node::Element(child) => {
                if should_strip(child, kind) {
                    continue;
                }
                if let Some(child_ref) = ElementRef::wrap(node) {
                    push_clean_element(child_ref, kind, out);
                }
            }
            _ => {}
        }
    }
}

fn push_clean_element(el: ElementRef<'_>, kind: BodyKind, out: &mut String) {
    let element = el.value();
    let name = element.name();
    out.push('<');
    out.push_str(name);
    for (attr, value) in element.attrs() {
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        push_escaped_attr(value, out);
        out.push('"');
    }
    out.push('>');
    if is_void_element(name) {
        return;
    }
    append_clean_children(el, kind, out);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

/// Non-content furniture dropped from every body, plus the per-kind rules:
/// post bodies lose all inline spans (the byline lives in one), comment
/// bodies lose their `.smallcopy` byline (the author is carried separately).
fn should_strip(element: &scraper::node::Element, kind: BodyKind) -> bool {
    let name = element.name();
    if name == "script" {
        return true;
    }
    if matches!(element.id(), Some("related" | "threadsub")) {
        return true;
    }
    if element
        .classes()
        .any(|c| matches!(c, "go-to-anchor" | "feedicon" | "whitesmallcopy" | "smallcopy"))
    {
        return true;
    }
    matches!(kind, BodyKind::Post) && name == "span"
}

fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn push_escaped_text(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn push_escaped_attr(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

// ── Text helpers ─────────────────────────────────────────────────────────────

fn full_text(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// All text under `el` except inside descendants with an excluded tag name.
fn text_excluding(el: ElementRef<'_>, excluded: &[&str]) -> String {
    let mut out = String::new();
    collect_text_excluding(el, excluded, &mut out);
    out
}

fn collect_text_excluding(el: ElementRef<'_>, excluded: &[&str], out: &mut String) {
    for node in el.children() {
        match node.value() {
            Node::Text(t) => {
                let s: &str = t;
                out.push_str(s);
            }
            Node::Element(child) => {
                if excluded.contains(&child.name()) {
                    continue;
                }
                if let Some(child_ref) = ElementRef::wrap(node) {
                    collect_text_excluding(child_ref, excluded, out);
                }
            }
            _ => {}
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
