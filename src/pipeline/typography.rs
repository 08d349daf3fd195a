//! Typographic preparation of raw thread markup.
//!
//! Straight quotes, double hyphens, and three-dot ellipses read fine on the
//! web but look cheap on a printed page. This module curls and widens them
//! across the whole raw document *before* structural parsing, so the
//! transform does not care how the markup is later sliced into post and
//! comments.
//!
//! The walk is tag-aware: tag internals (attribute values included) pass
//! through untouched, and text inside `pre`, `code`, `kbd`, `script`,
//! `style`, and `textarea` elements is left verbatim. Quote direction is
//! decided from the preceding visible character, carried across inline tags
//! so `said <i>"yes"</i>` still opens correctly.
//!
//! Rules (applied in order):
//! 1. Unfold `&quot;` entities so the quote pass can see them
//! 2. `---` → em dash, `--` → en dash
//! 3. `...` → ellipsis
//! 4. Straight double/single quotes → curly, chosen by context

use once_cell::sync::Lazy;
use regex::Regex;

/// Elements whose text content must never be retypeset.
const VERBATIM_TAGS: [&str; 6] = ["pre", "code", "kbd", "script", "style", "textarea"];

/// Apply all typographic rules to a raw markup string.
pub fn educate(input: &str) -> String {
    let unfolded = unfold_quote_entities(input);
    let mut out = String::with_capacity(unfolded.len() + 16);
    let mut verbatim_depth = 0usize;
    let mut last_visible: Option<char> = None;

    let mut rest = unfolded.as_str();
    while !rest.is_empty() {
        match rest.find('<') {
            Some(0) => {
                let end = rest.find('>').map(|i| i + 1).unwrap_or(rest.len());
                let tag = &rest[..end];
                match verbatim_delta(tag) {
                    1 => verbatim_depth += 1,
                    -1 => verbatim_depth = verbatim_depth.saturating_sub(1),
                    _ => {}
                }
                out.push_str(tag);
                rest = &rest[end..];
            }
            Some(i) => {
                let (text, tail) = rest.split_at(i);
                push_text(&mut out, text, verbatim_depth > 0, &mut last_visible);
                rest = tail;
            }
            None => {
                push_text(&mut out, rest, verbatim_depth > 0, &mut last_visible);
                rest = "";
            }
        }
    }
    out
}

// ── Rule 1: Unfold &quot; entities ───────────────────────────────────────────

static RE_QUOT_ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)&quot;").unwrap());

fn unfold_quote_entities(input: &str) -> String {
    RE_QUOT_ENTITY.replace_all(input, "\"").to_string()
}

// ── Tag classification ───────────────────────────────────────────────────────

/// How a tag changes the verbatim nesting depth: +1 opens a verbatim
/// element, -1 closes one, 0 for everything else (self-closing included).
fn verbatim_delta(tag: &str) -> i32 {
    let inner = tag.trim_start_matches('<').trim_end_matches('>');
    let closing = inner.starts_with('/');
    let name: String = inner
        .trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    if !VERBATIM_TAGS.contains(&name.as_str()) {
        0
    } else if closing {
        -1
    } else if inner.ends_with('/') {
        0
    } else {
        1
    }
}

// ── Text runs ────────────────────────────────────────────────────────────────

fn push_text(out: &mut String, text: &str, verbatim: bool, last_visible: &mut Option<char>) {
    if text.is_empty() {
        return;
    }
    if verbatim {
        out.push_str(text);
        *last_visible = text.chars().last();
        return;
    }
    let widened = smarten_dashes_and_ellipses(text);
    let curled = smarten_quotes(&widened, *last_visible);
    *last_visible = curled.chars().last();
    out.push_str(&curled);
}

// ── Rules 2 & 3: dashes and ellipses ─────────────────────────────────────────

fn smarten_dashes_and_ellipses(text: &str) -> String {
    text.replace("---", "\u{2014}")
        .replace("--", "\u{2013}")
        .replace("...", "\u{2026}")
}

// ── Rule 4: quotes ───────────────────────────────────────────────────────────

/// True when a quote at this position should open rather than close.
///
/// `prev` is the already-transformed preceding character, carried across tag
/// boundaries; `None` means start of document.
fn is_opening_context(prev: Option<char>) -> bool {
    match prev {
        None => true,
        Some(c) => {
            c.is_whitespace()
                || matches!(
                    c,
                    '(' | '[' | '{' | '-' | '/' | '\u{2013}' | '\u{2014}' | '\u{201C}' | '\u{2018}'
                )
        }
    }
}

fn smarten_quotes(text: &str, carried: Option<char>) -> String {
    let mut out = String::with_capacity(text.len());
    let chars: Vec<char> = text.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        let prev = out.chars().last().or(carried);
        let next = chars.get(i + 1).copied();
        match c {
            '"' => {
                if is_opening_context(prev) {
                    out.push('\u{201C}');
                } else {
                    out.push('\u{201D}');
                }
            }
            '\'' => {
                let prev_alnum = prev.map(char::is_alphanumeric).unwrap_or(false);
                let next_alnum = next.map(char::is_alphanumeric).unwrap_or(false);
                if prev_alnum && next_alnum {
                    // mid-word apostrophe: don't, it's
                    out.push('\u{2019}');
                } else if is_opening_context(prev) && next.map(|n| n.is_ascii_digit()).unwrap_or(false)
                {
                    // decade abbreviation: '90s
                    out.push('\u{2019}');
                } else if is_opening_context(prev) && next_alnum {
                    out.push('\u{2018}');
                } else {
                    out.push('\u{2019}');
                }
            }
            _ => out.push(c),
        }
    }
    out
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unfolds_quot_entities_case_insensitively() {
        assert_eq!(educate("&quot;hi&QUOT;"), "\u{201C}hi\u{201D}");
    }

    #[test]
    fn test_double_quotes_curl_by_context() {
        assert_eq!(
            educate("He said, \"come in.\" Then left."),
            "He said, \u{201C}come in.\u{201D} Then left."
        );
    }

    #[test]
    fn test_apostrophes_and_single_quotes() {
        assert_eq!(educate("don't"), "don\u{2019}t");
        assert_eq!(educate("'quoted'"), "\u{2018}quoted\u{2019}");
        assert_eq!(educate("the '90s"), "the \u{2019}90s");
    }

    #[test]
    fn test_dashes() {
        assert_eq!(educate("a -- b --- c"), "a \u{2013} b \u{2014} c");
    }

    #[test]
    fn test_ellipsis() {
        assert_eq!(educate("wait..."), "wait\u{2026}");
    }

    #[test]
    fn test_attribute_values_pass_through() {
        let input = "<a href=\"http://x.test/a--b\">\"hi\"</a>";
        let out = educate(input);
        assert!(out.contains("href=\"http://x.test/a--b\""), "got: {out}");
        assert!(out.contains("\u{201C}hi\u{201D}"));
    }

    #[test]
    fn test_pre_and_code_left_verbatim() {
        let input = "<p>\"a\"</p><pre>keep \"straight\" -- here...</pre><code>x--y</code>";
        let out = educate(input);
        assert!(out.contains("<pre>keep \"straight\" -- here...</pre>"));
        assert!(out.contains("<code>x--y</code>"));
        assert!(out.contains("\u{201C}a\u{201D}"));
    }

    #[test]
    fn test_context_carries_across_inline_tags() {
        let out = educate("said <i>\"yes\"</i>");
        assert_eq!(out, "said <i>\u{201C}yes\u{201D}</i>");
    }

    #[test]
    fn test_nested_quotes() {
        assert_eq!(
            educate("\"'within'\""),
            "\u{201C}\u{2018}within\u{2019}\u{201D}"
        );
    }

    #[test]
    fn test_unterminated_tag_does_not_panic() {
        let out = educate("text <a href=");
        assert!(out.ends_with("<a href="));
    }
}
