//! Listing field heuristics for OCR output.
//!
//! Turns raw recognized text into a title, a price and a description.
//! These never fail: when nothing qualifies the field is `NOT_FOUND`, so a
//! partially readable screenshot still yields a usable result.
//!
//! The thresholds below were tuned by hand against real listing pages. They
//! are not derived from anything; change them only when recalibrating.

use crate::profiles::SiteProfile;
use regex::Regex;
use std::sync::OnceLock;

/// Sentinel for a field with no acceptable candidate.
pub const NOT_FOUND: &str = "Not found";

/// Max share of disallowed characters in a description line.
pub const DESC_MAX_SPECIAL_RATIO: f64 = 0.2;
/// Shorter description lines are fragments, not prose.
pub const DESC_MIN_LINE_CHARS: usize = 10;
/// Min share of ASCII letters in a description line.
pub const DESC_MIN_LETTER_RATIO: f64 = 0.4;
/// Description lines kept after filtering.
pub const DESC_MAX_LINES: usize = 15;
/// Hard cap on the joined description.
pub const DESC_MAX_CHARS: usize = 1000;

fn price_regex() -> &'static Regex {
    static PRICE: OnceLock<Regex> = OnceLock::new();
    // `[0-9]` rather than `\d`: only ASCII digits make a price.
    PRICE.get_or_init(|| {
        Regex::new(r"\$\s*[0-9]+(?:,[0-9]{3})*(?:\.[0-9]{2})?").expect("price pattern is valid")
    })
}

fn candidate_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').map(str::trim).filter(|l| !l.is_empty())
}

fn is_title_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c.is_whitespace() || matches!(c, '-' | '$' | '.' | ',' | '&' | '(' | ')' | '\'')
}

fn is_description_char(c: char) -> bool {
    is_title_char(c) || matches!(c, '!' | '?')
}

/// First clean, multi-word, non-blacklisted line of the title region.
///
/// OCR returns lines roughly top to bottom, so the first survivor is the
/// topmost. Single-word lines are usually icons or buttons read as text.
pub fn extract_title(text: &str, profile: &SiteProfile) -> String {
    for line in candidate_lines(text) {
        if profile.is_blacklisted(line) {
            continue;
        }
        let clean: String = line.chars().filter(|c| is_title_char(*c)).collect();
        let clean = clean.trim();
        if clean.chars().count() >= profile.min_title_length && clean.split_whitespace().count() > 1 {
            return clean.to_string();
        }
    }
    NOT_FOUND.to_string()
}

/// First dollar amount anywhere in the page text, verbatim.
///
/// Runs on the full-page OCR rather than a region: price placement varies
/// too much between layouts for a fixed rectangle.
pub fn extract_price(text: &str) -> String {
    price_regex()
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| NOT_FOUND.to_string())
}

/// Prose lines from the description region, joined and capped.
///
/// Lines equal to the already extracted `title` are skipped so the title is
/// not repeated inside the description.
pub fn extract_description(text: &str, profile: &SiteProfile, title: &str) -> String {
    let kept: Vec<&str> = candidate_lines(text)
        .filter(|l| *l != title)
        .filter(|l| !profile.is_blacklisted(l))
        .filter(|l| is_prose_line(l))
        .take(DESC_MAX_LINES)
        .collect();

    let joined = kept.join(" ");
    let capped: String = joined.chars().take(DESC_MAX_CHARS).collect();
    let capped = capped.trim();
    if capped.is_empty() {
        NOT_FOUND.to_string()
    } else {
        capped.to_string()
    }
}

fn is_prose_line(line: &str) -> bool {
    let len = line.chars().count();
    if len == 0 {
        return false;
    }
    let special = line.chars().filter(|c| !is_description_char(*c)).count();
    if special as f64 / len as f64 > DESC_MAX_SPECIAL_RATIO || len < DESC_MIN_LINE_CHARS {
        return false;
    }
    let letters = line.chars().filter(|c| c.is_ascii_alphabetic()).count();
    letters as f64 >= len as f64 * DESC_MIN_LETTER_RATIO
}
