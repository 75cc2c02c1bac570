//! Per-citation context recovery: case names to the left, years to the
//! right, both confined to sentence-clipped windows of the original text.

use crate::normalize::clean_case_name;
use crate::patterns::{
    is_abbreviation_boundary, BARE_YEAR, CASE_NAME, PAREN_YEAR, REPORTER_PATTERNS,
    SENTENCE_BOUNDARY,
};

/// Left context window: up to this many characters before the citation.
pub const LEFT_WINDOW_CHARS: usize = 200;
/// Right context window: up to this many characters after the citation.
pub const RIGHT_WINDOW_CHARS: usize = 50;
/// Fallback year search range when no parenthesized year exists.
const BARE_YEAR_RANGE_CHARS: usize = 15;

/// Walk `n` characters backward from byte offset `pos`.
fn back_up_chars(text: &str, pos: usize, n: usize) -> usize {
    text[..pos]
        .char_indices()
        .rev()
        .take(n)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(pos)
}

/// Walk `n` characters forward from byte offset `pos`.
fn advance_chars(text: &str, pos: usize, n: usize) -> usize {
    text[pos..]
        .char_indices()
        .nth(n)
        .map(|(i, _)| pos + i)
        .unwrap_or(text.len())
}

/// The left window for a citation starting at `cite_start`, clipped at the
/// last real sentence boundary. Returns the window slice.
pub fn left_window(text: &str, cite_start: usize) -> &str {
    let raw_start = back_up_chars(text, cite_start, LEFT_WINDOW_CHARS);
    let window = &text[raw_start..cite_start];
    let mut clip = 0usize;
    for m in SENTENCE_BOUNDARY.find_iter(window) {
        if !is_abbreviation_boundary(window, m.start()) {
            clip = m.end();
        }
    }
    &window[clip..]
}

/// The right window for a citation ending at `cite_end`, clipped at the
/// first real sentence boundary.
pub fn right_window(text: &str, cite_end: usize) -> &str {
    let raw_end = advance_chars(text, cite_end, RIGHT_WINDOW_CHARS);
    let window = &text[cite_end..raw_end];
    for m in SENTENCE_BOUNDARY.find_iter(window) {
        if !is_abbreviation_boundary(window, m.start()) {
            return &window[..m.start()];
        }
    }
    window
}

/// Recover the case name nearest the citation from its left window.
///
/// Candidates must take the `"… v. …"` form; the one with the largest start
/// wins. Citation tokens that leak into the capture are trimmed by
/// re-running the reporter patterns over it.
pub fn extract_case_name(window: &str) -> Option<String> {
    let caps = CASE_NAME.captures_iter(window).last()?;
    let raw = caps.name("name")?.as_str();
    let trimmed = trim_trailing_citation(raw);
    clean_case_name(trimmed)
}

/// Cut a captured name at the first embedded citation token, if any.
fn trim_trailing_citation(name: &str) -> &str {
    let mut cut = name.len();
    for compiled in REPORTER_PATTERNS.iter() {
        if let Some(m) = compiled.regex.find(name) {
            cut = cut.min(m.start());
        }
    }
    name[..cut].trim_end_matches([' ', ','])
}

/// Recover a four-digit year from the right window: parenthesized anywhere
/// in the window, else bare within the first few characters.
pub fn extract_year(window: &str) -> Option<String> {
    if let Some(caps) = PAREN_YEAR.captures(window) {
        return Some(caps["year"].to_string());
    }
    let fallback_end = advance_chars(window, 0, BARE_YEAR_RANGE_CHARS);
    let near = &window[..fallback_end];
    BARE_YEAR
        .captures(near)
        .map(|caps| caps["year"].to_string())
}
