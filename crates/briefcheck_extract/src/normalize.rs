//! Text normalization helpers.
//!
//! Matching happens against the original text (patterns tolerate arbitrary
//! whitespace, so spans stay bound to original byte offsets); these helpers
//! normalize only *derived* strings such as extracted case names.

use crate::patterns::SIGNAL_WORDS;

/// Collapse runs of whitespace (including line breaks) into single spaces.
pub fn squash_whitespace(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_space = false;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            if !last_was_space && !out.is_empty() {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    out.trim_end().to_string()
}

/// Strip signal words (`see`, `e.g.`, `accord`, ...) from the left edge,
/// repeatedly, case-insensitively.
pub fn strip_signal_words(name: &str) -> String {
    let mut rest = name.trim();
    loop {
        let lowered = rest.to_lowercase();
        let mut stripped = false;
        for signal in SIGNAL_WORDS {
            if lowered.starts_with(signal) {
                let boundary_ok = lowered[signal.len()..]
                    .chars()
                    .next()
                    .map(|c| c.is_whitespace() || c == ',')
                    .unwrap_or(true);
                if boundary_ok {
                    rest = rest[signal.len()..].trim_start_matches([' ', ',']);
                    stripped = true;
                    break;
                }
            }
        }
        if !stripped {
            return rest.trim().to_string();
        }
    }
}

/// Final cleanup for an extracted case name: squash whitespace, strip
/// signals and stray punctuation at the edges.
pub fn clean_case_name(raw: &str) -> Option<String> {
    let squashed = squash_whitespace(raw);
    let stripped = strip_signal_words(&squashed);
    let trimmed = stripped
        .trim_matches(|c: char| c.is_whitespace() || c == ',' || c == ';' || c == '(' || c == ')')
        .to_string();
    if trimmed.len() < 5 || trimmed.split_whitespace().count() > 16 {
        return None;
    }
    // Anything worth keeping still reads as "X v. Y".
    if !trimmed.to_lowercase().contains(" v") {
        return None;
    }
    Some(trimmed)
}

/// Case-insensitive, signal-stripped name agreement used by the clusterer.
pub fn names_agree(a: &str, b: &str) -> bool {
    let norm = |s: &str| squash_whitespace(&strip_signal_words(s)).to_lowercase();
    norm(a) == norm(b)
}
