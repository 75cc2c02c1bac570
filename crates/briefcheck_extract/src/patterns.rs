//! Compiled pattern tables, built once at startup and read-only after.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::reporters::{ReporterSpec, REPORTERS};

/// One compiled reporter pattern alongside its spec.
pub struct CompiledReporter {
    pub spec: &'static ReporterSpec,
    pub regex: Regex,
}

/// All reporter patterns, compiled once.
pub static REPORTER_PATTERNS: Lazy<Vec<CompiledReporter>> = Lazy::new(|| {
    REPORTERS
        .iter()
        .map(|spec| CompiledReporter {
            spec,
            regex: Regex::new(spec.regex)
                .unwrap_or_else(|e| panic!("reporter pattern {} failed to compile: {}", spec.tag, e)),
        })
        .collect()
});

/// Statute citations have their own patterns and are never emitted as case
/// citations; candidates overlapping these spans are dropped.
pub static STATUTE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // State codes: RCW 2.60.020, RCW 49.46.090(1)
        r"\bRCW\s+\d+(?:\.\d+)*(?:\(\w+\))*",
        r"\bWash\.\s?Rev\.\s?Code\s+(?:§+\s*)?\d+(?:\.\d+)*",
        // Federal codes: 42 U.S.C. § 1983, 28 U.S.C. 2254
        r"\b\d+\s+U\.\s?S\.\s?C\.(?:\s*§+)?\s*\d+(?:\([\w.]+\))*",
        r"\b\d+\s+C\.\s?F\.\s?R\.(?:\s*§+)?\s*\d+(?:\.\d+)*",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("statute pattern failed to compile"))
    .collect()
});

/// Case names in the `"… v. …"` form. The capture is deliberately loose;
/// trailing leakage is trimmed by re-running the citation patterns over it.
pub static CASE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        (?P<name>
            [A-Z][A-Za-z0-9&'\-\.]*                  # first party token
            (?:,?\s+[A-Za-z0-9&'\-\.,]+)*?           # lazily grown party words
            ,?\s+v(?:s)?\.\s+                        # the versus token
            [A-Z][A-Za-z0-9&'\-\.]*                  # first opposing token
            (?:,?\s+[A-Za-z0-9&'\-\.]+)*?            # lazily grown opposing words
        )
        (?:,\s|\s+\d|\s*$)                           # stop at comma, digit run, or window end
        ",
    )
    .expect("case name pattern failed to compile")
});

/// Four-digit year in parentheses, possibly with court prefix:
/// `(2015)`, `(Wash. 2015)`, `(9th Cir. 1987)`.
pub static PAREN_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\([^()]{0,40}?(?P<year>(?:1[6-9]|20)\d{2})\s*\)")
        .expect("paren year pattern failed to compile")
});

/// Bare four-digit year, used only in the short fallback window.
pub static BARE_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?P<year>(?:1[6-9]|20)\d{2})\b").expect("year pattern failed"));

/// Legal-writing signal words stripped from the left edge of case names.
/// Longer phrases first so `but see` wins over `see`.
pub const SIGNAL_WORDS: &[&str] = &[
    "see generally",
    "see, e.g.,",
    "see e.g.",
    "but see",
    "see also",
    "see",
    "e.g.,",
    "e.g.",
    "accord",
    "cf.",
    "compare",
    "contra",
    "quoting",
    "citing",
];

/// Sentence terminators (`.!?` followed by whitespace) delimit context
/// windows, except when the terminator ends a known abbreviation.
pub static SENTENCE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s").expect("sentence boundary pattern failed"));

/// Abbreviations whose trailing period never ends a sentence. Compared
/// lowercase, without the final period.
pub const NON_TERMINAL_ABBREVS: &[&str] = &[
    "v", "vs", "no", "nos", "inc", "co", "corp", "ltd", "llc", "bros", "jr", "sr", "st", "mt",
    "mr", "mrs", "ms", "dr", "dep't", "dept", "dist", "div", "app", "supp", "rev", "stat", "ed",
    "2d", "3d", "4th", "5th", "ct", "cir", "wn", "wash", "cal", "ill", "mont", "ariz", "colo",
    "fla", "mass", "mich", "minn", "okla", "tenn", "tex", "wis", "ark", "u.s", "s.ct", "l.ed",
    "f", "p", "am", "assoc", "ass'n", "assn", "sec", "comm'n",
];

/// True if the terminator at `dot_idx` (byte offset of `.`/`!`/`?` within
/// `window`) ends an abbreviation rather than a sentence.
pub fn is_abbreviation_boundary(window: &str, dot_idx: usize) -> bool {
    let before = &window[..dot_idx];
    let token_start = before
        .rfind(|c: char| c.is_whitespace() || c == '(' || c == ',')
        .map(|i| i + 1)
        .unwrap_or(0);
    let token = before[token_start..].trim_end_matches('.');
    if token.is_empty() {
        return true;
    }
    // Single letters ("M.Y.G.", middle initials) never end sentences here.
    if token.chars().count() == 1 && token.chars().all(|c| c.is_alphabetic()) {
        return true;
    }
    let lowered = token.to_lowercase();
    // "U.S" style tokens keep internal periods; compare both raw and the
    // final segment ("M.Y.G" -> "g").
    if NON_TERMINAL_ABBREVS.contains(&lowered.as_str()) {
        return true;
    }
    if let Some(last_segment) = lowered.rsplit('.').next() {
        if last_segment.chars().count() == 1 {
            return true;
        }
        if NON_TERMINAL_ABBREVS.contains(&last_segment) {
            return true;
        }
    }
    false
}
