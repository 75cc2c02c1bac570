//! Token-set similarity between case names.
//!
//! Used by the verifier's match acceptance filter. Comparison is
//! case-insensitive, signal-stripped, and ignores party honorifics; common
//! reporter-style abbreviations are expanded so "Bros." matches "Brothers".

use std::collections::HashSet;

use crate::normalize::strip_signal_words;

/// Corporate designators and honorifics that carry no identity.
const HONORIFICS: &[&str] = &[
    "inc", "co", "corp", "ltd", "llc", "llp", "lp", "pllc", "na", "sa", "plc", "et", "al",
];

/// Common abbreviation expansions seen in party names.
const EXPANSIONS: &[(&str, &str)] = &[
    ("bros", "brothers"),
    ("assn", "association"),
    ("ass'n", "association"),
    ("dept", "department"),
    ("dep't", "department"),
    ("natl", "national"),
    ("nat'l", "national"),
    ("intl", "international"),
    ("int'l", "international"),
    ("univ", "university"),
    ("mfg", "manufacturing"),
    ("ins", "insurance"),
    ("am", "american"),
];

/// Tokenize a case name for set comparison.
pub fn name_tokens(name: &str) -> HashSet<String> {
    let stripped = strip_signal_words(name);
    stripped
        .to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|t| !t.is_empty())
        .filter(|t| *t != "v" && *t != "vs")
        .filter(|t| !HONORIFICS.contains(t))
        .map(|t| {
            EXPANSIONS
                .iter()
                .find(|(abbrev, _)| *abbrev == t)
                .map(|(_, full)| (*full).to_string())
                .unwrap_or_else(|| t.to_string())
        })
        .collect()
}

/// Token-set similarity in `[0, 1]`.
///
/// The score is the larger of Jaccard overlap and the containment
/// coefficient, so a canonical name with extra boilerplate ("..., a
/// Washington corporation") does not sink an otherwise exact match.
pub fn token_set_similarity(a: &str, b: &str) -> f64 {
    let ta = name_tokens(a);
    let tb = name_tokens(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let intersection = ta.intersection(&tb).count() as f64;
    let union = ta.union(&tb).count() as f64;
    let jaccard = intersection / union;
    let containment = intersection / (ta.len().min(tb.len()) as f64);
    jaccard.max(containment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_names() {
        let s = token_set_similarity(
            "Lopez Demetrio v. Sakuma Bros. Farms",
            "Lopez Demetrio v. Sakuma Bros. Farms",
        );
        assert!((s - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_abbreviation_expansion() {
        let s = token_set_similarity(
            "Lopez Demetrio v. Sakuma Bros. Farms",
            "Lopez Demetrio v. Sakuma Brothers Farms, Inc.",
        );
        assert!(s >= 0.9, "got {}", s);
    }

    #[test]
    fn test_unrelated_names_score_low() {
        let s = token_set_similarity("State v. M.Y.G.", "Roe v. Wade");
        assert!(s < 0.2, "got {}", s);
    }

    #[test]
    fn test_signal_words_ignored() {
        let s = token_set_similarity(
            "quoting Am. Legion Post No. 32 v. City of Walla Walla",
            "American Legion Post No. 32 v. City of Walla Walla",
        );
        assert!(s >= 0.6, "got {}", s);
    }

    #[test]
    fn test_empty_name_scores_zero() {
        assert_eq!(token_set_similarity("", "Roe v. Wade"), 0.0);
    }

    #[test]
    fn test_containment_rescues_verbose_canonical() {
        let s = token_set_similarity(
            "Hamaatsa v. Pueblo of San Felipe",
            "Hamaatsa, Inc. v. Pueblo of San Felipe, a federally recognized Indian tribe",
        );
        assert!(s >= 0.6, "got {}", s);
    }
}
