//! Match acceptance filter.
//!
//! Canonical data is assigned to a citation only when the authority's
//! candidate survives every check here. The filter is deliberately
//! conservative: a wrong canonical match is worse than an unverified
//! citation.

use briefcheck_protocol::{Citation, Jurisdiction, VerificationFailure};
use briefcheck_extract::token_set_similarity;
use tracing::debug;

use crate::wire::CaseCandidate;

/// Minimum token-set similarity between an extracted name and a candidate's
/// canonical name.
pub const NAME_SIMILARITY_THRESHOLD: f64 = 0.6;
/// Maximum |candidate year - extracted year|.
pub const YEAR_DISTANCE_MAX: i32 = 2;

/// Run the acceptance filter over the candidates returned for one citation.
///
/// Exactly one candidate must pass; two or more passing candidates reject
/// the lookup as ambiguous rather than guessing.
pub fn accept_candidates(
    citation: &Citation,
    candidates: &[CaseCandidate],
) -> Result<CaseCandidate, VerificationFailure> {
    if candidates.is_empty() {
        return Err(VerificationFailure::NotFound);
    }

    // Without an extracted name, only a lone jurisdiction-compatible
    // candidate is trustworthy.
    if citation.extracted_case_name.is_none() && candidates.len() > 1 {
        return Err(VerificationFailure::AmbiguousMatch);
    }

    let mut passing: Vec<&CaseCandidate> = Vec::new();
    let mut last_rejection = VerificationFailure::NotFound;
    for candidate in candidates {
        match check_candidate(citation, candidate) {
            Ok(()) => passing.push(candidate),
            Err(reason) => {
                debug!(
                    citation = %citation.text,
                    candidate = candidate.case_name.as_deref().unwrap_or("<unnamed>"),
                    %reason,
                    "candidate rejected"
                );
                last_rejection = reason;
            }
        }
    }

    match passing.len() {
        0 => Err(last_rejection),
        1 => Ok(passing[0].clone()),
        _ => Err(VerificationFailure::AmbiguousMatch),
    }
}

fn check_candidate(
    citation: &Citation,
    candidate: &CaseCandidate,
) -> Result<(), VerificationFailure> {
    let candidate_jurisdiction = candidate
        .court
        .as_deref()
        .map(Jurisdiction::parse_authority)
        .unwrap_or(Jurisdiction::Unknown);
    if !citation.jurisdiction_hint.accepts(&candidate_jurisdiction) {
        return Err(VerificationFailure::JurisdictionMismatch);
    }

    // A candidate with no canonical name cannot be assigned to a citation.
    let canonical = candidate
        .case_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(VerificationFailure::NameMismatch)?;

    if let Some(extracted) = &citation.extracted_case_name {
        if token_set_similarity(extracted, canonical) < NAME_SIMILARITY_THRESHOLD {
            return Err(VerificationFailure::NameMismatch);
        }
    }

    if let Some(extracted_year) = citation
        .extracted_date
        .as_deref()
        .and_then(|y| y.parse::<i32>().ok())
    {
        if let Some(candidate_year) = candidate.year() {
            if (candidate_year - extracted_year).abs() > YEAR_DISTANCE_MAX {
                return Err(VerificationFailure::DateMismatch);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use briefcheck_protocol::{ClusterId, Span, VerifiedStatus};

    use crate::mock::candidate;

    fn citation(name: Option<&str>, date: Option<&str>, hint: Jurisdiction) -> Citation {
        Citation {
            text: "183 Wn.2d 649".to_string(),
            span: Span::new(0, 13),
            reporter: "Wn.2d".to_string(),
            volume: 183,
            page: 649,
            pincite: None,
            extracted_case_name: name.map(str::to_string),
            extracted_date: date.map(str::to_string),
            jurisdiction_hint: hint,
            canonical_name: None,
            canonical_date: None,
            canonical_url: None,
            verification_source: None,
            verified: VerifiedStatus::Unverified,
            cluster_id: Some(ClusterId::new(1)),
        }
    }

    #[test]
    fn test_exact_match_accepted() {
        let cite = citation(
            Some("Lopez Demetrio v. Sakuma Bros. Farms"),
            Some("2015"),
            Jurisdiction::state("washington"),
        );
        let good = candidate(
            "Lopez Demetrio v. Sakuma Bros. Farms",
            "2015-07-16",
            "/opinion/1/",
            "Washington Supreme Court",
        );
        let accepted = accept_candidates(&cite, &[good]).unwrap();
        assert_eq!(
            accepted.case_name.as_deref(),
            Some("Lopez Demetrio v. Sakuma Bros. Farms")
        );
    }

    #[test]
    fn test_jurisdiction_mismatch_rejected() {
        let cite = citation(
            Some("Lopez Demetrio v. Sakuma Bros. Farms"),
            None,
            Jurisdiction::state("washington"),
        );
        let wrong = candidate(
            "Lopez Demetrio v. Sakuma Bros. Farms",
            "2015-07-16",
            "/opinion/1/",
            "Supreme Court of Florida",
        );
        assert_eq!(
            accept_candidates(&cite, &[wrong]).unwrap_err(),
            VerificationFailure::JurisdictionMismatch
        );
    }

    #[test]
    fn test_name_mismatch_rejected() {
        let cite = citation(
            Some("State v. Gamble"),
            None,
            Jurisdiction::state("washington"),
        );
        let wrong = candidate(
            "Entirely Different v. Case",
            "2010-01-01",
            "/opinion/9/",
            "Washington Supreme Court",
        );
        assert_eq!(
            accept_candidates(&cite, &[wrong]).unwrap_err(),
            VerificationFailure::NameMismatch
        );
    }

    #[test]
    fn test_year_distance_rejects_even_with_matching_name() {
        let cite = citation(
            Some("State v. Gamble"),
            Some("2010"),
            Jurisdiction::state("washington"),
        );
        let stale = candidate(
            "State v. Gamble",
            "2001-06-01",
            "/opinion/9/",
            "Washington Supreme Court",
        );
        assert_eq!(
            accept_candidates(&cite, &[stale]).unwrap_err(),
            VerificationFailure::DateMismatch
        );
    }

    #[test]
    fn test_year_within_two_accepted() {
        let cite = citation(
            Some("State v. Gamble"),
            Some("2010"),
            Jurisdiction::state("washington"),
        );
        let close = candidate(
            "State v. Gamble",
            "2008-12-30",
            "/opinion/9/",
            "Washington Supreme Court",
        );
        assert!(accept_candidates(&cite, &[close]).is_ok());
    }

    #[test]
    fn test_no_name_single_candidate_accepted() {
        let cite = citation(None, None, Jurisdiction::state("washington"));
        let only = candidate(
            "State v. Gamble",
            "2010-02-04",
            "/opinion/9/",
            "Washington Supreme Court",
        );
        assert!(accept_candidates(&cite, &[only]).is_ok());
    }

    #[test]
    fn test_no_name_multiple_candidates_rejected() {
        let cite = citation(None, None, Jurisdiction::state("washington"));
        let a = candidate("A v. B", "2010-01-01", "/a/", "Washington Supreme Court");
        let b = candidate("C v. D", "2011-01-01", "/b/", "Washington Supreme Court");
        assert_eq!(
            accept_candidates(&cite, &[a, b]).unwrap_err(),
            VerificationFailure::AmbiguousMatch
        );
    }

    #[test]
    fn test_two_passing_candidates_ambiguous() {
        let cite = citation(
            Some("State v. Gamble"),
            None,
            Jurisdiction::state("washington"),
        );
        let a = candidate(
            "State v. Gamble",
            "2010-01-01",
            "/a/",
            "Washington Supreme Court",
        );
        let b = candidate(
            "State v. Gamble",
            "2011-01-01",
            "/b/",
            "Washington Court of Appeals",
        );
        assert_eq!(
            accept_candidates(&cite, &[a, b]).unwrap_err(),
            VerificationFailure::AmbiguousMatch
        );
    }

    #[test]
    fn test_empty_candidates_not_found() {
        let cite = citation(None, None, Jurisdiction::Unknown);
        assert_eq!(
            accept_candidates(&cite, &[]).unwrap_err(),
            VerificationFailure::NotFound
        );
    }

    #[test]
    fn test_federal_hint_accepts_federal_court() {
        let cite = citation(Some("Monroe v. Pape"), Some("1961"), Jurisdiction::Federal);
        let fed = candidate(
            "Monroe v. Pape",
            "1961-02-20",
            "/opinion/3/",
            "Supreme Court of the United States",
        );
        assert!(accept_candidates(&cite, &[fed]).is_ok());
    }
}
