//! The extraction pass: reporter patterns over the original text, overlap
//! dedup, statute filtering, then per-citation context recovery.

use briefcheck_protocol::{Citation, Jurisdiction, Span, VerifiedStatus};
use tracing::debug;

use crate::context::{extract_case_name, extract_year, left_window, right_window};
use crate::patterns::{REPORTER_PATTERNS, STATUTE_PATTERNS};
use crate::reporters::ReporterClass;

struct Candidate {
    span: Span,
    reporter: &'static str,
    class: ReporterClass,
    hint: Jurisdiction,
    volume: u32,
    page: u32,
    pincite: Option<(u32, Span)>,
}

/// Extract every case citation from `text`, in document order.
///
/// Deterministic and idempotent: the same text always yields byte-identical
/// output. Extraction never fails; citations with no recoverable context
/// simply carry `None` fields.
pub fn extract(text: &str) -> Vec<Citation> {
    let statute_spans = statute_spans(text);
    let mut candidates = scan(text, &statute_spans);
    dedup_overlaps(&mut candidates);
    clear_leaked_pincites(&mut candidates);

    candidates.sort_by_key(|c| c.span.start);
    candidates
        .into_iter()
        .map(|c| {
            let name = extract_case_name(left_window(text, c.span.start));
            let year = extract_year(right_window(text, c.span.end));
            Citation {
                text: text[c.span.start..c.span.end].to_string(),
                span: c.span,
                reporter: c.reporter.to_string(),
                volume: c.volume,
                page: c.page,
                pincite: c.pincite.map(|(value, _)| value),
                extracted_case_name: name,
                extracted_date: year,
                jurisdiction_hint: c.hint,
                canonical_name: None,
                canonical_date: None,
                canonical_url: None,
                verification_source: None,
                verified: VerifiedStatus::Unverified,
                cluster_id: None,
            }
        })
        .collect()
}

fn statute_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    for re in STATUTE_PATTERNS.iter() {
        for m in re.find_iter(text) {
            spans.push(Span::new(m.start(), m.end()));
        }
    }
    spans
}

fn scan(text: &str, statute_spans: &[Span]) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for compiled in REPORTER_PATTERNS.iter() {
        for caps in compiled.regex.captures_iter(text) {
            let cite = match caps.name("cite") {
                Some(m) => m,
                None => continue,
            };
            let span = Span::new(cite.start(), cite.end());
            if statute_spans.iter().any(|s| s.overlaps(&span)) {
                debug!(cite = cite.as_str(), "dropping statute overlap");
                continue;
            }
            let volume: u32 = match caps["vol"].parse() {
                Ok(v) => v,
                Err(_) => continue,
            };
            let page: u32 = match caps["page"].parse() {
                Ok(p) => p,
                Err(_) => continue,
            };
            if volume == 0 || page == 0 || volume > compiled.spec.max_volume {
                continue;
            }
            let pincite = caps.name("pin").and_then(|m| {
                m.as_str()
                    .parse::<u32>()
                    .ok()
                    .map(|v| (v, Span::new(m.start(), m.end())))
            });
            candidates.push(Candidate {
                span,
                reporter: compiled.spec.tag,
                class: compiled.spec.class,
                hint: compiled.spec.hint.resolve(),
                volume,
                page,
                pincite,
            });
        }
    }
    candidates
}

/// When two patterns match overlapping spans, keep the longer; ties go to
/// the higher-priority pattern class.
fn dedup_overlaps(candidates: &mut Vec<Candidate>) {
    candidates.sort_by(|a, b| {
        a.span
            .start
            .cmp(&b.span.start)
            .then(b.span.len().cmp(&a.span.len()))
            .then(b.class.cmp(&a.class))
    });
    let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates.drain(..) {
        if kept.iter().all(|k| !k.span.overlaps(&candidate.span)) {
            kept.push(candidate);
        }
    }
    *candidates = kept;
}

/// A "pincite" that is really the volume of the next parallel citation
/// (`116 Wn.2d 1, 802 P.2d 784`) sits inside that citation's span; drop it.
fn clear_leaked_pincites(candidates: &mut [Candidate]) {
    let spans: Vec<Span> = candidates.iter().map(|c| c.span).collect();
    for candidate in candidates.iter_mut() {
        if let Some((_, pin_span)) = candidate.pincite {
            let leaked = spans.iter().any(|other| {
                *other != candidate.span
                    && pin_span.start >= other.start
                    && pin_span.end <= other.end
            });
            if leaked {
                candidate.pincite = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallel_washington_citation() {
        let text = "Lopez Demetrio v. Sakuma Bros. Farms, 183 Wn.2d 649, 655, 355 P.3d 258 (2015).";
        let citations = extract(text);
        assert_eq!(citations.len(), 2);

        assert_eq!(citations[0].text, "183 Wn.2d 649");
        assert_eq!(citations[0].reporter, "Wn.2d");
        assert_eq!(citations[0].volume, 183);
        assert_eq!(citations[0].page, 649);
        assert_eq!(citations[0].pincite, Some(655));
        assert_eq!(
            citations[0].extracted_case_name.as_deref(),
            Some("Lopez Demetrio v. Sakuma Bros. Farms")
        );
        assert_eq!(citations[0].extracted_date.as_deref(), Some("2015"));

        assert_eq!(citations[1].text, "355 P.3d 258");
        assert_eq!(citations[1].reporter, "P.3d");
        assert_eq!(
            citations[1].extracted_case_name.as_deref(),
            Some("Lopez Demetrio v. Sakuma Bros. Farms")
        );
        assert_eq!(citations[1].extracted_date.as_deref(), Some("2015"));
    }

    #[test]
    fn test_neutral_and_parallel_reporter_both_match() {
        let text = "Hamaatsa, Inc. v. Pueblo of San Felipe, 2017-NM-007, 388 P.3d 977 (2016).";
        let citations = extract(text);
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].text, "2017-NM-007");
        assert_eq!(citations[0].reporter, "NM");
        assert_eq!(citations[0].volume, 2017);
        assert_eq!(citations[0].page, 7);
        assert_eq!(citations[1].text, "388 P.3d 977");
        for citation in &citations {
            assert_eq!(
                citation.extracted_case_name.as_deref(),
                Some("Hamaatsa, Inc. v. Pueblo of San Felipe")
            );
            assert_eq!(citation.extracted_date.as_deref(), Some("2016"));
        }
    }

    #[test]
    fn test_span_stability() {
        let text = "See State v. Gamble, 168 Wn.2d 161, 225 P.3d 973 (2010).";
        for citation in extract(text) {
            assert_eq!(
                &text[citation.span.start..citation.span.end],
                citation.text,
                "span must slice back to the citation text"
            );
        }
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let text = "State v. M.Y.G., 199 Wn.2d 528, 509 P.3d 818 (2022) (quoting Am. Legion Post No. 32 v. City of Walla Walla, 116 Wn.2d 1, 802 P.2d 784 (1991)).";
        let first = extract(text);
        let second = extract(text);
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn test_statute_citations_filtered() {
        let text = "Under RCW 2.60.020 and 42 U.S.C. § 1983, see Monroe v. Pape, 365 U.S. 167 (1961).";
        let citations = extract(text);
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].text, "365 U.S. 167");
        assert_eq!(
            citations[0].extracted_case_name.as_deref(),
            Some("Monroe v. Pape")
        );
    }

    #[test]
    fn test_leaked_pincite_cleared() {
        let text = "Am. Legion Post No. 32 v. City of Walla Walla, 116 Wn.2d 1, 802 P.2d 784 (1991).";
        let citations = extract(text);
        assert_eq!(citations.len(), 2);
        // "802" is the parallel citation's volume, not a pincite of the first.
        assert_eq!(citations[0].pincite, None);
    }

    #[test]
    fn test_real_pincite_survives() {
        let text = "Lopez Demetrio v. Sakuma Bros. Farms, 183 Wn.2d 649, 655 (2015).";
        let citations = extract(text);
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].pincite, Some(655));
    }

    #[test]
    fn test_overlapping_series_prefers_longer_match() {
        let text = "Kitsap County v. Allstate Ins. Co., 136 Wash. 2d 567, 964 P.2d 1173 (1998).";
        let citations = extract(text);
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].reporter, "Wash. 2d");
        assert_eq!(citations[0].volume, 136);
        assert_eq!(citations[0].page, 567);
    }

    #[test]
    fn test_westlaw_weekly() {
        let text = "Doe v. Roe, No. 80000-1-I, 2020 WL 1234567, at *3 (Wash. Ct. App. Mar. 2, 2020).";
        let citations = extract(text);
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].reporter, "WL");
        assert_eq!(citations[0].volume, 2020);
        assert_eq!(citations[0].page, 1234567);
    }

    #[test]
    fn test_line_break_inside_case_name() {
        let text = "Lopez Demetrio v.\nSakuma Bros. Farms, 183\nWn.2d 649 (2015).";
        let citations = extract(text);
        assert_eq!(citations.len(), 1);
        assert_eq!(
            citations[0].extracted_case_name.as_deref(),
            Some("Lopez Demetrio v. Sakuma Bros. Farms")
        );
        // The span still points at the original, line-broken text.
        assert_eq!(&text[citations[0].span.start..citations[0].span.end], "183\nWn.2d 649");
    }

    #[test]
    fn test_empty_and_citation_free_text() {
        assert!(extract("").is_empty());
        assert!(extract("No citations appear anywhere in this text.").is_empty());
    }

    #[test]
    fn test_missing_name_leaves_none() {
        let text = "As previously discussed, 410 U.S. 113 controls.";
        let citations = extract(text);
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].extracted_case_name, None);
    }
}
