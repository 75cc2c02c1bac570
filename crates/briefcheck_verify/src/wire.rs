//! Authority wire shapes.
//!
//! The authority's v4 API mixes `camelCase` and `snake_case` across
//! endpoints, so every field carries an alias; a single-shape assumption is
//! a latent bug.

use serde::Deserialize;

/// One entry of a batch-lookup response, aligned to the request order.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchEntry {
    /// The citation string this entry answers.
    #[serde(default)]
    pub citation: Option<String>,
    /// HTTP-style status for this citation: 200 found, 404 unknown.
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default, alias = "errorMessage")]
    pub error_message: Option<String>,
    /// Zero or more candidate cases for the citation.
    #[serde(default)]
    pub clusters: Vec<CaseCandidate>,
}

fn default_status() -> u16 {
    404
}

impl BatchEntry {
    pub fn is_found(&self) -> bool {
        self.status == 200 && !self.clusters.is_empty()
    }

    /// The authority sometimes reports throttling inside an entry body
    /// instead of an HTTP 429.
    pub fn is_rate_limited(&self) -> bool {
        self.error_message
            .as_deref()
            .map(|msg| {
                let lowered = msg.to_lowercase();
                lowered.contains("rate limit") || lowered.contains("throttled")
            })
            .unwrap_or(false)
    }
}

/// One candidate case returned by the authority.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaseCandidate {
    #[serde(default, alias = "caseName")]
    pub case_name: Option<String>,
    /// `YYYY-MM-DD`.
    #[serde(default, alias = "dateFiled")]
    pub date_filed: Option<String>,
    #[serde(default, alias = "absoluteUrl")]
    pub absolute_url: Option<String>,
    /// Court description, e.g. "Washington Supreme Court".
    #[serde(default, alias = "courtName")]
    pub court: Option<String>,
}

impl CaseCandidate {
    /// Four-digit filing year, when the date parses.
    pub fn year(&self) -> Option<i32> {
        self.date_filed
            .as_deref()
            .and_then(|d| d.get(0..4))
            .and_then(|y| y.parse().ok())
    }
}

/// Search endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<CaseCandidate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_entry_snake_case() {
        let raw = r#"{
            "citation": "183 Wn.2d 649",
            "status": 200,
            "clusters": [{
                "case_name": "Lopez Demetrio v. Sakuma Bros. Farms",
                "date_filed": "2015-07-16",
                "absolute_url": "/opinion/1/lopez/",
                "court": "Washington Supreme Court"
            }]
        }"#;
        let entry: BatchEntry = serde_json::from_str(raw).unwrap();
        assert!(entry.is_found());
        assert_eq!(
            entry.clusters[0].case_name.as_deref(),
            Some("Lopez Demetrio v. Sakuma Bros. Farms")
        );
        assert_eq!(entry.clusters[0].year(), Some(2015));
    }

    #[test]
    fn test_batch_entry_camel_case() {
        let raw = r#"{
            "citation": "183 Wn.2d 649",
            "status": 200,
            "clusters": [{
                "caseName": "Lopez Demetrio v. Sakuma Bros. Farms",
                "dateFiled": "2015-07-16",
                "absoluteUrl": "/opinion/1/lopez/",
                "courtName": "Washington Supreme Court"
            }]
        }"#;
        let entry: BatchEntry = serde_json::from_str(raw).unwrap();
        assert!(entry.is_found());
        assert_eq!(entry.clusters[0].year(), Some(2015));
        assert_eq!(
            entry.clusters[0].court.as_deref(),
            Some("Washington Supreme Court")
        );
    }

    #[test]
    fn test_not_found_entry() {
        let raw = r#"{"citation": "1 Wn.2d 1", "status": 404, "clusters": []}"#;
        let entry: BatchEntry = serde_json::from_str(raw).unwrap();
        assert!(!entry.is_found());
        assert!(!entry.is_rate_limited());
    }

    #[test]
    fn test_rate_limit_marker_in_body() {
        let raw = r#"{"citation": "1 Wn.2d 1", "error_message": "Rate limit exceeded, slow down"}"#;
        let entry: BatchEntry = serde_json::from_str(raw).unwrap();
        assert!(entry.is_rate_limited());
        let raw = r#"{"citation": "1 Wn.2d 1", "errorMessage": "request throttled"}"#;
        let entry: BatchEntry = serde_json::from_str(raw).unwrap();
        assert!(entry.is_rate_limited());
    }

    #[test]
    fn test_malformed_date_yields_no_year() {
        let candidate = CaseCandidate {
            date_filed: Some("nodate".to_string()),
            ..Default::default()
        };
        assert_eq!(candidate.year(), None);
    }
}
