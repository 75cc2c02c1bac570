//! Mock authority for deterministic testing.
//!
//! Canned candidates keyed by citation text, a forced-error queue, and call
//! counters for batching assertions. No network, no subprocesses.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::authority::AuthorityApi;
use crate::error::VerifyError;
use crate::wire::{BatchEntry, CaseCandidate};

#[derive(Default)]
pub struct MockAuthority {
    /// Candidate lists by exact citation text.
    lookup: Mutex<HashMap<String, Vec<CaseCandidate>>>,
    /// Ranked search answers by substring of the query.
    search_answers: Mutex<Vec<(String, Vec<CaseCandidate>)>>,
    /// Errors to inject before serving batch calls, consumed in order.
    forced_errors: Mutex<VecDeque<VerifyError>>,
    batch_calls: AtomicUsize,
    search_calls: AtomicUsize,
}

impl MockAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the canonical answer for a citation string.
    pub fn answer(&self, citation: impl Into<String>, candidate: CaseCandidate) {
        self.answer_many(citation, vec![candidate]);
    }

    /// Register several candidates for one citation (ambiguity cases).
    pub fn answer_many(&self, citation: impl Into<String>, candidates: Vec<CaseCandidate>) {
        self.lookup
            .lock()
            .unwrap()
            .insert(citation.into(), candidates);
    }

    /// Register a search answer served when the query contains `needle`.
    pub fn search_answer(&self, needle: impl Into<String>, candidates: Vec<CaseCandidate>) {
        self.search_answers
            .lock()
            .unwrap()
            .push((needle.into(), candidates));
    }

    /// Queue an error for the next batch call (timeouts, transport).
    pub fn fail_next_batch(&self, error: VerifyError) {
        self.forced_errors.lock().unwrap().push_back(error);
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthorityApi for MockAuthority {
    async fn batch_lookup(&self, citations: &[String]) -> Result<Vec<BatchEntry>, VerifyError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.forced_errors.lock().unwrap().pop_front() {
            return Err(error);
        }
        let map = self.lookup.lock().unwrap();
        Ok(citations
            .iter()
            .map(|citation| match map.get(citation) {
                Some(candidates) => BatchEntry {
                    citation: Some(citation.clone()),
                    status: 200,
                    error_message: None,
                    clusters: candidates.clone(),
                },
                None => BatchEntry {
                    citation: Some(citation.clone()),
                    status: 404,
                    error_message: None,
                    clusters: Vec::new(),
                },
            })
            .collect())
    }

    async fn search(&self, query: &str) -> Result<Vec<CaseCandidate>, VerifyError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let answers = self.search_answers.lock().unwrap();
        for (needle, candidates) in answers.iter() {
            if query.contains(needle.as_str()) {
                return Ok(candidates.clone());
            }
        }
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Convenience constructor for candidates in tests.
pub fn candidate(name: &str, date: &str, url: &str, court: &str) -> CaseCandidate {
    CaseCandidate {
        case_name: Some(name.to_string()),
        date_filed: Some(date.to_string()),
        absolute_url: Some(url.to_string()),
        court: Some(court.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_serves_registered_answers() {
        let mock = MockAuthority::new();
        mock.answer(
            "183 Wn.2d 649",
            candidate(
                "Lopez Demetrio v. Sakuma Bros. Farms",
                "2015-07-16",
                "/opinion/1/",
                "Washington Supreme Court",
            ),
        );
        let entries = mock
            .batch_lookup(&["183 Wn.2d 649".to_string(), "1 Wn.2d 1".to_string()])
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_found());
        assert!(!entries[1].is_found());
        assert_eq!(mock.batch_calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_forced_error_consumed_once() {
        let mock = MockAuthority::new();
        mock.fail_next_batch(VerifyError::Timeout);
        assert!(mock.batch_lookup(&[]).await.is_err());
        assert!(mock.batch_lookup(&[]).await.is_ok());
        assert_eq!(mock.batch_calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_search_matches_substring() {
        let mock = MockAuthority::new();
        mock.search_answer(
            "Gamble",
            vec![candidate(
                "State v. Gamble",
                "2010-02-04",
                "/opinion/2/",
                "Washington Supreme Court",
            )],
        );
        let hits = mock.search("State v. Gamble 168 Wn.2d 161").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(mock.search("no such case").await.unwrap().is_empty());
        assert_eq!(mock.search_calls(), 2);
    }
}
