//! The batched verifier: primary batch lookups, fallbacks, acceptance
//! filtering, and in-cluster propagation.

use std::sync::Arc;
use std::time::Duration;

use briefcheck_protocol::defaults::{BATCH_TIMEOUT_SECS, MAX_BATCHES_IN_FLIGHT};
use briefcheck_protocol::{
    CancellationToken, Citation, Cluster, EngineConfig, EngineError, VerificationSource,
    VerifiedStatus,
};
use futures::stream::StreamExt;
use tracing::{debug, info, warn};

use crate::accept::accept_candidates;
use crate::alternates::AlternateRegistry;
use crate::authority::AuthorityApi;
use crate::error::VerifyError;
use crate::rate_limit::RateLimiter;
use crate::wire::{BatchEntry, CaseCandidate};

/// Position of one citation inside the cluster list.
type Slot = (usize, usize);

pub struct Verifier {
    authority: Arc<dyn AuthorityApi>,
    limiter: Arc<RateLimiter>,
    alternates: AlternateRegistry,
    batch_size: usize,
}

impl Verifier {
    pub fn new(
        authority: Arc<dyn AuthorityApi>,
        limiter: Arc<RateLimiter>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            authority,
            limiter,
            alternates: AlternateRegistry::from_names(&config.alt_sources),
            batch_size: config.batch_size.max(1),
        }
    }

    pub fn with_alternates(mut self, alternates: AlternateRegistry) -> Self {
        self.alternates = alternates;
        self
    }

    /// Populate `canonical_*` fields across all clusters.
    ///
    /// Per-citation failures degrade that citation; only cancellation fails
    /// the call. Progress is reported once per completed batch.
    pub async fn verify(
        &self,
        clusters: &mut [Cluster],
        cancel: &CancellationToken,
        mut on_batch: impl FnMut(usize, usize),
    ) -> Result<(), EngineError> {
        let slots: Vec<Slot> = clusters
            .iter()
            .enumerate()
            .flat_map(|(ci, cluster)| (0..cluster.members.len()).map(move |mi| (ci, mi)))
            .collect();
        if slots.is_empty() {
            return Ok(());
        }

        let batches: Vec<Vec<(Slot, String)>> = slots
            .iter()
            .map(|&(ci, mi)| ((ci, mi), clusters[ci].members[mi].text.clone()))
            .collect::<Vec<_>>()
            .chunks(self.batch_size)
            .map(|chunk| chunk.to_vec())
            .collect();
        let total_batches = batches.len();
        info!(
            citations = slots.len(),
            batches = total_batches,
            "starting batch verification"
        );

        let batch_futures: Vec<_> = batches
            .into_iter()
            .map(|batch| {
                let authority = Arc::clone(&self.authority);
                let limiter = Arc::clone(&self.limiter);
                async move {
                    let texts: Vec<String> =
                        batch.iter().map(|(_, text)| text.clone()).collect();
                    let entries = run_batch(authority, limiter, texts).await;
                    (batch, entries)
                }
            })
            .collect();

        let mut stream =
            futures::stream::iter(batch_futures).buffer_unordered(MAX_BATCHES_IN_FLIGHT);
        let mut completed = 0usize;
        while let Some((batch, outcome)) = stream.next().await {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            if let Some(entries) = outcome {
                self.apply_entries(clusters, &batch, entries).await;
            }
            completed += 1;
            on_batch(completed, total_batches);
        }
        drop(stream);
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        self.fallback_pass(clusters, cancel).await?;
        propagate_parallel(clusters);
        Ok(())
    }

    /// Merge one batch response into the clusters.
    async fn apply_entries(
        &self,
        clusters: &mut [Cluster],
        batch: &[(Slot, String)],
        entries: Vec<BatchEntry>,
    ) {
        let aligned = entries.len() == batch.len();
        if !aligned {
            warn!(
                sent = batch.len(),
                got = entries.len(),
                "batch response misaligned, matching by citation text"
            );
        }
        for (idx, ((ci, mi), text)) in batch.iter().enumerate() {
            let entry = if aligned {
                Some(&entries[idx])
            } else {
                entries
                    .iter()
                    .find(|e| e.citation.as_deref() == Some(text.as_str()))
            };
            let Some(entry) = entry else {
                continue;
            };
            if entry.is_rate_limited() {
                self.limiter.open_circuit().await;
                continue;
            }
            if !entry.is_found() {
                continue;
            }
            let citation = &mut clusters[*ci].members[*mi];
            match accept_candidates(citation, &entry.clusters) {
                Ok(candidate) => {
                    assign(citation, &candidate, VerificationSource::BatchLookup);
                }
                Err(reason) => {
                    debug!(citation = %citation.text, %reason, "batch candidate rejected");
                }
            }
        }
    }

    /// Search-endpoint and alternate-source fallbacks for citations the
    /// batch path left unverified, in clusters with no verified member.
    async fn fallback_pass(
        &self,
        clusters: &mut [Cluster],
        cancel: &CancellationToken,
    ) -> Result<(), EngineError> {
        for ci in 0..clusters.len() {
            if clusters[ci].has_verified_member() {
                continue;
            }
            for mi in 0..clusters[ci].members.len() {
                if cancel.is_cancelled() {
                    return Err(EngineError::Cancelled);
                }
                if clusters[ci].members[mi].verified.is_verified() {
                    continue;
                }
                self.try_search(&mut clusters[ci].members[mi]).await;
                if !clusters[ci].members[mi].verified.is_verified() {
                    self.try_alternates(&mut clusters[ci].members[mi]).await;
                }
                if clusters[ci].has_verified_member() {
                    break;
                }
            }
        }
        Ok(())
    }

    async fn try_search(&self, citation: &mut Citation) {
        if self.limiter.circuit_open().await {
            return;
        }
        if self.limiter.acquire().await.is_err() {
            return;
        }
        let query = match &citation.extracted_case_name {
            Some(name) => format!("{} {}", name, citation.text),
            None => citation.text.clone(),
        };
        match self.authority.search(&query).await {
            Ok(results) => {
                let top: Vec<CaseCandidate> = results.into_iter().take(5).collect();
                match accept_candidates(citation, &top) {
                    Ok(candidate) => {
                        assign(citation, &candidate, VerificationSource::SearchApi);
                    }
                    Err(reason) => {
                        debug!(citation = %citation.text, %reason, "search candidate rejected");
                    }
                }
            }
            Err(VerifyError::RateLimited) => self.limiter.open_circuit().await,
            Err(e) => debug!(citation = %citation.text, error = %e, "search fallback failed"),
        }
    }

    async fn try_alternates(&self, citation: &mut Citation) {
        for source in self.alternates.sources() {
            match source.lookup(citation).await {
                Ok(candidates) if !candidates.is_empty() => {
                    match accept_candidates(citation, &candidates) {
                        Ok(candidate) => {
                            assign(
                                citation,
                                &candidate,
                                VerificationSource::AlternateSource(source.name().to_string()),
                            );
                            return;
                        }
                        Err(reason) => {
                            debug!(
                                citation = %citation.text,
                                source = source.name(),
                                %reason,
                                "alternate candidate rejected"
                            );
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    debug!(
                        citation = %citation.text,
                        source = source.name(),
                        error = %e,
                        "alternate source failed"
                    );
                }
            }
        }
    }
}

/// One batch toward the authority: take a token, call with the per-batch
/// timeout, retry once, then leave the citations for the fallback path.
async fn run_batch(
    authority: Arc<dyn AuthorityApi>,
    limiter: Arc<RateLimiter>,
    texts: Vec<String>,
) -> Option<Vec<BatchEntry>> {
    for attempt in 0..2 {
        match limiter.acquire().await {
            Ok(()) => {}
            Err(_) => return None,
        }
        let call = authority.batch_lookup(&texts);
        match tokio::time::timeout(Duration::from_secs(BATCH_TIMEOUT_SECS), call).await {
            Ok(Ok(entries)) => return Some(entries),
            Ok(Err(VerifyError::RateLimited)) => {
                limiter.open_circuit().await;
                return None;
            }
            Ok(Err(e)) => {
                warn!(attempt, error = %e, "batch lookup failed");
            }
            Err(_) => {
                warn!(attempt, "batch lookup timed out");
            }
        }
    }
    None
}

fn assign(citation: &mut Citation, candidate: &CaseCandidate, source: VerificationSource) {
    citation.canonical_name = candidate.case_name.clone();
    citation.canonical_date = candidate.date_filed.clone();
    citation.canonical_url = candidate.absolute_url.clone();
    citation.verification_source = Some(source);
    citation.verified = VerifiedStatus::Verified;
}

/// In-cluster propagation: one directly verified member makes the others
/// `verified_by_parallel`, unless the cluster's verified members disagree
/// (the splitter handles those) or a member carries its own verification.
fn propagate_parallel(clusters: &mut [Cluster]) {
    for cluster in clusters.iter_mut() {
        let mut names: Vec<&str> = cluster
            .members
            .iter()
            .filter(|m| m.verified == VerifiedStatus::Verified)
            .filter_map(|m| m.canonical_name.as_deref())
            .collect();
        names.sort_unstable();
        names.dedup();
        if names.len() != 1 {
            continue;
        }
        let donor = cluster
            .members
            .iter()
            .find(|m| m.verified == VerifiedStatus::Verified)
            .cloned();
        let Some(donor) = donor else { continue };
        cluster.canonical_name = donor.canonical_name.clone();
        cluster.canonical_date = donor.canonical_date.clone();
        cluster.canonical_url = donor.canonical_url.clone();
        for member in &mut cluster.members {
            if member.verified == VerifiedStatus::Unverified {
                member.verified = VerifiedStatus::VerifiedByParallel;
                member.canonical_name = donor.canonical_name.clone();
                member.canonical_date = donor.canonical_date.clone();
                member.canonical_url = donor.canonical_url.clone();
                member.verification_source = donor.verification_source.clone();
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use briefcheck_protocol::{ClusterId, Jurisdiction, Span};

    use crate::mock::{candidate, MockAuthority};

    // The extract and cluster crates sit above this one, so tests build
    // clusters by hand instead of running the earlier pipeline stages.
    fn citation(text: &str, start: usize, name: Option<&str>, hint: Jurisdiction) -> Citation {
        Citation {
            text: text.to_string(),
            span: Span::new(start, start + text.len()),
            reporter: "Wn.2d".to_string(),
            volume: 1,
            page: 1,
            pincite: None,
            extracted_case_name: name.map(str::to_string),
            extracted_date: None,
            jurisdiction_hint: hint,
            canonical_name: None,
            canonical_date: None,
            canonical_url: None,
            verification_source: None,
            verified: VerifiedStatus::Unverified,
            cluster_id: Some(ClusterId::new(1)),
        }
    }

    fn clustered(groups: Vec<Vec<Citation>>) -> Vec<Cluster> {
        groups
            .into_iter()
            .enumerate()
            .map(|(i, members)| {
                let id = ClusterId::new(i as u32 + 1);
                let mut cluster = Cluster::new(id, members);
                for m in &mut cluster.members {
                    m.cluster_id = Some(id);
                }
                cluster
            })
            .collect()
    }

    fn verifier(mock: Arc<MockAuthority>) -> Verifier {
        Verifier::new(mock, Arc::new(RateLimiter::new(180)), &EngineConfig::default())
    }

    #[tokio::test]
    async fn test_batch_verification_assigns_canonical_and_propagates() {
        let mock = Arc::new(MockAuthority::new());
        mock.answer(
            "183 Wn.2d 649",
            candidate(
                "Lopez Demetrio v. Sakuma Bros. Farms",
                "2015-07-16",
                "/opinion/1/",
                "Washington Supreme Court",
            ),
        );
        let mut clusters = clustered(vec![vec![
            citation(
                "183 Wn.2d 649",
                0,
                Some("Lopez Demetrio v. Sakuma Bros. Farms"),
                Jurisdiction::state("washington"),
            ),
            citation(
                "355 P.3d 258",
                20,
                Some("Lopez Demetrio v. Sakuma Bros. Farms"),
                Jurisdiction::Unknown,
            ),
        ]]);

        let v = verifier(Arc::clone(&mock));
        let cancel = CancellationToken::new();
        v.verify(&mut clusters, &cancel, |_, _| {}).await.unwrap();

        let first = &clusters[0].members[0];
        assert_eq!(first.verified, VerifiedStatus::Verified);
        assert_eq!(
            first.canonical_name.as_deref(),
            Some("Lopez Demetrio v. Sakuma Bros. Farms")
        );
        assert_eq!(first.verification_source, Some(VerificationSource::BatchLookup));
        // Extracted data untouched by verification.
        assert_eq!(
            first.extracted_case_name.as_deref(),
            Some("Lopez Demetrio v. Sakuma Bros. Farms")
        );

        let second = &clusters[0].members[1];
        assert_eq!(second.verified, VerifiedStatus::VerifiedByParallel);
        assert_eq!(
            second.canonical_name.as_deref(),
            Some("Lopez Demetrio v. Sakuma Bros. Farms")
        );
        assert_eq!(
            clusters[0].canonical_name.as_deref(),
            Some("Lopez Demetrio v. Sakuma Bros. Farms")
        );
        assert_eq!(mock.batch_calls(), 1);
    }

    #[tokio::test]
    async fn test_one_call_per_fifty_citations() {
        let mock = Arc::new(MockAuthority::new());
        let mut groups = Vec::new();
        for i in 0..132u32 {
            let text = format!("{} Wn.2d {}", i + 1, i + 10);
            mock.answer(
                text.clone(),
                candidate(
                    &format!("Case {} v. State", i),
                    "2015-01-01",
                    "/opinion/x/",
                    "Washington Supreme Court",
                ),
            );
            groups.push(vec![citation(
                &text,
                (i as usize) * 300,
                None,
                Jurisdiction::state("washington"),
            )]);
        }
        let mut clusters = clustered(groups);

        let v = verifier(Arc::clone(&mock));
        let cancel = CancellationToken::new();
        let mut seen: Vec<(usize, usize)> = Vec::new();
        v.verify(&mut clusters, &cancel, |k, n| seen.push((k, n)))
            .await
            .unwrap();

        assert_eq!(mock.batch_calls(), 3, "ceil(132/50) batch calls expected");
        assert_eq!(mock.search_calls(), 0);
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|(_, n)| *n == 3));
    }

    #[tokio::test]
    async fn test_batch_error_retries_once() {
        let mock = Arc::new(MockAuthority::new());
        mock.fail_next_batch(VerifyError::Http("boom".to_string()));
        mock.answer(
            "183 Wn.2d 649",
            candidate(
                "Lopez Demetrio v. Sakuma Bros. Farms",
                "2015-07-16",
                "/opinion/1/",
                "Washington Supreme Court",
            ),
        );
        let mut clusters = clustered(vec![vec![citation(
            "183 Wn.2d 649",
            0,
            Some("Lopez Demetrio v. Sakuma Bros. Farms"),
            Jurisdiction::state("washington"),
        )]]);

        let v = verifier(Arc::clone(&mock));
        let cancel = CancellationToken::new();
        v.verify(&mut clusters, &cancel, |_, _| {}).await.unwrap();

        assert_eq!(mock.batch_calls(), 2);
        assert_eq!(clusters[0].members[0].verified, VerifiedStatus::Verified);
    }

    #[tokio::test]
    async fn test_search_fallback_rescues_unverified_cluster() {
        let mock = Arc::new(MockAuthority::new());
        mock.search_answer(
            "Gamble",
            vec![candidate(
                "State v. Gamble",
                "2010-02-04",
                "/opinion/2/",
                "Washington Supreme Court",
            )],
        );
        let mut clusters = clustered(vec![vec![citation(
            "168 Wn.2d 161",
            0,
            Some("State v. Gamble"),
            Jurisdiction::state("washington"),
        )]]);

        let v = verifier(Arc::clone(&mock));
        let cancel = CancellationToken::new();
        v.verify(&mut clusters, &cancel, |_, _| {}).await.unwrap();

        let member = &clusters[0].members[0];
        assert_eq!(member.verified, VerifiedStatus::Verified);
        assert_eq!(member.verification_source, Some(VerificationSource::SearchApi));
        assert_eq!(mock.search_calls(), 1);
    }

    #[tokio::test]
    async fn test_no_fallback_when_cluster_already_verified() {
        let mock = Arc::new(MockAuthority::new());
        mock.answer(
            "183 Wn.2d 649",
            candidate(
                "Lopez Demetrio v. Sakuma Bros. Farms",
                "2015-07-16",
                "/opinion/1/",
                "Washington Supreme Court",
            ),
        );
        let mut clusters = clustered(vec![vec![
            citation(
                "183 Wn.2d 649",
                0,
                Some("Lopez Demetrio v. Sakuma Bros. Farms"),
                Jurisdiction::state("washington"),
            ),
            citation("355 P.3d 258", 20, None, Jurisdiction::Unknown),
        ]]);

        let v = verifier(Arc::clone(&mock));
        let cancel = CancellationToken::new();
        v.verify(&mut clusters, &cancel, |_, _| {}).await.unwrap();
        assert_eq!(mock.search_calls(), 0);
    }

    #[tokio::test]
    async fn test_inconsistent_cluster_left_for_splitter() {
        let mock = Arc::new(MockAuthority::new());
        mock.answer(
            "410 U.S. 113",
            candidate(
                "Roe v. Wade",
                "1973-01-22",
                "/opinion/roe/",
                "Supreme Court of the United States",
            ),
        );
        mock.answer(
            "347 U.S. 483",
            candidate(
                "Brown v. Board of Education",
                "1954-05-17",
                "/opinion/brown/",
                "Supreme Court of the United States",
            ),
        );
        let mut clusters = clustered(vec![vec![
            citation("410 U.S. 113", 0, None, Jurisdiction::Federal),
            citation("347 U.S. 483", 40, None, Jurisdiction::Federal),
        ]]);

        let v = verifier(Arc::clone(&mock));
        let cancel = CancellationToken::new();
        v.verify(&mut clusters, &cancel, |_, _| {}).await.unwrap();

        // Two distinct canonical names: no propagation, no cluster canonical.
        assert!(clusters[0].canonical_name.is_none());
        let names: Vec<_> = clusters[0]
            .members
            .iter()
            .filter_map(|m| m.canonical_name.as_deref())
            .collect();
        assert_eq!(names, vec!["Roe v. Wade", "Brown v. Board of Education"]);
    }

    #[tokio::test]
    async fn test_cancellation_surfaces() {
        let mock = Arc::new(MockAuthority::new());
        let mut clusters = clustered(vec![vec![citation(
            "183 Wn.2d 649",
            0,
            None,
            Jurisdiction::state("washington"),
        )]]);
        let v = verifier(Arc::clone(&mock));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = v.verify(&mut clusters, &cancel, |_, _| {}).await.unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
    }

    #[tokio::test]
    async fn test_ambiguous_candidates_stay_unverified() {
        let mock = Arc::new(MockAuthority::new());
        mock.answer_many(
            "168 Wn.2d 161",
            vec![
                candidate(
                    "State v. Gamble",
                    "2010-01-01",
                    "/a/",
                    "Washington Supreme Court",
                ),
                candidate(
                    "State v. Gamble",
                    "2010-06-01",
                    "/b/",
                    "Washington Court of Appeals",
                ),
            ],
        );
        let mut clusters = clustered(vec![vec![citation(
            "168 Wn.2d 161",
            0,
            Some("State v. Gamble"),
            Jurisdiction::state("washington"),
        )]]);

        let v = verifier(Arc::clone(&mock));
        let cancel = CancellationToken::new();
        v.verify(&mut clusters, &cancel, |_, _| {}).await.unwrap();

        assert_eq!(clusters[0].members[0].verified, VerifiedStatus::Unverified);
        assert!(clusters[0].members[0].canonical_name.is_none());
    }

    #[tokio::test]
    async fn test_alternate_source_tried_after_search() {
        use crate::alternates::AlternateAuthority;
        use async_trait::async_trait;
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct Fixed {
            calls: AtomicUsize,
        }

        #[async_trait]
        impl AlternateAuthority for Fixed {
            fn name(&self) -> &str {
                "fixture"
            }

            async fn lookup(
                &self,
                _citation: &Citation,
            ) -> Result<Vec<CaseCandidate>, VerifyError> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![candidate(
                    "State v. Gamble",
                    "2010-02-04",
                    "https://alt.example/gamble",
                    "Washington Supreme Court",
                )])
            }
        }

        let mock = Arc::new(MockAuthority::new());
        let alternate = Arc::new(Fixed {
            calls: AtomicUsize::new(0),
        });
        let mut clusters = clustered(vec![vec![citation(
            "168 Wn.2d 161",
            0,
            Some("State v. Gamble"),
            Jurisdiction::state("washington"),
        )]]);

        let v = verifier(Arc::clone(&mock)).with_alternates(
            AlternateRegistry::empty().with_source(Arc::clone(&alternate) as Arc<dyn AlternateAuthority>),
        );
        let cancel = CancellationToken::new();
        v.verify(&mut clusters, &cancel, |_, _| {}).await.unwrap();

        let member = &clusters[0].members[0];
        assert_eq!(member.verified, VerifiedStatus::Verified);
        assert_eq!(
            member.verification_source,
            Some(VerificationSource::AlternateSource("fixture".to_string()))
        );
        assert_eq!(alternate.calls.load(Ordering::SeqCst), 1);
    }
}
