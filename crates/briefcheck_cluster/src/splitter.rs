//! Canonical-consistency splitting.
//!
//! The only post-verification modification permitted to cluster membership.
//! Clusters whose members verified to different canonical cases are split;
//! clusters are never merged, and extracted data is never touched.

use briefcheck_protocol::{Cluster, ClusterId, ClusterType, VerifiedStatus};
use tracing::info;

/// Re-examine verified clusters and split any whose members carry two or
/// more distinct canonical names. Members without canonical data attach to
/// the sub-cluster whose verified members are closest in the document, ties
/// to the earlier one. Cluster ids are reassigned in document order over the
/// final set.
pub fn split_by_canonical(clusters: Vec<Cluster>) -> Vec<Cluster> {
    let mut result: Vec<Cluster> = Vec::with_capacity(clusters.len());
    for cluster in clusters {
        let mut distinct: Vec<String> = Vec::new();
        for member in &cluster.members {
            if let Some(name) = &member.canonical_name {
                if !distinct.contains(name) {
                    distinct.push(name.clone());
                }
            }
        }
        if distinct.len() <= 1 {
            result.push(cluster);
            continue;
        }
        info!(
            cluster = %cluster.id,
            canonical_names = distinct.len(),
            "splitting canonically inconsistent cluster"
        );
        result.extend(split_one(cluster, &distinct));
    }

    renumber(&mut result);
    result
}

fn split_one(cluster: Cluster, distinct: &[String]) -> Vec<Cluster> {
    let mut subs: Vec<Cluster> = distinct
        .iter()
        .map(|name| {
            let mut sub = Cluster::new(ClusterId::new(0), Vec::new());
            sub.cluster_type = ClusterType::SplitByCanonical;
            sub.canonical_name = Some(name.clone());
            sub
        })
        .collect();

    let (with_canonical, without): (Vec<_>, Vec<_>) = cluster
        .members
        .into_iter()
        .partition(|m| m.canonical_name.is_some());

    for member in with_canonical {
        let name = member.canonical_name.as_deref().unwrap_or_default();
        if let Some(sub) = subs
            .iter_mut()
            .find(|s| s.canonical_name.as_deref() == Some(name))
        {
            if sub.canonical_date.is_none() {
                sub.canonical_date = member.canonical_date.clone();
            }
            if sub.canonical_url.is_none() {
                sub.canonical_url = member.canonical_url.clone();
            }
            sub.members.push(member);
        }
    }

    // Members the verifier could not place attach by minimum span distance
    // to a verified member; ties break toward the earlier sub-cluster.
    for member in without {
        let mut best: Option<(usize, usize)> = None; // (distance, sub index)
        for (idx, sub) in subs.iter().enumerate() {
            let distance = sub
                .members
                .iter()
                .filter(|m| m.canonical_name.is_some())
                .map(|m| m.span.gap_to(&member.span))
                .min()
                .unwrap_or(usize::MAX);
            if best.map(|(d, _)| distance < d).unwrap_or(true) {
                best = Some((distance, idx));
            }
        }
        let target = best.map(|(_, idx)| idx).unwrap_or(0);
        subs[target].members.push(member);
    }

    for sub in &mut subs {
        sub.members.sort_by_key(|m| m.span.start);
        inherit_verification(sub);
    }
    subs.retain(|s| !s.members.is_empty());
    subs
}

/// Within one (now consistent) sub-cluster, members without their own
/// verification inherit the cluster's canonical data as
/// `verified_by_parallel`.
fn inherit_verification(cluster: &mut Cluster) {
    if !cluster.has_verified_member() {
        return;
    }
    let name = cluster.canonical_name.clone();
    let date = cluster.canonical_date.clone();
    let url = cluster.canonical_url.clone();
    for member in &mut cluster.members {
        if member.verified == VerifiedStatus::Unverified {
            member.verified = VerifiedStatus::VerifiedByParallel;
            member.canonical_name = name.clone();
            member.canonical_date = date.clone();
            member.canonical_url = url.clone();
        }
    }
}

/// Reassign ids c1..cn over the final set, ordered by minimum member span.
fn renumber(clusters: &mut [Cluster]) {
    clusters.sort_by_key(|c| c.min_span_start());
    for (idx, cluster) in clusters.iter_mut().enumerate() {
        let id = ClusterId::new(idx as u32 + 1);
        cluster.id = id;
        for member in &mut cluster.members {
            member.cluster_id = Some(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use briefcheck_protocol::{Citation, Jurisdiction, Span, VerificationSource};

    fn verified_citation(text: &str, start: usize, canonical: &str) -> Citation {
        let mut c = unverified_citation(text, start);
        c.canonical_name = Some(canonical.to_string());
        c.canonical_url = Some(format!("https://example.test/{}", start));
        c.verified = VerifiedStatus::Verified;
        c.verification_source = Some(VerificationSource::BatchLookup);
        c
    }

    fn unverified_citation(text: &str, start: usize) -> Citation {
        Citation {
            text: text.to_string(),
            span: Span::new(start, start + text.len()),
            reporter: "U.S.".to_string(),
            volume: 1,
            page: 1,
            pincite: None,
            extracted_case_name: None,
            extracted_date: None,
            jurisdiction_hint: Jurisdiction::Federal,
            canonical_name: None,
            canonical_date: None,
            canonical_url: None,
            verification_source: None,
            verified: VerifiedStatus::Unverified,
            cluster_id: Some(ClusterId::new(1)),
        }
    }

    #[test]
    fn test_consistent_cluster_untouched() {
        let clusters = vec![Cluster::new(
            ClusterId::new(1),
            vec![
                verified_citation("410 U.S. 113", 0, "Roe v. Wade"),
                unverified_citation("93 S. Ct. 705", 20),
            ],
        )];
        let out = split_by_canonical(clusters);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].cluster_type, ClusterType::ProximityBased);
    }

    #[test]
    fn test_inconsistent_cluster_splits() {
        let clusters = vec![Cluster::new(
            ClusterId::new(1),
            vec![
                verified_citation("410 U.S. 113", 0, "Roe v. Wade"),
                verified_citation("347 U.S. 483", 40, "Brown v. Board of Education"),
            ],
        )];
        let out = split_by_canonical(clusters);
        assert_eq!(out.len(), 2);
        assert!(out
            .iter()
            .all(|c| c.cluster_type == ClusterType::SplitByCanonical));
        assert_eq!(out[0].id, ClusterId::new(1));
        assert_eq!(out[1].id, ClusterId::new(2));
        assert_eq!(out[0].canonical_name.as_deref(), Some("Roe v. Wade"));
        assert_eq!(
            out[1].canonical_name.as_deref(),
            Some("Brown v. Board of Education")
        );
    }

    #[test]
    fn test_unplaced_member_attaches_to_nearest() {
        let clusters = vec![Cluster::new(
            ClusterId::new(1),
            vec![
                verified_citation("410 U.S. 113", 0, "Roe v. Wade"),
                verified_citation("347 U.S. 483", 100, "Brown v. Board of Education"),
                unverified_citation("98 S. Ct. 2733", 110),
            ],
        )];
        let out = split_by_canonical(clusters);
        assert_eq!(out.len(), 2);
        let brown = &out[1];
        assert_eq!(brown.members.len(), 2);
        // The attached member inherits the sub-cluster's verification.
        assert_eq!(
            brown.members[1].verified,
            VerifiedStatus::VerifiedByParallel
        );
        assert_eq!(
            brown.members[1].canonical_name.as_deref(),
            Some("Brown v. Board of Education")
        );
    }

    #[test]
    fn test_split_preserves_member_count_and_order() {
        let clusters = vec![Cluster::new(
            ClusterId::new(1),
            vec![
                verified_citation("410 U.S. 113", 0, "Roe v. Wade"),
                verified_citation("347 U.S. 483", 40, "Brown v. Board of Education"),
                verified_citation("93 S. Ct. 705", 80, "Roe v. Wade"),
            ],
        )];
        let out = split_by_canonical(clusters);
        let total: usize = out.iter().map(|c| c.members.len()).sum();
        assert_eq!(total, 3);
        for c in &out {
            let starts: Vec<usize> = c.members.iter().map(|m| m.span.start).collect();
            let mut sorted = starts.clone();
            sorted.sort_unstable();
            assert_eq!(starts, sorted);
            for m in &c.members {
                assert_eq!(m.cluster_id, Some(c.id));
            }
        }
    }
}
