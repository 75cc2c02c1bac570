//! Context metadata propagation within clusters.

use briefcheck_protocol::Cluster;
use briefcheck_extract::names_agree;

/// Within each cluster, fill missing `extracted_case_name` and
/// `extracted_date` from a member that has one.
///
/// Conflicting non-null names keep their per-citation values; the cluster is
/// flagged `ambiguous_context` so the verifier treats its members
/// individually.
pub fn propagate_context(clusters: &mut [Cluster]) {
    for cluster in clusters.iter_mut() {
        propagate_names(cluster);
        propagate_dates(cluster);
    }
}

fn propagate_names(cluster: &mut Cluster) {
    let names: Vec<String> = cluster
        .members
        .iter()
        .filter_map(|m| m.extracted_case_name.clone())
        .collect();
    let Some(first) = names.first() else {
        return;
    };
    if names.iter().all(|n| names_agree(first, n)) {
        for member in &mut cluster.members {
            if member.extracted_case_name.is_none() {
                member.extracted_case_name = Some(first.clone());
            }
        }
    } else {
        cluster.ambiguous_context = true;
    }
}

fn propagate_dates(cluster: &mut Cluster) {
    let dates: Vec<String> = cluster
        .members
        .iter()
        .filter_map(|m| m.extracted_date.clone())
        .collect();
    let Some(first) = dates.first() else {
        return;
    };
    if dates.iter().all(|d| d == first) {
        for member in &mut cluster.members {
            if member.extracted_date.is_none() {
                member.extracted_date = Some(first.clone());
            }
        }
    }
}
