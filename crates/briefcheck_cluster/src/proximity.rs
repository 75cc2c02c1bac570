//! Parenthetical-aware proximity clustering.
//!
//! Clustering is a property of the document alone: position, reporter
//! families, parenthetical structure, and extracted names. Canonical data is
//! never consulted here; over-greedy clusters are corrected later by the
//! canonical-consistency splitter, which only ever splits.

use briefcheck_protocol::{Citation, Cluster, ClusterId};
use briefcheck_extract::{family_of, names_agree};
use tracing::debug;

use crate::paren::crosses_parenthetical_boundary;

/// Two citations may cluster only when their spans sit within this many
/// characters of each other.
pub const PROXIMITY_THRESHOLD: usize = 200;

/// Group citations into clusters of parallel citations.
///
/// Deterministic: clusters are numbered in increasing order of minimum
/// member span start, members ordered by span start.
pub fn cluster(mut citations: Vec<Citation>, text: &str) -> Vec<Cluster> {
    citations.sort_by_key(|c| c.span.start);
    let n = citations.len();
    let mut components = UnionFind::new(n);

    for i in 0..n {
        for j in (i + 1)..n {
            if citations[j].span.start.saturating_sub(citations[i].span.end)
                > PROXIMITY_THRESHOLD
            {
                break;
            }
            if pair_eligible(&citations[i], &citations[j], text) {
                components.union(i, j);
            }
        }
    }

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut group_of_root: std::collections::HashMap<usize, usize> =
        std::collections::HashMap::new();
    for idx in 0..n {
        let root = components.find(idx);
        let group_idx = *group_of_root.entry(root).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[group_idx].push(idx);
    }

    // Citations were scanned in span order, so the first index of each group
    // is its minimum span start; groups formed in that order are already
    // document-ordered.
    let mut clusters = Vec::with_capacity(groups.len());
    for (cluster_idx, group) in groups.into_iter().enumerate() {
        let id = ClusterId::new(cluster_idx as u32 + 1);
        let mut members: Vec<Citation> = group.iter().map(|&i| citations[i].clone()).collect();
        members.sort_by_key(|c| c.span.start);
        for member in &mut members {
            member.cluster_id = Some(id);
        }
        clusters.push(Cluster::new(id, members));
    }
    debug!(
        citations = n,
        clusters = clusters.len(),
        "proximity clustering done"
    );
    clusters
}

/// Pairwise eligibility: proximity, different reporter families, no
/// parenthetical boundary between, and name agreement when both sides have
/// an extracted name.
fn pair_eligible(a: &Citation, b: &Citation, text: &str) -> bool {
    if a.span.gap_to(&b.span) > PROXIMITY_THRESHOLD {
        return false;
    }
    // Two citations from the same reporter family are two different cases,
    // never parallels of one. Unknown families never cluster.
    match (family_of(&a.reporter), family_of(&b.reporter)) {
        (Some(fa), Some(fb)) if fa != fb => {}
        _ => return false,
    }
    if crosses_parenthetical_boundary(text, &a.span, &b.span) {
        return false;
    }
    match (&a.extracted_case_name, &b.extracted_case_name) {
        (Some(name_a), Some(name_b)) => names_agree(name_a, name_b),
        _ => true,
    }
}

/// Plain union-find over citation indices.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            let root = self.find(self.parent[x]);
            self.parent[x] = root;
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            // Attach the later root under the earlier one so roots stay
            // document-ordered.
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}
