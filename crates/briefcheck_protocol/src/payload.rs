//! Result payload shapes for the HTTP layer and CLI.
//!
//! These shapes are bit-stable: the web collaborator renders them directly,
//! so field names and nesting never change without a contract bump.

use serde::{Deserialize, Serialize};

use crate::types::{
    Citation, Cluster, ClusterId, ClusterType, JobId, JobStatus, VerificationSource,
    VerifiedStatus,
};

/// One citation as surfaced to clients, extracted and canonical fields kept
/// side by side but never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationPayload {
    pub text: String,
    pub reporter: String,
    pub volume: u32,
    pub page: u32,
    pub extracted_case_name: Option<String>,
    pub extracted_date: Option<String>,
    pub canonical_name: Option<String>,
    pub canonical_date: Option<String>,
    pub canonical_url: Option<String>,
    pub verified: VerifiedStatus,
    pub verification_source: Option<VerificationSource>,
}

impl From<&Citation> for CitationPayload {
    fn from(citation: &Citation) -> Self {
        Self {
            text: citation.text.clone(),
            reporter: citation.reporter.clone(),
            volume: citation.volume,
            page: citation.page,
            extracted_case_name: citation.extracted_case_name.clone(),
            extracted_date: citation.extracted_date.clone(),
            canonical_name: citation.canonical_name.clone(),
            canonical_date: citation.canonical_date.clone(),
            canonical_url: citation.canonical_url.clone(),
            verified: citation.verified,
            verification_source: citation.verification_source.clone(),
        }
    }
}

/// One cluster as surfaced to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterPayload {
    pub cluster_id: ClusterId,
    pub cluster_type: ClusterType,
    pub canonical_name: Option<String>,
    pub canonical_date: Option<String>,
    pub canonical_url: Option<String>,
    pub citations: Vec<CitationPayload>,
}

impl From<&Cluster> for ClusterPayload {
    fn from(cluster: &Cluster) -> Self {
        Self {
            cluster_id: cluster.id,
            cluster_type: cluster.cluster_type,
            canonical_name: cluster.canonical_name.clone(),
            canonical_date: cluster.canonical_date.clone(),
            canonical_url: cluster.canonical_url.clone(),
            citations: cluster.members.iter().map(CitationPayload::from).collect(),
        }
    }
}

/// Roll-up counts for the result header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultStats {
    pub total_citations: usize,
    /// Counts both `verified` and `verified_by_parallel`.
    pub verified: usize,
    pub clusters: usize,
}

/// Output of a completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPayload {
    pub clusters: Vec<ClusterPayload>,
    pub stats: ResultStats,
}

impl ResultPayload {
    /// Assemble the client payload from finished clusters.
    pub fn from_clusters(clusters: &[Cluster]) -> Self {
        let cluster_payloads: Vec<ClusterPayload> =
            clusters.iter().map(ClusterPayload::from).collect();
        let total_citations = clusters.iter().map(|c| c.members.len()).sum();
        let verified = clusters
            .iter()
            .flat_map(|c| c.members.iter())
            .filter(|m| m.verified.is_verified())
            .count();
        Self {
            stats: ResultStats {
                total_citations,
                verified,
                clusters: cluster_payloads.len(),
            },
            clusters: cluster_payloads,
        }
    }
}

// ============================================================================
// Submission / polling
// ============================================================================

/// Acknowledgement status for a non-sync submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckStatus {
    Queued,
    /// The sync wall-clock cap was exceeded and the job moved to the queue.
    AsyncPromoted,
}

/// Returned when a submission does not (or no longer can) run synchronously.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitAck {
    pub job_id: JobId,
    pub status: AckStatus,
}

/// Response shape for job polling. `result` is present iff the job
/// completed; `partial_result` only on a timeout failure that had already
/// assembled clusters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    pub progress_pct: u8,
    pub current_step: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_result: Option<ResultPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
