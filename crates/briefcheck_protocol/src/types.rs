//! Canonical pipeline types (citations, clusters, jobs, verification).

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Identifiers
// ============================================================================

/// Opaque job identifier (UUID v4, stringly typed at the edges).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Cluster identifier, stable within a single job.
///
/// Serialized as `"c1"`, `"c2"`, ... in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterId(u32);

impl ClusterId {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

impl FromStr for ClusterId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('c')
            .ok_or_else(|| format!("invalid cluster id: '{}'", s))?;
        let value = digits
            .parse::<u32>()
            .map_err(|_| format!("invalid cluster id: '{}'", s))?;
        Ok(ClusterId(value))
    }
}

impl Serialize for ClusterId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClusterId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

// ============================================================================
// Spans
// ============================================================================

/// Half-open byte range `[start, end)` into the *original* input text.
///
/// Spans are never recorded against a normalized copy; `text[start..end]`
/// must equal the citation text exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Character gap between two non-overlapping spans (0 if they overlap).
    pub fn gap_to(&self, other: &Span) -> usize {
        if self.end <= other.start {
            other.start - self.end
        } else if other.end <= self.start {
            self.start - other.end
        } else {
            0
        }
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

// ============================================================================
// Jurisdictions
// ============================================================================

/// Regional reporter coverage groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionalGroup {
    Pacific,
    NorthEastern,
    NorthWestern,
    SouthEastern,
    SouthWestern,
    Southern,
    Atlantic,
}

impl RegionalGroup {
    /// Canonical lowercase state names covered by the group.
    pub fn states(&self) -> &'static [&'static str] {
        match self {
            RegionalGroup::Pacific => &[
                "alaska",
                "arizona",
                "california",
                "colorado",
                "hawaii",
                "idaho",
                "kansas",
                "montana",
                "nevada",
                "new mexico",
                "oklahoma",
                "oregon",
                "utah",
                "washington",
                "wyoming",
            ],
            RegionalGroup::NorthEastern => &[
                "illinois",
                "indiana",
                "massachusetts",
                "new york",
                "ohio",
            ],
            RegionalGroup::NorthWestern => &[
                "iowa",
                "michigan",
                "minnesota",
                "nebraska",
                "north dakota",
                "south dakota",
                "wisconsin",
            ],
            RegionalGroup::SouthEastern => &[
                "georgia",
                "north carolina",
                "south carolina",
                "virginia",
                "west virginia",
            ],
            RegionalGroup::SouthWestern => &[
                "arkansas",
                "kentucky",
                "missouri",
                "tennessee",
                "texas",
            ],
            RegionalGroup::Southern => &["alabama", "florida", "louisiana", "mississippi"],
            RegionalGroup::Atlantic => &[
                "connecticut",
                "delaware",
                "maine",
                "maryland",
                "new hampshire",
                "new jersey",
                "pennsylvania",
                "rhode island",
                "vermont",
            ],
        }
    }
}

/// Jurisdiction hint derived from a citation's reporter, and the candidate
/// jurisdiction reported by the authority.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Jurisdiction {
    /// Any federal court (U.S., S. Ct., F.2d, ...).
    Federal,
    /// A specific state, canonical lowercase name (e.g. "washington").
    State(String),
    /// A regional reporter covering several states (e.g. P.3d).
    Regional(RegionalGroup),
    Unknown,
}

impl Jurisdiction {
    pub fn state(name: &str) -> Self {
        Jurisdiction::State(name.to_lowercase())
    }

    /// Parse the free-form jurisdiction string the authority returns.
    ///
    /// Court strings look like "Washington Supreme Court", "W.D. Wash.",
    /// "United States Court of Appeals for the Ninth Circuit", or a bare
    /// state name.
    pub fn parse_authority(raw: &str) -> Self {
        let lowered = raw.trim().to_lowercase();
        if lowered.is_empty() {
            return Jurisdiction::Unknown;
        }
        if lowered.contains("united states")
            || lowered.contains("u.s.")
            || lowered.contains("circuit")
            || lowered.contains("federal")
            || lowered.starts_with("scotus")
        {
            return Jurisdiction::Federal;
        }
        for state in ALL_STATES {
            if lowered.contains(state) {
                return Jurisdiction::State((*state).to_string());
            }
        }
        // Postal-style abbreviations show up in district court strings
        // ("W.D. Wash.", "N.D. Cal."); those are federal anyway and were
        // caught above only when spelled out.
        for (abbrev, state) in STATE_ABBREVS {
            if lowered.contains(abbrev) {
                return Jurisdiction::State((*state).to_string());
            }
        }
        Jurisdiction::Unknown
    }

    /// Match acceptance rule: is a candidate from `other` compatible with
    /// this citation's hint?
    ///
    /// A Washington reporter citation must not match a non-Washington case;
    /// federal reporter citations accept any federal court. An `Unknown` on
    /// either side cannot disqualify.
    pub fn accepts(&self, other: &Jurisdiction) -> bool {
        match (self, other) {
            (Jurisdiction::Unknown, _) | (_, Jurisdiction::Unknown) => true,
            (Jurisdiction::Federal, Jurisdiction::Federal) => true,
            (Jurisdiction::Federal, _) | (_, Jurisdiction::Federal) => false,
            (Jurisdiction::State(a), Jurisdiction::State(b)) => a == b,
            (Jurisdiction::Regional(group), Jurisdiction::State(state)) => {
                group.states().contains(&state.as_str())
            }
            (Jurisdiction::State(state), Jurisdiction::Regional(group)) => {
                group.states().contains(&state.as_str())
            }
            (Jurisdiction::Regional(a), Jurisdiction::Regional(b)) => a == b,
        }
    }
}

const ALL_STATES: &[&str] = &[
    "alabama",
    "alaska",
    "arizona",
    "arkansas",
    "california",
    "colorado",
    "connecticut",
    "delaware",
    "florida",
    "georgia",
    "hawaii",
    "idaho",
    "illinois",
    "indiana",
    "iowa",
    "kansas",
    "kentucky",
    "louisiana",
    "maine",
    "maryland",
    "massachusetts",
    "michigan",
    "minnesota",
    "mississippi",
    "missouri",
    "montana",
    "nebraska",
    "nevada",
    "new hampshire",
    "new jersey",
    "new mexico",
    "new york",
    "north carolina",
    "north dakota",
    "ohio",
    "oklahoma",
    "oregon",
    "pennsylvania",
    "rhode island",
    "south carolina",
    "south dakota",
    "tennessee",
    "texas",
    "utah",
    "vermont",
    "virginia",
    "washington",
    "west virginia",
    "wisconsin",
    "wyoming",
];

const STATE_ABBREVS: &[(&str, &str)] = &[
    ("wash.", "washington"),
    ("cal.", "california"),
    ("n.m.", "new mexico"),
    ("n.y.", "new york"),
    ("ill.", "illinois"),
    ("mont.", "montana"),
    ("tex.", "texas"),
    ("fla.", "florida"),
    ("mass.", "massachusetts"),
    ("pa.", "pennsylvania"),
    ("ohio", "ohio"),
];

// ============================================================================
// Citations
// ============================================================================

/// Verification state of a single citation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerifiedStatus {
    #[default]
    Unverified,
    /// Directly verified against the authority.
    Verified,
    /// Another member of the same cluster was directly verified.
    VerifiedByParallel,
}

impl VerifiedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerifiedStatus::Unverified => "unverified",
            VerifiedStatus::Verified => "verified",
            VerifiedStatus::VerifiedByParallel => "verified_by_parallel",
        }
    }

    pub fn is_verified(&self) -> bool {
        !matches!(self, VerifiedStatus::Unverified)
    }
}

impl fmt::Display for VerifiedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One occurrence of a legal citation in the source text.
///
/// `extracted_*` fields are owned by the extractor; `canonical_*` fields are
/// owned by the verifier. The two sets are never mixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Canonical string form, e.g. `"183 Wn.2d 649"`.
    pub text: String,
    /// Byte range into the original input.
    pub span: Span,
    /// Reporter tag, e.g. `Wn.2d`, `P.3d`, `WL`, `NM` (neutral).
    pub reporter: String,
    pub volume: u32,
    pub page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pincite: Option<u32>,
    /// Case name recovered from surrounding text, never from the authority.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_case_name: Option<String>,
    /// Four-digit year recovered from surrounding text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_date: Option<String>,
    pub jurisdiction_hint: Jurisdiction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_source: Option<VerificationSource>,
    #[serde(default)]
    pub verified: VerifiedStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<ClusterId>,
}

impl Citation {
    /// True once the verifier has attached canonical data.
    pub fn has_canonical(&self) -> bool {
        self.canonical_name.is_some()
    }
}

// ============================================================================
// Clusters
// ============================================================================

/// How a cluster came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClusterType {
    /// Produced by document-order proximity clustering.
    #[default]
    ProximityBased,
    /// Produced by the canonical-consistency splitter.
    SplitByCanonical,
}

impl ClusterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterType::ProximityBased => "proximity_based",
            ClusterType::SplitByCanonical => "split_by_canonical",
        }
    }
}

/// One set of citations believed to refer to the same case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: ClusterId,
    /// Members in document order.
    pub members: Vec<Citation>,
    pub cluster_type: ClusterType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    /// Set when members disagreed on extracted case names; read by the
    /// verifier, never serialized into the result payload.
    #[serde(default, skip_serializing)]
    pub ambiguous_context: bool,
}

impl Cluster {
    pub fn new(id: ClusterId, members: Vec<Citation>) -> Self {
        Self {
            id,
            members,
            cluster_type: ClusterType::ProximityBased,
            canonical_name: None,
            canonical_date: None,
            canonical_url: None,
            ambiguous_context: false,
        }
    }

    /// Smallest member span start; clusters are ordered by this.
    pub fn min_span_start(&self) -> usize {
        self.members
            .iter()
            .map(|c| c.span.start)
            .min()
            .unwrap_or(usize::MAX)
    }

    pub fn has_verified_member(&self) -> bool {
        self.members
            .iter()
            .any(|c| c.verified == VerifiedStatus::Verified)
    }
}

// ============================================================================
// Jobs
// ============================================================================

/// Where the input text came from. Decoding happened upstream; the engine
/// only ever sees UTF-8 text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    #[default]
    Text,
    FileDerivedText,
    UrlDerivedText,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Text => "text",
            InputKind::FileDerivedText => "file_derived_text",
            InputKind::UrlDerivedText => "url_derived_text",
        }
    }
}

impl FromStr for InputKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(InputKind::Text),
            "file_derived_text" => Ok(InputKind::FileDerivedText),
            "url_derived_text" => Ok(InputKind::UrlDerivedText),
            _ => Err(format!("invalid input kind: '{}'", s)),
        }
    }
}

/// Job lifecycle. Transitions only in the order
/// `Queued -> Running -> (Completed | Failed)`, terminal exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Legal forward transitions; the store rejects everything else.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        match self {
            JobStatus::Queued => matches!(
                next,
                JobStatus::Running | JobStatus::Completed | JobStatus::Failed
            ),
            JobStatus::Running => next.is_terminal(),
            JobStatus::Completed | JobStatus::Failed => false,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "queued" => Ok(JobStatus::Queued),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(format!("invalid job status: '{}'", s)),
        }
    }
}

/// Execution mode for a submitted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Sync,
    Async,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Sync => write!(f, "sync"),
            RunMode::Async => write!(f, "async"),
        }
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sync" => Ok(RunMode::Sync),
            "async" => Ok(RunMode::Async),
            _ => Err(format!("invalid run mode: '{}'. Expected: sync or async", s)),
        }
    }
}

/// One end-to-end request, as persisted in the progress store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub input_kind: InputKind,
    pub status: JobStatus,
    /// 0..=100, monotonic non-decreasing until terminal.
    pub progress_pct: u8,
    /// Human-readable step label (e.g. `extracting`, `verifying_batch_2_of_3`).
    pub current_step: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<crate::payload::ResultPayload>,
    /// Snapshot of whatever clusters were assembled before a per-job
    /// timeout killed the run. Never set for completed jobs or for
    /// non-timeout failures; `result` stays completed-only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_result: Option<crate::payload::ResultPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: String, // RFC3339
}

impl Job {
    pub fn new(id: JobId, input_kind: InputKind) -> Self {
        Self {
            id,
            input_kind,
            status: JobStatus::Queued,
            progress_pct: 0,
            current_step: "queued".to_string(),
            result: None,
            partial_result: None,
            error: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// What gets enqueued for async jobs. Workers resolve the handler by job
/// kind; the payload is plain data, never a callable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPayload {
    pub text: String,
    pub input_kind: InputKind,
}

// ============================================================================
// Verification
// ============================================================================

/// Which path produced a citation's canonical data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VerificationSource {
    BatchLookup,
    SearchApi,
    AlternateSource(String),
}

impl fmt::Display for VerificationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationSource::BatchLookup => write!(f, "batch_lookup"),
            VerificationSource::SearchApi => write!(f, "search_api"),
            VerificationSource::AlternateSource(name) => write!(f, "alternate_source_{}", name),
        }
    }
}

impl FromStr for VerificationSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "batch_lookup" => Ok(VerificationSource::BatchLookup),
            "search_api" => Ok(VerificationSource::SearchApi),
            other => other
                .strip_prefix("alternate_source_")
                .map(|name| VerificationSource::AlternateSource(name.to_string()))
                .ok_or_else(|| format!("invalid verification source: '{}'", s)),
        }
    }
}

impl Serialize for VerificationSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VerificationSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Authority response for one citation, owned by the verifier until merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub citation_text: String,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<Jurisdiction>,
    pub source: VerificationSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerificationResult {
    pub fn not_found(citation_text: impl Into<String>, source: VerificationSource) -> Self {
        Self {
            citation_text: citation_text.into(),
            found: false,
            canonical_name: None,
            canonical_date: None,
            canonical_url: None,
            jurisdiction: None,
            source,
            error: None,
        }
    }
}

/// Typed verification failure; decides retry vs fallback vs surface.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationFailure {
    #[error("authority rate limit hit")]
    RateLimited,
    #[error("authority reports no match")]
    NotFound,
    #[error("candidate jurisdiction incompatible with citation hint")]
    JurisdictionMismatch,
    #[error("candidate name similarity below threshold")]
    NameMismatch,
    #[error("candidate year differs from extracted year by more than 2")]
    DateMismatch,
    #[error("more than one candidate passed the acceptance filter")]
    AmbiguousMatch,
    #[error("transport error: {0}")]
    TransportError(String),
}
