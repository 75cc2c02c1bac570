//! Alternate verification sources.
//!
//! A small, fixed, configurable list tried after the authority's batch and
//! search paths, each at most once per citation. The engine ships with no
//! enabled alternates; deployments name them via `ALT_SOURCES` and register
//! implementations at startup.

use std::sync::Arc;

use async_trait::async_trait;
use briefcheck_protocol::Citation;
use tracing::warn;

use crate::error::VerifyError;
use crate::wire::CaseCandidate;

#[async_trait]
pub trait AlternateAuthority: Send + Sync {
    /// Short stable name surfaced as `alternate_source_<name>`.
    fn name(&self) -> &str;

    async fn lookup(&self, citation: &Citation) -> Result<Vec<CaseCandidate>, VerifyError>;
}

/// Ordered set of alternates for one engine instance.
#[derive(Default, Clone)]
pub struct AlternateRegistry {
    sources: Vec<Arc<dyn AlternateAuthority>>,
}

impl AlternateRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolve configured names against the registered builders. There are
    /// no built-in sources; every configured name is reported and skipped
    /// unless `with_source` provided it first.
    pub fn from_names(names: &[String]) -> Self {
        for name in names {
            warn!(source = %name, "no alternate source registered under this name");
        }
        Self::default()
    }

    /// Register an implementation (embedding applications and tests).
    pub fn with_source(mut self, source: Arc<dyn AlternateAuthority>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn sources(&self) -> &[Arc<dyn AlternateAuthority>] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
