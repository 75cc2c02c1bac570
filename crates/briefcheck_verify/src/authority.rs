//! Authority client.
//!
//! `AuthorityApi` is the seam: the HTTP implementation talks to the real
//! citation-lookup service, the mock implements the same trait for tests.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use briefcheck_protocol::defaults::{
    AUTHORITY_REQUEST_TIMEOUT_SECS, BATCH_LOOKUP_PATH, SEARCH_PATH,
};
use briefcheck_protocol::EngineConfig;

use crate::error::VerifyError;
use crate::wire::{BatchEntry, CaseCandidate, SearchResponse};

#[async_trait]
pub trait AuthorityApi: Send + Sync {
    /// Look up a batch of up to 50 citation strings; the response is
    /// aligned to input order.
    async fn batch_lookup(&self, citations: &[String]) -> Result<Vec<BatchEntry>, VerifyError>;

    /// Free-text search returning ranked candidates.
    async fn search(&self, query: &str) -> Result<Vec<CaseCandidate>, VerifyError>;

    fn name(&self) -> &str;
}

/// HTTP client for the authority's REST surface.
pub struct HttpAuthority {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpAuthority {
    pub fn new(config: &EngineConfig) -> Result<Self, VerifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(AUTHORITY_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(VerifyError::from)?;
        Ok(Self {
            client,
            base_url: config.authority_base_url.trim_end_matches('/').to_string(),
            api_key: config.authority_api_key.clone(),
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("Authorization", format!("Token {}", key)),
            None => request,
        }
    }
}

#[async_trait]
impl AuthorityApi for HttpAuthority {
    async fn batch_lookup(&self, citations: &[String]) -> Result<Vec<BatchEntry>, VerifyError> {
        let url = format!("{}{}", self.base_url, BATCH_LOOKUP_PATH);
        debug!(count = citations.len(), "batch lookup");
        let response = self
            .authorize(self.client.post(&url))
            .json(&serde_json::json!({ "citations": citations }))
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(VerifyError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VerifyError::Http(format!("HTTP {}: {}", status, body)));
        }
        let entries: Vec<BatchEntry> = response.json().await?;
        Ok(entries)
    }

    async fn search(&self, query: &str) -> Result<Vec<CaseCandidate>, VerifyError> {
        let url = format!("{}{}", self.base_url, SEARCH_PATH);
        debug!(query, "search lookup");
        let response = self
            .authorize(self.client.get(&url))
            .query(&[("q", query), ("type", "o")])
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(VerifyError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VerifyError::Http(format!("HTTP {}: {}", status, body)));
        }
        let parsed: SearchResponse = response.json().await?;
        Ok(parsed.results)
    }

    fn name(&self) -> &str {
        "authority"
    }
}
