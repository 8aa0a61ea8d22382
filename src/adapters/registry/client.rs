//! Implements RegistryGateway against the Companies House REST API.
//!
//! One GET per call, no retries; a non-success status is an error the use
//! cases handle at per-entry or per-company granularity. Document links are
//! opaque URIs from prior responses and may point at a different host than
//! the company endpoints (the document API), so they are fetched verbatim.

use crate::domain::{DomainError, FilingHistory};
use crate::ports::RegistryGateway;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, Response};
use tracing::debug;

/// Registry gateway over reqwest. The API key, when configured, is sent as
/// the basic-auth username with an empty password, as the registry expects.
pub struct CompaniesHouseGateway {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CompaniesHouseGateway {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn get(&self, url: &str) -> RequestBuilder {
        let mut req = self.client.get(url);
        if let Some(key) = &self.api_key {
            req = req.basic_auth(key, None::<&str>);
        }
        req
    }

    async fn send_checked(&self, req: RequestBuilder, url: &str) -> Result<Response, DomainError> {
        let res = req
            .send()
            .await
            .map_err(|e| DomainError::Registry(format!("request to {url} failed: {e}")))?;
        if !res.status().is_success() {
            return Err(DomainError::Registry(format!(
                "{url} returned status {}",
                res.status()
            )));
        }
        Ok(res)
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, DomainError> {
        debug!(url, "GET json");
        let res = self.send_checked(self.get(url), url).await?;
        res.json()
            .await
            .map_err(|e| DomainError::Registry(format!("invalid JSON from {url}: {e}")))
    }
}

#[async_trait]
impl RegistryGateway for CompaniesHouseGateway {
    async fn company_profile(&self, company_id: &str) -> Result<serde_json::Value, DomainError> {
        let url = format!("{}/company/{company_id}", self.base_url);
        self.get_json(&url).await
    }

    async fn filing_history(&self, company_id: &str) -> Result<FilingHistory, DomainError> {
        let url = format!("{}/company/{company_id}/filing-history", self.base_url);
        let res = self.send_checked(self.get(&url), &url).await?;
        res.json()
            .await
            .map_err(|e| DomainError::Registry(format!("invalid filing history from {url}: {e}")))
    }

    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value, DomainError> {
        self.get_json(url).await
    }

    async fn fetch_document(&self, url: &str, accept: &str) -> Result<String, DomainError> {
        debug!(url, accept, "GET document");
        let req = self.get(url).header(ACCEPT, accept);
        let res = self.send_checked(req, url).await?;
        let bytes = res
            .bytes()
            .await
            .map_err(|e| DomainError::Registry(format!("reading body from {url} failed: {e}")))?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| DomainError::Registry(format!("document from {url} is not UTF-8: {e}")))
    }
}
