//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters; substituted with in-memory fakes in tests.

use crate::domain::{CompanyProfile, DocumentPointer, DomainError, FilingHistory, ProfilePage};

/// Company registry gateway. One HTTP GET per call, no retries.
///
/// The two company endpoints are built from the company identifier; document
/// metadata/bundle/document links are opaque URIs returned within prior
/// responses and fetched as-is.
#[async_trait::async_trait]
pub trait RegistryGateway: Send + Sync {
    /// Fetch the company's current profile payload.
    async fn company_profile(&self, company_id: &str) -> Result<serde_json::Value, DomainError>;

    /// Fetch the company's filing history listing.
    async fn filing_history(&self, company_id: &str) -> Result<FilingHistory, DomainError>;

    /// Fetch an opaque link returned by a prior response, as JSON.
    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value, DomainError>;

    /// Fetch an opaque link with an `Accept` preference selecting the desired
    /// representation. The body is decoded as UTF-8 text.
    async fn fetch_document(&self, url: &str, accept: &str) -> Result<String, DomainError>;
}

/// Blob store for raw document content. Keys use `/` separators.
#[async_trait::async_trait]
pub trait ContentStorePort: Send + Sync {
    /// Store `body` under `key`, overwriting any previous content.
    /// Returns the storage URI of the written object.
    async fn put_document(
        &self,
        key: &str,
        body: &[u8],
        content_type: &str,
    ) -> Result<String, DomainError>;
}

/// Keyed index of stored documents, one pointer per (company, period).
#[async_trait::async_trait]
pub trait IndexStorePort: Send + Sync {
    /// Upsert a pointer record. An identical (company, period) key overwrites.
    async fn put_pointer(&self, pointer: &DocumentPointer) -> Result<(), DomainError>;
}

/// Keyed store of per-company profile records with full-scan support.
#[async_trait::async_trait]
pub trait ProfileStorePort: Send + Sync {
    /// Point lookup. `None` when no record exists for the company.
    async fn get_profile(&self, company_id: &str) -> Result<Option<CompanyProfile>, DomainError>;

    /// Atomic per-key overwrite of the whole record.
    async fn upsert_profile(&self, record: &CompanyProfile) -> Result<(), DomainError>;

    /// Scan one page of records. Pass the previous page's continuation token
    /// to resume; a `None` token in the result means the scan is exhausted.
    async fn scan_page(
        &self,
        cursor: Option<String>,
        limit: u32,
    ) -> Result<ProfilePage, DomainError>;
}
