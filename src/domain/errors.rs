//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these. The company-level wrappers
//! carry the operation context and the original cause.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("registry error: {0}")]
    Registry(String),

    #[error("content store error: {0}")]
    ContentStore(String),

    #[error("index store error: {0}")]
    IndexStore(String),

    #[error("profile store error: {0}")]
    ProfileStore(String),

    /// Profile record update failed. Fatal for the calling company's run;
    /// distinct from a profile *fetch* failure, which is logged and tolerated.
    #[error("profile update failed for company {company_id}: {cause}")]
    ProfileUpdate {
        company_id: String,
        cause: Box<DomainError>,
    },

    /// Filing history could not be retrieved. Fatal for the company's run.
    #[error("filing history unavailable for company {company_id}: {cause}")]
    FilingHistory {
        company_id: String,
        cause: Box<DomainError>,
    },

    /// A reconciliation query failed mid-scan. No partial results are returned.
    #[error("{op} failed: {cause}")]
    Scan {
        op: &'static str,
        cause: Box<DomainError>,
    },
}
