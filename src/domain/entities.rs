//! Domain entities. Pure data structures for the core business.
//!
//! No HTTP/store types here — these are mapped from adapters.

use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};

/// Per-company profile record as kept in the profile store.
///
/// Overwritten wholesale on every refresh. `profile` is the raw registry
/// payload and may be JSON null when the upstream fetch failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub company_id: String,
    pub profile: serde_json::Value,
    /// Human-readable refresh time, `%Y-%m-%d %H:%M:%S`.
    pub last_updated: String,
    pub timestamp_unix: i64,
}

/// Filing history listing returned by the registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilingHistory {
    #[serde(default)]
    pub items: Vec<FilingEntry>,
}

/// One filing in a company's history. Transient; never persisted as its own record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilingEntry {
    /// Filing type code, e.g. "AA" for annual accounts.
    #[serde(rename = "type")]
    pub filing_type: Option<String>,
    pub action_date: Option<String>,
    pub description: Option<String>,
    pub description_values: Option<DescriptionValues>,
    pub links: Option<FilingLinks>,
}

impl FilingEntry {
    /// Accounting period end date ("made up to") for accounts filings.
    pub fn made_up_date(&self) -> Option<&str> {
        self.description_values
            .as_ref()
            .and_then(|v| v.made_up_date.as_deref())
    }

    /// Link to the filing's document-metadata resource.
    pub fn document_metadata_link(&self) -> Option<&str> {
        self.links
            .as_ref()
            .and_then(|l| l.document_metadata.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DescriptionValues {
    pub made_up_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilingLinks {
    pub document_metadata: Option<String>,
}

/// Pointer from (company, period) to a stored document.
///
/// The key is derived deterministically from company id and period date, so
/// re-processing the same filing period overwrites rather than duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPointer {
    pub company_id: String,
    /// Accounting period end date the document was made up to.
    pub period: String,
    pub key: String,
    pub uri: String,
    pub timestamp_date: String,
    pub timestamp_unix: i64,
}

/// One page of a profile-store scan. `next` is an opaque continuation token;
/// `None` means the scan is exhausted.
#[derive(Debug, Clone)]
pub struct ProfilePage {
    pub items: Vec<CompanyProfile>,
    pub next: Option<String>,
}

/// Write timestamp pair: human-readable local time + unix seconds.
#[derive(Debug, Clone)]
pub struct Stamp {
    pub human: String,
    pub unix: i64,
}

impl Stamp {
    pub fn now() -> Self {
        Self {
            human: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            unix: Utc::now().timestamp(),
        }
    }
}
