//! Profile refresh: fetch a company's registry profile and upsert the
//! per-company record with freshness timestamps.
//!
//! A fetch failure is tolerated (the record is refreshed with a null payload);
//! a store failure is fatal for the calling company's run.

use crate::domain::{CompanyProfile, DomainError, Stamp};
use crate::ports::{ProfileStorePort, RegistryGateway};
use std::sync::Arc;
use tracing::{info, warn};

pub struct ProfileService {
    registry: Arc<dyn RegistryGateway>,
    profiles: Arc<dyn ProfileStorePort>,
}

impl ProfileService {
    pub fn new(registry: Arc<dyn RegistryGateway>, profiles: Arc<dyn ProfileStorePort>) -> Self {
        Self { registry, profiles }
    }

    /// Fetch the company's current profile payload. Logs and returns `None`
    /// on any error: a stale profile must not block filing processing for a
    /// company whose identifier is already known.
    pub async fn fetch_profile(&self, company_id: &str) -> Option<serde_json::Value> {
        match self.registry.company_profile(company_id).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!(company_id, error = %e, "company profile fetch failed");
                None
            }
        }
    }

    /// Refresh the company's profile record: fetch, then atomically overwrite
    /// the record's payload and both timestamp fields.
    pub async fn upsert_profile(&self, company_id: &str) -> Result<(), DomainError> {
        let stamp = Stamp::now();
        let profile = self
            .fetch_profile(company_id)
            .await
            .unwrap_or(serde_json::Value::Null);
        let record = CompanyProfile {
            company_id: company_id.to_string(),
            profile,
            last_updated: stamp.human.clone(),
            timestamp_unix: stamp.unix,
        };
        self.profiles
            .upsert_profile(&record)
            .await
            .map_err(|e| DomainError::ProfileUpdate {
                company_id: company_id.to_string(),
                cause: Box::new(e),
            })?;
        info!(company_id, last_updated = %stamp.human, "profile record updated");
        Ok(())
    }

    /// Whether a profile record exists for the company. Precondition check for
    /// profile-dependent operations.
    pub async fn profile_exists(&self, company_id: &str) -> Result<bool, DomainError> {
        Ok(self.profiles.get_profile(company_id).await?.is_some())
    }
}
