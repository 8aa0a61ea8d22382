//! Reporting queries over the full profile store.
//!
//! Pagination is a lazy cursor: each `next_page` call fetches one page, so a
//! caller can stop early without materializing the whole store. Any store
//! error aborts the query; these are reports, not batch jobs.

use crate::domain::{CompanyProfile, DomainError};
use crate::ports::ProfileStorePort;
use std::collections::HashMap;
use std::sync::Arc;

/// Lazy, restartable scan over the profile store.
pub struct ProfileScan {
    store: Arc<dyn ProfileStorePort>,
    cursor: Option<String>,
    exhausted: bool,
    page_size: u32,
}

impl ProfileScan {
    pub fn new(store: Arc<dyn ProfileStorePort>, page_size: u32) -> Self {
        Self {
            store,
            cursor: None,
            exhausted: false,
            page_size,
        }
    }

    /// Fetch the next page of records. Returns `None` once the store reports
    /// no further continuation token.
    pub async fn next_page(&mut self) -> Result<Option<Vec<CompanyProfile>>, DomainError> {
        if self.exhausted {
            return Ok(None);
        }
        let page = self
            .store
            .scan_page(self.cursor.take(), self.page_size)
            .await?;
        match page.next {
            Some(token) => self.cursor = Some(token),
            None => self.exhausted = true,
        }
        Ok(Some(page.items))
    }
}

/// Read-only reconciliation queries: derived projections of the profile store.
pub struct ReconciliationService {
    profiles: Arc<dyn ProfileStorePort>,
    page_size: u32,
}

impl ReconciliationService {
    pub fn new(profiles: Arc<dyn ProfileStorePort>, page_size: u32) -> Self {
        Self { profiles, page_size }
    }

    /// All known company identifiers, across every page of the store.
    pub async fn collect_company_ids(&self) -> Result<Vec<String>, DomainError> {
        let mut scan = ProfileScan::new(Arc::clone(&self.profiles), self.page_size);
        let mut ids = Vec::new();
        while let Some(page) = scan.next_page().await.map_err(|e| DomainError::Scan {
            op: "collect_company_ids",
            cause: Box::new(e),
        })? {
            ids.extend(page.into_iter().map(|record| record.company_id));
        }
        Ok(ids)
    }

    /// Latest accounts period per company: company id -> made-up-to date.
    /// Companies whose profile lacks the path are omitted.
    pub async fn collect_last_accounts_info(
        &self,
    ) -> Result<HashMap<String, String>, DomainError> {
        let mut scan = ProfileScan::new(Arc::clone(&self.profiles), self.page_size);
        let mut info = HashMap::new();
        while let Some(page) = scan.next_page().await.map_err(|e| DomainError::Scan {
            op: "collect_last_accounts_info",
            cause: Box::new(e),
        })? {
            for record in page {
                if let Some(date) = last_accounts_made_up_to(&record.profile) {
                    info.insert(record.company_id, date.to_string());
                }
            }
        }
        Ok(info)
    }

    /// Point-lookup version of the projection for one company.
    pub async fn get_single_last_accounts_info(
        &self,
        company_id: &str,
    ) -> Result<Option<String>, DomainError> {
        let record = self
            .profiles
            .get_profile(company_id)
            .await
            .map_err(|e| DomainError::Scan {
                op: "get_single_last_accounts_info",
                cause: Box::new(e),
            })?;
        Ok(record
            .and_then(|r| last_accounts_made_up_to(&r.profile).map(str::to_string)))
    }
}

/// Navigate `accounts.last_accounts.made_up_to` in a raw profile payload.
fn last_accounts_made_up_to(profile: &serde_json::Value) -> Option<&str> {
    profile
        .get("accounts")?
        .get("last_accounts")?
        .get("made_up_to")?
        .as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::testing::FakeProfileStore;
    use serde_json::json;

    fn seeded_store() -> Arc<FakeProfileStore> {
        let store = Arc::new(FakeProfileStore::new());
        for (id, date) in [
            ("00000001", Some("2021-03-31")),
            ("00000002", None),
            ("00000003", Some("2022-06-30")),
            ("00000004", Some("2023-12-31")),
            ("00000005", None),
        ] {
            let profile = match date {
                Some(d) => json!({"accounts": {"last_accounts": {"made_up_to": d}}}),
                None => json!({"company_name": "no accounts yet"}),
            };
            store.insert(id, profile);
        }
        store
    }

    #[tokio::test]
    async fn collect_company_ids_is_independent_of_page_size() {
        let store = seeded_store();
        let mut results = Vec::new();
        for page_size in [1, 2, 100] {
            let service = ReconciliationService::new(Arc::clone(&store) as _, page_size);
            let mut ids = service.collect_company_ids().await.unwrap();
            ids.sort();
            results.push(ids);
        }

        assert_eq!(results[0].len(), 5);
        assert_eq!(results[0], results[1]);
        assert_eq!(results[1], results[2]);
    }

    #[tokio::test]
    async fn projection_includes_only_profiles_with_made_up_to() {
        let store = seeded_store();
        for page_size in [1, 3, 100] {
            let service = ReconciliationService::new(Arc::clone(&store) as _, page_size);
            let info = service.collect_last_accounts_info().await.unwrap();

            assert_eq!(info.len(), 3);
            assert_eq!(info["00000001"], "2021-03-31");
            assert_eq!(info["00000004"], "2023-12-31");
            assert!(!info.contains_key("00000002"));
        }
    }

    #[tokio::test]
    async fn single_lookup_matches_projection() {
        let store = seeded_store();
        let service = ReconciliationService::new(Arc::clone(&store) as _, 100);

        assert_eq!(
            service
                .get_single_last_accounts_info("00000003")
                .await
                .unwrap()
                .as_deref(),
            Some("2022-06-30")
        );
        assert_eq!(
            service
                .get_single_last_accounts_info("00000002")
                .await
                .unwrap(),
            None
        );
        assert_eq!(
            service
                .get_single_last_accounts_info("unknown")
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn scan_can_stop_after_the_first_page() {
        let store = seeded_store();
        let mut scan = ProfileScan::new(Arc::clone(&store) as _, 2);

        let first = scan.next_page().await.unwrap().expect("first page");
        assert_eq!(first.len(), 2);
        // Dropping the scan here leaves the remaining pages unfetched.
    }

    #[tokio::test]
    async fn store_error_aborts_the_query() {
        let store = Arc::new(FakeProfileStore::failing_scan());
        let service = ReconciliationService::new(Arc::clone(&store) as _, 10);

        let err = service.collect_company_ids().await.unwrap_err();
        assert!(matches!(err, DomainError::Scan { .. }));
    }
}
