//! In-memory port fakes for use-case tests. No network, no disk.

use crate::domain::{
    CompanyProfile, DocumentPointer, DomainError, FilingEntry, FilingHistory, FilingLinks,
    ProfilePage, Stamp,
};
use crate::ports::{ContentStorePort, IndexStorePort, ProfileStorePort, RegistryGateway};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// Registry fake backed by url -> payload maps. Records every request so
/// tests can assert that classification short-circuits further fetches.
#[derive(Default)]
pub struct FakeRegistry {
    profiles: HashMap<String, serde_json::Value>,
    histories: HashMap<String, FilingHistory>,
    json: HashMap<String, serde_json::Value>,
    documents: HashMap<String, String>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, company_id: &str, profile: serde_json::Value) -> Self {
        self.profiles.insert(company_id.to_string(), profile);
        self
    }

    pub fn with_history(mut self, company_id: &str, history: FilingHistory) -> Self {
        self.histories.insert(company_id.to_string(), history);
        self
    }

    pub fn with_json(mut self, url: &str, payload: serde_json::Value) -> Self {
        self.json.insert(url.to_string(), payload);
        self
    }

    pub fn with_document(mut self, url: &str, body: &str) -> Self {
        self.documents.insert(url.to_string(), body.to_string());
        self
    }

    /// Snapshot of every URL requested so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Shared handle to the request log; survives moving the fake into an Arc.
    pub fn request_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.requests)
    }

    /// A filing entry of the given type whose document metadata lives at `url`.
    pub fn entry_with_metadata_link(filing_type: &str, url: &str) -> FilingEntry {
        FilingEntry {
            filing_type: Some(filing_type.to_string()),
            links: Some(FilingLinks {
                document_metadata: Some(url.to_string()),
            }),
            ..FilingEntry::default()
        }
    }

    fn record(&self, url: &str) {
        self.requests.lock().unwrap().push(url.to_string());
    }
}

#[async_trait::async_trait]
impl RegistryGateway for FakeRegistry {
    async fn company_profile(&self, company_id: &str) -> Result<serde_json::Value, DomainError> {
        self.record(company_id);
        self.profiles
            .get(company_id)
            .cloned()
            .ok_or_else(|| DomainError::Registry(format!("no profile for {company_id}")))
    }

    async fn filing_history(&self, company_id: &str) -> Result<FilingHistory, DomainError> {
        self.record(company_id);
        self.histories
            .get(company_id)
            .cloned()
            .ok_or_else(|| DomainError::Registry(format!("no filing history for {company_id}")))
    }

    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value, DomainError> {
        self.record(url);
        self.json
            .get(url)
            .cloned()
            .ok_or_else(|| DomainError::Registry(format!("no such resource: {url}")))
    }

    async fn fetch_document(&self, url: &str, _accept: &str) -> Result<String, DomainError> {
        self.record(url);
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| DomainError::Registry(format!("no such document: {url}")))
    }
}

/// Blob-store fake: key -> (body, content type).
#[derive(Default)]
pub struct FakeContentStore {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    fail: bool,
}

impl FakeContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes always fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).map(|(b, _)| b.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl ContentStorePort for FakeContentStore {
    async fn put_document(
        &self,
        key: &str,
        body: &[u8],
        content_type: &str,
    ) -> Result<String, DomainError> {
        if self.fail {
            return Err(DomainError::ContentStore("simulated write failure".into()));
        }
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (body.to_vec(), content_type.to_string()));
        Ok(format!("mem://{key}"))
    }
}

/// Pointer-index fake keyed by (company, period).
#[derive(Default)]
pub struct FakeIndexStore {
    pointers: Mutex<HashMap<(String, String), DocumentPointer>>,
    fail: bool,
}

impl FakeIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes always fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn get(&self, company_id: &str, period: &str) -> Option<DocumentPointer> {
        self.pointers
            .lock()
            .unwrap()
            .get(&(company_id.to_string(), period.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.pointers.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl IndexStorePort for FakeIndexStore {
    async fn put_pointer(&self, pointer: &DocumentPointer) -> Result<(), DomainError> {
        if self.fail {
            return Err(DomainError::IndexStore("simulated write failure".into()));
        }
        self.pointers.lock().unwrap().insert(
            (pointer.company_id.clone(), pointer.period.clone()),
            pointer.clone(),
        );
        Ok(())
    }
}

/// Profile-store fake with keyset pagination, mirroring the SQLite adapter.
#[derive(Default)]
pub struct FakeProfileStore {
    records: Mutex<BTreeMap<String, CompanyProfile>>,
    fail_upsert: bool,
    fail_scan: bool,
}

impl FakeProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_upsert() -> Self {
        Self {
            fail_upsert: true,
            ..Self::default()
        }
    }

    pub fn failing_scan() -> Self {
        Self {
            fail_scan: true,
            ..Self::default()
        }
    }

    /// Seed a record directly, bypassing the port.
    pub fn insert(&self, company_id: &str, profile: serde_json::Value) {
        let stamp = Stamp::now();
        self.records.lock().unwrap().insert(
            company_id.to_string(),
            CompanyProfile {
                company_id: company_id.to_string(),
                profile,
                last_updated: stamp.human,
                timestamp_unix: stamp.unix,
            },
        );
    }

    pub fn get(&self, company_id: &str) -> Option<CompanyProfile> {
        self.records.lock().unwrap().get(company_id).cloned()
    }
}

#[async_trait::async_trait]
impl ProfileStorePort for FakeProfileStore {
    async fn get_profile(&self, company_id: &str) -> Result<Option<CompanyProfile>, DomainError> {
        Ok(self.records.lock().unwrap().get(company_id).cloned())
    }

    async fn upsert_profile(&self, record: &CompanyProfile) -> Result<(), DomainError> {
        if self.fail_upsert {
            return Err(DomainError::ProfileStore("simulated update failure".into()));
        }
        self.records
            .lock()
            .unwrap()
            .insert(record.company_id.clone(), record.clone());
        Ok(())
    }

    async fn scan_page(
        &self,
        cursor: Option<String>,
        limit: u32,
    ) -> Result<ProfilePage, DomainError> {
        if self.fail_scan {
            return Err(DomainError::ProfileStore("simulated scan failure".into()));
        }
        let records = self.records.lock().unwrap();
        let start = cursor.unwrap_or_default();
        let items: Vec<CompanyProfile> = records
            .iter()
            .filter(|(id, _)| id.as_str() > start.as_str())
            .take(limit as usize)
            .map(|(_, record)| record.clone())
            .collect();
        let next = if items.len() == limit as usize {
            items.last().map(|r| r.company_id.clone())
        } else {
            None
        };
        Ok(ProfilePage { items, next })
    }
}
