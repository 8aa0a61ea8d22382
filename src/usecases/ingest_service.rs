//! Main ingestion logic: fetch filing history -> classify -> resolve
//! structured documents -> persist content + pointer.
//!
//! - Entries are processed in the order the registry lists them
//! - A failure on one entry is recorded and the batch continues
//! - Content and pointer writes are independent; a pointer write can fail
//!   after the content write succeeded, leaving the document stored with no
//!   index entry until the filing is re-processed

use crate::domain::{DocumentPointer, DomainError, FilingEntry, FilingHistory, Stamp};
use crate::ports::{ContentStorePort, IndexStorePort, RegistryGateway};
use crate::shared::pacing::Pacer;
use crate::usecases::classifier::{self, STRUCTURED_DOCUMENT_MIME};
use std::sync::Arc;
use tracing::{info, warn};

/// Namespace prefix for content-store keys.
const CONTENT_NAMESPACE: &str = "xhtml_data";

/// Deterministic content-store key for a company's filing period.
pub fn document_key(company_id: &str, period: &str) -> String {
    format!("{CONTENT_NAMESPACE}/{company_id}/{period}")
}

/// Ingestion service. Walks a company's accounts filings and archives every
/// one that offers a structured document representation.
pub struct IngestService {
    registry: Arc<dyn RegistryGateway>,
    content: Arc<dyn ContentStorePort>,
    index: Arc<dyn IndexStorePort>,
    pacer: Pacer,
}

/// Result of one company's ingestion run.
#[derive(Debug)]
pub enum IngestReport {
    /// The filing history contained no annual-accounts filings. Informational;
    /// callers decide whether to treat it as noteworthy.
    NoAccountsFilings,
    /// Per-entry outcomes, in the registry's listing order.
    Processed(Vec<FilingOutcome>),
}

impl IngestReport {
    /// Number of documents stored (content + pointer both written).
    pub fn stored(&self) -> usize {
        match self {
            IngestReport::NoAccountsFilings => 0,
            IngestReport::Processed(outcomes) => outcomes
                .iter()
                .filter(|o| matches!(o, FilingOutcome::Stored { .. }))
                .count(),
        }
    }

    /// Number of entries that failed partway through.
    pub fn failed(&self) -> usize {
        match self {
            IngestReport::NoAccountsFilings => 0,
            IngestReport::Processed(outcomes) => outcomes
                .iter()
                .filter(|o| matches!(o, FilingOutcome::Failed { .. }))
                .count(),
        }
    }
}

/// Outcome of processing a single accounts filing.
#[derive(Debug)]
pub enum FilingOutcome {
    /// Document archived and pointer indexed.
    Stored {
        period: String,
        key: String,
        uri: String,
    },
    /// The filing offers no structured representation; nothing to archive.
    NoStructuredDocument { action_date: Option<String> },
    /// A fetch or store step failed; the entry was skipped.
    Failed {
        period: Option<String>,
        reason: String,
    },
}

impl IngestService {
    pub fn new(
        registry: Arc<dyn RegistryGateway>,
        content: Arc<dyn ContentStorePort>,
        index: Arc<dyn IndexStorePort>,
        pacer: Pacer,
    ) -> Self {
        Self {
            registry,
            content,
            index,
            pacer,
        }
    }

    /// Ingest one company: fetch its filing history and archive its accounts
    /// filings. A history fetch failure is fatal for this company only.
    pub async fn ingest_company(&self, company_id: &str) -> Result<IngestReport, DomainError> {
        info!(company_id, "processing company filings");
        let history = self.registry.filing_history(company_id).await.map_err(|e| {
            DomainError::FilingHistory {
                company_id: company_id.to_string(),
                cause: Box::new(e),
            }
        })?;
        Ok(self.process_history(company_id, &history).await)
    }

    /// Archive every accounts filing in an already-fetched history.
    pub async fn process_history(
        &self,
        company_id: &str,
        history: &FilingHistory,
    ) -> IngestReport {
        if let Some(micro) = classifier::latest_filing_is_micro_entity(history) {
            info!(company_id, micro_entity = micro, "latest accounts filing classified");
        }

        let accounts = classifier::filter_accounts_filings(history);
        if accounts.is_empty() {
            warn!(company_id, "no annual-accounts filings in history");
            return IngestReport::NoAccountsFilings;
        }

        let mut outcomes = Vec::with_capacity(accounts.len());
        for entry in accounts {
            outcomes.push(self.process_entry(company_id, entry).await);
        }
        IngestReport::Processed(outcomes)
    }

    /// Process one accounts filing. Every failure is caught and returned as a
    /// `Failed` outcome so the caller's batch keeps going.
    async fn process_entry(&self, company_id: &str, entry: &FilingEntry) -> FilingOutcome {
        self.pacer.pace().await;
        let structured = match classifier::has_structured_document(&*self.registry, entry).await {
            Ok(v) => v,
            Err(e) => {
                warn!(company_id, error = %e, "document metadata lookup failed");
                return FilingOutcome::Failed {
                    period: entry.made_up_date().map(str::to_string),
                    reason: e.to_string(),
                };
            }
        };
        if !structured {
            info!(
                company_id,
                action_date = entry.action_date.as_deref().unwrap_or("unknown"),
                "no structured representation for this filing"
            );
            return FilingOutcome::NoStructuredDocument {
                action_date: entry.action_date.clone(),
            };
        }

        let Some(period) = entry.made_up_date().map(str::to_string) else {
            warn!(company_id, "accounts filing has no made-up date");
            return FilingOutcome::Failed {
                period: None,
                reason: "filing entry has no made_up_date".to_string(),
            };
        };

        info!(company_id, period = %period, "fetching structured document");
        let body = match self.resolve_structured_document(entry).await {
            Ok(body) => body,
            Err(e) => {
                warn!(company_id, period = %period, error = %e, "document retrieval failed");
                return FilingOutcome::Failed {
                    period: Some(period),
                    reason: e.to_string(),
                };
            }
        };

        let (key, uri) = match self.store_document(company_id, &period, &body).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(company_id, period = %period, error = %e, "content store write failed");
                return FilingOutcome::Failed {
                    period: Some(period),
                    reason: e.to_string(),
                };
            }
        };

        if let Err(e) = self.index_pointer(company_id, &period, &key, &uri).await {
            // Content is already stored; the pointer will catch up on re-processing.
            warn!(company_id, period = %period, error = %e, "pointer index write failed");
            return FilingOutcome::Failed {
                period: Some(period),
                reason: e.to_string(),
            };
        }

        info!(company_id, period = %period, key = %key, "document archived");
        FilingOutcome::Stored { period, key, uri }
    }

    /// Write the document body under the deterministic key. Returns the key
    /// and the storage URI of the written object.
    async fn store_document(
        &self,
        company_id: &str,
        period: &str,
        content: &str,
    ) -> Result<(String, String), DomainError> {
        let key = document_key(company_id, period);
        let uri = self
            .content
            .put_document(&key, content.as_bytes(), STRUCTURED_DOCUMENT_MIME)
            .await?;
        Ok((key, uri))
    }

    /// Record the pointer for a stored document with current timestamps.
    async fn index_pointer(
        &self,
        company_id: &str,
        period: &str,
        key: &str,
        uri: &str,
    ) -> Result<(), DomainError> {
        let stamp = Stamp::now();
        let pointer = DocumentPointer {
            company_id: company_id.to_string(),
            period: period.to_string(),
            key: key.to_string(),
            uri: uri.to_string(),
            timestamp_date: stamp.human,
            timestamp_unix: stamp.unix,
        };
        self.index.put_pointer(&pointer).await
    }

    /// Walk the document link chain: metadata -> bundle -> content.
    ///
    /// Each hop is paced and fetched exactly once; any non-success response
    /// aborts this entry's resolution.
    async fn resolve_structured_document(
        &self,
        entry: &FilingEntry,
    ) -> Result<String, DomainError> {
        let metadata_link = entry.document_metadata_link().ok_or_else(|| {
            DomainError::Registry("filing entry has no document_metadata link".to_string())
        })?;

        self.pacer.pace().await;
        let metadata = self.registry.fetch_json(metadata_link).await?;
        let bundle_link = json_link(&metadata, "document").ok_or_else(|| {
            DomainError::Registry("document metadata has no document link".to_string())
        })?;

        self.pacer.pace().await;
        let bundle = self.registry.fetch_json(bundle_link).await?;
        let document_link = json_link(&bundle, "document").ok_or_else(|| {
            DomainError::Registry("document bundle has no document link".to_string())
        })?;

        self.pacer.pace().await;
        self.registry
            .fetch_document(document_link, STRUCTURED_DOCUMENT_MIME)
            .await
    }
}

fn json_link<'a>(payload: &'a serde_json::Value, name: &str) -> Option<&'a str> {
    payload.get("links")?.get(name)?.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::testing::{FakeContentStore, FakeIndexStore, FakeRegistry};
    use serde_json::json;
    use std::time::Duration;

    const COMPANY: &str = "01234567";

    fn service(
        registry: FakeRegistry,
        content: &Arc<FakeContentStore>,
        index: &Arc<FakeIndexStore>,
    ) -> IngestService {
        IngestService::new(
            Arc::new(registry),
            Arc::clone(content) as Arc<dyn ContentStorePort>,
            Arc::clone(index) as Arc<dyn IndexStorePort>,
            Pacer::new(Duration::ZERO),
        )
    }

    /// Registry fake holding one structured accounts filing for the full chain.
    fn registry_with_structured_filing(period: &str) -> (FakeRegistry, FilingHistory) {
        let entry = FilingEntry {
            description_values: Some(crate::domain::DescriptionValues {
                made_up_date: Some(period.to_string()),
            }),
            ..FakeRegistry::entry_with_metadata_link("AA", "https://example/meta/1")
        };
        let registry = FakeRegistry::new()
            .with_json(
                "https://example/meta/1",
                json!({
                    "resources": {"application/xhtml+xml": {}},
                    "links": {"document": "https://example/bundle/1"}
                }),
            )
            .with_json(
                "https://example/bundle/1",
                json!({"links": {"document": "https://example/doc/1"}}),
            )
            .with_document("https://example/doc/1", "<html>accounts</html>");
        let history = FilingHistory { items: vec![entry] };
        (registry, history)
    }

    #[tokio::test]
    async fn history_without_accounts_filings_reports_without_fetching() {
        let registry = FakeRegistry::new();
        let requests = registry.request_log();
        let content = Arc::new(FakeContentStore::new());
        let index = Arc::new(FakeIndexStore::new());
        let service = service(registry, &content, &index);
        let history = FilingHistory {
            items: vec![FilingEntry {
                filing_type: Some("CS01".to_string()),
                ..FilingEntry::default()
            }],
        };

        let report = service.process_history(COMPANY, &history).await;

        assert!(matches!(report, IngestReport::NoAccountsFilings));
        assert!(requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn structured_filing_is_stored_and_indexed() {
        let (registry, history) = registry_with_structured_filing("2023-01-31");
        let content = Arc::new(FakeContentStore::new());
        let index = Arc::new(FakeIndexStore::new());
        let service = service(registry, &content, &index);

        let report = service.process_history(COMPANY, &history).await;

        assert_eq!(report.stored(), 1);
        let key = document_key(COMPANY, "2023-01-31");
        assert_eq!(
            content.get(&key).as_deref(),
            Some("<html>accounts</html>".as_bytes())
        );
        let pointer = index.get(COMPANY, "2023-01-31").expect("pointer indexed");
        assert_eq!(pointer.key, key);
        assert!(pointer.timestamp_unix > 0);
    }

    #[tokio::test]
    async fn filing_without_structured_type_stops_after_metadata_lookup() {
        let entry = FakeRegistry::entry_with_metadata_link("AA", "https://example/meta/1");
        let registry = FakeRegistry::new().with_json(
            "https://example/meta/1",
            json!({"resources": {"application/pdf": {}}}),
        );
        let requests = registry.request_log();
        let content = Arc::new(FakeContentStore::new());
        let index = Arc::new(FakeIndexStore::new());
        let service = service(registry, &content, &index);
        let history = FilingHistory { items: vec![entry] };

        let report = service.process_history(COMPANY, &history).await;

        let IngestReport::Processed(outcomes) = report else {
            panic!("expected processed report");
        };
        assert!(matches!(
            outcomes[0],
            FilingOutcome::NoStructuredDocument { .. }
        ));
        assert_eq!(requests.lock().unwrap().len(), 1);
        assert!(content.is_empty());
    }

    #[tokio::test]
    async fn index_write_failure_leaves_content_stored_and_index_unchanged() {
        let (registry, history) = registry_with_structured_filing("2023-01-31");
        let content = Arc::new(FakeContentStore::new());
        let index = Arc::new(FakeIndexStore::failing());
        let service = service(registry, &content, &index);

        let report = service.process_history(COMPANY, &history).await;

        assert_eq!(report.stored(), 0);
        assert_eq!(report.failed(), 1);
        assert!(content.get(&document_key(COMPANY, "2023-01-31")).is_some());
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn content_write_failure_skips_index_write() {
        let (registry, history) = registry_with_structured_filing("2023-01-31");
        let content = Arc::new(FakeContentStore::failing());
        let index = Arc::new(FakeIndexStore::new());
        let service = service(registry, &content, &index);

        let report = service.process_history(COMPANY, &history).await;

        assert_eq!(report.failed(), 1);
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn reprocessing_same_period_overwrites_instead_of_duplicating() {
        let (registry, history) = registry_with_structured_filing("2023-01-31");
        let content = Arc::new(FakeContentStore::new());
        let index = Arc::new(FakeIndexStore::new());
        let service = service(registry, &content, &index);

        service.process_history(COMPANY, &history).await;
        service.process_history(COMPANY, &history).await;

        assert_eq!(content.len(), 1);
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn missing_made_up_date_fails_entry_before_document_fetch() {
        let entry = FakeRegistry::entry_with_metadata_link("AA", "https://example/meta/1");
        let registry = FakeRegistry::new().with_json(
            "https://example/meta/1",
            json!({
                "resources": {"application/xhtml+xml": {}},
                "links": {"document": "https://example/bundle/1"}
            }),
        );
        let requests = registry.request_log();
        let content = Arc::new(FakeContentStore::new());
        let index = Arc::new(FakeIndexStore::new());
        let service = service(registry, &content, &index);
        let history = FilingHistory { items: vec![entry] };

        let report = service.process_history(COMPANY, &history).await;

        assert_eq!(report.failed(), 1);
        // Only the manifest lookup happened; the document chain was never walked.
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn one_failing_entry_does_not_abort_the_batch() {
        let broken = FilingEntry {
            description_values: Some(crate::domain::DescriptionValues {
                made_up_date: Some("2022-01-31".to_string()),
            }),
            ..FakeRegistry::entry_with_metadata_link("AA", "https://example/meta/broken")
        };
        let (mut registry, mut history) = registry_with_structured_filing("2023-01-31");
        // Manifest claims a structured document but the bundle link is dead.
        registry = registry.with_json(
            "https://example/meta/broken",
            json!({
                "resources": {"application/xhtml+xml": {}},
                "links": {"document": "https://example/bundle/missing"}
            }),
        );
        history.items.insert(0, broken);
        let content = Arc::new(FakeContentStore::new());
        let index = Arc::new(FakeIndexStore::new());
        let service = service(registry, &content, &index);

        let report = service.process_history(COMPANY, &history).await;

        let IngestReport::Processed(outcomes) = report else {
            panic!("expected processed report");
        };
        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[0], FilingOutcome::Failed { .. }));
        assert!(matches!(outcomes[1], FilingOutcome::Stored { .. }));
    }

    #[tokio::test]
    async fn history_fetch_failure_is_fatal_for_the_company() {
        let registry = FakeRegistry::new();
        let content = Arc::new(FakeContentStore::new());
        let index = Arc::new(FakeIndexStore::new());
        let service = service(registry, &content, &index);

        let err = service.ingest_company(COMPANY).await.unwrap_err();

        assert!(matches!(err, DomainError::FilingHistory { .. }));
        assert!(err.to_string().contains(COMPANY));
    }

    #[tokio::test]
    async fn ingest_company_uses_registry_history() {
        let (registry, history) = registry_with_structured_filing("2023-01-31");
        let registry = registry.with_history(COMPANY, history);
        let content = Arc::new(FakeContentStore::new());
        let index = Arc::new(FakeIndexStore::new());
        let service = service(registry, &content, &index);

        let report = service.ingest_company(COMPANY).await.unwrap();

        assert_eq!(report.stored(), 1);
    }
}
