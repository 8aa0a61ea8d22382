//! Filing classification: select annual-accounts filings from a history
//! listing and decide which of them offer a structured (XHTML) document.

use crate::domain::{DomainError, FilingEntry, FilingHistory};
use crate::ports::RegistryGateway;

/// Filing-history type code for annual accounts.
pub const ACCOUNTS_FILING_TYPE: &str = "AA";

/// Media type of the structured (machine-readable) document representation.
pub const STRUCTURED_DOCUMENT_MIME: &str = "application/xhtml+xml";

/// Marker in a filing description identifying micro-entity accounts.
const MICRO_ENTITY_MARKER: &str = "micro-entity";

/// Selects annual-accounts filings, preserving the registry's listing order.
///
/// An empty result is a reportable condition for the caller, not an error.
pub fn filter_accounts_filings(history: &FilingHistory) -> Vec<&FilingEntry> {
    history
        .items
        .iter()
        .filter(|entry| entry.filing_type.as_deref() == Some(ACCOUNTS_FILING_TYPE))
        .collect()
}

/// Whether the entry's document is available in the structured representation.
///
/// Looks up the entry's document-metadata resource and inspects its
/// `resources` manifest for the structured media type. A well-formed manifest
/// lacking the type (or an entry with no metadata link at all) is `false`,
/// not an error; only a failed fetch propagates.
pub async fn has_structured_document(
    registry: &dyn RegistryGateway,
    entry: &FilingEntry,
) -> Result<bool, DomainError> {
    let Some(link) = entry.document_metadata_link() else {
        return Ok(false);
    };
    let metadata = registry.fetch_json(link).await?;
    let available = metadata
        .get("resources")
        .and_then(serde_json::Value::as_object)
        .is_some_and(|resources| resources.contains_key(STRUCTURED_DOCUMENT_MIME));
    Ok(available)
}

/// Whether the most recent annual-accounts filing is for micro-entity accounts.
///
/// "Most recent" is the entry with the greatest `action_date` (a missing date
/// compares as the empty string); among equal dates the first entry in listing
/// order wins. Returns `None` when the history has no accounts filings, so
/// callers can distinguish "unknown" from "not micro-entity".
pub fn latest_filing_is_micro_entity(history: &FilingHistory) -> Option<bool> {
    let accounts = filter_accounts_filings(history);
    let mut latest = *accounts.first()?;
    for entry in &accounts[1..] {
        if action_date(entry) > action_date(latest) {
            latest = entry;
        }
    }
    Some(
        latest
            .description
            .as_deref()
            .unwrap_or_default()
            .contains(MICRO_ENTITY_MARKER),
    )
}

fn action_date(entry: &FilingEntry) -> &str {
    entry.action_date.as_deref().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::testing::FakeRegistry;
    use serde_json::json;

    fn entry(filing_type: &str, action_date: &str, description: &str) -> FilingEntry {
        FilingEntry {
            filing_type: Some(filing_type.to_string()),
            action_date: Some(action_date.to_string()),
            description: Some(description.to_string()),
            ..FilingEntry::default()
        }
    }

    #[test]
    fn filter_keeps_only_accounts_filings_in_order() {
        let history = FilingHistory {
            items: vec![
                entry("AA", "2023-01-01", "accounts"),
                entry("CS01", "2023-02-01", "confirmation statement"),
                entry("AA", "2022-01-01", "accounts"),
            ],
        };

        let filtered = filter_accounts_filings(&history);

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].action_date.as_deref(), Some("2023-01-01"));
        assert_eq!(filtered[1].action_date.as_deref(), Some("2022-01-01"));
    }

    #[test]
    fn latest_micro_entity_is_none_without_accounts_filings() {
        let history = FilingHistory {
            items: vec![entry("CS01", "2023-02-01", "confirmation statement")],
        };
        assert_eq!(latest_filing_is_micro_entity(&history), None);
    }

    #[test]
    fn latest_micro_entity_true_for_single_micro_entity_filing() {
        let history = FilingHistory {
            items: vec![entry("AA", "2023-01-01", "micro-entity accounts")],
        };
        assert_eq!(latest_filing_is_micro_entity(&history), Some(true));
    }

    #[test]
    fn latest_micro_entity_selects_greatest_action_date() {
        let history = FilingHistory {
            items: vec![
                entry("AA", "2022-01-01", "micro-entity accounts"),
                entry("AA", "2023-01-01", "full accounts"),
            ],
        };
        assert_eq!(latest_filing_is_micro_entity(&history), Some(false));
    }

    #[test]
    fn latest_micro_entity_tie_takes_first_in_listing_order() {
        let history = FilingHistory {
            items: vec![
                entry("AA", "2023-01-01", "micro-entity accounts"),
                entry("AA", "2023-01-01", "full accounts"),
            ],
        };
        assert_eq!(latest_filing_is_micro_entity(&history), Some(true));

        let reversed = FilingHistory {
            items: vec![
                entry("AA", "2023-01-01", "full accounts"),
                entry("AA", "2023-01-01", "micro-entity accounts"),
            ],
        };
        assert_eq!(latest_filing_is_micro_entity(&reversed), Some(false));
    }

    #[test]
    fn latest_micro_entity_treats_missing_action_date_as_oldest() {
        let history = FilingHistory {
            items: vec![
                FilingEntry {
                    filing_type: Some("AA".to_string()),
                    description: Some("micro-entity accounts".to_string()),
                    ..FilingEntry::default()
                },
                entry("AA", "2020-01-01", "full accounts"),
            ],
        };
        assert_eq!(latest_filing_is_micro_entity(&history), Some(false));
    }

    #[tokio::test]
    async fn structured_document_present_in_manifest() {
        let registry = FakeRegistry::new().with_json(
            "https://example/meta/1",
            json!({"resources": {"application/xhtml+xml": {}, "application/pdf": {}}}),
        );
        let entry = FakeRegistry::entry_with_metadata_link("AA", "https://example/meta/1");

        assert!(has_structured_document(&registry, &entry).await.unwrap());
    }

    #[tokio::test]
    async fn manifest_without_structured_type_is_false() {
        let registry = FakeRegistry::new().with_json(
            "https://example/meta/1",
            json!({"resources": {"application/pdf": {}}}),
        );
        let entry = FakeRegistry::entry_with_metadata_link("AA", "https://example/meta/1");

        assert!(!has_structured_document(&registry, &entry).await.unwrap());
    }

    #[tokio::test]
    async fn entry_without_metadata_link_is_false_with_no_fetch() {
        let registry = FakeRegistry::new();
        let entry = FilingEntry {
            filing_type: Some("AA".to_string()),
            ..FilingEntry::default()
        };

        assert!(!has_structured_document(&registry, &entry).await.unwrap());
        assert!(registry.requests().is_empty());
    }

    #[tokio::test]
    async fn metadata_fetch_failure_propagates() {
        let registry = FakeRegistry::new();
        let entry = FakeRegistry::entry_with_metadata_link("AA", "https://example/meta/unknown");

        assert!(has_structured_document(&registry, &entry).await.is_err());
    }
}
