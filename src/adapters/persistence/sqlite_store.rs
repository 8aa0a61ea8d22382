//! SQLite-backed stores via libsql: company profiles and document pointers.
//!
//! One database file (archive.db) holds both tables. Profile upserts replace
//! the whole record; pointer upserts are keyed by (company_id, period) so an
//! identical key overwrites. Scans use keyset pagination: the continuation
//! token is the last company id of a full page.

use crate::domain::{CompanyProfile, DocumentPointer, DomainError, ProfilePage};
use crate::ports::{IndexStorePort, ProfileStorePort};
use libsql::{params, Connection, Database};
use std::path::Path;
use tracing::info;

const PROFILE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS company_profile (
    company_id TEXT PRIMARY KEY,
    profile TEXT NOT NULL,
    last_updated TEXT NOT NULL,
    timestamp_unix INTEGER NOT NULL
)"#;

const POINTER_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS document_pointers (
    company_id TEXT NOT NULL,
    period TEXT NOT NULL,
    content_key TEXT NOT NULL,
    content_uri TEXT NOT NULL,
    timestamp_date TEXT NOT NULL,
    timestamp_unix INTEGER NOT NULL,
    PRIMARY KEY (company_id, period)
)"#;

/// SQLite store. One database file (archive.db) in the given base directory;
/// safe to share via Arc, implements both the profile and the index port.
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Connect to (or create) the database and ensure the schema exists.
    /// Sets WAL mode and synchronous=NORMAL, as elsewhere in this stack.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(|e| DomainError::ProfileStore(e.to_string()))?;
        let db_path = base.join("archive.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(|e| DomainError::ProfileStore(e.to_string()))?;
        let conn = db
            .connect()
            .map_err(|e| DomainError::ProfileStore(e.to_string()))?;

        // PRAGMA returns a row (the new value); consume it via query since
        // execute fails when rows are returned.
        for pragma in ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL"] {
            let mut rows = conn
                .query(pragma, ())
                .await
                .map_err(|e| DomainError::ProfileStore(format!("{pragma} failed: {e}")))?;
            while rows
                .next()
                .await
                .map_err(|e| DomainError::ProfileStore(e.to_string()))?
                .is_some()
            {}
        }

        conn.execute(PROFILE_TABLE, ())
            .await
            .map_err(|e| DomainError::ProfileStore(e.to_string()))?;
        conn.execute(POINTER_TABLE, ())
            .await
            .map_err(|e| DomainError::IndexStore(e.to_string()))?;

        info!(path = %db_path.display(), "SQLite connected with WAL mode");

        Ok(Self { db })
    }

    fn conn(&self) -> Result<Connection, DomainError> {
        self.db
            .connect()
            .map_err(|e| DomainError::ProfileStore(e.to_string()))
    }

    fn profile_from_row(row: &libsql::Row) -> Result<CompanyProfile, DomainError> {
        let company_id: String = row
            .get(0)
            .map_err(|e| DomainError::ProfileStore(e.to_string()))?;
        let profile_json: String = row
            .get(1)
            .map_err(|e| DomainError::ProfileStore(e.to_string()))?;
        let last_updated: String = row
            .get(2)
            .map_err(|e| DomainError::ProfileStore(e.to_string()))?;
        let timestamp_unix: i64 = row
            .get(3)
            .map_err(|e| DomainError::ProfileStore(e.to_string()))?;
        let profile = serde_json::from_str(&profile_json)
            .map_err(|e| DomainError::ProfileStore(format!("corrupt profile payload: {e}")))?;
        Ok(CompanyProfile {
            company_id,
            profile,
            last_updated,
            timestamp_unix,
        })
    }
}

#[async_trait::async_trait]
impl ProfileStorePort for SqliteStore {
    async fn get_profile(&self, company_id: &str) -> Result<Option<CompanyProfile>, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                "SELECT company_id, profile, last_updated, timestamp_unix
                 FROM company_profile WHERE company_id = ?1",
                params![company_id],
            )
            .await
            .map_err(|e| DomainError::ProfileStore(e.to_string()))?;
        match rows
            .next()
            .await
            .map_err(|e| DomainError::ProfileStore(e.to_string()))?
        {
            Some(row) => Ok(Some(Self::profile_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn upsert_profile(&self, record: &CompanyProfile) -> Result<(), DomainError> {
        let conn = self.conn()?;
        let profile_json = serde_json::to_string(&record.profile)
            .map_err(|e| DomainError::ProfileStore(e.to_string()))?;
        conn.execute(
            r#"
            INSERT INTO company_profile (company_id, profile, last_updated, timestamp_unix)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (company_id) DO UPDATE SET
                profile = excluded.profile,
                last_updated = excluded.last_updated,
                timestamp_unix = excluded.timestamp_unix
            "#,
            params![
                record.company_id.as_str(),
                profile_json,
                record.last_updated.as_str(),
                record.timestamp_unix
            ],
        )
        .await
        .map_err(|e| DomainError::ProfileStore(e.to_string()))?;
        Ok(())
    }

    async fn scan_page(
        &self,
        cursor: Option<String>,
        limit: u32,
    ) -> Result<ProfilePage, DomainError> {
        let conn = self.conn()?;
        let start = cursor.unwrap_or_default();
        let mut rows = conn
            .query(
                "SELECT company_id, profile, last_updated, timestamp_unix
                 FROM company_profile
                 WHERE company_id > ?1
                 ORDER BY company_id
                 LIMIT ?2",
                params![start, limit as i64],
            )
            .await
            .map_err(|e| DomainError::ProfileStore(e.to_string()))?;

        let mut items = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DomainError::ProfileStore(e.to_string()))?
        {
            items.push(Self::profile_from_row(&row)?);
        }
        let next = if items.len() == limit as usize {
            items.last().map(|r| r.company_id.clone())
        } else {
            None
        };
        Ok(ProfilePage { items, next })
    }
}

#[async_trait::async_trait]
impl IndexStorePort for SqliteStore {
    async fn put_pointer(&self, pointer: &DocumentPointer) -> Result<(), DomainError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| DomainError::IndexStore(e.to_string()))?;
        conn.execute(
            r#"
            INSERT INTO document_pointers
                (company_id, period, content_key, content_uri, timestamp_date, timestamp_unix)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (company_id, period) DO UPDATE SET
                content_key = excluded.content_key,
                content_uri = excluded.content_uri,
                timestamp_date = excluded.timestamp_date,
                timestamp_unix = excluded.timestamp_unix
            "#,
            params![
                pointer.company_id.as_str(),
                pointer.period.as_str(),
                pointer.key.as_str(),
                pointer.uri.as_str(),
                pointer.timestamp_date.as_str(),
                pointer.timestamp_unix
            ],
        )
        .await
        .map_err(|e| DomainError::IndexStore(e.to_string()))?;
        Ok(())
    }
}
