//! Implements ContentStorePort on the local filesystem.
//!
//! Keys use `/` separators and map directly to paths under the base
//! directory, so `xhtml_data/<company>/<period>` lands in a per-company
//! subdirectory. Writes overwrite, which gives re-processing its idempotence.

use crate::domain::DomainError;
use crate::ports::ContentStorePort;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Filesystem blob store rooted at a base directory.
pub struct FsContentStore {
    base_dir: PathBuf,
}

impl FsContentStore {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    fn object_path(&self, key: &str) -> PathBuf {
        key.split('/')
            .fold(self.base_dir.clone(), |path, part| path.join(part))
    }
}

#[async_trait::async_trait]
impl ContentStorePort for FsContentStore {
    async fn put_document(
        &self,
        key: &str,
        body: &[u8],
        content_type: &str,
    ) -> Result<String, DomainError> {
        let path = self.object_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::ContentStore(format!("create dir for {key}: {e}")))?;
        }
        fs::write(&path, body)
            .await
            .map_err(|e| DomainError::ContentStore(format!("write {key}: {e}")))?;

        let abs = path.canonicalize().unwrap_or(path);
        info!(
            key,
            content_type,
            bytes = body.len(),
            path = %abs.display(),
            "stored document"
        );
        Ok(format!("file://{}", abs.display()))
    }
}
