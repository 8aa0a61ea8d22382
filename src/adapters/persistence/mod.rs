//! Persistence adapters: filesystem blob store, SQLite profile + pointer stores.

pub mod fs_content_store;
pub mod sqlite_store;

pub use fs_content_store::FsContentStore;
pub use sqlite_store::SqliteStore;
