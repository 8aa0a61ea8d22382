//! ch-sync: Incremental Companies House annual-accounts archiver with Hexagonal Architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
