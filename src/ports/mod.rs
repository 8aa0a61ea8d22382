//! Port traits. API boundaries for the hexagon.
//!
//! All ports here are outbound: the application calls into infrastructure.

pub mod outbound;

pub use outbound::{ContentStorePort, IndexStorePort, ProfileStorePort, RegistryGateway};
