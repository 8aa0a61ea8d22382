//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod entities;
pub mod errors;

pub use entities::{
    CompanyProfile, DescriptionValues, DocumentPointer, FilingEntry, FilingHistory, FilingLinks,
    ProfilePage, Stamp,
};
pub use errors::DomainError;
