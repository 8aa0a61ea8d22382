//! Companies House registry adapter.

pub mod client;

pub use client::CompaniesHouseGateway;
