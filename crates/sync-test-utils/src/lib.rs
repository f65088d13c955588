//! Shared test utilities for the entity-sync workspace.
//!
//! This crate provides standardised fixtures so that crate test suites do
//! not each rebuild a store, a sync root and a handler. It is a
//! dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`site`]: a small seeded entity tree with well-known aliases
//! - [`fixture`]: [`SyncFixture`], a temp sync root wired to a store-backed handler

pub mod fixture;
pub mod site;

pub use fixture::SyncFixture;
pub use site::Site;
