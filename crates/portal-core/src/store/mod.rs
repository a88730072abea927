//! Datastore implementations
//!
//! Two backends implement the [`crate::Datastore`] trait: PostgreSQL for
//! deployments and an in-memory store for tests and DB-less development
//! runs.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;
