//! Repository layer: entity store, cascading persistence and typed
//! repositories for both schemas.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite statements from service orchestration.
//!
//! # Invariants
//! - Structured writes run `validate()` and the audit touch before SQL.
//! - Repository APIs return semantic errors (`NotFound`, `Constraint`,
//!   `Unsaved`) in addition to DB transport errors.

pub mod cascade;
pub mod catalog_repo;
pub mod error;
pub mod roster_repo;
pub mod seed;
pub mod store;

pub use cascade::{cascade_persist, cascade_persist_all, Persist};
pub use catalog_repo::{CatalogRepository, SqliteCatalogRepository};
pub use error::{ensure_connection_ready, RepoError, RepoResult};
pub use roster_repo::{RosterRepository, SqliteRosterRepository};
pub use store::Entity;
