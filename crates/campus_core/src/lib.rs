//! Core domain logic for the campus store: a university roster and a course
//! catalog over one embedded SQLite database.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use config::{CampusConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, open_with_config, DbError, DbResult};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::audit::{Clock, EpochMillis, FixedClock, SystemClock};
pub use model::catalog::{CatalogStudent, Course, CourseMaterial, Guardian, Teacher};
pub use model::constraint::{ConstraintKind, ConstraintViolation};
pub use model::roster::{Address, Country, Person, Professor, Student};
pub use query::catalog::{CourseField, CoursePageRequest};
pub use query::page::{Direction, Page, PageRequest, Sort};
pub use query::roster::{CountryRoleCount, InstantRange, ModifiedPerson, PersonRoleRow, RoleLabel};
pub use query::{QueryError, QueryResult};
pub use repo::{
    CatalogRepository, RepoError, RepoResult, RosterRepository, SqliteCatalogRepository,
    SqliteRosterRepository,
};
pub use service::catalog_service::CatalogService;
pub use service::roster_service::{RosterSeedSummary, RosterService};
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
