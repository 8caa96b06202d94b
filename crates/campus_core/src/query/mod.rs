//! Read-side queries: joins, grouped aggregation, range filters and paging.
//!
//! # Responsibility
//! - Hold every report statement as static SQL.
//! - Validate caller parameters (ranges, page requests) before touching SQL.
//!
//! # Invariants
//! - Queries never write.
//! - Result ordering is deterministic for every query.

use crate::db::DbError;
use crate::repo::error::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod catalog;
pub mod page;
pub mod roster;

pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Debug)]
pub enum QueryError {
    /// Range lower bound is after its upper bound.
    InvalidRange { from: i64, to: i64 },
    /// Negative page index or non-positive page size.
    InvalidPage { index: i64, size: i64 },
    Db(DbError),
    InvalidData(String),
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRange { from, to } => {
                write!(f, "invalid range: from {from} is after to {to}")
            }
            Self::InvalidPage { index, size } => {
                write!(f, "invalid page request: index {index}, size {size}")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid query row: {message}"),
        }
    }
}

impl Error for QueryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for QueryError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for QueryError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<RepoError> for QueryError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Db(err) => Self::Db(err),
            other => Self::InvalidData(other.to_string()),
        }
    }
}
