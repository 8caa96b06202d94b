//! Column constraint failures shared by validation and persistence.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Which declared constraint rejected a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Unique,
    NotNull,
    ForeignKey,
    Check,
}

impl ConstraintKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unique => "unique",
            Self::NotNull => "not_null",
            Self::ForeignKey => "foreign_key",
            Self::Check => "check",
        }
    }
}

/// A write rejected by a unique, not-null, foreign-key or check constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintViolation {
    pub kind: ConstraintKind,
    pub detail: String,
}

impl ConstraintViolation {
    pub fn new(kind: ConstraintKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Not-null style violation for a blank required field.
    pub fn blank(entity: &str, field: &str) -> Self {
        Self::new(
            ConstraintKind::NotNull,
            format!("{entity}.{field} must not be blank"),
        )
    }
}

impl Display for ConstraintViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} constraint violated: {}", self.kind.as_str(), self.detail)
    }
}

impl Error for ConstraintViolation {}
