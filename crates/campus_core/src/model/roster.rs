//! University roster entities.
//!
//! # Responsibility
//! - Model countries, addresses, persons and their student/professor roles.
//!
//! # Invariants
//! - Every address references a country, every person an address.
//! - A person holds at most one student and at most one professor role;
//!   both, one or neither are valid.
//! - `Country.name`, `Student.student_number` and
//!   `Professor.professor_number` are unique across the store.

use crate::model::audit::AuditStamp;
use serde::{Deserialize, Serialize};

pub type CountryId = i64;
pub type AddressId = i64;
pub type PersonId = i64;
pub type StudentId = i64;
pub type ProfessorId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub id: Option<CountryId>,
    pub name: String,
}

impl Country {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: Option<AddressId>,
    /// Cascades: persisting the address persists the country first.
    pub country: Country,
    pub street: String,
    pub city: String,
}

impl Address {
    pub fn new(country: Country, city: impl Into<String>, street: impl Into<String>) -> Self {
        Self {
            id: None,
            country,
            street: street.into(),
            city: city.into(),
        }
    }

    /// Display form used by roster reports: `"city, street"`.
    pub fn label(&self) -> String {
        format!("{}, {}", self.city, self.street)
    }
}

/// Auditable person row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: Option<PersonId>,
    /// Cascades: persisting the person persists the address (and its country).
    pub address: Address,
    pub last_name: String,
    /// Maintained by the audit touch step; callers should not set it.
    #[serde(flatten)]
    pub audit: AuditStamp,
}

impl Person {
    pub fn new(address: Address, last_name: impl Into<String>) -> Self {
        Self {
            id: None,
            address,
            last_name: last_name.into(),
            audit: AuditStamp::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: Option<StudentId>,
    /// One-to-one, cascades.
    pub person: Person,
    pub student_number: i64,
}

impl Student {
    pub fn new(person: Person, student_number: i64) -> Self {
        Self {
            id: None,
            person,
            student_number,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Professor {
    pub id: Option<ProfessorId>,
    /// One-to-one, cascades.
    pub person: Person,
    pub professor_number: i64,
}

impl Professor {
    pub fn new(person: Person, professor_number: i64) -> Self {
        Self {
            id: None,
            person,
            professor_number,
        }
    }
}
