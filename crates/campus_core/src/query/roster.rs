//! Roster reports over persons, their roles and where they live.
//!
//! # Invariants
//! - Student/professor roles are outer-joined from `person`; a person with
//!   neither role still appears where the report lists persons.
//! - Grouping is by country name, which is unique by constraint.
//! - Range filters are inclusive on both ends (`BETWEEN`).

use crate::model::audit::EpochMillis;
use crate::query::{QueryError, QueryResult};
use log::debug;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::time::Instant;

const ROLE_COUNTS_BY_COUNTRY_SQL: &str = "SELECT
    COUNT(s.student_id) AS student_count,
    COUNT(pr.professor_id) AS professor_count,
    c.name AS country_name
FROM person p
LEFT JOIN student s ON s.person_id = p.person_id
LEFT JOIN professor pr ON pr.person_id = p.person_id
JOIN address a ON a.address_id = p.address_id
JOIN country c ON c.country_id = a.country_id
GROUP BY c.name
HAVING COUNT(s.student_id) + COUNT(pr.professor_id) > 0
ORDER BY c.name ASC;";

const PERSONS_MODIFIED_BETWEEN_SQL: &str = "SELECT
    p.last_name AS last_name,
    p.modification_timestamp AS modification_timestamp,
    s.student_number AS student_number,
    pr.professor_number AS professor_number,
    a.city || ', ' || a.street AS address
FROM person p
LEFT JOIN student s ON s.person_id = p.person_id
LEFT JOIN professor pr ON pr.person_id = p.person_id
JOIN address a ON a.address_id = p.address_id
WHERE p.modification_timestamp BETWEEN ?1 AND ?2
ORDER BY p.person_id ASC;";

const PERSONS_IN_COUNTRY_SQL: &str = "SELECT
    c.name AS country_name,
    p.last_name AS last_name,
    CASE
        WHEN s.person_id IS NOT NULL THEN 'STUDENT'
        WHEN pr.person_id IS NOT NULL THEN 'PROFESSOR'
        ELSE 'UNKNOWN'
    END AS role_label
FROM person p
LEFT JOIN student s ON s.person_id = p.person_id
LEFT JOIN professor pr ON pr.person_id = p.person_id
JOIN address a ON a.address_id = p.address_id
JOIN country c ON c.country_id = a.country_id
WHERE c.name = ?1
ORDER BY p.person_id ASC;";

/// Per-country number of student and professor role holders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryRoleCount {
    pub student_count: u64,
    pub professor_count: u64,
    pub country_name: String,
}

/// Person whose modification timestamp fell inside a requested range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifiedPerson {
    pub last_name: String,
    pub modification_timestamp: EpochMillis,
    pub student_number: Option<i64>,
    pub professor_number: Option<i64>,
    /// `"city, street"`.
    pub address: String,
}

/// Role derived from which optional role row exists; student wins over professor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleLabel {
    Student,
    Professor,
    Unknown,
}

impl RoleLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::Professor => "PROFESSOR",
            Self::Unknown => "UNKNOWN",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "STUDENT" => Some(Self::Student),
            "PROFESSOR" => Some(Self::Professor),
            "UNKNOWN" => Some(Self::Unknown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRoleRow {
    pub country_name: String,
    pub last_name: String,
    pub role_label: RoleLabel,
}

/// Inclusive instant range; construction rejects `from > to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstantRange {
    from: EpochMillis,
    to: EpochMillis,
}

impl InstantRange {
    pub fn new(from: EpochMillis, to: EpochMillis) -> QueryResult<Self> {
        if from > to {
            return Err(QueryError::InvalidRange { from, to });
        }
        Ok(Self { from, to })
    }

    pub fn from(&self) -> EpochMillis {
        self.from
    }

    pub fn to(&self) -> EpochMillis {
        self.to
    }

    pub fn contains(&self, instant: EpochMillis) -> bool {
        self.from <= instant && instant <= self.to
    }
}

/// Countries with at least one student or professor, with both counts.
pub fn role_counts_by_country(conn: &Connection) -> QueryResult<Vec<CountryRoleCount>> {
    let started_at = Instant::now();
    let mut stmt = conn.prepare(ROLE_COUNTS_BY_COUNTRY_SQL)?;
    let mut rows = stmt.query([])?;
    let mut counts = Vec::new();
    while let Some(row) = rows.next()? {
        counts.push(CountryRoleCount {
            student_count: non_negative(row, "student_count")?,
            professor_count: non_negative(row, "professor_count")?,
            country_name: row.get("country_name")?,
        });
    }
    log_query("role_counts_by_country", started_at, counts.len());
    Ok(counts)
}

/// Persons modified within `range`, with role numbers and address label.
pub fn persons_modified_between(
    conn: &Connection,
    range: &InstantRange,
) -> QueryResult<Vec<ModifiedPerson>> {
    let started_at = Instant::now();
    let mut stmt = conn.prepare(PERSONS_MODIFIED_BETWEEN_SQL)?;
    let mut rows = stmt.query(params![range.from, range.to])?;
    let mut persons = Vec::new();
    while let Some(row) = rows.next()? {
        persons.push(ModifiedPerson {
            last_name: row.get("last_name")?,
            modification_timestamp: row.get("modification_timestamp")?,
            student_number: row.get("student_number")?,
            professor_number: row.get("professor_number")?,
            address: row.get("address")?,
        });
    }
    log_query("persons_modified_between", started_at, persons.len());
    Ok(persons)
}

/// Persons living in `country_name`, labelled by role.
pub fn persons_in_country(conn: &Connection, country_name: &str) -> QueryResult<Vec<PersonRoleRow>> {
    let started_at = Instant::now();
    let mut stmt = conn.prepare(PERSONS_IN_COUNTRY_SQL)?;
    let mut rows = stmt.query([country_name])?;
    let mut persons = Vec::new();
    while let Some(row) = rows.next()? {
        let label: String = row.get("role_label")?;
        let role_label = RoleLabel::parse(&label)
            .ok_or_else(|| QueryError::InvalidData(format!("unknown role label `{label}`")))?;
        persons.push(PersonRoleRow {
            country_name: row.get("country_name")?,
            last_name: row.get("last_name")?,
            role_label,
        });
    }
    log_query("persons_in_country", started_at, persons.len());
    Ok(persons)
}

fn non_negative(row: &Row<'_>, column: &str) -> QueryResult<u64> {
    let value: i64 = row.get(column)?;
    u64::try_from(value)
        .map_err(|_| QueryError::InvalidData(format!("negative {column} value {value}")))
}

fn log_query(name: &str, started_at: Instant, rows: usize) {
    debug!(
        "event=query module=query status=ok query={name} rows={rows} duration_ms={}",
        started_at.elapsed().as_millis()
    );
}

#[cfg(test)]
mod tests {
    use super::{InstantRange, RoleLabel};
    use crate::query::QueryError;

    #[test]
    fn range_is_inclusive_and_rejects_inverted_bounds() {
        let range = InstantRange::new(10, 20).unwrap();
        assert!(range.contains(10));
        assert!(range.contains(20));
        assert!(!range.contains(21));
        assert!(InstantRange::new(5, 5).is_ok());
        assert!(matches!(
            InstantRange::new(30, 20),
            Err(QueryError::InvalidRange { from: 30, to: 20 })
        ));
    }

    #[test]
    fn role_labels_round_trip_their_sql_text() {
        for label in [RoleLabel::Student, RoleLabel::Professor, RoleLabel::Unknown] {
            assert_eq!(RoleLabel::parse(label.as_str()), Some(label));
        }
        assert_eq!(RoleLabel::parse("student"), None);
    }
}
