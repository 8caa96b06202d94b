//! Cascading persistence across declared associations.
//!
//! # Responsibility
//! - Persist an entity graph associate-before-owner inside one transaction.
//! - Write many-to-many pair rows once both endpoints exist.
//!
//! # Invariants
//! - Each entity cascades only to its direct many-to-one / one-to-one
//!   associates; those cascade to theirs. Owned values make the graph a
//!   finite tree, so the walk always terminates.
//! - Many-to-many never cascades: enrolled students must already have ids.
//! - Ids assigned during a failed cascade never leak into the caller's value.
//!
//! Two owners holding separate unsaved copies of the same associate produce
//! two rows; persist the shared associate first and clone it afterwards.

use crate::model::audit::Clock;
use crate::model::catalog::{CatalogStudent, Course, CourseMaterial, Teacher};
use crate::model::roster::{Address, Country, Person, Professor, Student};
use crate::repo::catalog_repo::replace_enrollments;
use crate::repo::error::RepoResult;
use crate::repo::store::{in_transaction, save_row, Entity};
use rusqlite::Connection;

/// Insert-or-update of one entity together with its cascading associates.
pub trait Persist: Entity {
    /// Persists cascading associates, then this row. Must run inside a
    /// transaction owned by the caller.
    fn persist(&mut self, conn: &Connection, clock: &dyn Clock) -> RepoResult<i64>;
}

/// Persists `root` and everything it cascades to as one atomic unit.
///
/// On success the ids assigned anywhere in the graph are written back into
/// `root`; on failure the transaction rolls back and `root` is untouched.
pub fn cascade_persist<E: Persist>(
    conn: &mut Connection,
    clock: &dyn Clock,
    root: &mut E,
) -> RepoResult<i64> {
    let (id, working) = in_transaction(conn, "cascade_persist", E::NAME, |tx| {
        let mut working = root.clone();
        let id = working.persist(tx, clock)?;
        Ok((id, working))
    })?;
    *root = working;
    Ok(id)
}

/// Persists several roots in one transaction; ids are returned in input order.
pub fn cascade_persist_all<E: Persist>(
    conn: &mut Connection,
    clock: &dyn Clock,
    roots: &mut [E],
) -> RepoResult<Vec<i64>> {
    let (ids, working) = in_transaction(conn, "cascade_persist_all", E::NAME, |tx| {
        let mut working = roots.to_vec();
        let mut ids = Vec::with_capacity(working.len());
        for root in &mut working {
            ids.push(root.persist(tx, clock)?);
        }
        Ok((ids, working))
    })?;
    roots.clone_from_slice(&working);
    Ok(ids)
}

impl Persist for Country {
    fn persist(&mut self, conn: &Connection, clock: &dyn Clock) -> RepoResult<i64> {
        save_row(conn, clock, self)
    }
}

impl Persist for Address {
    fn persist(&mut self, conn: &Connection, clock: &dyn Clock) -> RepoResult<i64> {
        self.country.persist(conn, clock)?;
        save_row(conn, clock, self)
    }
}

impl Persist for Person {
    fn persist(&mut self, conn: &Connection, clock: &dyn Clock) -> RepoResult<i64> {
        self.address.persist(conn, clock)?;
        save_row(conn, clock, self)
    }
}

impl Persist for Student {
    fn persist(&mut self, conn: &Connection, clock: &dyn Clock) -> RepoResult<i64> {
        self.person.persist(conn, clock)?;
        save_row(conn, clock, self)
    }
}

impl Persist for Professor {
    fn persist(&mut self, conn: &Connection, clock: &dyn Clock) -> RepoResult<i64> {
        self.person.persist(conn, clock)?;
        save_row(conn, clock, self)
    }
}

impl Persist for Teacher {
    fn persist(&mut self, conn: &Connection, clock: &dyn Clock) -> RepoResult<i64> {
        save_row(conn, clock, self)
    }
}

impl Persist for CatalogStudent {
    fn persist(&mut self, conn: &Connection, clock: &dyn Clock) -> RepoResult<i64> {
        save_row(conn, clock, self)
    }
}

impl Persist for Course {
    fn persist(&mut self, conn: &Connection, clock: &dyn Clock) -> RepoResult<i64> {
        if let Some(teacher) = self.teacher.as_mut() {
            teacher.persist(conn, clock)?;
        }
        let course_id = save_row(conn, clock, self)?;
        replace_enrollments(conn, course_id, &self.students)?;
        Ok(course_id)
    }
}

impl Persist for CourseMaterial {
    fn persist(&mut self, conn: &Connection, clock: &dyn Clock) -> RepoResult<i64> {
        self.course.persist(conn, clock)?;
        save_row(conn, clock, self)
    }
}
