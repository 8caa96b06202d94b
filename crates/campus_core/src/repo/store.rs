//! Generic entity store over single-table rows.
//!
//! # Responsibility
//! - Describe each persisted entity by its static SQL statements.
//! - Provide `insert`, `insert_all`, `get`, `find`, `update` and `count`.
//! - Run the audit touch step on every structured write.
//! - Skip saves of persisted rows that match their stored value.
//!
//! # Invariants
//! - Ids come from SQLite (`AUTOINCREMENT`); callers never choose one.
//! - Public writes are atomic: on failure neither the store nor the
//!   caller's value changes.
//! - Flat writes never cascade; associates must already carry ids.

use crate::model::audit::{AuditStamp, Clock};
use crate::model::constraint::ConstraintViolation;
use crate::repo::error::{RepoError, RepoResult};
use log::{debug, error};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::time::Instant;

/// Static description of one persisted row type.
///
/// Statements are plain constants so every generated statement is visible at
/// compile time; `UPDATE_SQL` binds the id as its last parameter.
pub trait Entity: Sized + Clone + PartialEq {
    /// Name used in errors and log events.
    const NAME: &'static str;
    const TABLE: &'static str;
    const ID_COLUMN: &'static str;
    const SELECT_BY_ID_SQL: &'static str;
    const INSERT_SQL: &'static str;
    const UPDATE_SQL: &'static str;

    fn id(&self) -> Option<i64>;
    fn set_id(&mut self, id: i64);

    /// Column values for `INSERT_SQL`, in placeholder order.
    fn insert_params(&self) -> RepoResult<Vec<Value>>;
    /// Column values for `UPDATE_SQL`, id last.
    fn update_params(&self) -> RepoResult<Vec<Value>>;
    /// Decodes one row, loading eager associates through `conn`.
    fn from_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Self>;

    fn validate(&self) -> Result<(), ConstraintViolation> {
        Ok(())
    }

    /// Audit columns for auditable entities.
    fn audit_mut(&mut self) -> Option<&mut AuditStamp> {
        None
    }
}

/// Inserts one row and assigns its id.
pub fn insert<E: Entity>(conn: &mut Connection, clock: &dyn Clock, entity: &mut E) -> RepoResult<i64> {
    in_transaction(conn, "entity_insert", E::NAME, |tx| {
        let mut working = entity.clone();
        let id = insert_row(tx, clock, &mut working)?;
        Ok((id, working))
    })
    .map(|(id, working)| {
        *entity = working;
        id
    })
}

/// Inserts every row in one transaction; ids are returned in input order.
pub fn insert_all<E: Entity>(
    conn: &mut Connection,
    clock: &dyn Clock,
    entities: &mut [E],
) -> RepoResult<Vec<i64>> {
    let (ids, working) = in_transaction(conn, "entity_insert_all", E::NAME, |tx| {
        let mut working = entities.to_vec();
        let mut ids = Vec::with_capacity(working.len());
        for entity in &mut working {
            ids.push(insert_row(tx, clock, entity)?);
        }
        Ok((ids, working))
    })?;
    entities.clone_from_slice(&working);
    Ok(ids)
}

/// Rewrites one existing row.
pub fn update<E: Entity>(conn: &mut Connection, clock: &dyn Clock, entity: &mut E) -> RepoResult<()> {
    let working = in_transaction(conn, "entity_update", E::NAME, |tx| {
        let mut working = entity.clone();
        update_row(tx, clock, &mut working)?;
        Ok(working)
    })?;
    *entity = working;
    Ok(())
}

/// Loads one row by id or fails with `NotFound`.
pub fn get<E: Entity>(conn: &Connection, id: i64) -> RepoResult<E> {
    find(conn, id)?.ok_or(RepoError::NotFound {
        entity: E::NAME,
        id,
    })
}

/// Loads one row by id.
pub fn find<E: Entity>(conn: &Connection, id: i64) -> RepoResult<Option<E>> {
    let mut stmt = conn.prepare(E::SELECT_BY_ID_SQL)?;
    let mut rows = stmt.query([id])?;
    match rows.next()? {
        Some(row) => Ok(Some(E::from_row(conn, row)?)),
        None => Ok(None),
    }
}

/// Number of persisted rows of `E`.
pub fn count<E: Entity>(conn: &Connection) -> RepoResult<u64> {
    let total: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {};", E::TABLE), [], |row| {
        row.get(0)
    })?;
    u64::try_from(total).map_err(|_| RepoError::InvalidData(format!("negative count {total}")))
}

/// Inserts or updates depending on whether the entity already has an id.
///
/// A persisted entity equal to its stored row is left alone: no UPDATE runs
/// and its audit stamp is replaced by the stored one.
pub(crate) fn save_row<E: Entity>(conn: &Connection, clock: &dyn Clock, entity: &mut E) -> RepoResult<i64> {
    match entity.id() {
        None => insert_row(conn, clock, entity),
        Some(id) => {
            if matches_stored(conn, entity, id)? {
                debug!("event=entity_save module=repo status=skipped entity={} id={id} reason=unchanged", E::NAME);
            } else {
                update_row(conn, clock, entity)?;
            }
            Ok(id)
        }
    }
}

pub(crate) fn insert_row<E: Entity>(conn: &Connection, clock: &dyn Clock, entity: &mut E) -> RepoResult<i64> {
    if let Some(id) = entity.id() {
        return Err(RepoError::AlreadyPersisted {
            entity: E::NAME,
            id,
        });
    }
    entity.validate()?;
    if let Some(audit) = entity.audit_mut() {
        audit.touch_created(clock.now_ms());
    }

    conn.execute(E::INSERT_SQL, params_from_iter(entity.insert_params()?))?;
    let id = conn.last_insert_rowid();
    entity.set_id(id);
    debug!("event=entity_insert module=repo status=ok entity={} id={id}", E::NAME);
    Ok(id)
}

pub(crate) fn update_row<E: Entity>(conn: &Connection, clock: &dyn Clock, entity: &mut E) -> RepoResult<()> {
    let id = entity.id().ok_or(RepoError::Unsaved { entity: E::NAME })?;
    entity.validate()?;
    if entity.audit_mut().is_some() {
        let stored_creation = stored_creation_timestamp::<E>(conn, id)?;
        let now = clock.now_ms();
        if let Some(audit) = entity.audit_mut() {
            audit.touch_modified(now, stored_creation);
        }
    }

    let changed = conn.execute(E::UPDATE_SQL, params_from_iter(entity.update_params()?))?;
    if changed == 0 {
        return Err(RepoError::NotFound {
            entity: E::NAME,
            id,
        });
    }
    debug!("event=entity_update module=repo status=ok entity={} id={id}", E::NAME);
    Ok(())
}

/// Runs `work` inside one IMMEDIATE transaction; commits only on success.
pub(crate) fn in_transaction<T, F>(
    conn: &mut Connection,
    event: &str,
    entity: &str,
    work: F,
) -> RepoResult<T>
where
    F: FnOnce(&Transaction<'_>) -> RepoResult<T>,
{
    let started_at = Instant::now();
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    match work(&tx) {
        Ok(value) => {
            tx.commit()?;
            debug!(
                "event={event} module=repo status=ok entity={entity} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(value)
        }
        Err(err) => {
            error!(
                "event={event} module=repo status=error entity={entity} duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

/// Id of a required associate, or `Unsaved` when it has not been persisted.
pub(crate) fn associate_id(id: Option<i64>, entity: &'static str) -> RepoResult<i64> {
    id.ok_or(RepoError::Unsaved { entity })
}

/// Loads an associate referenced by a foreign key of `owner`.
pub(crate) fn load_associate<E: Entity>(conn: &Connection, id: i64, owner: &str) -> RepoResult<E> {
    find(conn, id)?.ok_or_else(|| {
        RepoError::InvalidData(format!(
            "{owner} references missing {} {id}",
            E::NAME
        ))
    })
}

pub(crate) fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

pub(crate) fn opt_text(value: Option<&String>) -> Value {
    value.map_or(Value::Null, |text| Value::Text(text.clone()))
}

pub(crate) fn opt_int(value: Option<i64>) -> Value {
    value.map_or(Value::Null, Value::Integer)
}

/// Compares `entity` with its stored row, ignoring audit columns.
/// On a match the stored audit stamp is copied onto `entity`.
fn matches_stored<E: Entity>(conn: &Connection, entity: &mut E, id: i64) -> RepoResult<bool> {
    let Some(mut stored) = find::<E>(conn, id)? else {
        return Ok(false);
    };
    let mut candidate = entity.clone();
    let stored_audit = stored.audit_mut().map(|audit| *audit);
    if let (Some(audit), Some(stored_audit)) = (candidate.audit_mut(), stored_audit) {
        *audit = stored_audit;
    }
    if candidate != stored {
        return Ok(false);
    }
    *entity = candidate;
    Ok(true)
}

fn stored_creation_timestamp<E: Entity>(conn: &Connection, id: i64) -> RepoResult<Option<i64>> {
    conn.query_row(
        &format!(
            "SELECT creation_timestamp FROM {} WHERE {} = ?1;",
            E::TABLE,
            E::ID_COLUMN
        ),
        [id],
        |row| row.get::<_, Option<i64>>(0),
    )
    .optional()?
    .ok_or(RepoError::NotFound {
        entity: E::NAME,
        id,
    })
}
