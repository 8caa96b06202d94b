//! Fixed demo data for both schemas.
//!
//! # Responsibility
//! - Roster: one native multi-row `INSERT` per table with fixed literals.
//! - Catalog: structured cascade writes through `CatalogRepository`.
//!
//! # Invariants
//! - Roster seeds must run in dependency order: countries, addresses,
//!   persons, then students and professors. Out of order they fail with a
//!   foreign-key violation and insert nothing.
//! - Roster seeds bypass the audit touch; person timestamps come from the
//!   database clock at insert time.

use crate::model::catalog::{CatalogStudent, Course, CourseId, CourseMaterial, Guardian, Teacher};
use crate::repo::catalog_repo::CatalogRepository;
use crate::repo::error::RepoResult;
use log::{error, info};
use rusqlite::Connection;
use std::time::Instant;

const INIT_COUNTRIES_SQL: &str = "INSERT INTO country (name) VALUES
    ('Poland'),
    ('Germany'),
    ('England');";

const INIT_ADDRESSES_SQL: &str = "INSERT INTO address (country_id, city, street) VALUES
    (1, 'Kraków', 'Karmelicka 2'),
    (1, 'Warszawa', 'Przemieścia 5'),
    (2, 'Berlin', 'Schemteling 10'),
    (3, 'Londyn', 'Big 10');";

const INIT_PERSONS_SQL: &str = "INSERT INTO person (
    address_id,
    last_name,
    creation_timestamp,
    modification_timestamp
)
SELECT seed.address_id, seed.last_name, now.ms, now.ms
FROM (
    SELECT 1 AS address_id, 'Kowalski' AS last_name, 1 AS ord
    UNION ALL SELECT 1, 'Nowak', 2
    UNION ALL SELECT 2, 'Smesny', 3
    UNION ALL SELECT 3, 'Nsmesny', 4
    UNION ALL SELECT 4, 'Inny', 5
    UNION ALL SELECT 4, 'Beziczego', 6
) AS seed
CROSS JOIN (SELECT CAST(unixepoch('now', 'subsec') * 1000 AS INTEGER) AS ms) AS now
ORDER BY seed.ord;";

const INIT_STUDENTS_SQL: &str = "INSERT INTO student (student_number, person_id) VALUES
    (234223, 1),
    (22222, 2),
    (333333, 3),
    (444444, 4);";

const INIT_PROFESSORS_SQL: &str = "INSERT INTO professor (professor_number, person_id) VALUES
    (121212, 1),
    (555555, 5);";

pub fn init_countries(conn: &Connection) -> RepoResult<usize> {
    run_native_seed(conn, "country", INIT_COUNTRIES_SQL)
}

pub fn init_addresses(conn: &Connection) -> RepoResult<usize> {
    run_native_seed(conn, "address", INIT_ADDRESSES_SQL)
}

pub fn init_persons(conn: &Connection) -> RepoResult<usize> {
    run_native_seed(conn, "person", INIT_PERSONS_SQL)
}

pub fn init_students(conn: &Connection) -> RepoResult<usize> {
    run_native_seed(conn, "student", INIT_STUDENTS_SQL)
}

pub fn init_professors(conn: &Connection) -> RepoResult<usize> {
    run_native_seed(conn, "professor", INIT_PROFESSORS_SQL)
}

/// Runs every roster seed in dependency order; returns rows per table.
pub fn init_roster(conn: &Connection) -> RepoResult<[usize; 5]> {
    Ok([
        init_countries(conn)?,
        init_addresses(conn)?,
        init_persons(conn)?,
        init_students(conn)?,
        init_professors(conn)?,
    ])
}

fn run_native_seed(conn: &Connection, table: &str, sql: &str) -> RepoResult<usize> {
    let started_at = Instant::now();
    match conn.execute(sql, []) {
        Ok(rows) => {
            info!(
                "event=native_seed module=repo status=ok table={table} rows={rows} audit=bypassed duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(rows)
        }
        Err(err) => {
            error!(
                "event=native_seed module=repo status=error table={table} duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            );
            Err(err.into())
        }
    }
}

/// Two courses reached through their materials, then three plain courses.
pub fn init_courses<R: CatalogRepository>(repo: &mut R) -> RepoResult<Vec<CourseId>> {
    let mut ids = Vec::with_capacity(5);

    let mut first = CourseMaterial::new(
        "DDDDDD",
        Course::new("kurs1", 1000).with_teacher(Teacher::new("FFFFF", "FFFFFSDD")),
    );
    repo.save_course_material(&mut first)?;
    ids.extend(first.course.id);

    let mut second = CourseMaterial::new(
        "XXXXXX",
        Course::new("kurs2", 2000).with_teacher(Teacher::new("22222222", "22222222")),
    );
    repo.save_course_material(&mut second)?;
    ids.extend(second.course.id);

    let mut plain = vec![
        Course::new("3333333", 4),
        Course::new("4444444", 15),
        Course::new("5555555", 15),
    ];
    ids.extend(repo.save_courses(&mut plain)?);

    info!(
        "event=catalog_seed module=repo status=ok step=courses rows={}",
        ids.len()
    );
    Ok(ids)
}

/// One course with a teacher and two students enrolled.
pub fn init_enrollments<R: CatalogRepository>(repo: &mut R) -> RepoResult<Course> {
    let mut course = Course::new("kurs1", 1000).with_teacher(Teacher::new("FFFFF", "FFFFFSDD"));
    course.add_student(CatalogStudent::new(
        "AdamGrant",
        Some("GrantHHAHAH".to_string()),
        "Email",
        Guardian::new("SSSS", "SSSS", "SSSS"),
    ));
    course.add_student(CatalogStudent::new(
        "Edwart",
        None,
        "EmailDDDDD",
        Guardian::new("XXX", "XXXX", "XXXXXXXXXXXXXX"),
    ));
    repo.save_course_with_students(&mut course)?;
    info!(
        "event=catalog_seed module=repo status=ok step=enrollments rows={}",
        course.students.len()
    );
    Ok(course)
}

/// Full catalog demo: `init_courses` followed by `init_enrollments`.
pub fn init_catalog<R: CatalogRepository>(repo: &mut R) -> RepoResult<()> {
    init_courses(repo)?;
    init_enrollments(repo)?;
    Ok(())
}
