//! Course catalog repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Map catalog entities onto their tables, enrollment pairs included.
//! - Expose cascading saves, student finders, the native first-name bulk
//!   statement and paginated course listing.
//!
//! # Invariants
//! - Enrollment pairs are written only after the course row exists and only
//!   for students that already carry ids.
//! - Duplicate enrollment pairs are stored as given.

use crate::model::audit::{Clock, SystemClock};
use crate::model::catalog::{
    CatalogStudent, CatalogStudentId, Course, CourseId, CourseMaterial, CourseMaterialId,
    Guardian, Teacher, TeacherId,
};
use crate::model::constraint::ConstraintViolation;
use crate::query::catalog::{list_courses, search_courses_by_title, CoursePageRequest};
use crate::query::page::Page;
use crate::query::QueryResult;
use crate::repo::cascade::{cascade_persist, cascade_persist_all, Persist};
use crate::repo::error::{ensure_connection_ready, RepoError, RepoResult};
use crate::repo::store::{
    self, associate_id, in_transaction, load_associate, opt_int, opt_text, text, Entity,
};
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;

const STUDENT_COLUMNS: &str = "student_id, first_name, last_name, email_address, \
     guardian_name, guardian_email, guardian_mobile";

impl Entity for Teacher {
    const NAME: &'static str = "teacher";
    const TABLE: &'static str = "teacher";
    const ID_COLUMN: &'static str = "teacher_id";
    const SELECT_BY_ID_SQL: &'static str =
        "SELECT teacher_id, first_name, last_name FROM teacher WHERE teacher_id = ?1;";
    const INSERT_SQL: &'static str = "INSERT INTO teacher (first_name, last_name) VALUES (?1, ?2);";
    const UPDATE_SQL: &'static str =
        "UPDATE teacher SET first_name = ?1, last_name = ?2 WHERE teacher_id = ?3;";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn insert_params(&self) -> RepoResult<Vec<Value>> {
        Ok(vec![
            opt_text(self.first_name.as_ref()),
            opt_text(self.last_name.as_ref()),
        ])
    }

    fn update_params(&self) -> RepoResult<Vec<Value>> {
        let mut values = self.insert_params()?;
        values.push(opt_int(self.id));
        Ok(values)
    }

    fn from_row(_conn: &Connection, row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: Some(row.get("teacher_id")?),
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
        })
    }
}

impl Entity for CatalogStudent {
    const NAME: &'static str = "catalog_student";
    const TABLE: &'static str = "catalog_student";
    const ID_COLUMN: &'static str = "student_id";
    const SELECT_BY_ID_SQL: &'static str = "SELECT
            student_id,
            first_name,
            last_name,
            email_address,
            guardian_name,
            guardian_email,
            guardian_mobile
        FROM catalog_student
        WHERE student_id = ?1;";
    const INSERT_SQL: &'static str = "INSERT INTO catalog_student (
            first_name,
            last_name,
            email_address,
            guardian_name,
            guardian_email,
            guardian_mobile
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);";
    const UPDATE_SQL: &'static str = "UPDATE catalog_student
        SET
            first_name = ?1,
            last_name = ?2,
            email_address = ?3,
            guardian_name = ?4,
            guardian_email = ?5,
            guardian_mobile = ?6
        WHERE student_id = ?7;";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn insert_params(&self) -> RepoResult<Vec<Value>> {
        Ok(vec![
            opt_text(self.first_name.as_ref()),
            opt_text(self.last_name.as_ref()),
            text(&self.email),
            opt_text(self.guardian.name.as_ref()),
            opt_text(self.guardian.email.as_ref()),
            opt_text(self.guardian.mobile.as_ref()),
        ])
    }

    fn update_params(&self) -> RepoResult<Vec<Value>> {
        let mut values = self.insert_params()?;
        values.push(opt_int(self.id));
        Ok(values)
    }

    fn from_row(_conn: &Connection, row: &Row<'_>) -> RepoResult<Self> {
        student_from_row(row)
    }

    fn validate(&self) -> Result<(), ConstraintViolation> {
        CatalogStudent::validate(self)
    }
}

impl Entity for Course {
    const NAME: &'static str = "course";
    const TABLE: &'static str = "course";
    const ID_COLUMN: &'static str = "course_id";
    const SELECT_BY_ID_SQL: &'static str =
        "SELECT course_id, title, credit, teacher_id FROM course WHERE course_id = ?1;";
    const INSERT_SQL: &'static str =
        "INSERT INTO course (title, credit, teacher_id) VALUES (?1, ?2, ?3);";
    const UPDATE_SQL: &'static str =
        "UPDATE course SET title = ?1, credit = ?2, teacher_id = ?3 WHERE course_id = ?4;";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn insert_params(&self) -> RepoResult<Vec<Value>> {
        let teacher_id = match self.teacher.as_ref() {
            Some(teacher) => Value::Integer(associate_id(teacher.id, Teacher::NAME)?),
            None => Value::Null,
        };
        Ok(vec![
            opt_text(self.title.as_ref()),
            opt_int(self.credit.map(i64::from)),
            teacher_id,
        ])
    }

    fn update_params(&self) -> RepoResult<Vec<Value>> {
        let mut values = self.insert_params()?;
        values.push(opt_int(self.id));
        Ok(values)
    }

    fn from_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Self> {
        let course_id: i64 = row.get("course_id")?;
        let teacher_id: Option<i64> = row.get("teacher_id")?;
        let teacher = match teacher_id {
            Some(id) => Some(load_associate::<Teacher>(conn, id, Self::NAME)?),
            None => None,
        };
        Ok(Self {
            id: Some(course_id),
            title: row.get("title")?,
            credit: row.get("credit")?,
            teacher,
            students: enrolled_students(conn, course_id)?,
        })
    }
}

impl Entity for CourseMaterial {
    const NAME: &'static str = "course_material";
    const TABLE: &'static str = "course_material";
    const ID_COLUMN: &'static str = "course_material_id";
    const SELECT_BY_ID_SQL: &'static str = "SELECT course_material_id, url, course_id
        FROM course_material
        WHERE course_material_id = ?1;";
    const INSERT_SQL: &'static str = "INSERT INTO course_material (url, course_id) VALUES (?1, ?2);";
    const UPDATE_SQL: &'static str =
        "UPDATE course_material SET url = ?1, course_id = ?2 WHERE course_material_id = ?3;";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn insert_params(&self) -> RepoResult<Vec<Value>> {
        Ok(vec![
            opt_text(self.url.as_ref()),
            Value::Integer(associate_id(self.course.id, Course::NAME)?),
        ])
    }

    fn update_params(&self) -> RepoResult<Vec<Value>> {
        let mut values = self.insert_params()?;
        values.push(opt_int(self.id));
        Ok(values)
    }

    fn from_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Self> {
        let course_id: i64 = row.get("course_id")?;
        Ok(Self {
            id: Some(row.get("course_material_id")?),
            url: row.get("url")?,
            course: load_associate(conn, course_id, Self::NAME)?,
        })
    }
}

/// Rewrites the enrollment pairs of `course_id` to exactly `students`.
///
/// Fails with `Unsaved` before touching any pair row when a student has no id.
pub(crate) fn replace_enrollments(
    conn: &Connection,
    course_id: CourseId,
    students: &[CatalogStudent],
) -> RepoResult<()> {
    let student_ids = students
        .iter()
        .map(|student| associate_id(student.id, CatalogStudent::NAME))
        .collect::<RepoResult<Vec<_>>>()?;

    conn.execute(
        "DELETE FROM student_course_map WHERE course_id = ?1;",
        [course_id],
    )?;
    let mut stmt =
        conn.prepare("INSERT INTO student_course_map (course_id, student_id) VALUES (?1, ?2);")?;
    for student_id in &student_ids {
        stmt.execute(params![course_id, student_id])?;
    }
    Ok(())
}

/// Students enrolled in `course_id`, in pair insertion order.
fn enrolled_students(conn: &Connection, course_id: CourseId) -> RepoResult<Vec<CatalogStudent>> {
    let mut stmt = conn.prepare(
        "SELECT s.student_id, s.first_name, s.last_name, s.email_address,
                s.guardian_name, s.guardian_email, s.guardian_mobile
         FROM student_course_map m
         JOIN catalog_student s ON s.student_id = m.student_id
         WHERE m.course_id = ?1
         ORDER BY m.rowid ASC;",
    )?;
    let mut rows = stmt.query([course_id])?;
    let mut students = Vec::new();
    while let Some(row) = rows.next()? {
        students.push(student_from_row(row)?);
    }
    Ok(students)
}

fn student_from_row(row: &Row<'_>) -> RepoResult<CatalogStudent> {
    Ok(CatalogStudent {
        id: Some(row.get("student_id")?),
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        email: row.get("email_address")?,
        guardian: Guardian {
            name: row.get("guardian_name")?,
            email: row.get("guardian_email")?,
            mobile: row.get("guardian_mobile")?,
        },
    })
}

/// Data-access API for the course catalog.
pub trait CatalogRepository {
    fn save_teacher(&mut self, teacher: &mut Teacher) -> RepoResult<TeacherId>;
    /// Cascades to the teacher; enrolled students must already be saved.
    fn save_course(&mut self, course: &mut Course) -> RepoResult<CourseId>;
    fn save_courses(&mut self, courses: &mut [Course]) -> RepoResult<Vec<CourseId>>;
    /// Cascades to the course and, through it, the teacher.
    fn save_course_material(&mut self, material: &mut CourseMaterial)
        -> RepoResult<CourseMaterialId>;
    fn save_student(&mut self, student: &mut CatalogStudent) -> RepoResult<CatalogStudentId>;
    /// Persists unsaved enrolled students first, then the course, atomically.
    ///
    /// Unsaved entries sharing an e-mail address are stored once and linked
    /// once per occurrence.
    fn save_course_with_students(&mut self, course: &mut Course) -> RepoResult<CourseId>;

    fn get_teacher(&self, id: TeacherId) -> RepoResult<Teacher>;
    fn get_course(&self, id: CourseId) -> RepoResult<Course>;
    fn get_course_material(&self, id: CourseMaterialId) -> RepoResult<CourseMaterial>;
    fn get_student(&self, id: CatalogStudentId) -> RepoResult<CatalogStudent>;
    fn material_for_course(&self, course_id: CourseId) -> RepoResult<Option<CourseMaterial>>;
    fn courses_for_student(&self, student_id: CatalogStudentId) -> RepoResult<Vec<Course>>;
    fn count_courses(&self) -> RepoResult<u64>;

    fn find_students_by_first_name(&self, first_name: &str) -> RepoResult<Vec<CatalogStudent>>;
    fn find_students_by_first_name_containing(
        &self,
        fragment: &str,
    ) -> RepoResult<Vec<CatalogStudent>>;
    fn find_students_with_last_name(&self) -> RepoResult<Vec<CatalogStudent>>;
    fn find_students_by_guardian_name(&self, name: &str) -> RepoResult<Vec<CatalogStudent>>;
    fn find_student_by_email(&self, email: &str) -> RepoResult<Option<CatalogStudent>>;
    /// `None` when no student has this e-mail or the first name is null.
    fn find_student_first_name_by_email(&self, email: &str) -> RepoResult<Option<String>>;
    /// Native bulk rename keyed by e-mail; returns the affected row count.
    fn update_student_first_name_by_email(&self, first_name: &str, email: &str)
        -> RepoResult<usize>;

    fn list_courses(&self, request: &CoursePageRequest) -> QueryResult<Page<Course>>;
    fn search_courses_by_title(
        &self,
        fragment: &str,
        request: &CoursePageRequest,
    ) -> QueryResult<Page<Course>>;
}

/// SQLite-backed catalog repository.
pub struct SqliteCatalogRepository<'conn, C: Clock = SystemClock> {
    conn: &'conn mut Connection,
    clock: C,
}

impl<'conn> SqliteCatalogRepository<'conn, SystemClock> {
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        Self::with_clock(conn, SystemClock)
    }
}

impl<'conn, C: Clock> SqliteCatalogRepository<'conn, C> {
    pub fn with_clock(conn: &'conn mut Connection, clock: C) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn, clock })
    }

    pub fn connection(&self) -> &Connection {
        self.conn
    }

    fn students_where(&self, condition: &str, param: Option<&str>) -> RepoResult<Vec<CatalogStudent>> {
        let sql = format!(
            "SELECT {STUDENT_COLUMNS} FROM catalog_student WHERE {condition} ORDER BY student_id ASC;"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = match param {
            Some(value) => stmt.query([value])?,
            None => stmt.query([])?,
        };
        let mut students = Vec::new();
        while let Some(row) = rows.next()? {
            students.push(student_from_row(row)?);
        }
        Ok(students)
    }
}

impl<C: Clock> CatalogRepository for SqliteCatalogRepository<'_, C> {
    fn save_teacher(&mut self, teacher: &mut Teacher) -> RepoResult<TeacherId> {
        cascade_persist(self.conn, &self.clock, teacher)
    }

    fn save_course(&mut self, course: &mut Course) -> RepoResult<CourseId> {
        cascade_persist(self.conn, &self.clock, course)
    }

    fn save_courses(&mut self, courses: &mut [Course]) -> RepoResult<Vec<CourseId>> {
        cascade_persist_all(self.conn, &self.clock, courses)
    }

    fn save_course_material(
        &mut self,
        material: &mut CourseMaterial,
    ) -> RepoResult<CourseMaterialId> {
        cascade_persist(self.conn, &self.clock, material)
    }

    fn save_student(&mut self, student: &mut CatalogStudent) -> RepoResult<CatalogStudentId> {
        cascade_persist(self.conn, &self.clock, student)
    }

    fn save_course_with_students(&mut self, course: &mut Course) -> RepoResult<CourseId> {
        let clock = &self.clock;
        let (id, working) = in_transaction(
            self.conn,
            "save_course_with_students",
            Course::NAME,
            |tx| {
                let mut working = course.clone();
                let mut saved_by_email: HashMap<String, CatalogStudentId> = HashMap::new();
                for student in &mut working.students {
                    if student.id.is_some() {
                        continue;
                    }
                    if let Some(id) = saved_by_email.get(&student.email) {
                        student.id = Some(*id);
                        continue;
                    }
                    let id = student.persist(tx, clock)?;
                    saved_by_email.insert(student.email.clone(), id);
                }
                let id = working.persist(tx, clock)?;
                Ok((id, working))
            },
        )?;
        *course = working;
        Ok(id)
    }

    fn get_teacher(&self, id: TeacherId) -> RepoResult<Teacher> {
        store::get(self.conn, id)
    }

    fn get_course(&self, id: CourseId) -> RepoResult<Course> {
        store::get(self.conn, id)
    }

    fn get_course_material(&self, id: CourseMaterialId) -> RepoResult<CourseMaterial> {
        store::get(self.conn, id)
    }

    fn get_student(&self, id: CatalogStudentId) -> RepoResult<CatalogStudent> {
        store::get(self.conn, id)
    }

    fn material_for_course(&self, course_id: CourseId) -> RepoResult<Option<CourseMaterial>> {
        let id = self
            .conn
            .query_row(
                "SELECT course_material_id FROM course_material WHERE course_id = ?1;",
                [course_id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        match id {
            Some(id) => store::find(self.conn, id),
            None => Ok(None),
        }
    }

    fn courses_for_student(&self, student_id: CatalogStudentId) -> RepoResult<Vec<Course>> {
        if store::find::<CatalogStudent>(self.conn, student_id)?.is_none() {
            return Err(RepoError::NotFound {
                entity: CatalogStudent::NAME,
                id: student_id,
            });
        }
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT course_id FROM student_course_map
             WHERE student_id = ?1
             ORDER BY course_id ASC;",
        )?;
        let ids = stmt
            .query_map([student_id], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        ids.into_iter()
            .map(|id| store::get::<Course>(self.conn, id))
            .collect()
    }

    fn count_courses(&self) -> RepoResult<u64> {
        store::count::<Course>(self.conn)
    }

    fn find_students_by_first_name(&self, first_name: &str) -> RepoResult<Vec<CatalogStudent>> {
        self.students_where("first_name = ?1", Some(first_name))
    }

    fn find_students_by_first_name_containing(
        &self,
        fragment: &str,
    ) -> RepoResult<Vec<CatalogStudent>> {
        self.students_where("instr(first_name, ?1) > 0", Some(fragment))
    }

    fn find_students_with_last_name(&self) -> RepoResult<Vec<CatalogStudent>> {
        self.students_where("last_name IS NOT NULL", None)
    }

    fn find_students_by_guardian_name(&self, name: &str) -> RepoResult<Vec<CatalogStudent>> {
        self.students_where("guardian_name = ?1", Some(name))
    }

    fn find_student_by_email(&self, email: &str) -> RepoResult<Option<CatalogStudent>> {
        Ok(self
            .students_where("email_address = ?1", Some(email))?
            .into_iter()
            .next())
    }

    fn find_student_first_name_by_email(&self, email: &str) -> RepoResult<Option<String>> {
        let first_name = self
            .conn
            .query_row(
                "SELECT first_name FROM catalog_student WHERE email_address = ?1;",
                [email],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?;
        Ok(first_name.flatten())
    }

    fn update_student_first_name_by_email(
        &self,
        first_name: &str,
        email: &str,
    ) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE catalog_student SET first_name = ?1 WHERE email_address = ?2;",
            params![first_name, email],
        )?;
        info!(
            "event=bulk_update module=repo status=ok statement=student_first_name rows={changed}"
        );
        Ok(changed)
    }

    fn list_courses(&self, request: &CoursePageRequest) -> QueryResult<Page<Course>> {
        list_courses(self.conn, request)
    }

    fn search_courses_by_title(
        &self,
        fragment: &str,
        request: &CoursePageRequest,
    ) -> QueryResult<Page<Course>> {
        search_courses_by_title(self.conn, fragment, request)
    }
}
