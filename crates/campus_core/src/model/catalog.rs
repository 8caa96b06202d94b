//! Course catalog entities.
//!
//! # Responsibility
//! - Model teachers, courses, course materials and enrolled students.
//!
//! # Invariants
//! - `CatalogStudent.email` is required, non-blank and unique.
//! - A course material belongs to exactly one course; a course has at most
//!   one material (resolved on demand, not stored on `Course`).
//! - Course enrollment is an unordered multiset of student references.

use crate::model::constraint::ConstraintViolation;
use serde::{Deserialize, Serialize};

pub type TeacherId = i64;
pub type CourseId = i64;
pub type CourseMaterialId = i64;
pub type CatalogStudentId = i64;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: Option<TeacherId>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Teacher {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: None,
            first_name: Some(first_name.into()),
            last_name: Some(last_name.into()),
        }
    }
}

/// Guardian contact embedded in the student row; it has no identity of its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guardian {
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
}

impl Guardian {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        mobile: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
            mobile: Some(mobile.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStudent {
    pub id: Option<CatalogStudentId>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub guardian: Guardian,
}

impl CatalogStudent {
    pub fn new(
        first_name: impl Into<String>,
        last_name: Option<String>,
        email: impl Into<String>,
        guardian: Guardian,
    ) -> Self {
        Self {
            id: None,
            first_name: Some(first_name.into()),
            last_name,
            email: email.into(),
            guardian,
        }
    }

    pub fn validate(&self) -> Result<(), ConstraintViolation> {
        if self.email.trim().is_empty() {
            return Err(ConstraintViolation::blank("catalog_student", "email_address"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: Option<CourseId>,
    pub title: Option<String>,
    pub credit: Option<i32>,
    /// Optional many-to-one, cascades.
    pub teacher: Option<Teacher>,
    /// Many-to-many through `student_course_map`. Never cascaded implicitly:
    /// every entry must already be persisted when the course is saved.
    pub students: Vec<CatalogStudent>,
}

impl Course {
    pub fn new(title: impl Into<String>, credit: i32) -> Self {
        Self {
            title: Some(title.into()),
            credit: Some(credit),
            ..Self::default()
        }
    }

    pub fn with_teacher(mut self, teacher: Teacher) -> Self {
        self.teacher = Some(teacher);
        self
    }

    /// Appends an enrollment. The same student may be added twice.
    pub fn add_student(&mut self, student: CatalogStudent) {
        self.students.push(student);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseMaterial {
    pub id: Option<CourseMaterialId>,
    pub url: Option<String>,
    /// Required one-to-one owner side, cascades.
    pub course: Course,
}

impl CourseMaterial {
    pub fn new(url: impl Into<String>, course: Course) -> Self {
        Self {
            id: None,
            url: Some(url.into()),
            course,
        }
    }
}
