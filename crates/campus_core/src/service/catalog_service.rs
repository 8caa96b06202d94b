//! Catalog use-case service.
//!
//! # Responsibility
//! - Create courses, enroll students and seed the demo catalog.
//! - Build validated page requests for course listing and search.

use crate::model::catalog::{CatalogStudent, CatalogStudentId, Course, CourseId, CourseMaterial, Teacher};
use crate::query::catalog::{CourseField, CoursePageRequest};
use crate::query::page::{Page, PageRequest, Sort};
use crate::repo::catalog_repo::CatalogRepository;
use crate::repo::seed;
use crate::service::ServiceResult;

/// Catalog service facade over repository implementations.
pub struct CatalogService<R: CatalogRepository> {
    repo: R,
}

impl<R: CatalogRepository> CatalogService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Demo catalog: five courses (two with materials) plus one enrolled course.
    pub fn seed_catalog(&mut self) -> ServiceResult<()> {
        Ok(seed::init_catalog(&mut self.repo)?)
    }

    /// Persists a course, cascading to `teacher` when present.
    pub fn create_course(
        &mut self,
        title: &str,
        credit: i32,
        teacher: Option<Teacher>,
    ) -> ServiceResult<Course> {
        let mut course = Course::new(title, credit);
        course.teacher = teacher;
        self.repo.save_course(&mut course)?;
        Ok(course)
    }

    pub fn attach_material(&mut self, url: &str, course: Course) -> ServiceResult<CourseMaterial> {
        let mut material = CourseMaterial::new(url, course);
        self.repo.save_course_material(&mut material)?;
        Ok(material)
    }

    pub fn register_student(&mut self, student: CatalogStudent) -> ServiceResult<CatalogStudent> {
        let mut student = student;
        self.repo.save_student(&mut student)?;
        Ok(student)
    }

    /// Saves `course` with `students` enrolled, persisting unsaved students first.
    pub fn enroll(
        &mut self,
        mut course: Course,
        students: Vec<CatalogStudent>,
    ) -> ServiceResult<Course> {
        course.students.extend(students);
        self.repo.save_course_with_students(&mut course)?;
        Ok(course)
    }

    pub fn material_for_course(&self, course_id: CourseId) -> ServiceResult<Option<CourseMaterial>> {
        Ok(self.repo.material_for_course(course_id)?)
    }

    pub fn courses_for_student(&self, student_id: CatalogStudentId) -> ServiceResult<Vec<Course>> {
        Ok(self.repo.courses_for_student(student_id)?)
    }

    /// One page of courses; `index` is zero-based.
    pub fn list_courses(
        &self,
        index: i64,
        size: i64,
        sort: Sort<CourseField>,
    ) -> ServiceResult<Page<Course>> {
        let request: CoursePageRequest = PageRequest::sorted(index, size, sort)?;
        Ok(self.repo.list_courses(&request)?)
    }

    pub fn search_courses(
        &self,
        title_fragment: &str,
        index: i64,
        size: i64,
        sort: Sort<CourseField>,
    ) -> ServiceResult<Page<Course>> {
        let request: CoursePageRequest = PageRequest::sorted(index, size, sort)?;
        Ok(self.repo.search_courses_by_title(title_fragment, &request)?)
    }

    pub fn student_by_email(&self, email: &str) -> ServiceResult<Option<CatalogStudent>> {
        Ok(self.repo.find_student_by_email(email)?)
    }

    /// Native rename; returns how many students matched `email`.
    pub fn rename_student_by_email(&self, email: &str, first_name: &str) -> ServiceResult<usize> {
        Ok(self.repo.update_student_first_name_by_email(first_name, email)?)
    }
}
