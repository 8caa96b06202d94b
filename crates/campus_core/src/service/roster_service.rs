//! Roster use-case service.
//!
//! # Responsibility
//! - Seed the roster in dependency order.
//! - Register students and professors, rename persons, run the reports.
//!
//! # Invariants
//! - `rename_person` is a structured write and refreshes the modification
//!   timestamp; `bulk_rename_person` is native and does not.

use crate::model::audit::EpochMillis;
use crate::model::roster::{Person, PersonId, Professor, Student};
use crate::query::roster::{CountryRoleCount, InstantRange, ModifiedPerson, PersonRoleRow};
use crate::repo::roster_repo::RosterRepository;
use crate::service::ServiceResult;
use log::info;
use serde::{Deserialize, Serialize};

/// Rows inserted per roster table by `seed_roster`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSeedSummary {
    pub countries: usize,
    pub addresses: usize,
    pub persons: usize,
    pub students: usize,
    pub professors: usize,
}

/// Roster service facade over repository implementations.
pub struct RosterService<R: RosterRepository> {
    repo: R,
}

impl<R: RosterRepository> RosterService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Runs the five native seeds: countries, addresses, persons, students,
    /// professors. Stops at the first failure.
    pub fn seed_roster(&self) -> ServiceResult<RosterSeedSummary> {
        let summary = RosterSeedSummary {
            countries: self.repo.init_countries()?,
            addresses: self.repo.init_addresses()?,
            persons: self.repo.init_persons()?,
            students: self.repo.init_students()?,
            professors: self.repo.init_professors()?,
        };
        info!(
            "event=roster_seed module=service status=ok persons={} students={} professors={}",
            summary.persons, summary.students, summary.professors
        );
        Ok(summary)
    }

    /// Persists `person` (cascading to address and country) with a student role.
    pub fn register_student(&mut self, person: Person, student_number: i64) -> ServiceResult<Student> {
        let mut student = Student::new(person, student_number);
        self.repo.save_student(&mut student)?;
        Ok(student)
    }

    pub fn register_professor(
        &mut self,
        person: Person,
        professor_number: i64,
    ) -> ServiceResult<Professor> {
        let mut professor = Professor::new(person, professor_number);
        self.repo.save_professor(&mut professor)?;
        Ok(professor)
    }

    pub fn rename_person(&mut self, person_id: PersonId, last_name: &str) -> ServiceResult<Person> {
        let mut person = self.repo.get_person(person_id)?;
        person.last_name = last_name.to_string();
        self.repo.save_person(&mut person)?;
        Ok(person)
    }

    pub fn bulk_rename_person(&self, person_id: PersonId, last_name: &str) -> ServiceResult<usize> {
        Ok(self.repo.bulk_update_person_last_name(person_id, last_name)?)
    }

    pub fn role_counts_by_country(&self) -> ServiceResult<Vec<CountryRoleCount>> {
        Ok(self.repo.role_counts_by_country()?)
    }

    /// Persons modified in `[from, to]`; fails with `InvalidRange` when `from > to`.
    pub fn persons_modified_between(
        &self,
        from: EpochMillis,
        to: EpochMillis,
    ) -> ServiceResult<Vec<ModifiedPerson>> {
        let range = InstantRange::new(from, to)?;
        Ok(self.repo.persons_modified_between(&range)?)
    }

    pub fn persons_in_country(&self, country_name: &str) -> ServiceResult<Vec<PersonRoleRow>> {
        Ok(self.repo.persons_in_country(country_name)?)
    }
}
