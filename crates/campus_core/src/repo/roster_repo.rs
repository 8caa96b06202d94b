//! Roster repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Map roster entities onto their tables.
//! - Expose cascading saves, lookups, native seed/bulk statements and the
//!   roster reports behind one data-access API.
//!
//! # Invariants
//! - Saves are cascading and atomic (see `repo::cascade`).
//! - Native statements (`init_*`, `bulk_update_person_last_name`) bypass the
//!   audit touch step.

use crate::model::audit::{AuditStamp, Clock, SystemClock};
use crate::model::roster::{
    Address, AddressId, Country, CountryId, Person, PersonId, Professor, ProfessorId, Student,
    StudentId,
};
use crate::query::roster::{
    persons_in_country, persons_modified_between, role_counts_by_country, CountryRoleCount,
    InstantRange, ModifiedPerson, PersonRoleRow,
};
use crate::query::QueryResult;
use crate::repo::cascade::cascade_persist;
use crate::repo::error::{ensure_connection_ready, RepoResult};
use crate::repo::seed;
use crate::repo::store::{self, associate_id, load_associate, opt_int, text, Entity};
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Row};

impl Entity for Country {
    const NAME: &'static str = "country";
    const TABLE: &'static str = "country";
    const ID_COLUMN: &'static str = "country_id";
    const SELECT_BY_ID_SQL: &'static str =
        "SELECT country_id, name FROM country WHERE country_id = ?1;";
    const INSERT_SQL: &'static str = "INSERT INTO country (name) VALUES (?1);";
    const UPDATE_SQL: &'static str = "UPDATE country SET name = ?1 WHERE country_id = ?2;";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn insert_params(&self) -> RepoResult<Vec<Value>> {
        Ok(vec![text(&self.name)])
    }

    fn update_params(&self) -> RepoResult<Vec<Value>> {
        Ok(vec![text(&self.name), opt_int(self.id)])
    }

    fn from_row(_conn: &Connection, row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: Some(row.get("country_id")?),
            name: row.get("name")?,
        })
    }
}

impl Entity for Address {
    const NAME: &'static str = "address";
    const TABLE: &'static str = "address";
    const ID_COLUMN: &'static str = "address_id";
    const SELECT_BY_ID_SQL: &'static str =
        "SELECT address_id, country_id, street, city FROM address WHERE address_id = ?1;";
    const INSERT_SQL: &'static str =
        "INSERT INTO address (country_id, street, city) VALUES (?1, ?2, ?3);";
    const UPDATE_SQL: &'static str =
        "UPDATE address SET country_id = ?1, street = ?2, city = ?3 WHERE address_id = ?4;";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn insert_params(&self) -> RepoResult<Vec<Value>> {
        Ok(vec![
            Value::Integer(associate_id(self.country.id, Country::NAME)?),
            text(&self.street),
            text(&self.city),
        ])
    }

    fn update_params(&self) -> RepoResult<Vec<Value>> {
        let mut values = self.insert_params()?;
        values.push(opt_int(self.id));
        Ok(values)
    }

    fn from_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Self> {
        let country_id: i64 = row.get("country_id")?;
        Ok(Self {
            id: Some(row.get("address_id")?),
            country: load_associate(conn, country_id, Self::NAME)?,
            street: row.get("street")?,
            city: row.get("city")?,
        })
    }
}

impl Entity for Person {
    const NAME: &'static str = "person";
    const TABLE: &'static str = "person";
    const ID_COLUMN: &'static str = "person_id";
    const SELECT_BY_ID_SQL: &'static str = "SELECT
            person_id,
            address_id,
            last_name,
            creation_timestamp,
            modification_timestamp
        FROM person
        WHERE person_id = ?1;";
    const INSERT_SQL: &'static str = "INSERT INTO person (
            address_id,
            last_name,
            creation_timestamp,
            modification_timestamp
        ) VALUES (?1, ?2, ?3, ?4);";
    // creation_timestamp is insert-only.
    const UPDATE_SQL: &'static str = "UPDATE person
        SET
            address_id = ?1,
            last_name = ?2,
            modification_timestamp = ?3
        WHERE person_id = ?4;";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn insert_params(&self) -> RepoResult<Vec<Value>> {
        Ok(vec![
            Value::Integer(associate_id(self.address.id, Address::NAME)?),
            text(&self.last_name),
            opt_int(self.audit.creation_timestamp),
            opt_int(self.audit.modification_timestamp),
        ])
    }

    fn update_params(&self) -> RepoResult<Vec<Value>> {
        Ok(vec![
            Value::Integer(associate_id(self.address.id, Address::NAME)?),
            text(&self.last_name),
            opt_int(self.audit.modification_timestamp),
            opt_int(self.id),
        ])
    }

    fn from_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Self> {
        let address_id: i64 = row.get("address_id")?;
        Ok(Self {
            id: Some(row.get("person_id")?),
            address: load_associate(conn, address_id, Self::NAME)?,
            last_name: row.get("last_name")?,
            audit: AuditStamp {
                creation_timestamp: row.get("creation_timestamp")?,
                modification_timestamp: row.get("modification_timestamp")?,
            },
        })
    }

    fn audit_mut(&mut self) -> Option<&mut AuditStamp> {
        Some(&mut self.audit)
    }
}

impl Entity for Student {
    const NAME: &'static str = "student";
    const TABLE: &'static str = "student";
    const ID_COLUMN: &'static str = "student_id";
    const SELECT_BY_ID_SQL: &'static str =
        "SELECT student_id, person_id, student_number FROM student WHERE student_id = ?1;";
    const INSERT_SQL: &'static str =
        "INSERT INTO student (person_id, student_number) VALUES (?1, ?2);";
    const UPDATE_SQL: &'static str =
        "UPDATE student SET person_id = ?1, student_number = ?2 WHERE student_id = ?3;";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn insert_params(&self) -> RepoResult<Vec<Value>> {
        Ok(vec![
            Value::Integer(associate_id(self.person.id, Person::NAME)?),
            Value::Integer(self.student_number),
        ])
    }

    fn update_params(&self) -> RepoResult<Vec<Value>> {
        let mut values = self.insert_params()?;
        values.push(opt_int(self.id));
        Ok(values)
    }

    fn from_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Self> {
        let person_id: i64 = row.get("person_id")?;
        Ok(Self {
            id: Some(row.get("student_id")?),
            person: load_associate(conn, person_id, Self::NAME)?,
            student_number: row.get("student_number")?,
        })
    }
}

impl Entity for Professor {
    const NAME: &'static str = "professor";
    const TABLE: &'static str = "professor";
    const ID_COLUMN: &'static str = "professor_id";
    const SELECT_BY_ID_SQL: &'static str =
        "SELECT professor_id, person_id, professor_number FROM professor WHERE professor_id = ?1;";
    const INSERT_SQL: &'static str =
        "INSERT INTO professor (person_id, professor_number) VALUES (?1, ?2);";
    const UPDATE_SQL: &'static str =
        "UPDATE professor SET person_id = ?1, professor_number = ?2 WHERE professor_id = ?3;";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn insert_params(&self) -> RepoResult<Vec<Value>> {
        Ok(vec![
            Value::Integer(associate_id(self.person.id, Person::NAME)?),
            Value::Integer(self.professor_number),
        ])
    }

    fn update_params(&self) -> RepoResult<Vec<Value>> {
        let mut values = self.insert_params()?;
        values.push(opt_int(self.id));
        Ok(values)
    }

    fn from_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Self> {
        let person_id: i64 = row.get("person_id")?;
        Ok(Self {
            id: Some(row.get("professor_id")?),
            person: load_associate(conn, person_id, Self::NAME)?,
            professor_number: row.get("professor_number")?,
        })
    }
}

/// Data-access API for the roster schema.
pub trait RosterRepository {
    /// Inserts the fixed country literals (native statement).
    fn init_countries(&self) -> RepoResult<usize>;
    /// Inserts the fixed address literals; requires countries.
    fn init_addresses(&self) -> RepoResult<usize>;
    /// Inserts the fixed person literals; requires addresses.
    fn init_persons(&self) -> RepoResult<usize>;
    /// Inserts the fixed student literals; requires persons.
    fn init_students(&self) -> RepoResult<usize>;
    /// Inserts the fixed professor literals; requires persons.
    fn init_professors(&self) -> RepoResult<usize>;

    fn save_country(&mut self, country: &mut Country) -> RepoResult<CountryId>;
    fn save_address(&mut self, address: &mut Address) -> RepoResult<AddressId>;
    fn save_person(&mut self, person: &mut Person) -> RepoResult<PersonId>;
    fn save_student(&mut self, student: &mut Student) -> RepoResult<StudentId>;
    fn save_professor(&mut self, professor: &mut Professor) -> RepoResult<ProfessorId>;

    fn get_country(&self, id: CountryId) -> RepoResult<Country>;
    fn get_address(&self, id: AddressId) -> RepoResult<Address>;
    fn get_person(&self, id: PersonId) -> RepoResult<Person>;
    fn get_student(&self, id: StudentId) -> RepoResult<Student>;
    fn get_professor(&self, id: ProfessorId) -> RepoResult<Professor>;
    fn find_country_by_name(&self, name: &str) -> RepoResult<Option<Country>>;
    fn student_of_person(&self, person_id: PersonId) -> RepoResult<Option<Student>>;
    fn professor_of_person(&self, person_id: PersonId) -> RepoResult<Option<Professor>>;

    /// Native bulk rename; leaves audit timestamps untouched.
    fn bulk_update_person_last_name(&self, person_id: PersonId, last_name: &str)
        -> RepoResult<usize>;

    fn role_counts_by_country(&self) -> QueryResult<Vec<CountryRoleCount>>;
    fn persons_modified_between(&self, range: &InstantRange) -> QueryResult<Vec<ModifiedPerson>>;
    fn persons_in_country(&self, country_name: &str) -> QueryResult<Vec<PersonRoleRow>>;
}

/// SQLite-backed roster repository.
pub struct SqliteRosterRepository<'conn, C: Clock = SystemClock> {
    conn: &'conn mut Connection,
    clock: C,
}

impl<'conn> SqliteRosterRepository<'conn, SystemClock> {
    /// Creates a repository on a migrated connection using the wall clock.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        Self::with_clock(conn, SystemClock)
    }
}

impl<'conn, C: Clock> SqliteRosterRepository<'conn, C> {
    pub fn with_clock(conn: &'conn mut Connection, clock: C) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn, clock })
    }

    pub fn connection(&self) -> &Connection {
        self.conn
    }
}

impl<C: Clock> RosterRepository for SqliteRosterRepository<'_, C> {
    fn init_countries(&self) -> RepoResult<usize> {
        seed::init_countries(self.conn)
    }

    fn init_addresses(&self) -> RepoResult<usize> {
        seed::init_addresses(self.conn)
    }

    fn init_persons(&self) -> RepoResult<usize> {
        seed::init_persons(self.conn)
    }

    fn init_students(&self) -> RepoResult<usize> {
        seed::init_students(self.conn)
    }

    fn init_professors(&self) -> RepoResult<usize> {
        seed::init_professors(self.conn)
    }

    fn save_country(&mut self, country: &mut Country) -> RepoResult<CountryId> {
        cascade_persist(self.conn, &self.clock, country)
    }

    fn save_address(&mut self, address: &mut Address) -> RepoResult<AddressId> {
        cascade_persist(self.conn, &self.clock, address)
    }

    fn save_person(&mut self, person: &mut Person) -> RepoResult<PersonId> {
        cascade_persist(self.conn, &self.clock, person)
    }

    fn save_student(&mut self, student: &mut Student) -> RepoResult<StudentId> {
        cascade_persist(self.conn, &self.clock, student)
    }

    fn save_professor(&mut self, professor: &mut Professor) -> RepoResult<ProfessorId> {
        cascade_persist(self.conn, &self.clock, professor)
    }

    fn get_country(&self, id: CountryId) -> RepoResult<Country> {
        store::get(self.conn, id)
    }

    fn get_address(&self, id: AddressId) -> RepoResult<Address> {
        store::get(self.conn, id)
    }

    fn get_person(&self, id: PersonId) -> RepoResult<Person> {
        store::get(self.conn, id)
    }

    fn get_student(&self, id: StudentId) -> RepoResult<Student> {
        store::get(self.conn, id)
    }

    fn get_professor(&self, id: ProfessorId) -> RepoResult<Professor> {
        store::get(self.conn, id)
    }

    fn find_country_by_name(&self, name: &str) -> RepoResult<Option<Country>> {
        let id = self
            .conn
            .query_row(
                "SELECT country_id FROM country WHERE name = ?1;",
                [name],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        match id {
            Some(id) => store::find(self.conn, id),
            None => Ok(None),
        }
    }

    fn student_of_person(&self, person_id: PersonId) -> RepoResult<Option<Student>> {
        let id = self
            .conn
            .query_row(
                "SELECT student_id FROM student WHERE person_id = ?1;",
                [person_id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        match id {
            Some(id) => store::find(self.conn, id),
            None => Ok(None),
        }
    }

    fn professor_of_person(&self, person_id: PersonId) -> RepoResult<Option<Professor>> {
        let id = self
            .conn
            .query_row(
                "SELECT professor_id FROM professor WHERE person_id = ?1;",
                [person_id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        match id {
            Some(id) => store::find(self.conn, id),
            None => Ok(None),
        }
    }

    fn bulk_update_person_last_name(
        &self,
        person_id: PersonId,
        last_name: &str,
    ) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE person SET last_name = ?1 WHERE person_id = ?2;",
            params![last_name, person_id],
        )?;
        info!(
            "event=bulk_update module=repo status=ok statement=person_last_name rows={changed} audit=bypassed"
        );
        Ok(changed)
    }

    fn role_counts_by_country(&self) -> QueryResult<Vec<CountryRoleCount>> {
        role_counts_by_country(self.conn)
    }

    fn persons_modified_between(&self, range: &InstantRange) -> QueryResult<Vec<ModifiedPerson>> {
        persons_modified_between(self.conn, range)
    }

    fn persons_in_country(&self, country_name: &str) -> QueryResult<Vec<PersonRoleRow>> {
        persons_in_country(self.conn, country_name)
    }
}
