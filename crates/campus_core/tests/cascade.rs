use campus_core::db::open_db_in_memory;
use campus_core::repo::store;
use campus_core::{
    Address, CatalogRepository, CatalogStudent, ConstraintKind, Country, Course, CourseMaterial,
    FixedClock, Guardian, Person, Professor, RepoError, RosterRepository,
    SqliteCatalogRepository, SqliteRosterRepository, Student, Teacher,
};
use rusqlite::Connection;

fn person_in(country: &str, city: &str, last_name: &str) -> Person {
    Person::new(
        Address::new(Country::new(country), city, "Main 1"),
        last_name,
    )
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

fn dangling_references(conn: &Connection) -> i64 {
    let violations: Vec<String> = conn
        .prepare("PRAGMA foreign_key_check;")
        .unwrap()
        .query_map([], |row| row.get::<_, String>(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    violations.len() as i64
}

#[test]
fn course_with_unsaved_teacher_persists_teacher_first() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteCatalogRepository::with_clock(&mut conn, FixedClock::at(1_000)).unwrap();

    let mut course = Course::new("kurs1", 1000).with_teacher(Teacher::new("FFFFF", "FFFFFSDD"));
    let course_id = repo.save_course(&mut course).unwrap();

    let teacher_id = course.teacher.as_ref().and_then(|teacher| teacher.id);
    assert!(teacher_id.is_some());
    assert_eq!(course.id, Some(course_id));

    let stored_fk: Option<i64> = repo
        .connection()
        .query_row(
            "SELECT teacher_id FROM course WHERE course_id = ?1;",
            [course_id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(stored_fk, teacher_id);
    assert_eq!(repo.get_course(course_id).unwrap(), course);
}

#[test]
fn student_cascade_creates_the_whole_chain() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let mut repo =
            SqliteRosterRepository::with_clock(&mut conn, FixedClock::at(5_000)).unwrap();
        let mut student = Student::new(person_in("Poland", "Kraków", "Kowalski"), 234223);
        let student_id = repo.save_student(&mut student).unwrap();

        assert!(student.person.id.is_some());
        assert!(student.person.address.id.is_some());
        assert!(student.person.address.country.id.is_some());
        assert_eq!(repo.get_student(student_id).unwrap(), student);
    }
    assert_eq!(count(&conn, "country"), 1);
    assert_eq!(count(&conn, "address"), 1);
    assert_eq!(count(&conn, "person"), 1);
    assert_eq!(dangling_references(&conn), 0);
}

#[test]
fn saved_person_can_hold_both_roles() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRosterRepository::with_clock(&mut conn, FixedClock::at(5_000)).unwrap();

    let mut student = Student::new(person_in("Poland", "Kraków", "Kowalski"), 234223);
    repo.save_student(&mut student).unwrap();
    let mut professor = Professor::new(student.person.clone(), 121212);
    repo.save_professor(&mut professor).unwrap();

    let person_id = student.person.id.unwrap();
    assert_eq!(
        repo.student_of_person(person_id).unwrap().map(|s| s.student_number),
        Some(234223)
    );
    assert_eq!(
        repo.professor_of_person(person_id).unwrap().map(|p| p.professor_number),
        Some(121212)
    );
    assert_eq!(count(repo.connection(), "person"), 1);
}

#[test]
fn failed_cascade_rolls_back_every_associate() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let mut repo =
            SqliteRosterRepository::with_clock(&mut conn, FixedClock::at(5_000)).unwrap();
        let mut first = Student::new(person_in("Poland", "Kraków", "Kowalski"), 234223);
        repo.save_student(&mut first).unwrap();

        let mut clash = Student::new(person_in("Germany", "Berlin", "Smesny"), 234223);
        let before = clash.clone();
        let err = repo.save_student(&mut clash).unwrap_err();

        assert_eq!(err.constraint_kind(), Some(ConstraintKind::Unique));
        assert_eq!(clash, before);
        assert!(repo.find_country_by_name("Germany").unwrap().is_none());
    }
    assert_eq!(count(&conn, "country"), 1);
    assert_eq!(count(&conn, "address"), 1);
    assert_eq!(count(&conn, "person"), 1);
    assert_eq!(count(&conn, "student"), 1);
    assert_eq!(dangling_references(&conn), 0);
}

#[test]
fn second_role_for_same_person_violates_one_to_one() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRosterRepository::with_clock(&mut conn, FixedClock::at(5_000)).unwrap();

    let mut student = Student::new(person_in("Poland", "Kraków", "Kowalski"), 1);
    repo.save_student(&mut student).unwrap();
    let mut again = Student::new(student.person.clone(), 2);

    let err = repo.save_student(&mut again).unwrap_err();
    assert_eq!(err.constraint_kind(), Some(ConstraintKind::Unique));
}

#[test]
fn material_cascades_through_course_to_teacher() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteCatalogRepository::with_clock(&mut conn, FixedClock::at(1_000)).unwrap();

    let mut material = CourseMaterial::new(
        "DDDDDD",
        Course::new("kurs1", 1000).with_teacher(Teacher::new("FFFFF", "FFFFFSDD")),
    );
    let material_id = repo.save_course_material(&mut material).unwrap();
    let course_id = material.course.id.unwrap();

    let found = repo.material_for_course(course_id).unwrap().unwrap();
    assert_eq!(found.id, Some(material_id));
    assert_eq!(found.url.as_deref(), Some("DDDDDD"));
    assert_eq!(found.course.teacher, material.course.teacher);

    let mut second = CourseMaterial::new("XXXXXX", material.course.clone());
    let err = repo.save_course_material(&mut second).unwrap_err();
    assert_eq!(err.constraint_kind(), Some(ConstraintKind::Unique));
}

#[test]
fn course_without_material_has_no_back_reference() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteCatalogRepository::with_clock(&mut conn, FixedClock::at(1_000)).unwrap();

    let mut course = Course::new("3333333", 4);
    let id = repo.save_course(&mut course).unwrap();
    assert!(repo.material_for_course(id).unwrap().is_none());
    assert!(course.teacher.is_none());
}

#[test]
fn plain_save_refuses_unsaved_enrolled_students() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let mut repo =
            SqliteCatalogRepository::with_clock(&mut conn, FixedClock::at(1_000)).unwrap();
        let mut course = Course::new("kurs1", 1000).with_teacher(Teacher::new("FFFFF", "FFFFFSDD"));
        course.add_student(CatalogStudent::new(
            "AdamGrant",
            None,
            "Email",
            Guardian::default(),
        ));

        let err = repo.save_course(&mut course).unwrap_err();
        assert!(matches!(err, RepoError::Unsaved { entity: "catalog_student" }));
        assert!(course.id.is_none());
        assert!(course.teacher.as_ref().unwrap().id.is_none());
    }
    assert_eq!(count(&conn, "course"), 0);
    assert_eq!(count(&conn, "teacher"), 0);
}

#[test]
fn explicit_student_cascade_links_each_student() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteCatalogRepository::with_clock(&mut conn, FixedClock::at(1_000)).unwrap();

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
    let course_id = repo.save_course_with_students(&mut course).unwrap();

    assert!(course.students.iter().all(|student| student.id.is_some()));
    let stored = repo.get_course(course_id).unwrap();
    assert_eq!(stored.students, course.students);

    let adam_id = course.students[0].id.unwrap();
    let adam_courses = repo.courses_for_student(adam_id).unwrap();
    assert_eq!(adam_courses.len(), 1);
    assert_eq!(adam_courses[0].id, Some(course_id));
}

#[test]
fn duplicate_enrollment_pairs_are_kept() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteCatalogRepository::with_clock(&mut conn, FixedClock::at(1_000)).unwrap();

    let mut student = CatalogStudent::new("Edwart", None, "EmailDDDDD", Guardian::default());
    repo.save_student(&mut student).unwrap();

    let mut course = Course::new("kurs2", 2000);
    course.add_student(student.clone());
    course.add_student(student.clone());
    let course_id = repo.save_course(&mut course).unwrap();

    let pairs: i64 = repo
        .connection()
        .query_row(
            "SELECT COUNT(*) FROM student_course_map WHERE course_id = ?1;",
            [course_id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(pairs, 2);
    assert_eq!(repo.get_course(course_id).unwrap().students.len(), 2);
    assert_eq!(repo.courses_for_student(student.id.unwrap()).unwrap().len(), 1);
}

#[test]
fn unsaved_duplicates_in_one_enrollment_share_a_row() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteCatalogRepository::with_clock(&mut conn, FixedClock::at(1_000)).unwrap();

    let student = CatalogStudent::new("Edwart", None, "EmailDDDDD", Guardian::default());
    let mut course = Course::new("kurs2", 2000);
    course.add_student(student.clone());
    course.add_student(student);
    repo.save_course_with_students(&mut course).unwrap();

    assert_eq!(course.students[0].id, course.students[1].id);
    assert_eq!(store::count::<CatalogStudent>(repo.connection()).unwrap(), 1);
}

#[test]
fn resaving_course_replaces_its_enrollments() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteCatalogRepository::with_clock(&mut conn, FixedClock::at(1_000)).unwrap();

    let mut adam = CatalogStudent::new("AdamGrant", None, "Email", Guardian::default());
    let mut edwart = CatalogStudent::new("Edwart", None, "EmailDDDDD", Guardian::default());
    repo.save_student(&mut adam).unwrap();
    repo.save_student(&mut edwart).unwrap();

    let mut course = Course::new("kurs1", 1000);
    course.add_student(adam.clone());
    let course_id = repo.save_course(&mut course).unwrap();

    course.students = vec![edwart.clone()];
    repo.save_course(&mut course).unwrap();

    let stored = repo.get_course(course_id).unwrap();
    assert_eq!(stored.students, vec![edwart]);
    assert!(repo.courses_for_student(adam.id.unwrap()).unwrap().is_empty());
}
