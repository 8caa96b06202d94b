use campus_core::db::open_db_in_memory;
use campus_core::{
    Address, Country, FixedClock, InstantRange, Person, Professor, RosterRepository, RosterService,
    SqliteRosterRepository, Student,
};

fn new_person(last_name: &str) -> Person {
    Person::new(
        Address::new(Country::new("Poland"), "Kraków", "Karmelicka 2"),
        last_name,
    )
}

#[test]
fn insert_stamps_both_timestamps_with_clock_time() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRosterRepository::with_clock(&mut conn, FixedClock::at(1_000)).unwrap();

    let mut person = new_person("Kowalski");
    let id = repo.save_person(&mut person).unwrap();

    assert_eq!(person.audit.creation_timestamp, Some(1_000));
    assert_eq!(person.audit.modification_timestamp, Some(1_000));
    assert_eq!(repo.get_person(id).unwrap().audit, person.audit);
}

#[test]
fn update_moves_modification_and_keeps_creation() {
    let clock = FixedClock::at(1_000);
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRosterRepository::with_clock(&mut conn, clock.clone()).unwrap();

    let mut person = new_person("Kowalski");
    let id = repo.save_person(&mut person).unwrap();

    clock.advance(2_500);
    person.last_name = "Nowak".to_string();
    person.audit.creation_timestamp = Some(1);
    repo.save_person(&mut person).unwrap();

    let stored = repo.get_person(id).unwrap();
    assert_eq!(stored.last_name, "Nowak");
    assert_eq!(stored.audit.creation_timestamp, Some(1_000));
    assert_eq!(stored.audit.modification_timestamp, Some(3_500));
    assert_eq!(person.audit, stored.audit);
}

#[test]
fn modification_never_precedes_creation() {
    let clock = FixedClock::at(10_000);
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRosterRepository::with_clock(&mut conn, clock.clone()).unwrap();

    let mut person = new_person("Kowalski");
    let id = repo.save_person(&mut person).unwrap();

    clock.set(500);
    repo.save_person(&mut person).unwrap();

    let stored = repo.get_person(id).unwrap().audit;
    assert!(stored.modification_timestamp >= stored.creation_timestamp);
    assert_eq!(stored.creation_timestamp, Some(10_000));
}

#[test]
fn attaching_a_role_leaves_an_unchanged_person_untouched() {
    let clock = FixedClock::at(1_000);
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRosterRepository::with_clock(&mut conn, clock.clone()).unwrap();

    let mut person = new_person("Kowalski");
    let id = repo.save_person(&mut person).unwrap();

    clock.set(10_000);
    let mut professor = Professor::new(repo.get_person(id).unwrap(), 121212);
    repo.save_professor(&mut professor).unwrap();
    assert_eq!(professor.person.audit.modification_timestamp, Some(1_000));

    let stored = repo.get_person(id).unwrap();
    assert_eq!(stored.audit.modification_timestamp, Some(1_000));
    let range = InstantRange::new(0, 2_000).unwrap();
    assert_eq!(repo.persons_modified_between(&range).unwrap().len(), 1);
}

#[test]
fn attaching_a_role_to_a_changed_person_touches_it_once() {
    let clock = FixedClock::at(1_000);
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRosterRepository::with_clock(&mut conn, clock.clone()).unwrap();

    let mut person = new_person("Kowalski");
    let id = repo.save_person(&mut person).unwrap();

    clock.set(10_000);
    person.last_name = "Nowak".to_string();
    let mut student = Student::new(person, 234223);
    repo.save_student(&mut student).unwrap();

    let stored = repo.get_person(id).unwrap();
    assert_eq!(stored.last_name, "Nowak");
    assert_eq!(stored.audit.creation_timestamp, Some(1_000));
    assert_eq!(stored.audit.modification_timestamp, Some(10_000));
}

#[test]
fn resaving_an_unchanged_person_restores_the_stored_stamp() {
    let clock = FixedClock::at(1_000);
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRosterRepository::with_clock(&mut conn, clock.clone()).unwrap();

    let mut person = new_person("Kowalski");
    let id = repo.save_person(&mut person).unwrap();

    clock.set(5_000);
    person.audit.modification_timestamp = Some(42);
    repo.save_person(&mut person).unwrap();

    assert_eq!(person.audit.modification_timestamp, Some(1_000));
    assert_eq!(repo.get_person(id).unwrap().audit, person.audit);
}

#[test]
fn cascading_save_of_student_stamps_its_person() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteRosterRepository::with_clock(&mut conn, FixedClock::at(7_000)).unwrap();
    let mut roster = RosterService::new(repo);

    let student = roster.register_student(new_person("Smesny"), 333333).unwrap();
    assert_eq!(student.person.audit.creation_timestamp, Some(7_000));
}

#[test]
fn bulk_update_bypasses_audit() {
    let clock = FixedClock::at(1_000);
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRosterRepository::with_clock(&mut conn, clock.clone()).unwrap();

    let mut person = new_person("Kowalski");
    let id = repo.save_person(&mut person).unwrap();

    clock.advance(60_000);
    let changed = repo.bulk_update_person_last_name(id, "Inny").unwrap();
    assert_eq!(changed, 1);

    let stored = repo.get_person(id).unwrap();
    assert_eq!(stored.last_name, "Inny");
    assert_eq!(stored.audit.modification_timestamp, Some(1_000));
}

#[test]
fn structured_rename_through_service_touches_modification() {
    let clock = FixedClock::at(1_000);
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteRosterRepository::with_clock(&mut conn, clock.clone()).unwrap();
    let mut roster = RosterService::new(repo);

    let student = roster.register_student(new_person("Kowalski"), 234223).unwrap();
    let person_id = student.person.id.unwrap();

    clock.advance(1_000);
    let renamed = roster.rename_person(person_id, "Nowak").unwrap();
    assert_eq!(renamed.audit.modification_timestamp, Some(2_000));

    clock.advance(1_000);
    assert_eq!(roster.bulk_rename_person(person_id, "Inny").unwrap(), 1);
    let stored = roster.repository().get_person(person_id).unwrap();
    assert_eq!(stored.last_name, "Inny");
    assert_eq!(stored.audit.modification_timestamp, Some(2_000));
}

#[test]
fn native_seed_persons_carry_database_timestamps() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteRosterRepository::try_new(&mut conn).unwrap();
    repo.init_countries().unwrap();
    repo.init_addresses().unwrap();
    assert_eq!(repo.init_persons().unwrap(), 6);

    for id in 1..=6 {
        let audit = repo.get_person(id).unwrap().audit;
        assert!(audit.creation_timestamp.is_some());
        assert_eq!(audit.creation_timestamp, audit.modification_timestamp);
    }
}

#[test]
fn audit_fields_serialize_flat_on_the_person() {
    let mut person = new_person("Kowalski");
    person.audit.touch_created(1_000);

    let json = serde_json::to_value(&person).unwrap();
    assert_eq!(json["creation_timestamp"], 1_000);
    assert_eq!(json["modification_timestamp"], 1_000);
    assert_eq!(json["address"]["country"]["name"], "Poland");
    assert!(json.get("audit").is_none());
}
