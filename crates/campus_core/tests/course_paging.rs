use campus_core::db::open_db_in_memory;
use campus_core::repo::seed;
use campus_core::{
    CatalogRepository, CatalogService, Course, CourseField, FixedClock, PageRequest, QueryError,
    ServiceError, Sort, SqliteCatalogRepository,
};
use rusqlite::Connection;
use std::collections::HashSet;

fn seeded_courses(conn: &mut Connection) -> SqliteCatalogRepository<'_, FixedClock> {
    let mut repo = SqliteCatalogRepository::with_clock(conn, FixedClock::at(1_000)).unwrap();
    let ids = seed::init_courses(&mut repo).unwrap();
    assert_eq!(ids.len(), 5);
    repo
}

fn titles(courses: &[Course]) -> Vec<&str> {
    courses
        .iter()
        .map(|course| course.title.as_deref().unwrap_or("<null>"))
        .collect()
}

#[test]
fn first_page_of_five_courses() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = seeded_courses(&mut conn);

    let page = repo.list_courses(&PageRequest::of(0, 3).unwrap()).unwrap();
    assert_eq!(page.content.len(), 3);
    assert_eq!(page.total_elements, 5);
    assert_eq!(page.total_pages, 2);
    assert!(page.has_next());
}

#[test]
fn pages_concatenate_to_every_row_exactly_once() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = seeded_courses(&mut conn);

    for size in 1..=6 {
        let mut request = PageRequest::sorted(0, size, Sort::by(CourseField::Credit)).unwrap();
        let mut seen = Vec::new();
        loop {
            let page = repo.list_courses(&request).unwrap();
            assert_eq!(page.total_pages, 5_u64.div_ceil(size as u64));
            seen.extend(page.content.iter().filter_map(|course| course.id));
            if page.is_last() {
                break;
            }
            request = request.next().unwrap();
        }
        let unique: HashSet<i64> = seen.iter().copied().collect();
        assert_eq!(seen.len(), 5, "size {size}");
        assert_eq!(unique.len(), 5, "size {size}");
    }
}

#[test]
fn page_past_the_end_is_empty() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = seeded_courses(&mut conn);

    let page = repo.list_courses(&PageRequest::of(7, 3).unwrap()).unwrap();
    assert!(page.content.is_empty());
    assert_eq!(page.total_elements, 5);
    assert_eq!(page.total_pages, 2);
}

#[test]
fn loader_sort_examples() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = seeded_courses(&mut conn);

    let by_title = repo
        .list_courses(&PageRequest::sorted(0, 5, Sort::by(CourseField::Title)).unwrap())
        .unwrap();
    assert_eq!(
        titles(&by_title.content),
        vec!["3333333", "4444444", "5555555", "kurs1", "kurs2"]
    );

    let by_credit_desc = repo
        .list_courses(
            &PageRequest::sorted(0, 5, Sort::by(CourseField::Credit).descending()).unwrap(),
        )
        .unwrap();
    assert_eq!(
        titles(&by_credit_desc.content),
        vec!["kurs2", "kurs1", "4444444", "5555555", "3333333"]
    );

    let sort = Sort::by(CourseField::Title)
        .descending()
        .and(Sort::by(CourseField::Credit));
    let mixed = repo
        .list_courses(&PageRequest::sorted(0, 2, sort).unwrap())
        .unwrap();
    assert_eq!(titles(&mixed.content), vec!["kurs2", "kurs1"]);
}

#[test]
fn sorting_sorted_rows_again_changes_nothing() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = seeded_courses(&mut conn);

    let sort = Sort::by(CourseField::Title).and(Sort::by(CourseField::Credit).descending());
    let page = repo
        .list_courses(&PageRequest::sorted(0, 10, sort.clone()).unwrap())
        .unwrap();

    let mut resorted = page.content.clone();
    sort.sort_rows(&mut resorted);
    assert_eq!(resorted, page.content);
}

#[test]
fn null_titles_sort_last_in_both_directions() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = seeded_courses(&mut conn);
    let mut untitled = Course {
        credit: Some(3),
        ..Course::default()
    };
    repo.save_course(&mut untitled).unwrap();

    for sort in [
        Sort::by(CourseField::Title),
        Sort::by(CourseField::Title).descending(),
    ] {
        let page = repo
            .list_courses(&PageRequest::sorted(0, 10, sort).unwrap())
            .unwrap();
        assert_eq!(page.content.last().unwrap().id, untitled.id);
    }
}

#[test]
fn title_search_is_a_case_sensitive_substring_match() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = seeded_courses(&mut conn);
    let request = PageRequest::sorted(0, 1, Sort::by(CourseField::Title)).unwrap();

    let page = repo.search_courses_by_title("kurs", &request).unwrap();
    assert_eq!(page.total_elements, 2);
    assert_eq!(page.total_pages, 2);
    assert_eq!(titles(&page.content), vec!["kurs1"]);

    let second = repo
        .search_courses_by_title("kurs", &request.next().unwrap())
        .unwrap();
    assert_eq!(titles(&second.content), vec!["kurs2"]);

    let upper = repo.search_courses_by_title("KURS", &request).unwrap();
    assert_eq!(upper.total_elements, 0);
    assert_eq!(upper.total_pages, 0);
}

#[test]
fn service_rejects_invalid_page_requests() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = seeded_courses(&mut conn);
    let catalog = CatalogService::new(repo);

    let err = catalog.list_courses(0, 0, Sort::unsorted()).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Query(QueryError::InvalidPage { index: 0, size: 0 })
    ));
    let err = catalog.list_courses(-1, 3, Sort::unsorted()).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Query(QueryError::InvalidPage { index: -1, size: 3 })
    ));

    let page = catalog.search_courses("3333", 0, 5, Sort::unsorted()).unwrap();
    assert_eq!(titles(&page.content), vec!["3333333"]);
}
