//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open a campus store, seed both schemas and print the roster reports
//!   plus the first course page.
//! - Accept one optional argument: a config file path.

use campus_core::{
    core_version, init_logging_from_config, open_with_config, CampusConfig, CatalogService, Clock,
    CourseField, ServiceError, Sort, SqliteCatalogRepository, SqliteRosterRepository,
    RosterService, SystemClock,
};
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

const REPORT_WINDOW_MS: i64 = 60 * 60 * 1000;
const REPORT_COUNTRY: &str = "England";

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("campus_cli error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = CampusConfig::load(config_path.as_deref())?;
    let file_logging = init_logging_from_config(&config)?;
    info!("event=cli_start module=cli status=ok file_logging={file_logging}");

    println!("campus_core version={}", core_version());
    let mut conn = open_with_config(&config)?;

    {
        let repo = SqliteRosterRepository::try_new(&mut conn)?;
        let roster = RosterService::new(repo);
        let seeded = roster.seed_roster()?;
        println!(
            "roster seeded: countries={} addresses={} persons={} students={} professors={}",
            seeded.countries, seeded.addresses, seeded.persons, seeded.students, seeded.professors
        );
        print_roster_reports(&roster)?;
    }

    let repo = SqliteCatalogRepository::try_new(&mut conn)?;
    let mut catalog = CatalogService::new(repo);
    catalog.seed_catalog()?;
    let page = catalog.list_courses(0, 3, Sort::by(CourseField::Title))?;
    println!(
        "courses page {} of {} (total {}):",
        page.index + 1,
        page.total_pages,
        page.total_elements
    );
    for course in &page.content {
        println!(
            "  {} credit={} students={}",
            course.title.as_deref().unwrap_or("-"),
            course
                .credit
                .map_or_else(|| "-".to_string(), |credit| credit.to_string()),
            course.students.len()
        );
    }
    Ok(())
}

fn print_roster_reports(
    roster: &RosterService<SqliteRosterRepository<'_>>,
) -> Result<(), ServiceError> {
    println!("role counts by country:");
    for row in roster.role_counts_by_country()? {
        println!(
            "  {} students={} professors={}",
            row.country_name, row.student_count, row.professor_count
        );
    }

    let now = SystemClock.now_ms();
    println!("persons modified in the last hour:");
    for person in roster.persons_modified_between(now - REPORT_WINDOW_MS, now + REPORT_WINDOW_MS)? {
        println!(
            "  {} student={:?} professor={:?} address={}",
            person.last_name, person.student_number, person.professor_number, person.address
        );
    }

    println!("persons in {REPORT_COUNTRY}:");
    for person in roster.persons_in_country(REPORT_COUNTRY)? {
        println!("  {} {}", person.last_name, person.role_label.as_str());
    }
    Ok(())
}
