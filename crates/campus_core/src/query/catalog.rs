//! Paginated, sorted course listing and title search.
//!
//! # Invariants
//! - Totals are counted over the same filter as the page content.
//! - Title search is a case-sensitive substring match; courses without a
//!   title never match.

use crate::model::catalog::Course;
use crate::query::page::{Page, PageRequest, SortField};
use crate::query::{QueryError, QueryResult};
use crate::repo::store;
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Instant;

/// Sortable course columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseField {
    Id,
    Title,
    Credit,
}

impl SortField for CourseField {
    type Row = Course;

    fn column(self) -> &'static str {
        match self {
            Self::Id => "course_id",
            Self::Title => "title",
            Self::Credit => "credit",
        }
    }

    fn id_column() -> &'static str {
        "course_id"
    }

    fn is_null(self, row: &Course) -> bool {
        match self {
            Self::Id => row.id.is_none(),
            Self::Title => row.title.is_none(),
            Self::Credit => row.credit.is_none(),
        }
    }

    fn compare_values(self, left: &Course, right: &Course) -> Ordering {
        match self {
            Self::Id => left.id.cmp(&right.id),
            Self::Title => left.title.cmp(&right.title),
            Self::Credit => left.credit.cmp(&right.credit),
        }
    }
}

pub type CoursePageRequest = PageRequest<CourseField>;

/// One page of all courses.
pub fn list_courses(conn: &Connection, request: &CoursePageRequest) -> QueryResult<Page<Course>> {
    page_of_courses(conn, "list_courses", None, request)
}

/// One page of courses whose title contains `fragment`.
pub fn search_courses_by_title(
    conn: &Connection,
    fragment: &str,
    request: &CoursePageRequest,
) -> QueryResult<Page<Course>> {
    page_of_courses(conn, "search_courses_by_title", Some(fragment), request)
}

fn page_of_courses(
    conn: &Connection,
    name: &str,
    title_fragment: Option<&str>,
    request: &CoursePageRequest,
) -> QueryResult<Page<Course>> {
    let started_at = Instant::now();
    let (filter, filter_values) = match title_fragment {
        Some(fragment) => (
            " WHERE instr(title, ?) > 0",
            vec![Value::Text(fragment.to_string())],
        ),
        None => ("", Vec::new()),
    };

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM course{filter};"),
        params_from_iter(filter_values.iter()),
        |row| row.get(0),
    )?;
    let total = course_total(total)?;

    let sql = format!(
        "SELECT course_id FROM course{filter} ORDER BY {} LIMIT ? OFFSET ?;",
        request.sort().order_by_sql()
    );
    let mut bind_values = filter_values;
    bind_values.push(Value::Integer(request.size()));
    bind_values.push(Value::Integer(request.offset()));

    let mut stmt = conn.prepare(&sql)?;
    let ids = stmt
        .query_map(params_from_iter(bind_values), |row| row.get::<_, i64>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut content = Vec::with_capacity(ids.len());
    for id in ids {
        content.push(store::get::<Course>(conn, id)?);
    }

    debug!(
        "event=query module=query status=ok query={name} rows={} total={total} page={} size={} duration_ms={}",
        content.len(),
        request.index(),
        request.size(),
        started_at.elapsed().as_millis()
    );
    Ok(Page::new(content, total, request.index(), request.size()))
}

fn course_total(total: i64) -> QueryResult<u64> {
    u64::try_from(total).map_err(|_| QueryError::InvalidData(format!("negative course count {total}")))
}

#[cfg(test)]
mod tests {
    use super::course_total;
    use crate::query::QueryError;

    #[test]
    fn negative_course_count_is_invalid_data() {
        assert_eq!(course_total(5).unwrap(), 5);
        assert!(matches!(course_total(-1), Err(QueryError::InvalidData(_))));
    }
}
