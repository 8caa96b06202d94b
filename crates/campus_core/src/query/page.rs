//! Page requests, multi-key sort specifications and page envelopes.
//!
//! # Invariants
//! - `total_pages == ceil(total_elements / size)`.
//! - A page index past the end yields empty content, not an error.
//! - Sort keys apply left to right; nulls sort last in either direction;
//!   the row id breaks any remaining tie so pages never overlap.

use crate::query::{QueryError, QueryResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A sortable column of some row type.
pub trait SortField: Copy {
    type Row;

    /// Column rendered into `ORDER BY`.
    fn column(self) -> &'static str;
    /// The row id column, appended as the final tie-breaker.
    fn id_column() -> &'static str;
    fn is_null(self, row: &Self::Row) -> bool;
    /// Ascending comparison of two non-null values.
    fn compare_values(self, left: &Self::Row, right: &Self::Row) -> Ordering;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order<F> {
    pub field: F,
    pub direction: Direction,
}

/// Ordered list of sort keys; the first key is primary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort<F> {
    orders: Vec<Order<F>>,
}

impl<F: SortField> Sort<F> {
    pub fn unsorted() -> Self {
        Self { orders: Vec::new() }
    }

    /// Single ascending key.
    pub fn by(field: F) -> Self {
        Self {
            orders: vec![Order {
                field,
                direction: Direction::Asc,
            }],
        }
    }

    /// Sets every key of this sort to ascending.
    pub fn ascending(self) -> Self {
        self.with_direction(Direction::Asc)
    }

    /// Sets every key of this sort to descending.
    pub fn descending(self) -> Self {
        self.with_direction(Direction::Desc)
    }

    /// Appends `other`'s keys as tie-breakers.
    pub fn and(mut self, other: Sort<F>) -> Self {
        self.orders.extend(other.orders);
        self
    }

    pub fn orders(&self) -> &[Order<F>] {
        &self.orders
    }

    pub fn is_unsorted(&self) -> bool {
        self.orders.is_empty()
    }

    /// Renders the `ORDER BY` body, id tie-breaker included.
    pub fn order_by_sql(&self) -> String {
        let mut parts = self
            .orders
            .iter()
            .map(|order| {
                format!(
                    "{} {} NULLS LAST",
                    order.field.column(),
                    order.direction.sql()
                )
            })
            .collect::<Vec<_>>();
        parts.push(format!("{} ASC", F::id_column()));
        parts.join(", ")
    }

    /// Lexicographic comparison over the sort keys, without the id tie-break.
    pub fn compare(&self, left: &F::Row, right: &F::Row) -> Ordering {
        for order in &self.orders {
            let field = order.field;
            let ordering = match (field.is_null(left), field.is_null(right)) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => match order.direction {
                    Direction::Asc => field.compare_values(left, right),
                    Direction::Desc => field.compare_values(left, right).reverse(),
                },
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Stable in-memory sort by these keys.
    pub fn sort_rows(&self, rows: &mut [F::Row]) {
        rows.sort_by(|left, right| self.compare(left, right));
    }

    fn with_direction(mut self, direction: Direction) -> Self {
        for order in &mut self.orders {
            order.direction = direction;
        }
        self
    }
}

impl<F: SortField> Default for Sort<F> {
    fn default() -> Self {
        Self::unsorted()
    }
}

/// Zero-based page index, page size and sort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest<F> {
    index: i64,
    size: i64,
    sort: Sort<F>,
}

impl<F: SortField> PageRequest<F> {
    /// Unsorted request; fails with `InvalidPage` on a negative index or a
    /// non-positive size.
    pub fn of(index: i64, size: i64) -> QueryResult<Self> {
        Self::sorted(index, size, Sort::unsorted())
    }

    pub fn sorted(index: i64, size: i64, sort: Sort<F>) -> QueryResult<Self> {
        if index < 0 || size <= 0 || index.checked_mul(size).is_none() {
            return Err(QueryError::InvalidPage { index, size });
        }
        Ok(Self { index, size, sort })
    }

    pub fn index(&self) -> i64 {
        self.index
    }

    pub fn size(&self) -> i64 {
        self.size
    }

    pub fn sort(&self) -> &Sort<F> {
        &self.sort
    }

    /// Rows to skip before this page.
    pub fn offset(&self) -> i64 {
        self.index * self.size
    }

    pub fn next(&self) -> QueryResult<Self> {
        let index = self.index.checked_add(1).ok_or(QueryError::InvalidPage {
            index: self.index,
            size: self.size,
        })?;
        Self::sorted(index, self.size, self.sort.clone())
    }
}

/// One page of results plus totals over the whole filtered set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u64,
    pub index: i64,
    pub size: i64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, total_elements: u64, index: i64, size: i64) -> Self {
        Self {
            content,
            total_elements,
            total_pages: total_pages(total_elements, size),
            index,
            size,
        }
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.total_pages as i64
    }

    pub fn has_next(&self) -> bool {
        !self.is_last()
    }
}

/// `ceil(total / size)`; zero rows means zero pages.
pub fn total_pages(total_elements: u64, size: i64) -> u64 {
    if size <= 0 {
        return 0;
    }
    let size = size as u64;
    total_elements.div_ceil(size)
}

#[cfg(test)]
mod tests {
    use super::{total_pages, Page, PageRequest, Sort, SortField};
    use crate::query::QueryError;
    use std::cmp::Ordering;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Key {
        Name,
        Rank,
    }

    type Row = (i64, Option<&'static str>, Option<i64>);

    impl SortField for Key {
        type Row = Row;

        fn column(self) -> &'static str {
            match self {
                Self::Name => "name",
                Self::Rank => "rank",
            }
        }

        fn id_column() -> &'static str {
            "id"
        }

        fn is_null(self, row: &Row) -> bool {
            match self {
                Self::Name => row.1.is_none(),
                Self::Rank => row.2.is_none(),
            }
        }

        fn compare_values(self, left: &Row, right: &Row) -> Ordering {
            match self {
                Self::Name => left.1.cmp(&right.1),
                Self::Rank => left.2.cmp(&right.2),
            }
        }
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 3), 0);
        assert_eq!(total_pages(5, 3), 2);
        assert_eq!(total_pages(6, 3), 2);
        assert_eq!(total_pages(7, 3), 3);
        assert_eq!(total_pages(5, 1), 5);
    }

    #[test]
    fn page_request_rejects_bad_index_and_size() {
        assert!(matches!(
            PageRequest::<Key>::of(-1, 3),
            Err(QueryError::InvalidPage { index: -1, size: 3 })
        ));
        assert!(matches!(
            PageRequest::<Key>::of(0, 0),
            Err(QueryError::InvalidPage { index: 0, size: 0 })
        ));
        assert!(PageRequest::<Key>::of(i64::MAX, 2).is_err());
        assert!(matches!(
            PageRequest::<Key>::of(i64::MAX, 1).unwrap().next(),
            Err(QueryError::InvalidPage {
                index: i64::MAX,
                size: 1
            })
        ));
        assert_eq!(PageRequest::<Key>::of(2, 3).unwrap().offset(), 6);
    }

    #[test]
    fn order_by_renders_keys_then_id() {
        let sort = Sort::by(Key::Name)
            .descending()
            .and(Sort::by(Key::Rank));
        assert_eq!(
            sort.order_by_sql(),
            "name DESC NULLS LAST, rank ASC NULLS LAST, id ASC"
        );
        assert_eq!(Sort::<Key>::unsorted().order_by_sql(), "id ASC");
    }

    #[test]
    fn compare_puts_nulls_last_in_both_directions() {
        let mut rows: Vec<Row> = vec![(1, None, Some(1)), (2, Some("b"), Some(2)), (3, Some("a"), None)];

        Sort::by(Key::Name).sort_rows(&mut rows);
        assert_eq!(rows.iter().map(|row| row.0).collect::<Vec<_>>(), vec![3, 2, 1]);

        Sort::by(Key::Name).descending().sort_rows(&mut rows);
        assert_eq!(rows.iter().map(|row| row.0).collect::<Vec<_>>(), vec![2, 3, 1]);
    }

    #[test]
    fn later_keys_break_ties() {
        let mut rows: Vec<Row> = vec![(1, Some("a"), Some(1)), (2, Some("a"), Some(9)), (3, Some("0"), Some(5))];
        let sort = Sort::by(Key::Name).and(Sort::by(Key::Rank).descending());
        sort.sort_rows(&mut rows);
        assert_eq!(rows.iter().map(|row| row.0).collect::<Vec<_>>(), vec![3, 2, 1]);

        let once = rows.clone();
        sort.sort_rows(&mut rows);
        assert_eq!(rows, once);
    }

    #[test]
    fn page_flags_follow_totals() {
        let first = Page::new(vec![1, 2, 3], 5, 0, 3);
        assert_eq!(first.total_pages, 2);
        assert!(first.has_next());

        let beyond = Page::<i32>::new(Vec::new(), 5, 4, 3);
        assert!(beyond.is_last());
        assert!(beyond.content.is_empty());
    }
}
