//! Pagination and date-window query shapes shared by list operations
//!
//! These are service-level types; the HTTP layer owns the wire DTOs and
//! converts into them.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// Default page size for all list queries
pub const DEFAULT_LIMIT: usize = 50;

/// Inclusive UTC day window used by list filters
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
    /// First day included in the window
    pub start_date: Option<NaiveDate>,
    /// Last day included in the window
    pub end_date: Option<NaiveDate>,
}

impl DateRange {
    /// Lower bound: 00:00:00.000 UTC on the start day
    pub fn lower_bound(&self) -> Option<DateTime<Utc>> {
        self.start_date
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| Utc.from_utc_datetime(&dt))
    }

    /// Upper bound: 23:59:59.999 UTC on the end day
    pub fn upper_bound(&self) -> Option<DateTime<Utc>> {
        self.end_date
            .and_then(|d| d.and_hms_milli_opt(23, 59, 59, 999))
            .map(|dt| Utc.from_utc_datetime(&dt))
    }

    /// Whether a timestamp falls inside the window
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        if let Some(start) = self.lower_bound() {
            if at < start {
                return false;
            }
        }
        if let Some(end) = self.upper_bound() {
            if at > end {
                return false;
            }
        }
        true
    }
}

/// Common list-query parameters: date window plus one-indexed page
#[derive(Debug, Clone, Copy, Default)]
pub struct PageQuery {
    pub range: DateRange,
    /// Page size, defaults to 50
    pub limit: Option<usize>,
    /// One-indexed page number, defaults to 1
    pub page: Option<usize>,
}

impl PageQuery {
    /// Effective page size (floor 1)
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).max(1)
    }

    /// Effective one-indexed page (floor 1)
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    /// Number of items to skip
    pub fn offset(&self) -> usize {
        (self.page() - 1) * self.limit()
    }
}

/// One page of results together with the total match count
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

impl<T> Page<T> {
    /// Build a page from an already-sorted full result set
    pub fn slice(all: Vec<T>, query: &PageQuery) -> Self {
        let total = all.len();
        let items = all
            .into_iter()
            .skip(query.offset())
            .take(query.limit())
            .collect();
        Self {
            items,
            total,
            page: query.page(),
            limit: query.limit(),
        }
    }

    /// Build a page from a pre-sliced item set and an external total count
    pub fn from_parts(items: Vec<T>, total: usize, query: &PageQuery) -> Self {
        Self {
            items,
            total,
            page: query.page(),
            limit: query.limit(),
        }
    }

    /// Total number of pages at this page size
    pub fn total_pages(&self) -> usize {
        if self.limit == 0 {
            0
        } else {
            (self.total + self.limit - 1) / self.limit
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults() {
        let q = PageQuery::default();
        assert_eq!(q.limit(), 50);
        assert_eq!(q.page(), 1);
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn slice_and_total_pages() {
        let q = PageQuery {
            limit: Some(10),
            page: Some(2),
            ..Default::default()
        };
        let page = Page::slice((0..25).collect::<Vec<_>>(), &q);
        assert_eq!(page.items, (10..20).collect::<Vec<_>>());
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages(), 3);
    }

    #[test]
    fn date_range_is_day_inclusive() {
        let range = DateRange {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 10),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 10),
        };
        let midday = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 1, 10, 23, 59, 59).unwrap();
        let next_day = Utc.with_ymd_and_hms(2024, 1, 11, 0, 0, 0).unwrap();
        assert!(range.contains(midday));
        assert!(range.contains(late));
        assert!(!range.contains(next_day));
    }
}
