//! Defines what page of expenses to ask the server for and what the server sends back.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    expense::{Category, ExpenseId, ExpenseRecord, date_format},
};

/// The field expenses are sorted by. The list always shows the newest expenses first.
pub const SORT_FIELD: &str = "date";

/// The direction expenses are sorted in.
pub const SORT_DIRECTION: &str = "desc";

/// The number of records on one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageSize(u64);

impl PageSize {
    /// The page size used when none has been chosen.
    pub const DEFAULT: PageSize = PageSize(10);

    /// Create a page size that is one of `allowed`.
    ///
    /// # Errors
    /// Returns [Error::InvalidPageSize] if `size` is zero or not in `allowed`.
    pub fn try_new(size: u64, allowed: &[u64]) -> Result<Self, Error> {
        if size == 0 || !allowed.contains(&size) {
            return Err(Error::InvalidPageSize(size));
        }

        Ok(Self(size))
    }

    /// The number of records on one page.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The number of pages needed to show `total_elements` records `page_size` at a time.
pub fn total_pages_for(total_elements: u64, page_size: PageSize) -> u64 {
    total_elements.div_ceil(page_size.get())
}

/// Constraints on which expenses are listed.
///
/// The date range is inclusive and never inverted: [ExpenseFilter::apply]
/// moves the other bound when a change would put the start after the end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpenseFilter {
    category: Option<Category>,
    start_date: Option<Date>,
    end_date: Option<Date>,
}

impl ExpenseFilter {
    /// Only list expenses in this category.
    pub fn category(&self) -> Option<Category> {
        self.category
    }

    /// Only list expenses on or after this date.
    pub fn start_date(&self) -> Option<Date> {
        self.start_date
    }

    /// Only list expenses on or before this date.
    pub fn end_date(&self) -> Option<Date> {
        self.end_date
    }

    /// Whether any constraint is set.
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.start_date.is_none() && self.end_date.is_none()
    }

    /// Apply a partial change.
    ///
    /// The start date is applied before the end date. A start date after the
    /// current end date raises the end date to match, and an end date before
    /// the current start date lowers the start date to match, so when both
    /// bounds in one change conflict the end date wins.
    pub fn apply(&mut self, change: FilterChange) {
        if let Some(category) = change.category {
            self.category = category;
        }

        if let Some(start_date) = change.start_date {
            self.start_date = start_date;

            if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
                if start > end {
                    self.end_date = Some(start);
                }
            }
        }

        if let Some(end_date) = change.end_date {
            self.end_date = end_date;

            if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
                if end < start {
                    self.start_date = Some(end);
                }
            }
        }
    }
}

/// A partial update to an [ExpenseFilter].
///
/// Fields that are not mentioned keep their current value. Setting a field to
/// `None` removes that constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterChange {
    category: Option<Option<Category>>,
    start_date: Option<Option<Date>>,
    end_date: Option<Option<Date>>,
}

impl FilterChange {
    /// A change that leaves everything as it is.
    pub fn new() -> Self {
        Self::default()
    }

    /// A change that removes every constraint.
    pub fn clear_all() -> Self {
        Self {
            category: Some(None),
            start_date: Some(None),
            end_date: Some(None),
        }
    }

    /// Set or clear the category.
    pub fn category(self, category: Option<Category>) -> Self {
        Self {
            category: Some(category),
            ..self
        }
    }

    /// Set or clear the start of the date range.
    pub fn start_date(self, start_date: Option<Date>) -> Self {
        Self {
            start_date: Some(start_date),
            ..self
        }
    }

    /// Set or clear the end of the date range.
    pub fn end_date(self, end_date: Option<Date>) -> Self {
        Self {
            end_date: Some(end_date),
            ..self
        }
    }
}

/// Which page of expenses to fetch and how to filter them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageQuery {
    /// The zero-based index of the page.
    pub page_index: u64,
    /// The maximum number of records on the page.
    pub page_size: PageSize,
    /// Constraints on which expenses are included.
    pub filter: ExpenseFilter,
}

/// The URL query parameters the backend expects.
///
/// Filters that are not set are left out instead of being sent empty, so the
/// backend treats them as unconstrained.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageQueryParams {
    page: u64,
    size: u64,
    sort_by: &'static str,
    sort_dir: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_date: Option<String>,
}

impl PageQuery {
    /// Encode the query as a URL query string, e.g.
    /// "page=0&size=10&sortBy=date&sortDir=desc&category=FOOD".
    ///
    /// # Errors
    /// Returns [Error::InvalidRequest] if the parameters could not be encoded.
    pub fn to_query_string(&self) -> Result<String, Error> {
        let params = PageQueryParams {
            page: self.page_index,
            size: self.page_size.get(),
            sort_by: SORT_FIELD,
            sort_dir: SORT_DIRECTION,
            category: self.filter.category.map(Category::as_query_value),
            start_date: self.filter.start_date.map(date_format::format),
            end_date: self.filter.end_date.map(date_format::format),
        };

        serde_urlencoded::to_string(params).map_err(|error| Error::InvalidRequest(error.to_string()))
    }
}

/// One page of expenses and the totals for the whole filtered set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    content: Vec<ExpenseRecord>,
    total_pages: u64,
    total_elements: u64,
}

impl PageResult {
    /// Create a page, deriving the page count from `total_elements` and `page_size`.
    pub fn new(content: Vec<ExpenseRecord>, total_elements: u64, page_size: PageSize) -> Self {
        Self {
            content,
            total_pages: total_pages_for(total_elements, page_size),
            total_elements,
        }
    }

    /// The records on this page, newest first.
    pub fn content(&self) -> &[ExpenseRecord] {
        &self.content
    }

    /// The number of pages in the filtered set.
    pub fn total_pages(&self) -> u64 {
        self.total_pages
    }

    /// The number of records in the filtered set.
    pub fn total_elements(&self) -> u64 {
        self.total_elements
    }

    /// Whether the page has any records on it.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Whether the record with `id` is on this page.
    pub fn contains(&self, id: ExpenseId) -> bool {
        self.content.iter().any(|record| record.id() == id)
    }

    /// Check the page against the paging invariants before it is displayed.
    ///
    /// # Errors
    /// Returns [Error::InvalidResponse] if the page holds more records than
    /// `page_size` or more than the reported total, or if the reported page
    /// count does not match the total split into pages of `page_size`.
    pub fn validate(&self, page_size: PageSize) -> Result<(), Error> {
        let len = self.content.len() as u64;

        if len > page_size.get() {
            return Err(Error::InvalidResponse(format!(
                "page has {len} records but the page size is {}",
                page_size.get()
            )));
        }

        if len > self.total_elements {
            return Err(Error::InvalidResponse(format!(
                "page has {len} records but the total is {}",
                self.total_elements
            )));
        }

        let want_pages = total_pages_for(self.total_elements, page_size);

        if self.total_pages != want_pages {
            return Err(Error::InvalidResponse(format!(
                "{} records make {want_pages} pages of {} but the page count is {}",
                self.total_elements,
                page_size.get(),
                self.total_pages
            )));
        }

        Ok(())
    }

    /// Remove the record with `id` and shrink the totals to match.
    ///
    /// Returns the removed record, or `None` (leaving the page untouched) if
    /// it is not on this page.
    pub(crate) fn remove(&mut self, id: ExpenseId, page_size: PageSize) -> Option<ExpenseRecord> {
        let position = self.content.iter().position(|record| record.id() == id)?;
        let removed = self.content.remove(position);

        self.total_elements = self.total_elements.saturating_sub(1);
        self.total_pages = total_pages_for(self.total_elements, page_size);

        Some(removed)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Error,
        expense::{Category, ExpenseRecord, NewExpense},
    };

    use super::{ExpenseFilter, FilterChange, PageQuery, PageResult, PageSize, total_pages_for};

    fn record(id: i64) -> ExpenseRecord {
        ExpenseRecord::new(
            id,
            NewExpense::new_unchecked("Lunch", dec!(10), date!(2024 - 01 - 10), Category::Food),
        )
    }

    #[test]
    fn page_count_rounds_up() {
        let size = PageSize::try_new(10, &[10, 25]).unwrap();

        assert_eq!(total_pages_for(0, size), 0);
        assert_eq!(total_pages_for(1, size), 1);
        assert_eq!(total_pages_for(10, size), 1);
        assert_eq!(total_pages_for(25, size), 3);
    }

    #[test]
    fn page_size_must_be_allowed() {
        assert_eq!(PageSize::try_new(25, &[10, 25]).map(PageSize::get), Ok(25));
        assert_eq!(PageSize::try_new(15, &[10, 25]), Err(Error::InvalidPageSize(15)));
        assert_eq!(PageSize::try_new(0, &[0]), Err(Error::InvalidPageSize(0)));
    }

    #[test]
    fn query_string_includes_set_filters() {
        let mut filter = ExpenseFilter::default();
        filter.apply(
            FilterChange::new()
                .category(Some(Category::Food))
                .start_date(Some(date!(2024 - 01 - 01)))
                .end_date(Some(date!(2024 - 01 - 31))),
        );
        let query = PageQuery {
            page_index: 0,
            page_size: PageSize::DEFAULT,
            filter,
        };

        let got = query.to_query_string().unwrap();

        assert_eq!(
            got,
            "page=0&size=10&sortBy=date&sortDir=desc&category=FOOD&startDate=2024-01-01&endDate=2024-01-31"
        );
    }

    #[test]
    fn query_string_omits_unset_filters() {
        let query = PageQuery::default();

        let got = query.to_query_string().unwrap();

        assert_eq!(got, "page=0&size=10&sortBy=date&sortDir=desc");
    }

    #[test]
    fn query_string_omits_cleared_filters() {
        let mut filter = ExpenseFilter::default();
        filter.apply(
            FilterChange::new()
                .category(Some(Category::PersonalCare))
                .end_date(Some(date!(2024 - 02 - 29))),
        );
        filter.apply(FilterChange::new().category(None));
        let query = PageQuery {
            page_index: 3,
            page_size: PageSize::try_new(25, &[10, 25]).unwrap(),
            filter,
        };

        let got = query.to_query_string().unwrap();

        assert_eq!(got, "page=3&size=25&sortBy=date&sortDir=desc&endDate=2024-02-29");
    }

    #[test]
    fn later_start_date_raises_end_date() {
        let mut filter = ExpenseFilter::default();
        filter.apply(FilterChange::new().end_date(Some(date!(2024 - 01 - 31))));

        filter.apply(FilterChange::new().start_date(Some(date!(2024 - 02 - 15))));

        assert_eq!(filter.start_date(), Some(date!(2024 - 02 - 15)));
        assert_eq!(filter.end_date(), Some(date!(2024 - 02 - 15)));
    }

    #[test]
    fn earlier_end_date_lowers_start_date() {
        let mut filter = ExpenseFilter::default();
        filter.apply(FilterChange::new().start_date(Some(date!(2024 - 03 - 01))));

        filter.apply(FilterChange::new().end_date(Some(date!(2024 - 02 - 01))));

        assert_eq!(filter.start_date(), Some(date!(2024 - 02 - 01)));
        assert_eq!(filter.end_date(), Some(date!(2024 - 02 - 01)));
    }

    #[test]
    fn conflicting_bounds_in_one_change_favour_end_date() {
        let mut filter = ExpenseFilter::default();

        filter.apply(
            FilterChange::new()
                .start_date(Some(date!(2024 - 05 - 01)))
                .end_date(Some(date!(2024 - 04 - 01))),
        );

        assert_eq!(filter.start_date(), Some(date!(2024 - 04 - 01)));
        assert_eq!(filter.end_date(), Some(date!(2024 - 04 - 01)));
    }

    #[test]
    fn range_is_never_inverted() {
        let dates = [
            None,
            Some(date!(2024 - 01 - 01)),
            Some(date!(2024 - 06 - 15)),
            Some(date!(2024 - 12 - 31)),
        ];

        for initial_start in dates {
            for initial_end in dates {
                for start in dates {
                    for end in dates {
                        let mut filter = ExpenseFilter::default();
                        filter.apply(
                            FilterChange::new()
                                .start_date(initial_start)
                                .end_date(initial_end),
                        );
                        filter.apply(FilterChange::new().start_date(start));
                        filter.apply(FilterChange::new().end_date(end));

                        if let (Some(start), Some(end)) = (filter.start_date(), filter.end_date()) {
                            assert!(start <= end, "inverted range {start} > {end}");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn deserialises_paged_response() {
        let json = r#"{
            "content": [{"id":1,"description":"Rent","amount":900.0,"date":"2024-01-01","category":"HOUSING"}],
            "currentPage": 0,
            "totalPages": 3,
            "totalElements": 21,
            "size": 10,
            "first": true,
            "last": false
        }"#;

        let got: PageResult = serde_json::from_str(json).unwrap();

        assert_eq!(got.content().len(), 1);
        assert_eq!(got.total_pages(), 3);
        assert_eq!(got.total_elements(), 21);
    }

    #[test]
    fn rejects_oversized_page() {
        let size = PageSize::try_new(10, &[10]).unwrap();
        let page = PageResult::new((1..=11).map(record).collect(), 11, size);

        assert!(matches!(page.validate(size), Err(Error::InvalidResponse(_))));
    }

    #[test]
    fn rejects_page_larger_than_total() {
        let size = PageSize::DEFAULT;
        let page = PageResult::new(vec![record(1), record(2)], 1, size);

        assert!(matches!(page.validate(size), Err(Error::InvalidResponse(_))));
    }

    #[test]
    fn rejects_page_count_that_disagrees_with_total() {
        let json = r#"{
            "content": [{"id":1,"description":"Rent","amount":900.0,"date":"2024-01-01","category":"HOUSING"}],
            "currentPage": 0,
            "totalPages": 5,
            "totalElements": 21,
            "size": 10,
            "first": true,
            "last": false
        }"#;
        let page: PageResult = serde_json::from_str(json).unwrap();

        assert!(matches!(
            page.validate(PageSize::DEFAULT),
            Err(Error::InvalidResponse(_))
        ));
    }

    #[test]
    fn accepts_consistent_page() {
        let size = PageSize::DEFAULT;
        let page = PageResult::new((1..=10).map(record).collect(), 21, size);

        assert_eq!(page.validate(size), Ok(()));
    }

    #[test]
    fn remove_shrinks_totals() {
        let size = PageSize::DEFAULT;
        let mut page = PageResult::new(vec![record(1)], 11, size);

        let removed = page.remove(1, size);

        assert_eq!(removed.map(|record| record.id()), Some(1));
        assert!(page.is_empty());
        assert_eq!(page.total_elements(), 10);
        assert_eq!(page.total_pages(), 1);
    }

    #[test]
    fn remove_missing_record_is_a_no_op() {
        let size = PageSize::DEFAULT;
        let mut page = PageResult::new(vec![record(1)], 1, size);
        let want = page.clone();

        let removed = page.remove(2, size);

        assert_eq!(removed, None);
        assert_eq!(page, want);
    }
}
