//! An in-memory stand-in for the expense backend.

use std::{collections::VecDeque, sync::Mutex};

use rust_decimal::Decimal;
use time::{Date, Duration, macros::date};

use crate::{
    Error, ExpenseService,
    expense::{Category, ExpenseId, ExpenseRecord, NewExpense},
    page::{PageQuery, PageResult},
};

/// The date of the expense with ID 1. Expense `n` is dated `n - 1` days later.
const FIRST_DATE: Date = date!(2024 - 01 - 01);

/// Build an expense with a distinct date for `id`.
pub(crate) fn expense(id: ExpenseId, category: Category) -> ExpenseRecord {
    ExpenseRecord::new(
        id,
        NewExpense::new_unchecked(
            &format!("expense #{id}"),
            Decimal::new(id * 100 + 1, 2),
            FIRST_DATE + Duration::days(id - 1),
            category,
        ),
    )
}

#[derive(Default)]
struct Backend {
    records: Vec<ExpenseRecord>,
    next_id: ExpenseId,
    queries: Vec<PageQuery>,
    deletes: Vec<ExpenseId>,
    load_failures: VecDeque<Error>,
    delete_failures: VecDeque<Error>,
}

/// Filters, sorts and pages expenses the way the real backend does.
#[derive(Default)]
pub(crate) struct InMemoryExpenseService {
    backend: Mutex<Backend>,
}

impl InMemoryExpenseService {
    /// A backend holding expenses 1 to `count`, all in the food category.
    pub(crate) fn with_records(count: i64) -> Self {
        Self::with_expenses((1..=count).map(|id| expense(id, Category::Food)).collect())
    }

    pub(crate) fn with_expenses(records: Vec<ExpenseRecord>) -> Self {
        let next_id = records.iter().map(ExpenseRecord::id).max().unwrap_or(0) + 1;

        Self {
            backend: Mutex::new(Backend {
                records,
                next_id,
                ..Backend::default()
            }),
        }
    }

    /// Every query received so far, oldest first.
    pub(crate) fn queries(&self) -> Vec<PageQuery> {
        self.backend.lock().unwrap().queries.clone()
    }

    /// The most recent query received.
    pub(crate) fn last_query(&self) -> Option<PageQuery> {
        self.backend.lock().unwrap().queries.last().copied()
    }

    /// Every delete request received so far, oldest first.
    pub(crate) fn deletes(&self) -> Vec<ExpenseId> {
        self.backend.lock().unwrap().deletes.clone()
    }

    /// Make the next page request fail with `error`.
    pub(crate) fn fail_next_load(&self, error: Error) {
        self.backend.lock().unwrap().load_failures.push_back(error);
    }

    /// Make the next delete request fail with `error`.
    pub(crate) fn fail_next_delete(&self, error: Error) {
        self.backend.lock().unwrap().delete_failures.push_back(error);
    }

    /// Delete a record behind the list's back, e.g. from another device.
    pub(crate) fn remove_directly(&self, id: ExpenseId) {
        self.backend
            .lock()
            .unwrap()
            .records
            .retain(|record| record.id() != id);
    }
}

impl ExpenseService for InMemoryExpenseService {
    async fn get_paginated(&self, query: &PageQuery) -> Result<PageResult, Error> {
        let mut backend = self.backend.lock().unwrap();
        backend.queries.push(*query);

        if let Some(error) = backend.load_failures.pop_front() {
            return Err(error);
        }

        let filter = query.filter;
        let mut matching: Vec<ExpenseRecord> = backend
            .records
            .iter()
            .filter(|record| filter.category().is_none_or(|c| record.category() == c))
            .filter(|record| filter.start_date().is_none_or(|start| record.date() >= start))
            .filter(|record| filter.end_date().is_none_or(|end| record.date() <= end))
            .cloned()
            .collect();

        matching.sort_by(|a, b| b.date().cmp(&a.date()).then(b.id().cmp(&a.id())));

        let total_elements = matching.len() as u64;
        let page_size = query.page_size.get() as usize;
        let content = matching
            .into_iter()
            .skip(query.page_index as usize * page_size)
            .take(page_size)
            .collect();

        Ok(PageResult::new(content, total_elements, query.page_size))
    }

    async fn delete_by_id(&self, id: ExpenseId) -> Result<(), Error> {
        let mut backend = self.backend.lock().unwrap();
        backend.deletes.push(id);

        if let Some(error) = backend.delete_failures.pop_front() {
            return Err(error);
        }

        let count_before = backend.records.len();
        backend.records.retain(|record| record.id() != id);

        if backend.records.len() == count_before {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    async fn create(&self, expense: &NewExpense) -> Result<ExpenseRecord, Error> {
        let mut backend = self.backend.lock().unwrap();
        let record = ExpenseRecord::new(backend.next_id, expense.clone());
        backend.next_id += 1;
        backend.records.push(record.clone());

        Ok(record)
    }

    async fn update(&self, id: ExpenseId, expense: &NewExpense) -> Result<ExpenseRecord, Error> {
        let mut backend = self.backend.lock().unwrap();
        let existing = backend
            .records
            .iter_mut()
            .find(|record| record.id() == id)
            .ok_or(Error::NotFound)?;
        *existing = ExpenseRecord::new(id, expense.clone());

        Ok(existing.clone())
    }
}
