//! Defines the expense service trait, the list's view of the backend.

use crate::{
    Error,
    expense::{ExpenseId, ExpenseRecord, NewExpense},
    page::{PageQuery, PageResult},
};

/// Handles the retrieval and modification of expenses on the server.
///
/// The server owns the expenses: it assigns IDs, orders records and counts
/// them. Implementers must not send filters that are not set in the query.
#[allow(async_fn_in_trait)]
pub trait ExpenseService {
    /// Retrieve one page of expenses, newest first, in the way defined by `query`.
    async fn get_paginated(&self, query: &PageQuery) -> Result<PageResult, Error>;

    /// Delete the expense with `id`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if the server has no such expense.
    async fn delete_by_id(&self, id: ExpenseId) -> Result<(), Error>;

    /// Create a new expense and return it with its server-assigned ID.
    async fn create(&self, expense: &NewExpense) -> Result<ExpenseRecord, Error>;

    /// Replace the fields of the expense with `id`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if the server has no such expense.
    async fn update(&self, id: ExpenseId, expense: &NewExpense) -> Result<ExpenseRecord, Error>;
}
