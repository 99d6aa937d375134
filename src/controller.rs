//! Keeps the displayed page of expenses in step with the server and with the
//! user's paging and filter choices.
//!
//! Every change to what should be displayed issues a fetch. Fetches are split
//! into two phases so that the host can keep accepting input while a request
//! is in flight:
//!
//! 1. A `begin_*` method updates the query and returns a [PendingLoad], which
//!    owns everything it needs to make the request.
//! 2. [ListController::complete_load] applies the [LoadOutcome] of that
//!    request, unless a newer fetch has been issued in the meantime, in which
//!    case the outcome is discarded.
//!
//! The `async` methods such as [ListController::set_page] drive both phases
//! for callers that do not need the split.

use std::sync::Arc;

use crate::{
    Error,
    config::{DeleteStrategy, ListConfig},
    error::UserMessage,
    expense::{ExpenseId, ExpenseRecord},
    page::{ExpenseFilter, FilterChange, PageQuery, PageResult, PageSize},
    pagination::PageNavigation,
    service::ExpenseService,
};

/// Where the list is in its fetch cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadStatus {
    /// Nothing has been requested yet.
    #[default]
    Idle,
    /// A fetch has been issued and not completed.
    Loading,
    /// The latest fetch succeeded.
    Loaded,
    /// The latest fetch or delete failed.
    Errored,
}

/// A request for the host to open its expense editor.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorRequest {
    /// Open an empty editor to create an expense.
    Add,
    /// Open the editor on an existing expense.
    Edit(ExpenseRecord),
}

/// What the list displays.
#[derive(Debug, Clone, PartialEq)]
pub struct ListViewState {
    query: PageQuery,
    result: PageResult,
    status: LoadStatus,
    error: Option<Error>,
}

impl ListViewState {
    fn new(page_size: PageSize) -> Self {
        Self {
            query: PageQuery {
                page_size,
                ..PageQuery::default()
            },
            result: PageResult::default(),
            status: LoadStatus::Idle,
            error: None,
        }
    }

    /// The query for the page the user asked for.
    pub fn query(&self) -> &PageQuery {
        &self.query
    }

    /// The records on the displayed page, newest first.
    ///
    /// After a failed fetch this is the last page that was fetched successfully.
    pub fn content(&self) -> &[ExpenseRecord] {
        self.result.content()
    }

    /// The zero-based index of the requested page.
    pub fn page_index(&self) -> u64 {
        self.query.page_index
    }

    /// The maximum number of records per page.
    pub fn page_size(&self) -> PageSize {
        self.query.page_size
    }

    /// The filters applied to the list.
    pub fn filter(&self) -> &ExpenseFilter {
        &self.query.filter
    }

    /// The number of pages the server reported for the filtered set.
    pub fn total_pages(&self) -> u64 {
        self.result.total_pages()
    }

    /// The number of records the server reported for the filtered set.
    pub fn total_elements(&self) -> u64 {
        self.result.total_elements()
    }

    /// Where the list is in its fetch cycle.
    pub fn status(&self) -> LoadStatus {
        self.status
    }

    /// Whether a fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    /// The most recent failure since the last fetch was issued.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// A message describing [ListViewState::error] that is safe to show to the user.
    pub fn error_message(&self) -> Option<UserMessage> {
        self.error.as_ref().map(Error::user_message)
    }
}

/// A page request that has been issued but not yet applied.
///
/// Run it with [PendingLoad::run] and hand the outcome to
/// [ListController::complete_load].
#[must_use = "a pending load does nothing unless it is run and completed"]
#[derive(Debug)]
pub struct PendingLoad<S> {
    service: Arc<S>,
    query: PageQuery,
    generation: u64,
}

impl<S: ExpenseService> PendingLoad<S> {
    /// The query that will be sent.
    pub fn query(&self) -> &PageQuery {
        &self.query
    }

    /// Send the request and wait for the server's response.
    pub async fn run(self) -> LoadOutcome {
        let result = self.service.get_paginated(&self.query).await;

        LoadOutcome {
            query: self.query,
            generation: self.generation,
            result,
        }
    }
}

/// The server's answer to a [PendingLoad].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
    query: PageQuery,
    generation: u64,
    result: Result<PageResult, Error>,
}

/// A delete request that has been issued but not yet applied.
#[must_use = "a pending delete does nothing unless it is run and completed"]
#[derive(Debug)]
pub struct PendingDelete<S> {
    service: Arc<S>,
    id: ExpenseId,
}

impl<S: ExpenseService> PendingDelete<S> {
    /// The ID of the expense to delete.
    pub fn id(&self) -> ExpenseId {
        self.id
    }

    /// Send the request and wait for the server's response.
    pub async fn run(self) -> DeleteOutcome {
        let result = self.service.delete_by_id(self.id).await;

        DeleteOutcome {
            id: self.id,
            result,
        }
    }
}

/// The server's answer to a [PendingDelete].
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteOutcome {
    id: ExpenseId,
    result: Result<(), Error>,
}

type EditorCallback = Box<dyn FnMut(EditorRequest)>;

/// Owns the paging and filter state of the expense list.
pub struct ListController<S> {
    service: Arc<S>,
    config: ListConfig,
    state: ListViewState,
    /// The tag of the most recently issued fetch.
    generation: u64,
    /// Whether the most recently issued fetch has yet to be completed.
    load_in_flight: bool,
    editor: Option<EditorCallback>,
}

impl<S: ExpenseService> ListController<S> {
    /// Create an idle controller. Nothing is fetched until [ListController::mount].
    ///
    /// # Errors
    /// Returns [Error::InvalidPageSize] if the configured default page size
    /// is not one of the configured page sizes.
    pub fn new(service: Arc<S>, config: ListConfig) -> Result<Self, Error> {
        let page_size = config.default_page_size()?;

        Ok(Self {
            service,
            state: ListViewState::new(page_size),
            config,
            generation: 0,
            load_in_flight: false,
            editor: None,
        })
    }

    /// What the list displays.
    pub fn state(&self) -> &ListViewState {
        &self.state
    }

    /// The page sizes the user may choose from.
    pub fn page_sizes(&self) -> &[u64] {
        &self.config.page_sizes
    }

    /// The pagination controls for the displayed page.
    pub fn navigation(&self) -> PageNavigation {
        PageNavigation::new(
            self.state.page_index(),
            self.state.total_pages(),
            self.state.total_elements(),
            self.config.max_page_links,
        )
    }

    /// Issue the first fetch.
    pub fn begin_mount(&mut self) -> PendingLoad<S> {
        tracing::debug!("Mounting expense list");
        self.begin_load()
    }

    /// Go to the page at `page_index`, clamped to the pages that exist.
    ///
    /// Until the first page has loaded the page count is unknown and every
    /// index is clamped to 0.
    pub fn begin_set_page(&mut self, page_index: i64) -> PendingLoad<S> {
        let last_index = self.state.total_pages().saturating_sub(1);
        let clamped = u64::try_from(page_index).unwrap_or(0).min(last_index);

        if i64::try_from(clamped) != Ok(page_index) {
            tracing::debug!("Clamped page index {page_index} to {clamped}");
        }

        self.state.query.page_index = clamped;
        self.begin_load()
    }

    /// Go to the next page, if there is one.
    pub fn begin_next_page(&mut self) -> PendingLoad<S> {
        let index = self.current_index_signed();
        self.begin_set_page(index.saturating_add(1))
    }

    /// Go to the previous page, if there is one.
    pub fn begin_previous_page(&mut self) -> PendingLoad<S> {
        let index = self.current_index_signed();
        self.begin_set_page(index.saturating_sub(1))
    }

    /// Show `page_size` records per page, starting again from the first page.
    ///
    /// # Errors
    /// Returns [Error::InvalidPageSize] and leaves the state untouched if
    /// `page_size` is not one of the configured page sizes.
    pub fn begin_set_page_size(&mut self, page_size: u64) -> Result<PendingLoad<S>, Error> {
        let page_size = self.config.page_size(page_size)?;

        self.state.query.page_size = page_size;
        self.state.query.page_index = 0;

        Ok(self.begin_load())
    }

    /// Change some or all of the filters, starting again from the first page.
    ///
    /// The date range is kept in order: see [ExpenseFilter::apply].
    pub fn begin_set_filter(&mut self, change: FilterChange) -> PendingLoad<S> {
        self.state.query.filter.apply(change);
        self.state.query.page_index = 0;

        tracing::debug!("Filter changed to {:?}", self.state.query.filter);

        self.begin_load()
    }

    /// Remove every filter, starting again from the first page.
    pub fn begin_clear_filter(&mut self) -> PendingLoad<S> {
        self.begin_set_filter(FilterChange::clear_all())
    }

    /// Fetch the current page again, e.g. after the user saved an expense.
    pub fn begin_refresh(&mut self) -> PendingLoad<S> {
        self.begin_load()
    }

    /// Issue a fetch for the current query.
    ///
    /// Any fetch issued before this one will be discarded when it completes.
    pub fn begin_load(&mut self) -> PendingLoad<S> {
        self.generation += 1;
        self.load_in_flight = true;
        self.state.status = LoadStatus::Loading;
        self.state.error = None;

        tracing::debug!(
            "Loading page {} (generation {})",
            self.state.query.page_index,
            self.generation
        );

        PendingLoad {
            service: Arc::clone(&self.service),
            query: self.state.query,
            generation: self.generation,
        }
    }

    /// Apply the outcome of a fetch.
    ///
    /// Returns a follow-up fetch if the page turned out to be past the end of
    /// the list, e.g. because the last page was emptied elsewhere. The
    /// follow-up asks for the last page that exists.
    pub fn complete_load(&mut self, outcome: LoadOutcome) -> Option<PendingLoad<S>> {
        if outcome.generation != self.generation {
            tracing::debug!(
                "Discarding stale page {} (generation {}, latest is {})",
                outcome.query.page_index,
                outcome.generation,
                self.generation
            );
            return None;
        }

        self.load_in_flight = false;

        let page = match outcome
            .result
            .and_then(|page| page.validate(outcome.query.page_size).map(|_| page))
        {
            Ok(page) => page,
            Err(error) => {
                tracing::warn!(
                    "Could not load page {}: {error}",
                    outcome.query.page_index
                );
                self.state.error = Some(error);
                self.state.status = LoadStatus::Errored;
                return None;
            }
        };

        let page_index = outcome.query.page_index;
        let is_past_the_end = page.is_empty() && page_index > 0 && page_index >= page.total_pages();
        self.state.result = page;

        if is_past_the_end {
            let last_index = self.state.total_pages().saturating_sub(1);
            tracing::info!("Page {page_index} no longer exists, going to page {last_index}");
            self.state.query.page_index = last_index;

            return Some(self.begin_load());
        }

        self.state.status = LoadStatus::Loaded;

        None
    }

    /// Ask the server to delete the expense with `id`.
    ///
    /// The list is not changed until the outcome is passed to
    /// [ListController::complete_delete].
    pub fn begin_delete(&mut self, id: ExpenseId) -> PendingDelete<S> {
        tracing::info!("Deleting expense {id}");

        PendingDelete {
            service: Arc::clone(&self.service),
            id,
        }
    }

    /// Apply the outcome of a delete using the configured [DeleteStrategy].
    ///
    /// Returns the fetch needed to catch up with the server, if any. A failed
    /// delete leaves the displayed page as it was and records the error. The
    /// status stays [LoadStatus::Loading] while a fetch is still in flight.
    pub fn complete_delete(&mut self, outcome: DeleteOutcome) -> Option<PendingLoad<S>> {
        if let Err(error) = outcome.result {
            tracing::warn!("Could not delete expense {}: {error}", outcome.id);
            self.state.error = Some(error);

            if !self.load_in_flight {
                self.state.status = LoadStatus::Errored;
            }

            return None;
        }

        match self.config.delete_strategy {
            DeleteStrategy::Refetch => Some(self.begin_load()),
            DeleteStrategy::LocalSplice => self.splice(outcome.id),
        }
    }

    /// Remove a deleted expense from the displayed page without asking the server.
    fn splice(&mut self, id: ExpenseId) -> Option<PendingLoad<S>> {
        let page_size = self.state.query.page_size;

        if self.state.result.remove(id, page_size).is_none() {
            tracing::debug!("Expense {id} is not on the displayed page, reloading instead");
            return Some(self.begin_load());
        }

        if self.state.result.is_empty() {
            if self.state.query.page_index > 0 {
                self.state.query.page_index -= 1;
                return Some(self.begin_load());
            }

            if self.state.total_elements() > 0 {
                return Some(self.begin_load());
            }
        }

        // A fetch issued before the delete may still hold the deleted expense.
        if self.load_in_flight {
            return Some(self.begin_load());
        }

        // After a failure the displayed page may not be the one that was asked for.
        if self.state.status == LoadStatus::Errored {
            tracing::debug!("Reloading after the earlier failure: {:?}", self.state.error);
            return Some(self.begin_load());
        }

        None
    }

    /// Register the callback that opens the host's expense editor.
    pub fn on_editor_request(&mut self, callback: impl FnMut(EditorRequest) + 'static) {
        self.editor = Some(Box::new(callback));
    }

    /// Open the editor to create a new expense.
    pub fn request_add(&mut self) {
        self.open_editor(EditorRequest::Add);
    }

    /// Open the editor on the displayed expense with `id`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if the expense is not on the displayed page.
    pub fn request_edit(&mut self, id: ExpenseId) -> Result<(), Error> {
        let record = self
            .state
            .content()
            .iter()
            .find(|record| record.id() == id)
            .cloned()
            .ok_or(Error::NotFound)?;

        self.open_editor(EditorRequest::Edit(record));

        Ok(())
    }

    fn open_editor(&mut self, request: EditorRequest) {
        match self.editor.as_mut() {
            Some(callback) => callback(request),
            None => tracing::debug!("No editor registered, ignoring {request:?}"),
        }
    }

    fn current_index_signed(&self) -> i64 {
        i64::try_from(self.state.query.page_index).unwrap_or(i64::MAX)
    }

    /// Issue the first fetch and wait for it.
    pub async fn mount(&mut self) {
        let pending = self.begin_mount();
        self.drive(pending).await;
    }

    /// Go to the page at `page_index` and wait for it to load.
    pub async fn set_page(&mut self, page_index: i64) {
        let pending = self.begin_set_page(page_index);
        self.drive(pending).await;
    }

    /// Go to the next page and wait for it to load.
    pub async fn next_page(&mut self) {
        let pending = self.begin_next_page();
        self.drive(pending).await;
    }

    /// Go to the previous page and wait for it to load.
    pub async fn previous_page(&mut self) {
        let pending = self.begin_previous_page();
        self.drive(pending).await;
    }

    /// Change the page size and wait for the first page to load.
    ///
    /// # Errors
    /// Returns [Error::InvalidPageSize] if `page_size` is not allowed.
    pub async fn set_page_size(&mut self, page_size: u64) -> Result<(), Error> {
        let pending = self.begin_set_page_size(page_size)?;
        self.drive(pending).await;

        Ok(())
    }

    /// Change the filters and wait for the first page to load.
    pub async fn set_filter(&mut self, change: FilterChange) {
        let pending = self.begin_set_filter(change);
        self.drive(pending).await;
    }

    /// Remove every filter and wait for the first page to load.
    pub async fn clear_filter(&mut self) {
        let pending = self.begin_clear_filter();
        self.drive(pending).await;
    }

    /// Fetch the current query and wait for it.
    pub async fn load_page(&mut self) {
        let pending = self.begin_load();
        self.drive(pending).await;
    }

    /// Fetch the current page again and wait for it.
    pub async fn refresh(&mut self) {
        let pending = self.begin_refresh();
        self.drive(pending).await;
    }

    /// Delete the expense with `id` and wait for the list to catch up.
    ///
    /// Failures are recorded in [ListViewState::error].
    pub async fn delete_record(&mut self, id: ExpenseId) {
        let outcome = self.begin_delete(id).run().await;

        if let Some(pending) = self.complete_delete(outcome) {
            self.drive(pending).await;
        }
    }

    async fn drive(&mut self, mut pending: PendingLoad<S>) {
        loop {
            let outcome = pending.run().await;

            match self.complete_load(outcome) {
                Some(next) => pending = next,
                None => break,
            }
        }
    }
}
