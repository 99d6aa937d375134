//! A client for an expense tracking REST backend.
//!
//! The heart of the library is the [ListController], which keeps a page of
//! expenses in step with the server while the user pages through, filters and
//! deletes records. The server owns the records, their order and their
//! counts; the controller only ever displays what the server sent, or a
//! locally spliced copy of it after a delete.
//!
//! The controller talks to the backend through the [ExpenseService] trait.
//! [RestExpenseService] implements it over HTTP and JSON, attaching the token
//! of an injected [SessionContext] to every request.

#![warn(missing_docs)]

pub mod config;
pub mod controller;
mod error;
pub mod expense;
pub mod logging;
pub mod page;
pub mod pagination;
pub mod rest;
mod service;
pub mod session;
pub mod transport;

#[cfg(test)]
mod test_utils;

pub use config::{ClientConfig, DeleteStrategy, ListConfig};
pub use controller::{EditorRequest, ListController, ListViewState, LoadStatus};
pub use error::{Error, UserMessage};
pub use expense::{Category, ExpenseId, ExpenseRecord, NewExpense, ValidationError};
pub use logging::{LOG_BODY_LENGTH_LIMIT, LoggingTransport};
pub use page::{ExpenseFilter, FilterChange, PageQuery, PageResult, PageSize};
pub use rest::{Credentials, RestExpenseService};
pub use service::ExpenseService;
pub use session::{Session, SessionContext, SessionEvent, UserProfile};
pub use transport::{HyperTransport, Transport};
