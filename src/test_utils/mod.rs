#![allow(missing_docs)]

pub(crate) mod expense_service;
pub(crate) mod transport;

pub(crate) use expense_service::{InMemoryExpenseService, expense};
pub(crate) use transport::ScriptedTransport;
