//! Defines the crate level error type and its conversion to messages that can be shown to users.

use crate::expense::ValidationError;

/// The errors that may occur while talking to the expense backend.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request never produced a response, e.g. the server is unreachable
    /// or the request timed out.
    #[error("could not reach the server: {0}")]
    Network(String),

    /// The server responded with a non-success status code that is not
    /// covered by a more specific variant.
    #[error("the server responded with status {status}: {message}")]
    Server {
        /// The HTTP status code of the response.
        status: u16,
        /// The response body, or the canonical reason when the body is empty.
        message: String,
    },

    /// The requested expense does not exist on the server.
    ///
    /// Also used when the caller refers to an expense that is not part of the
    /// displayed page.
    #[error("the requested expense could not be found")]
    NotFound,

    /// The email and password did not match an account.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The server rejected the session token (HTTP 401).
    ///
    /// The session is cleared before this error is returned.
    #[error("the session has expired")]
    SessionExpired,

    /// The response body could not be decoded, or it broke the paging
    /// invariants (e.g. more records than the page size).
    #[error("the server sent an invalid response: {0}")]
    InvalidResponse(String),

    /// An expense failed client-side validation.
    #[error("invalid expense: {0}")]
    Validation(ValidationError),

    /// The page size is not one of the configured page sizes.
    #[error("{0} is not one of the allowed page sizes")]
    InvalidPageSize(u64),

    /// The request could not be assembled, e.g. the base URL is malformed.
    #[error("could not build the request: {0}")]
    InvalidRequest(String),
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::InvalidResponse(value.to_string())
    }
}

impl From<ValidationError> for Error {
    fn from(value: ValidationError) -> Self {
        Error::Validation(value)
    }
}

/// A short message and a longer explanation that are safe to show to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMessage {
    /// A heading for the error.
    pub message: String,
    /// What happened and what the user can do about it.
    pub details: String,
}

impl Error {
    /// Convert the error into a generic message for display.
    ///
    /// Transport and server details are logged rather than shown.
    pub fn user_message(&self) -> UserMessage {
        let (message, details) = match self {
            Error::Network(_) => (
                "Could not reach the server",
                "Check your connection and try again.".to_owned(),
            ),
            Error::NotFound => (
                "Expense not found",
                "The expense could not be found. \
                Try refreshing the list to see if it has already been deleted."
                    .to_owned(),
            ),
            Error::InvalidCredentials => (
                "Log in failed",
                "The email or password is incorrect.".to_owned(),
            ),
            Error::SessionExpired => (
                "Session expired",
                "Your session has expired. Log in again to continue.".to_owned(),
            ),
            Error::Validation(error) => ("Invalid expense", format!("{error}.")),
            Error::InvalidPageSize(size) => (
                "Invalid page size",
                format!("{size} records per page is not supported."),
            ),
            error => {
                tracing::error!("An unexpected error occurred: {error}");
                (
                    "Something went wrong",
                    "An unexpected error occurred. Try again later.".to_owned(),
                )
            }
        };

        UserMessage {
            message: message.to_owned(),
            details,
        }
    }
}
