//! The REST/JSON implementation of [ExpenseService] and the log-in request.

use std::fmt;

use hyper::{
    Method, Request, StatusCode,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    Error, ExpenseService,
    config::ClientConfig,
    expense::{ExpenseId, ExpenseRecord, NewExpense},
    page::{PageQuery, PageResult},
    session::{Session, SessionContext, UserProfile},
    transport::Transport,
};

const JSON: &str = "application/json";

/// An email and password to log in with.
#[derive(Clone, Serialize)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    /// Create credentials for the account registered to `email`.
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.trim().to_owned(),
            password: password.to_owned(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"********")
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogInResponse {
    access_token: String,
    #[serde(default)]
    user: UserProfile,
}

/// Talks to the expense backend over HTTP.
///
/// Every request carries the bearer token of the injected [SessionContext],
/// if a session is active. A 401 response ends the session and publishes
/// [crate::session::SessionEvent::Expired].
#[derive(Debug)]
pub struct RestExpenseService<T> {
    config: ClientConfig,
    transport: T,
    session: SessionContext,
}

impl<T: Transport> RestExpenseService<T> {
    /// Create a service that sends requests through `transport`.
    pub fn new(config: ClientConfig, transport: T, session: SessionContext) -> Self {
        Self {
            config,
            transport,
            session,
        }
    }

    /// The session whose token is attached to requests.
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Log in and establish the session.
    ///
    /// # Errors
    /// Returns [Error::InvalidCredentials] if the server rejects the email or
    /// password.
    pub async fn log_in(&self, credentials: &Credentials) -> Result<UserProfile, Error> {
        let body = serde_json::to_string(credentials)
            .map_err(|error| Error::InvalidRequest(error.to_string()))?;
        let request = self.build_request(Method::POST, "/users/login", Some(body))?;

        let response = self.transport.send(request).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!("Log in rejected for {}", credentials.email);
            return Err(Error::InvalidCredentials);
        }

        let body = Self::check_status(response.status(), response.into_body())?;
        let log_in_response: LogInResponse = serde_json::from_str(&body)?;

        self.session.establish(Session::new(
            &log_in_response.access_token,
            log_in_response.user.clone(),
        ));
        tracing::info!("Logged in as {}", credentials.email);

        Ok(log_in_response.user)
    }

    /// End the session. Later requests are sent without a token.
    pub fn log_out(&self) {
        self.session.end();
    }

    fn build_request(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<Request<String>, Error> {
        let mut builder = Request::builder()
            .method(method)
            .uri(self.config.url(path))
            .header(ACCEPT, JSON);

        if let Some(token) = self.session.access_token() {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        if body.is_some() {
            builder = builder.header(CONTENT_TYPE, JSON);
        }

        builder
            .body(body.unwrap_or_default())
            .map_err(|error| Error::InvalidRequest(error.to_string()))
    }

    /// Send `request` and return the body of a successful response.
    async fn send(&self, request: Request<String>) -> Result<String, Error> {
        let token = bearer_token(&request);
        let response = self.transport.send(request).await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            match token {
                Some(token) => {
                    tracing::warn!("The server rejected the session token, ending the session");
                    self.session.expire(&token);
                }
                None => tracing::warn!("The server rejected a request sent without a token"),
            }
            return Err(Error::SessionExpired);
        }

        Self::check_status(status, response.into_body())
    }

    async fn send_json<R: DeserializeOwned>(&self, request: Request<String>) -> Result<R, Error> {
        let body = self.send(request).await?;

        Ok(serde_json::from_str(&body)?)
    }

    fn check_status(status: StatusCode, body: String) -> Result<String, Error> {
        if status.is_success() {
            return Ok(body);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound);
        }

        let message = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or_default().to_owned()
        } else {
            body
        };

        Err(Error::Server {
            status: status.as_u16(),
            message,
        })
    }
}

/// The token a request was sent with, if any.
fn bearer_token(request: &Request<String>) -> Option<String> {
    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_owned)
}

fn to_json_body(expense: &NewExpense) -> Result<String, Error> {
    serde_json::to_string(expense).map_err(|error| Error::InvalidRequest(error.to_string()))
}

impl<T: Transport> ExpenseService for RestExpenseService<T> {
    async fn get_paginated(&self, query: &PageQuery) -> Result<PageResult, Error> {
        let path = format!("/expenses?{}", query.to_query_string()?);
        let request = self.build_request(Method::GET, &path, None)?;

        let page: PageResult = self.send_json(request).await?;
        page.validate(query.page_size)?;

        Ok(page)
    }

    async fn delete_by_id(&self, id: ExpenseId) -> Result<(), Error> {
        let request = self.build_request(Method::DELETE, &format!("/expenses/{id}"), None)?;
        self.send(request).await?;

        Ok(())
    }

    async fn create(&self, expense: &NewExpense) -> Result<ExpenseRecord, Error> {
        let request = self.build_request(Method::POST, "/expenses", Some(to_json_body(expense)?))?;

        self.send_json(request).await
    }

    async fn update(&self, id: ExpenseId, expense: &NewExpense) -> Result<ExpenseRecord, Error> {
        let request = self.build_request(
            Method::PUT,
            &format!("/expenses/{id}"),
            Some(to_json_body(expense)?),
        )?;

        self.send_json(request).await
    }
}
