//! Sending HTTP requests to the backend.

use std::{sync::Arc, time::Duration};

use hyper::{Body, Client, Request, Response, client::HttpConnector};

use crate::Error;

/// Exchanges a request for a response.
///
/// Implementations only report failures to get a response at all, e.g. a
/// refused connection, as errors. Responses with error status codes are
/// returned as responses.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Send `request` and wait for the full response body.
    async fn send(&self, request: Request<String>) -> Result<Response<String>, Error>;
}

impl<T: Transport> Transport for Arc<T> {
    async fn send(&self, request: Request<String>) -> Result<Response<String>, Error> {
        self.as_ref().send(request).await
    }
}

/// A [Transport] that uses a hyper client over plain HTTP.
#[derive(Debug, Clone)]
pub struct HyperTransport {
    client: Client<HttpConnector>,
    timeout: Duration,
}

impl HyperTransport {
    /// Create a transport that gives up on requests after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }
}

impl Transport for HyperTransport {
    async fn send(&self, request: Request<String>) -> Result<Response<String>, Error> {
        let (parts, body) = request.into_parts();
        let request = Request::from_parts(parts, Body::from(body));

        let response = tokio::time::timeout(self.timeout, self.client.request(request))
            .await
            .map_err(|_| Error::Network(format!("no response after {:?}", self.timeout)))?
            .map_err(|error| Error::Network(error.to_string()))?;

        let (parts, body) = response.into_parts();
        let body_bytes = hyper::body::to_bytes(body)
            .await
            .map_err(|error| Error::Network(error.to_string()))?;

        Ok(Response::from_parts(
            parts,
            String::from_utf8_lossy(&body_bytes).into_owned(),
        ))
    }
}
