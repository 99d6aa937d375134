//! A transport that replays canned responses and records what was sent.

use std::{collections::VecDeque, sync::Mutex};

use hyper::{
    Method, Request, Response, StatusCode,
    header::{AUTHORIZATION, CONTENT_TYPE},
};

use crate::{Error, transport::Transport};

/// The parts of a sent request that tests check.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedRequest {
    pub method: Method,
    pub uri: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Default)]
pub(crate) struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<Response<String>, Error>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a response with `status` and `body`.
    pub(crate) fn respond(self, status: u16, body: &str) -> Self {
        let response = Response::builder()
            .status(StatusCode::from_u16(status).unwrap())
            .body(body.to_owned())
            .unwrap();
        self.responses.lock().unwrap().push_back(Ok(response));
        self
    }

    /// Queue a failure to get any response.
    pub(crate) fn fail(self, error: Error) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn header_value(request: &Request<String>, name: hyper::header::HeaderName) -> Option<String> {
    request
        .headers()
        .get(name)
        .map(|value| value.to_str().unwrap().to_owned())
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: Request<String>) -> Result<Response<String>, Error> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method: request.method().clone(),
            uri: request.uri().to_string(),
            authorization: header_value(&request, AUTHORIZATION),
            content_type: header_value(&request, CONTENT_TYPE),
            body: request.body().clone(),
        });

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Network("no scripted response".to_owned())))
    }
}
