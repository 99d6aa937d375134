//! Logging for requests sent to and responses received from the backend.

use hyper::{HeaderMap, Request, Response, header::AUTHORIZATION};

use crate::{Error, transport::Transport};

/// Bodies longer than this many bytes are truncated in `info` logs.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// A [Transport] that logs each request and response before passing it on.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is truncated
/// and the full body is logged at the `debug` level. Passwords and bearer
/// tokens are never logged.
#[derive(Debug, Clone)]
pub struct LoggingTransport<T> {
    inner: T,
}

impl<T> LoggingTransport<T> {
    /// Wrap `inner` so its traffic is logged.
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

impl<T: Transport> Transport for LoggingTransport<T> {
    async fn send(&self, request: Request<String>) -> Result<Response<String>, Error> {
        log_request(&request);

        let result = self.inner.send(request).await;

        match &result {
            Ok(response) => log_response(response),
            Err(error) => tracing::warn!("Request failed: {error}"),
        }

        result
    }
}

fn log_request(request: &Request<String>) {
    let body = redact_json_field(request.body(), "password");
    let headers = redact_headers(request.headers());

    log_body(
        &format!(
            "Sending request: {} {}\nheaders: {headers:?}",
            request.method(),
            request.uri()
        ),
        &body,
    );
}

fn log_response(response: &Response<String>) {
    let body = redact_json_field(response.body(), "accessToken");

    log_body(&format!("Received response: {}", response.status()), &body);
}

fn log_body(summary: &str, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!("{summary}\nbody: {}...", truncate(body, LOG_BODY_LENGTH_LIMIT));
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("{summary}\nbody: {body:?}");
    }
}

/// Cut `text` to at most `limit` bytes without splitting a character.
fn truncate(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }

    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    &text[..end]
}

fn redact_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if *name == AUTHORIZATION {
                "********".to_owned()
            } else {
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            };

            (name.to_string(), value)
        })
        .collect()
}

/// Replace the string value of `field_name` in a JSON body with asterisks.
fn redact_json_field(json_text: &str, field_name: &str) -> String {
    let key = format!("\"{field_name}\":");

    let value_start = match json_text.find(&key) {
        Some(key_pos) => key_pos + key.len(),
        None => return json_text.to_string(),
    };

    let quote_start = match json_text[value_start..].find('"') {
        Some(offset) => value_start + offset + 1,
        None => return json_text.to_string(),
    };

    let mut end = quote_start;
    let mut escaped = false;
    for (offset, character) in json_text[quote_start..].char_indices() {
        match character {
            '\\' if !escaped => escaped = true,
            '"' if !escaped => {
                end = quote_start + offset;
                break;
            }
            _ => escaped = false,
        }
    }

    if end == quote_start && !json_text[quote_start..].starts_with('"') {
        // No closing quote, the body is not valid JSON so hide everything after the key.
        return format!("{}\"********", &json_text[..quote_start - 1]);
    }

    format!(
        "{}********{}",
        &json_text[..quote_start],
        &json_text[end..]
    )
}

#[cfg(test)]
mod tests {
    use hyper::{HeaderMap, Method, Request, header::AUTHORIZATION};

    use crate::{Error, test_utils::ScriptedTransport, transport::Transport};

    use super::{LoggingTransport, redact_headers, redact_json_field, truncate};

    fn request() -> Request<String> {
        Request::builder()
            .method(Method::GET)
            .uri("http://localhost:8080/api/expenses")
            .body(String::new())
            .unwrap()
    }

    #[tokio::test]
    async fn passes_response_through() {
        let transport = LoggingTransport::new(ScriptedTransport::new().respond(204, ""));

        let got = transport.send(request()).await.unwrap();

        assert_eq!(got.status(), 204);
    }

    #[tokio::test]
    async fn passes_error_through() {
        let transport = LoggingTransport::new(
            ScriptedTransport::new().fail(Error::Network("timed out".to_owned())),
        );

        let got = transport.send(request()).await;

        assert_eq!(got.err(), Some(Error::Network("timed out".to_owned())));
    }

    #[test]
    fn redacts_password_field() {
        let body = r#"{"email":"a@b.c","password":"hunter2"}"#;

        let got = redact_json_field(body, "password");

        assert_eq!(got, r#"{"email":"a@b.c","password":"********"}"#);
    }

    #[test]
    fn redacts_password_containing_escaped_quote() {
        let body = r#"{"password":"hun\"ter2","email":"a@b.c"}"#;

        let got = redact_json_field(body, "password");

        assert_eq!(got, r#"{"password":"********","email":"a@b.c"}"#);
    }

    #[test]
    fn leaves_body_without_field_untouched() {
        let body = r#"{"description":"Lunch"}"#;

        let got = redact_json_field(body, "password");

        assert_eq!(got, body);
    }

    #[test]
    fn hides_unterminated_value() {
        let body = r#"{"password":"hunter2"#;

        let got = redact_json_field(body, "password");

        assert!(!got.contains("hunter2"), "got {got}");
    }

    #[test]
    fn redacts_authorization_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer secret".parse().unwrap());

        let got = redact_headers(&headers);

        assert_eq!(got, vec![("authorization".to_owned(), "********".to_owned())]);
    }

    #[test]
    fn truncate_respects_character_boundaries() {
        let text = "ab🍽️cd";

        let got = truncate(text, 3);

        assert_eq!(got, "ab");
    }
}
