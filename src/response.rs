//! Response envelopes.
//!
//! [`RawResponse`] is what a [`Transport`](crate::transport::Transport) hands back.
//! [`Response`] adds the decoded value and the number of attempts it took, and is
//! what controllers and callers see.

use crate::{Error, Result};
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

/// The untyped result of one transport exchange.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// The HTTP status code.
    pub status: StatusCode,

    /// The status reason phrase, empty when the server sent none.
    pub message: String,

    /// The response headers.
    pub headers: HeaderMap,

    /// The response body as text.
    pub text: String,
}

impl RawResponse {
    /// Creates a raw response with no headers and the canonical reason phrase.
    pub fn new(status: StatusCode, text: impl Into<String>) -> Self {
        Self {
            status,
            message: status.canonical_reason().unwrap_or_default().to_string(),
            headers: HeaderMap::new(),
            text: text.into(),
        }
    }
}

/// Types a response body can be turned into.
///
/// [`RawResponse`] decodes to itself, which makes `Request<RawResponse>` the
/// untyped request. Every other `DeserializeOwned` type is decoded from JSON.
pub trait ResponseBody: Sized + Send + 'static {
    /// Decodes the payload out of a raw exchange.
    fn decode(raw: &RawResponse) -> Result<Self>;
}

impl ResponseBody for RawResponse {
    fn decode(raw: &RawResponse) -> Result<Self> {
        Ok(raw.clone())
    }
}

impl<T> ResponseBody for T
where
    T: DeserializeOwned + Send + 'static,
{
    fn decode(raw: &RawResponse) -> Result<Self> {
        serde_json::from_str(&raw.text).map_err(|e| {
            tracing::error!(
                error = %e,
                raw_response = %raw.text,
                "Failed to decode response"
            );
            Error::DecodeFailed {
                raw_response: raw.text.clone(),
                serde_error: e.to_string(),
                status: raw.status,
            }
        })
    }
}

/// A successful response together with its decoded value.
///
/// # Examples
///
/// ```no_run
/// use restpipe::{Request, Response};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct User {
///     id: u64,
///     name: String,
/// }
///
/// # async fn example() -> Result<(), restpipe::Error> {
/// let mut request: Request<User> = Request::get("https://api.example.com/users/1")?;
/// let response: Response<User> = request.send().await?;
///
/// println!("User: {}", response.value.name);
/// println!("Status: {} {}", response.status, response.message);
/// println!("Attempts: {}", response.attempts);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The decoded response value.
    pub value: T,

    /// The raw response body.
    pub raw_text: String,

    /// The HTTP status code.
    pub status: StatusCode,

    /// The status reason phrase.
    pub message: String,

    /// The response headers.
    pub headers: HeaderMap,

    /// Number of attempts it took, `1` when the first attempt succeeded.
    pub attempts: usize,
}

impl<T> Response<T> {
    /// Creates a new `Response`.
    pub fn new(
        value: T,
        raw_text: String,
        status: StatusCode,
        message: String,
        headers: HeaderMap,
        attempts: usize,
    ) -> Self {
        Self {
            value,
            raw_text,
            status,
            message,
            headers,
            attempts,
        }
    }

    pub(crate) fn from_raw(value: T, raw: RawResponse, attempts: usize) -> Self {
        Self::new(value, raw.text, raw.status, raw.message, raw.headers, attempts)
    }

    /// Maps the value to a different type, preserving the metadata.
    ///
    /// # Examples
    ///
    /// ```
    /// # use restpipe::Response;
    /// # use http::{HeaderMap, StatusCode};
    /// let response = Response::new(
    ///     42,
    ///     "42".to_string(),
    ///     StatusCode::OK,
    ///     "OK".to_string(),
    ///     HeaderMap::new(),
    ///     1,
    /// );
    ///
    /// let string_response = response.map(|n| n.to_string());
    /// assert_eq!(string_response.value, "42");
    /// ```
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            value: f(self.value),
            raw_text: self.raw_text,
            status: self.status,
            message: self.message,
            headers: self.headers,
            attempts: self.attempts,
        }
    }

    /// Returns `true` if the request was replayed at least once.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }

    /// Returns a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

impl<T> AsRef<T> for Response<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

impl<T> std::ops::Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: i64,
    }

    #[test]
    fn decodes_json_body() {
        let raw = RawResponse::new(StatusCode::OK, r#"{"id":1}"#);
        let item = Item::decode(&raw).unwrap();
        assert_eq!(item, Item { id: 1 });
    }

    #[test]
    fn malformed_body_is_decode_failure() {
        let raw = RawResponse::new(StatusCode::CREATED, "not json");
        match Item::decode(&raw) {
            Err(Error::DecodeFailed {
                raw_response,
                status,
                ..
            }) => {
                assert_eq!(raw_response, "not json");
                assert_eq!(status, StatusCode::CREATED);
            }
            other => panic!("Expected DecodeFailed, got {:?}", other),
        }
    }

    #[test]
    fn raw_response_decodes_to_itself() {
        let raw = RawResponse::new(StatusCode::ACCEPTED, "plain text");
        let decoded = RawResponse::decode(&raw).unwrap();
        assert_eq!(decoded.text, "plain text");
        assert_eq!(decoded.message, "Accepted");
    }

    #[test]
    fn header_lookup() {
        let mut raw = RawResponse::new(StatusCode::OK, "{}");
        raw.headers
            .insert("x-trace", http::HeaderValue::from_static("abc"));
        let response = Response::from_raw((), raw, 2);
        assert_eq!(response.header("x-trace"), Some("abc"));
        assert!(response.was_retried());
    }
}
