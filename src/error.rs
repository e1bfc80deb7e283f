//! Error types for the request pipeline.
//!
//! Every failure a [`Request`](crate::Request) can surface is a variant of [`Error`].
//! Transport failures that escape the retry loop are folded into
//! [`Error::RequestFailed`], so callers only have to match on a handful of kinds.

use http::StatusCode;

/// Code carried by [`Error::RequestFailed`] when no better code is known.
pub const DEFAULT_FAILURE_CODE: u16 = 484;

/// The main error type for requests.
///
/// # Examples
///
/// ```no_run
/// use restpipe::{Error, Request};
///
/// # async fn example() -> Result<(), Error> {
/// let mut request: Request<serde_json::Value> = Request::get("https://api.example.com/items")?;
///
/// match request.send().await {
///     Ok(response) => println!("Success: {:?}", response.value),
///     Err(Error::DecodeFailed { raw_response, serde_error, .. }) => {
///         eprintln!("Could not decode {raw_response}: {serde_error}");
///     }
///     Err(Error::RequestFailed { code, message, .. }) => {
///         eprintln!("Request failed ({code}): {message}");
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The exchange produced no usable response.
    ///
    /// Raised when the transport answers with an empty body, when an error status is
    /// rejected, and for any unrecognized failure that is still unresolved once the
    /// retry budget is spent.
    #[error("Request failed with code {code}: {message}")]
    RequestFailed {
        /// Failure code, [`DEFAULT_FAILURE_CODE`] unless a status was available
        code: u16,
        /// Response body, empty when there was none
        response_text: String,
        /// Human readable description
        message: String,
    },

    /// The attempt exceeded its deadline.
    #[error("Request timed out")]
    Timeout,

    /// The request was cancelled by the caller.
    #[error("Request cancelled")]
    Cancelled,

    /// The response body could not be decoded into the expected type.
    ///
    /// The raw body is preserved for debugging.
    #[error("Failed to decode response (status {status}): {serde_error}")]
    DecodeFailed {
        /// The raw response body that failed to decode
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// A network-level error reported by the transport.
    ///
    /// Only observed inside the retry loop: if it survives the last attempt it is
    /// wrapped into [`Error::RequestFailed`].
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A failure reported by a custom [`Transport`](crate::transport::Transport).
    ///
    /// Retryable, and wrapped into [`Error::RequestFailed`] like network errors.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid configuration, such as a malformed header.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The request body could not be serialized.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// An invalid URL was provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Builds a [`Error::RequestFailed`] with the default code and no response text.
    pub fn request_failed(message: impl Into<String>) -> Self {
        Error::RequestFailed {
            code: DEFAULT_FAILURE_CODE,
            response_text: String::new(),
            message: message.into(),
        }
    }

    /// Returns `true` if a failed attempt may be replayed.
    ///
    /// Only request failures and raw network or transport errors are retried. Timeouts,
    /// cancellations and decode failures always propagate as they are.
    ///
    /// # Examples
    ///
    /// ```
    /// use restpipe::Error;
    ///
    /// assert!(Error::request_failed("empty body").is_retryable());
    /// assert!(!Error::Timeout.is_retryable());
    /// assert!(!Error::Cancelled.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::RequestFailed { .. } => true,
            Error::Network(_) => true,
            Error::Transport(_) => true,
            Error::Timeout => false,
            Error::Cancelled => false,
            Error::DecodeFailed { .. } => false,
            Error::ConfigurationError(_) => false,
            Error::SerializationFailed(_) => false,
            Error::InvalidUrl(_) => false,
        }
    }

    /// Folds any failure that is not already a recognized pipeline outcome into
    /// [`Error::RequestFailed`], keeping the original message.
    pub(crate) fn into_boundary(self) -> Self {
        match self {
            e @ (Error::RequestFailed { .. } | Error::Timeout | Error::Cancelled) => e,
            other => Error::request_failed(other.to_string()),
        }
    }

    /// Returns the failure code for [`Error::RequestFailed`], or the status of a
    /// [`Error::DecodeFailed`].
    pub fn code(&self) -> Option<u16> {
        match self {
            Error::RequestFailed { code, .. } => Some(*code),
            Error::DecodeFailed { status, .. } => Some(status.as_u16()),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::RequestFailed { response_text, .. } => Some(response_text),
            Error::DecodeFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }
}

/// A specialized `Result` type for requests.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_keeps_recognized_kinds() {
        assert!(matches!(Error::Timeout.into_boundary(), Error::Timeout));
        assert!(matches!(Error::Cancelled.into_boundary(), Error::Cancelled));

        let failed = Error::RequestFailed {
            code: 503,
            response_text: "busy".to_string(),
            message: "unavailable".to_string(),
        };
        assert_eq!(failed.into_boundary().code(), Some(503));
    }

    #[test]
    fn boundary_wraps_unrecognized_kinds() {
        let wrapped = Error::ConfigurationError("bad header".to_string()).into_boundary();
        match wrapped {
            Error::RequestFailed {
                code,
                response_text,
                message,
            } => {
                assert_eq!(code, DEFAULT_FAILURE_CODE);
                assert!(response_text.is_empty());
                assert!(message.contains("bad header"));
            }
            other => panic!("Expected RequestFailed, got {:?}", other),
        }
    }

    #[test]
    fn decode_failures_are_not_retryable() {
        let err = Error::DecodeFailed {
            raw_response: "nope".to_string(),
            serde_error: "expected value".to_string(),
            status: StatusCode::OK,
        };
        assert!(!err.is_retryable());
        assert_eq!(err.raw_response(), Some("nope"));
        assert_eq!(err.code(), Some(200));
    }
}
