//! Defaults applied to newly created requests.

use crate::retry::RetryPolicy;
use crate::{Error, Result};
use http::{header, HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration a request starts from.
///
/// # Examples
///
/// ```
/// use restpipe::RequestConfig;
/// use restpipe::retry::RetryPolicy;
/// use std::time::Duration;
///
/// let config = RequestConfig::builder()
///     .timeout(Duration::from_secs(5))
///     .retry_policy(RetryPolicy::fixed(2, Duration::from_millis(100)))
///     .default_header("User-Agent", "my-game/1.0")
///     .unwrap()
///     .build();
///
/// assert_eq!(config.timeout, Duration::from_secs(5));
/// assert_eq!(config.retry_policy.retries, 2);
/// ```
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Deadline for a single attempt.
    pub timeout: Duration,

    /// Deadline for establishing the connection.
    pub connect_timeout: Duration,

    /// Retry budget and delays.
    pub retry_policy: RetryPolicy,

    /// Whether non-2xx statuses fail the attempt.
    ///
    /// Defaults to `false`: the response is decoded whatever its status.
    pub error_for_status: bool,

    /// Headers every request starts with.
    ///
    /// Defaults to `Content-Type: application/json`.
    pub default_headers: HeaderMap,
}

impl Default for RequestConfig {
    fn default() -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            retry_policy: RetryPolicy::default(),
            error_for_status: false,
            default_headers,
        }
    }
}

impl RequestConfig {
    /// Creates a new builder starting from the defaults.
    pub fn builder() -> RequestConfigBuilder {
        RequestConfigBuilder::default()
    }
}

/// Builder for [`RequestConfig`].
#[derive(Debug, Default)]
pub struct RequestConfigBuilder {
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    retry_policy: Option<RetryPolicy>,
    error_for_status: Option<bool>,
    extra_headers: HeaderMap,
}

impl RequestConfigBuilder {
    /// Sets the per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the retry policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Sets whether non-2xx statuses fail the attempt.
    pub fn error_for_status(mut self, enabled: bool) -> Self {
        self.error_for_status = Some(enabled);
        self
    }

    /// Adds a header on top of the default `Content-Type`.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let (name, value) = parse_header(name.as_ref(), value.as_ref())?;
        self.extra_headers.insert(name, value);
        Ok(self)
    }

    /// Builds the `RequestConfig`.
    pub fn build(self) -> RequestConfig {
        let default = RequestConfig::default();
        let mut default_headers = default.default_headers;
        for (name, value) in &self.extra_headers {
            default_headers.insert(name.clone(), value.clone());
        }

        RequestConfig {
            timeout: self.timeout.unwrap_or(default.timeout),
            connect_timeout: self.connect_timeout.unwrap_or(default.connect_timeout),
            retry_policy: self.retry_policy.unwrap_or(default.retry_policy),
            error_for_status: self.error_for_status.unwrap_or(default.error_for_status),
            default_headers,
        }
    }
}

/// Validates a header name/value pair.
pub(crate) fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let name = HeaderName::try_from(name)
        .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
    let value = HeaderValue::try_from(value)
        .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
    Ok((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RequestConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.retry_policy.retries, 0);
        assert!(!config.error_for_status);
        assert_eq!(
            config.default_headers.get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn builder_overrides_and_keeps_content_type() {
        let config = RequestConfig::builder()
            .connect_timeout(Duration::from_secs(3))
            .error_for_status(true)
            .default_header("x-client", "tests")
            .unwrap()
            .build();

        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert!(config.error_for_status);
        assert_eq!(config.default_headers.get("x-client").unwrap(), "tests");
        assert!(config.default_headers.contains_key(header::CONTENT_TYPE));
    }

    #[test]
    fn invalid_header_is_configuration_error() {
        let result = RequestConfig::builder().default_header("bad header", "x");
        assert!(matches!(result, Err(Error::ConfigurationError(_))));
    }
}
