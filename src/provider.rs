//! Request constructors.
//!
//! The type parameters of the returned [`Request`] pick its flavor:
//!
//! ```no_run
//! use restpipe::Request;
//! # #[derive(serde::Deserialize)] struct User;
//! # #[derive(serde::Serialize)] struct NewUser;
//!
//! # fn example() -> Result<(), restpipe::Error> {
//! // Untyped: the response body is left as text.
//! let raw: Request = Request::get("https://api.example.com/health")?;
//!
//! // Typed response.
//! let typed = Request::<User>::get("https://api.example.com/users/1")?;
//!
//! // Typed request body and response.
//! let create = Request::<User, NewUser>::post("https://api.example.com/users")?;
//! # Ok(())
//! # }
//! ```

use crate::config::RequestConfig;
use crate::transport::HttpCall;
use crate::{Request, Result};
use http::Method;
use url::Url;

impl<Res, Req> Request<Res, Req> {
    /// Creates a request with the default [`RequestConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn create(method: Method, url: impl AsRef<str>) -> Result<Self> {
        Self::create_with_config(method, url, &RequestConfig::default())
    }

    /// Creates a request starting from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn create_with_config(
        method: Method,
        url: impl AsRef<str>,
        config: &RequestConfig,
    ) -> Result<Self> {
        let url = Url::parse(url.as_ref())?;
        Ok(Self::from_parts(
            HttpCall::new(method, url, config),
            config.retry_policy.clone(),
            config.error_for_status,
            None,
        ))
    }

    /// Creates a GET request.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn get(url: impl AsRef<str>) -> Result<Self> {
        Self::create(Method::GET, url)
    }

    /// Creates a POST request.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn post(url: impl AsRef<str>) -> Result<Self> {
        Self::create(Method::POST, url)
    }

    /// Creates a PUT request.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn put(url: impl AsRef<str>) -> Result<Self> {
        Self::create(Method::PUT, url)
    }

    /// Creates a PATCH request.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn patch(url: impl AsRef<str>) -> Result<Self> {
        Self::create(Method::PATCH, url)
    }

    /// Creates a DELETE request.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn delete(url: impl AsRef<str>) -> Result<Self> {
        Self::create(Method::DELETE, url)
    }

    /// Creates a HEAD request.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn head(url: impl AsRef<str>) -> Result<Self> {
        Self::create(Method::HEAD, url)
    }

    /// Creates a fresh request with the configuration of `other`.
    ///
    /// Method, URL, timeouts, retry policy, status handling and transport are always
    /// copied. Headers and body/form data are copied only `with_headers`.
    /// Controllers, the cancellation token and the retry counter are not.
    ///
    /// The clone may use different type parameters than the original.
    ///
    /// # Examples
    ///
    /// ```
    /// use restpipe::Request;
    /// use std::time::Duration;
    ///
    /// # fn example() -> Result<(), restpipe::Error> {
    /// let original: Request = Request::get("https://api.example.com/items")?
    ///     .timeout(Duration::from_secs(5))
    ///     .retries(3)
    ///     .header("X", "y")?;
    ///
    /// let with: Request<serde_json::Value> = Request::clone_from_request(&original, true);
    /// assert_eq!(with.headers().get("X").unwrap(), "y");
    ///
    /// let without: Request = Request::clone_from_request(&original, false);
    /// assert!(without.headers().get("X").is_none());
    /// assert_eq!(without.retry_policy().retries, 3);
    /// # Ok(())
    /// # }
    /// ```
    pub fn clone_from_request<R2, Q2>(other: &Request<R2, Q2>, with_headers: bool) -> Self {
        Self::from_parts(
            other.call.copy(with_headers),
            other.retry_policy.clone(),
            other.error_for_status,
            other.transport.clone(),
        )
    }
}
