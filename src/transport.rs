//! The HTTP engine seam.
//!
//! A [`Transport`] performs one network exchange for an [`HttpCall`]. The call is
//! handed over by value: each attempt owns a fresh copy and the transport consumes
//! it, so nothing from a finished attempt is ever reused.
//!
//! [`ReqwestTransport`] is the default engine. Tests and hosts with their own
//! networking stack can plug in anything that implements [`Transport`].

use crate::config::{parse_header, RequestConfig};
use crate::response::RawResponse;
use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use http::{header, HeaderMap, Method};
use std::time::Duration;
use url::Url;

/// How form fields are encoded on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormUsage {
    /// `multipart/form-data`, each field sent as a file part.
    #[default]
    Multipart,
    /// `application/x-www-form-urlencoded`, field data sent as (lossy) UTF-8 text.
    UrlEncoded,
}

/// A binary form field.
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    /// Name of the form field.
    pub name: String,
    /// File name reported for the part.
    pub file_name: String,
    /// Raw contents.
    pub data: Bytes,
}

impl FormField {
    /// Creates a new form field.
    pub fn new(name: impl Into<String>, file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            file_name: file_name.into(),
            data: data.into(),
        }
    }
}

/// Everything a single attempt hands to the transport.
///
/// The URL and method are fixed at construction; headers, payload and timeouts
/// can be adjusted by interceptors and controller pre-hooks.
#[derive(Debug, Clone)]
pub struct HttpCall {
    url: Url,
    method: Method,
    headers: HeaderMap,
    body: Option<Bytes>,
    form: Vec<FormField>,
    form_usage: FormUsage,
    timeout: Duration,
    connect_timeout: Duration,
}

impl HttpCall {
    pub(crate) fn new(method: Method, url: Url, config: &RequestConfig) -> Self {
        Self {
            url,
            method,
            headers: config.default_headers.clone(),
            body: None,
            form: Vec::new(),
            form_usage: FormUsage::default(),
            timeout: config.timeout,
            connect_timeout: config.connect_timeout,
        }
    }

    /// Copies the call into a fresh one.
    ///
    /// Without `with_payload` the copy starts from the default headers and carries
    /// no body or form data.
    pub(crate) fn copy(&self, with_payload: bool) -> Self {
        if with_payload {
            return self.clone();
        }

        Self {
            url: self.url.clone(),
            method: self.method.clone(),
            headers: RequestConfig::default().default_headers,
            body: None,
            form: Vec::new(),
            form_usage: self.form_usage,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
        }
    }

    /// The target URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The outgoing headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to the outgoing headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Appends a header value, keeping any existing values under the same name.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn add_header(&mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<()> {
        let (name, value) = parse_header(name.as_ref(), value.as_ref())?;
        tracing::trace!(header = %name, "Add header");
        self.headers.append(name, value);
        Ok(())
    }

    /// Sets a header, replacing every existing value under the same name.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn set_header(&mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<()> {
        let (name, value) = parse_header(name.as_ref(), value.as_ref())?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// The raw body, if any.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Replaces the raw body.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = Some(body.into());
    }

    /// The attached form fields.
    pub fn form_fields(&self) -> &[FormField] {
        &self.form
    }

    /// The form encoding.
    pub fn form_usage(&self) -> FormUsage {
        self.form_usage
    }

    pub(crate) fn add_form_field(&mut self, field: FormField) {
        self.form.push(field);
    }

    pub(crate) fn set_form_usage(&mut self, usage: FormUsage) {
        self.form_usage = usage;
    }

    /// The per-attempt deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sets the per-attempt deadline.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// The connect deadline.
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Sets the connect deadline.
    pub fn set_connect_timeout(&mut self, timeout: Duration) {
        self.connect_timeout = timeout;
    }
}

/// Performs network exchanges.
///
/// Implementations report a deadline as [`Error::Timeout`] and raw network problems
/// as [`Error::Network`] (or any other error, which the pipeline wraps once the
/// retry budget is spent). An empty body is not an error at this level.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use restpipe::transport::{HttpCall, Transport};
/// use restpipe::{RawResponse, Result};
///
/// struct Canned;
///
/// #[async_trait]
/// impl Transport for Canned {
///     async fn execute(&self, _call: HttpCall) -> Result<RawResponse> {
///         Ok(RawResponse::new(http::StatusCode::OK, r#"{"ok":true}"#))
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Executes the call and returns the raw exchange.
    async fn execute(&self, call: HttpCall) -> Result<RawResponse>;
}

/// A [`Transport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    connect_timeout: Duration,
}

impl ReqwestTransport {
    /// Creates a transport with the default connect timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_connect_timeout(crate::config::DEFAULT_CONNECT_TIMEOUT)
    }

    /// Creates a transport whose pooled client uses the given connect timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be built.
    pub fn with_connect_timeout(connect_timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(connect_timeout)?,
            connect_timeout,
        })
    }

    /// Calls with a non-default connect timeout get a dedicated client.
    fn client_for(&self, call: &HttpCall) -> Result<reqwest::Client> {
        if call.connect_timeout == self.connect_timeout {
            Ok(self.client.clone())
        } else {
            build_client(call.connect_timeout)
        }
    }
}

fn build_client(connect_timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .build()
        .map_err(|e| Error::ConfigurationError(format!("Failed to build HTTP client: {}", e)))
}

fn map_reqwest_error(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::Timeout
    } else {
        Error::Network(error)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, call: HttpCall) -> Result<RawResponse> {
        let client = self.client_for(&call)?;
        let HttpCall {
            url,
            method,
            mut headers,
            body,
            form,
            form_usage,
            timeout,
            ..
        } = call;

        let mut request = client.request(method, url).timeout(timeout);

        if form.is_empty() {
            request = request.headers(headers);
            if let Some(body) = body {
                request = request.body(body);
            }
        } else {
            // The form encoder sets its own content type.
            headers.remove(header::CONTENT_TYPE);
            request = request.headers(headers);
            request = match form_usage {
                FormUsage::Multipart => {
                    let form = form.into_iter().fold(
                        reqwest::multipart::Form::new(),
                        |multipart, field| {
                            let part = reqwest::multipart::Part::bytes(field.data.to_vec())
                                .file_name(field.file_name);
                            multipart.part(field.name, part)
                        },
                    );
                    request.multipart(form)
                }
                FormUsage::UrlEncoded => {
                    let pairs: Vec<(String, String)> = form
                        .into_iter()
                        .map(|field| {
                            (field.name, String::from_utf8_lossy(&field.data).into_owned())
                        })
                        .collect();
                    request.form(&pairs)
                }
            };
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await.map_err(map_reqwest_error)?;

        Ok(RawResponse {
            status,
            message: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call() -> HttpCall {
        let url = Url::parse("https://api.example.com/items").unwrap();
        HttpCall::new(Method::POST, url, &RequestConfig::default())
    }

    #[test]
    fn headers_are_multi_valued() {
        let mut call = call();
        call.add_header("x-tag", "a").unwrap();
        call.add_header("x-tag", "b").unwrap();

        let values: Vec<_> = call.headers().get_all("x-tag").iter().collect();
        assert_eq!(values.len(), 2);

        call.set_header("x-tag", "c").unwrap();
        assert_eq!(call.headers().get_all("x-tag").iter().count(), 1);
    }

    #[test]
    fn copy_without_payload_resets_headers_and_body() {
        let mut call = call();
        call.add_header("x-tag", "a").unwrap();
        call.set_body(r#"{"id":1}"#);
        call.add_form_field(FormField::new("file", "a.bin", vec![1u8, 2, 3]));
        call.set_timeout(Duration::from_secs(3));

        let bare = call.copy(false);
        assert!(bare.headers().get("x-tag").is_none());
        assert!(bare.headers().contains_key(header::CONTENT_TYPE));
        assert!(bare.body().is_none());
        assert!(bare.form_fields().is_empty());
        assert_eq!(bare.timeout(), Duration::from_secs(3));
        assert_eq!(bare.url(), call.url());

        let full = call.copy(true);
        assert_eq!(full.headers().get("x-tag").unwrap(), "a");
        assert_eq!(&full.body().unwrap()[..], br#"{"id":1}"#);
        assert_eq!(full.form_fields().len(), 1);
    }

    #[test]
    fn invalid_header_value_is_rejected() {
        let mut call = call();
        let result = call.add_header("x-bad", "line\nbreak");
        assert!(matches!(result, Err(Error::ConfigurationError(_))));
    }
}
