//! A single REST call and its send/retry lifecycle.
//!
//! The [`Request`] type owns everything one call needs: its [`HttpCall`] template,
//! retry policy, controllers, transport and cancellation token. Constructors live in
//! the factory functions (`Request::get`, `Request::post`, ...).

use crate::controller::Controller;
use crate::interceptor::Interceptor;
use crate::response::{RawResponse, ResponseBody};
use crate::retry::RetryPolicy;
use crate::transport::{FormField, FormUsage, HttpCall, ReqwestTransport, Transport};
use crate::{Error, Response, Result, DEFAULT_FAILURE_CODE};
use bytes::Bytes;
use http::{HeaderMap, Method};
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// One REST call.
///
/// `Res` is the response value type: [`RawResponse`] (the default) leaves the body
/// undecoded, any other `DeserializeOwned` type is decoded from JSON. `Req` is the
/// body type accepted by [`send_body`](Request::send_body).
///
/// Every send runs the same pipeline: for each attempt a fresh copy of the call is
/// handed to the controllers' pre-hooks, dispatched, and (on a retryable failure
/// with budget left) replayed after the retry delay. The successful exchange is
/// decoded and passed through the controllers' post-hooks.
///
/// # Examples
///
/// ```no_run
/// use restpipe::{BearerAuth, Request};
/// use serde::{Deserialize, Serialize};
/// use std::time::Duration;
///
/// #[derive(Serialize)]
/// struct CreateUser {
///     name: String,
/// }
///
/// #[derive(Deserialize)]
/// struct User {
///     id: u64,
///     name: String,
/// }
///
/// # async fn example() -> Result<(), restpipe::Error> {
/// let mut request: Request<User, CreateUser> = Request::post("https://api.example.com/users")?
///     .timeout(Duration::from_secs(5))
///     .retries(3)
///     .retry_delay(Duration::from_millis(200))
///     .with_controller(BearerAuth::new("secret"));
///
/// let created = request
///     .send_body(&CreateUser { name: "Alice".to_string() })
///     .await?;
/// println!("Created user {} ({})", created.value.id, created.value.name);
/// # Ok(())
/// # }
/// ```
pub struct Request<Res = RawResponse, Req = ()> {
    pub(crate) call: HttpCall,
    pub(crate) retry_policy: RetryPolicy,
    pub(crate) current_retries: usize,
    pub(crate) error_for_status: bool,
    controllers: Vec<Box<dyn Controller<Res>>>,
    pub(crate) transport: Option<Arc<dyn Transport>>,
    cancel: CancellationToken,
    _types: PhantomData<fn(Req) -> Res>,
}

impl<Res, Req> Request<Res, Req> {
    pub(crate) fn from_parts(
        call: HttpCall,
        retry_policy: RetryPolicy,
        error_for_status: bool,
        transport: Option<Arc<dyn Transport>>,
    ) -> Self {
        tracing::debug!(
            method = %call.method(),
            url = %call.url(),
            "Create request"
        );

        Self {
            call,
            retry_policy,
            current_retries: 0,
            error_for_status,
            controllers: Vec::new(),
            transport,
            cancel: CancellationToken::new(),
            _types: PhantomData,
        }
    }

    /// The target URL.
    pub fn url(&self) -> &Url {
        self.call.url()
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        self.call.method()
    }

    /// The configured headers.
    pub fn headers(&self) -> &HeaderMap {
        self.call.headers()
    }

    /// The raw body, if one was set.
    pub fn raw_body(&self) -> Option<&Bytes> {
        self.call.body()
    }

    /// The attached form fields.
    pub fn form_fields(&self) -> &[FormField] {
        self.call.form_fields()
    }

    /// The call template every attempt is copied from.
    ///
    /// Timeouts are read from here: `request.call().timeout()`.
    pub fn call(&self) -> &HttpCall {
        &self.call
    }

    /// The retry policy.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Number of replays performed so far. Never exceeds the policy's budget.
    pub fn current_retries(&self) -> usize {
        self.current_retries
    }

    /// The token that cancels this request.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Number of attached controllers.
    pub fn controller_count(&self) -> usize {
        self.controllers.len()
    }

    /// Sets the per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.call.set_timeout(timeout);
        self
    }

    /// Sets the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.call.set_connect_timeout(timeout);
        self
    }

    /// Sets how many times a failed request is replayed.
    pub fn retries(mut self, retries: usize) -> Self {
        self.retry_policy.retries = retries;
        self
    }

    /// Sets the wait before a replay.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_policy.delay = delay;
        self
    }

    /// Replaces the whole retry policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Sets whether non-2xx statuses fail the attempt.
    pub fn error_for_status(mut self, enabled: bool) -> Self {
        self.error_for_status = enabled;
        self
    }

    /// Appends a header value.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn add_header(&mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<()> {
        self.call.add_header(name, value)
    }

    /// Appends a header value, builder style.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        self.add_header(name, value)?;
        Ok(self)
    }

    /// Appends several headers.
    ///
    /// # Errors
    ///
    /// Returns an error on the first invalid header name or value.
    pub fn headers_from<I, K, V>(mut self, headers: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in headers {
            self.add_header(name, value)?;
        }
        Ok(self)
    }

    /// Sets a raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.call.set_body(body);
        self
    }

    /// Attaches a controller. Controllers run in attachment order.
    pub fn with_controller(mut self, controller: impl Controller<Res> + 'static) -> Self {
        self.controllers.push(Box::new(controller));
        self
    }

    /// Uses the given transport instead of the default `reqwest` one.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Ties the request to an external cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Applies an interceptor to the request's configuration.
    pub fn intercept(mut self, interceptor: &dyn Interceptor) -> Self {
        self.call = interceptor.process_request(self.call);
        self
    }

    /// Cancels the request. An in-flight send fails with [`Error::Cancelled`].
    pub fn abort(&self) {
        self.cancel.cancel();
    }

    fn transport(&mut self) -> Result<Arc<dyn Transport>> {
        if let Some(transport) = &self.transport {
            return Ok(Arc::clone(transport));
        }

        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::with_connect_timeout(
            self.call.connect_timeout(),
        )?);
        self.transport = Some(Arc::clone(&transport));
        Ok(transport)
    }

    /// Runs pre-hooks and the transport call, replaying the whole attempt on
    /// retryable failures while budget remains.
    async fn dispatch(&mut self) -> Result<(RawResponse, usize)> {
        let transport = self.transport()?;
        let mut attempts = 1;

        loop {
            let mut call = self.call.copy(true);
            for controller in &self.controllers {
                controller.process_request(&mut call, &self.cancel).await?;
            }

            tracing::debug!(
                method = %call.method(),
                url = %call.url(),
                attempt = attempts,
                "Executing HTTP request"
            );

            match self.attempt(transport.as_ref(), call).await {
                Ok(raw) => return Ok((raw, attempts)),
                Err(e) if e.is_retryable() && self.current_retries < self.retry_policy.retries => {
                    self.current_retries += 1;
                    attempts += 1;
                    let delay = self.retry_policy.delay_for_retry(self.current_retries);

                    tracing::warn!(
                        error = %e,
                        url = %self.call.url(),
                        retries = self.retry_policy.retries,
                        current_retries = self.current_retries,
                        delay_ms = delay.as_millis(),
                        "Retrying request after delay"
                    );

                    tokio::select! {
                        _ = self.cancel.cancelled() => return Err(Error::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        url = %self.call.url(),
                        attempts = attempts,
                        "Request failed"
                    );
                    return Err(e.into_boundary());
                }
            }
        }
    }

    /// One transport exchange. The call is consumed here whatever the outcome.
    async fn attempt(&self, transport: &dyn Transport, call: HttpCall) -> Result<RawResponse> {
        let timeout = call.timeout();
        let raw = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(Error::Cancelled),
            result = tokio::time::timeout(timeout, transport.execute(call)) => match result {
                Ok(result) => result?,
                Err(_) => return Err(Error::Timeout),
            },
        };

        if self.error_for_status && !raw.status.is_success() {
            return Err(Error::RequestFailed {
                code: raw.status.as_u16(),
                message: format!("HTTP error {}", raw.status),
                response_text: raw.text,
            });
        }

        if raw.text.is_empty() {
            return Err(Error::RequestFailed {
                code: DEFAULT_FAILURE_CODE,
                response_text: String::new(),
                message: format!(
                    "Response body is empty, status code: {}, message: {}",
                    raw.status.as_u16(),
                    raw.message
                ),
            });
        }

        tracing::debug!(
            status = raw.status.as_u16(),
            url = %self.call.url(),
            "Received HTTP response"
        );
        tracing::trace!(body = %raw.text, "Response body");

        Ok(raw)
    }
}

impl<Res, Req> Request<Res, Req>
where
    Res: ResponseBody,
{
    /// Sends the request.
    ///
    /// # Errors
    ///
    /// - [`Error::RequestFailed`] when no usable response arrived within the retry budget
    /// - [`Error::Timeout`] / [`Error::Cancelled`] when an attempt timed out or was aborted
    /// - [`Error::DecodeFailed`] when the body does not decode into `Res`
    /// - any error returned by a controller
    pub async fn send(&mut self) -> Result<Response<Res>> {
        self.execute().await
    }

    /// Attaches a binary form field and sends the request as a form.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Request::send).
    pub async fn send_form(
        &mut self,
        field_name: impl Into<String>,
        data: impl Into<Bytes>,
        file_name: impl Into<String>,
        usage: FormUsage,
    ) -> Result<Response<Res>> {
        self.call
            .add_form_field(FormField::new(field_name, file_name, data));
        self.call.set_form_usage(usage);
        self.execute().await
    }

    async fn execute(&mut self) -> Result<Response<Res>> {
        let (raw, attempts) = self.dispatch().await?;
        let value = Res::decode(&raw)?;

        let mut response = Response::from_raw(value, raw, attempts);
        for controller in &self.controllers {
            response = controller.process_response(response, &self.cancel).await?;
        }
        Ok(response)
    }
}

impl<Res, Req> Request<Res, Req>
where
    Res: ResponseBody,
    Req: Serialize,
{
    /// Serializes `body` as JSON and sends it.
    ///
    /// Fields marked `#[serde(skip_serializing)]` are left out, which is how
    /// computed or read-only members are kept off the wire.
    ///
    /// # Errors
    ///
    /// [`Error::SerializationFailed`] if the body cannot be serialized, otherwise
    /// the same as [`send`](Request::send).
    pub async fn send_body(&mut self, body: &Req) -> Result<Response<Res>> {
        let json =
            serde_json::to_vec(body).map_err(|e| Error::SerializationFailed(e.to_string()))?;
        tracing::trace!(body = %String::from_utf8_lossy(&json), "Send request body");
        self.call.set_body(json);
        self.execute().await
    }
}

impl<Res, Req> fmt::Debug for Request<Res, Req> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("call", &self.call)
            .field("retry_policy", &self.retry_policy)
            .field("current_retries", &self.current_retries)
            .field("error_for_status", &self.error_for_status)
            .field("controllers", &self.controllers.len())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
