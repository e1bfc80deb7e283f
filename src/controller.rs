//! Pre/post hooks attached to a single request.
//!
//! A [`Controller`] sees every attempt's [`HttpCall`] right before it is dispatched
//! and the decoded [`Response`] once the exchange succeeded. Controllers are owned
//! by the request they are attached to, so per-request state needs no locking.

use crate::transport::HttpCall;
use crate::{Response, Result};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Cross-cutting behavior around a request (auth, logging, error translation...).
///
/// `T` is the response value type. Controllers that do not care about the value
/// implement the trait for every `T`.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use restpipe::{Controller, HttpCall, Response, Result};
/// use tokio_util::sync::CancellationToken;
///
/// struct ApiKey(String);
///
/// #[async_trait]
/// impl<T: Send + 'static> Controller<T> for ApiKey {
///     async fn process_request(
///         &self,
///         call: &mut HttpCall,
///         _cancel: &CancellationToken,
///     ) -> Result<()> {
///         call.set_header("x-api-key", &self.0)
///     }
///
///     async fn process_response(
///         &self,
///         response: Response<T>,
///         _cancel: &CancellationToken,
///     ) -> Result<Response<T>> {
///         Ok(response)
///     }
/// }
/// ```
#[async_trait]
pub trait Controller<T>: Send + Sync {
    /// Runs before each attempt is dispatched.
    ///
    /// Returning an error aborts the request without sending it.
    async fn process_request(&self, call: &mut HttpCall, cancel: &CancellationToken)
        -> Result<()>;

    /// Runs after the response was decoded, and may replace it.
    async fn process_response(
        &self,
        response: Response<T>,
        cancel: &CancellationToken,
    ) -> Result<Response<T>>;
}

/// Injects `Authorization: Bearer <token>` into every attempt.
#[derive(Debug, Clone)]
pub struct BearerAuth {
    token: String,
}

impl BearerAuth {
    /// Creates a controller for the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl<T: Send + 'static> Controller<T> for BearerAuth {
    async fn process_request(
        &self,
        call: &mut HttpCall,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        call.set_header(
            http::header::AUTHORIZATION.as_str(),
            format!("Bearer {}", self.token),
        )
    }

    async fn process_response(
        &self,
        response: Response<T>,
        _cancel: &CancellationToken,
    ) -> Result<Response<T>> {
        Ok(response)
    }
}

/// Logs every dispatched attempt and every received response.
#[derive(Debug, Clone, Default)]
pub struct TracingController {
    log_bodies: bool,
}

impl TracingController {
    /// Creates a controller that logs method, URL and status.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also logs raw response bodies (at trace level).
    pub fn with_bodies(mut self) -> Self {
        self.log_bodies = true;
        self
    }
}

#[async_trait]
impl<T: Send + 'static> Controller<T> for TracingController {
    async fn process_request(
        &self,
        call: &mut HttpCall,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        tracing::info!(
            method = %call.method(),
            url = %call.url(),
            headers = call.headers().len(),
            "Dispatching request"
        );
        Ok(())
    }

    async fn process_response(
        &self,
        response: Response<T>,
        _cancel: &CancellationToken,
    ) -> Result<Response<T>> {
        tracing::info!(
            status = response.status.as_u16(),
            attempts = response.attempts,
            "Received response"
        );
        if self.log_bodies {
            tracing::trace!(body = %response.raw_text, "Response body");
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RequestConfig;
    use http::{HeaderMap, Method, StatusCode};
    use url::Url;

    #[tokio::test]
    async fn bearer_auth_replaces_authorization() {
        let url = Url::parse("https://api.example.com/").unwrap();
        let mut call = HttpCall::new(Method::GET, url, &RequestConfig::default());
        let cancel = CancellationToken::new();
        let auth = BearerAuth::new("abc");

        Controller::<()>::process_request(&auth, &mut call, &cancel)
            .await
            .unwrap();
        Controller::<()>::process_request(&auth, &mut call, &cancel)
            .await
            .unwrap();

        let values: Vec<_> = call.headers().get_all("authorization").iter().collect();
        assert_eq!(values, vec!["Bearer abc"]);
    }

    #[tokio::test]
    async fn tracing_controller_passes_response_through() {
        let response = Response::new(
            7u32,
            "7".to_string(),
            StatusCode::OK,
            "OK".to_string(),
            HeaderMap::new(),
            1,
        );
        let controller = TracingController::new().with_bodies();
        let response = controller
            .process_response(response, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(response.value, 7);
    }
}
