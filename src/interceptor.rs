//! Request interceptors.
//!
//! An [`Interceptor`] is a plain transform over a request's [`HttpCall`]. They are
//! applied explicitly with [`Request::intercept`](crate::Request::intercept), and
//! an [`InterceptorSet`] chains several of them in insertion order.
//!
//! ```
//! use restpipe::interceptor::{BearerInterceptor, HeaderInterceptor, InterceptorSet};
//! use restpipe::Request;
//!
//! # fn example() -> Result<(), restpipe::Error> {
//! let mut interceptors = InterceptorSet::new();
//! interceptors.add_interceptor(HeaderInterceptor::new("x-client", "game/1.0")?);
//! let auth = interceptors.add_interceptor(BearerInterceptor::new("secret"));
//!
//! let request: Request = Request::get("https://api.example.com/items")?.intercept(&interceptors);
//! assert_eq!(request.headers().get("authorization").unwrap(), "Bearer secret");
//!
//! interceptors.remove_interceptor(auth);
//! # Ok(())
//! # }
//! ```

use crate::config::parse_header;
use crate::transport::HttpCall;
use crate::Result;
use http::{HeaderName, HeaderValue};
use std::sync::Arc;

/// A transform applied to a request before it is sent.
///
/// Any `Fn(HttpCall) -> HttpCall` closure is an interceptor.
pub trait Interceptor: Send + Sync {
    /// Transforms the call and hands it back.
    fn process_request(&self, call: HttpCall) -> HttpCall;
}

impl<F> Interceptor for F
where
    F: Fn(HttpCall) -> HttpCall + Send + Sync,
{
    fn process_request(&self, call: HttpCall) -> HttpCall {
        self(call)
    }
}

/// Handle returned by [`InterceptorSet::add_interceptor`], used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterceptorId(u64);

/// An ordered chain of interceptors, itself an [`Interceptor`].
#[derive(Default)]
pub struct InterceptorSet {
    interceptors: Vec<(InterceptorId, Arc<dyn Interceptor>)>,
    next_id: u64,
}

impl InterceptorSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an interceptor at the end of the chain.
    pub fn add_interceptor(&mut self, interceptor: impl Interceptor + 'static) -> InterceptorId {
        self.add_shared(Arc::new(interceptor))
    }

    /// Appends an interceptor that is shared with other sets.
    pub fn add_shared(&mut self, interceptor: Arc<dyn Interceptor>) -> InterceptorId {
        let id = InterceptorId(self.next_id);
        self.next_id += 1;
        self.interceptors.push((id, interceptor));
        id
    }

    /// Removes an interceptor. Returns `false` if it was not in the set.
    pub fn remove_interceptor(&mut self, id: InterceptorId) -> bool {
        let before = self.interceptors.len();
        self.interceptors.retain(|(existing, _)| *existing != id);
        self.interceptors.len() != before
    }

    /// Removes every interceptor.
    pub fn clear(&mut self) {
        self.interceptors.clear();
    }

    /// Number of interceptors in the chain.
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// Returns `true` if the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}

impl Interceptor for InterceptorSet {
    fn process_request(&self, call: HttpCall) -> HttpCall {
        self.interceptors
            .iter()
            .fold(call, |current, (_, interceptor)| {
                interceptor.process_request(current)
            })
    }
}

impl std::fmt::Debug for InterceptorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorSet")
            .field(
                "ids",
                &self.interceptors.iter().map(|(id, _)| id.0).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Appends a fixed header.
#[derive(Debug, Clone)]
pub struct HeaderInterceptor {
    name: HeaderName,
    value: HeaderValue,
}

impl HeaderInterceptor {
    /// Creates an interceptor for the given header.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn new(name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let (name, value) = parse_header(name.as_ref(), value.as_ref())?;
        Ok(Self { name, value })
    }
}

impl Interceptor for HeaderInterceptor {
    fn process_request(&self, mut call: HttpCall) -> HttpCall {
        call.headers_mut()
            .append(self.name.clone(), self.value.clone());
        call
    }
}

/// Appends `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct BearerInterceptor {
    token: String,
}

impl BearerInterceptor {
    /// Creates an interceptor for the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl Interceptor for BearerInterceptor {
    fn process_request(&self, mut call: HttpCall) -> HttpCall {
        match HeaderValue::try_from(format!("Bearer {}", self.token)) {
            Ok(value) => {
                call.headers_mut().append(http::header::AUTHORIZATION, value);
            }
            Err(e) => tracing::warn!(error = %e, "Skipping invalid bearer token"),
        }
        call
    }
}
