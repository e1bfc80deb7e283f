//! # restpipe - a REST request pipeline
//!
//! restpipe wraps an HTTP engine (`reqwest` by default) with typed requests, JSON
//! (de)serialization, retries, controller hooks and interceptors.
//!
//! ## Quick Start
//!
//! ```no_run
//! use restpipe::{BearerAuth, Request, TracingController};
//! use serde::{Deserialize, Serialize};
//! use std::time::Duration;
//!
//! #[derive(Serialize)]
//! struct CreateUser {
//!     name: String,
//! }
//!
//! #[derive(Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), restpipe::Error> {
//!     // A typed GET with a bearer token and three replays on failure
//!     let mut request = Request::<User>::get("https://api.example.com/users/123")?
//!         .retries(3)
//!         .retry_delay(Duration::from_millis(250))
//!         .with_controller(BearerAuth::new("secret"))
//!         .with_controller(TracingController::new());
//!
//!     let user = request.send().await?;
//!     println!("User: {} after {} attempt(s)", user.value.name, user.attempts);
//!
//!     // A typed POST
//!     let mut create = Request::<User, CreateUser>::post("https://api.example.com/users")?;
//!     let created = create
//!         .send_body(&CreateUser { name: "Alice".to_string() })
//!         .await?;
//!     println!("Created user with ID: {}", created.value.id);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! Each send runs, for every attempt:
//!
//! 1. the controllers' pre-hooks, in attachment order, on a fresh copy of the call
//! 2. the transport call, bounded by the timeout and the cancellation token
//! 3. on a retryable failure with budget left, the retry delay, then back to 1
//!
//! and once an attempt succeeded, the JSON decode and the controllers' post-hooks.
//!
//! ## Error Handling
//!
//! ```no_run
//! use restpipe::{Error, Request};
//!
//! # async fn example() -> Result<(), Error> {
//! let mut request = Request::<serde_json::Value>::get("https://api.example.com/endpoint")?;
//! match request.send().await {
//!     Ok(response) => println!("Success: {:?}", response.value),
//!     Err(Error::DecodeFailed { raw_response, serde_error, status }) => {
//!         eprintln!("Failed to decode (status {}): {}", status, serde_error);
//!         eprintln!("  Raw response: {}", raw_response);
//!     }
//!     Err(Error::RequestFailed { code, message, .. }) => {
//!         eprintln!("Request failed with code {}: {}", code, message);
//!     }
//!     Err(Error::Timeout) | Err(Error::Cancelled) => eprintln!("Gave up"),
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
mod controller;
mod error;
pub mod interceptor;
mod provider;
mod request;
mod response;
pub mod retry;
pub mod transport;

pub use config::{RequestConfig, RequestConfigBuilder};
pub use controller::{BearerAuth, Controller, TracingController};
pub use error::{Error, Result, DEFAULT_FAILURE_CODE};
pub use interceptor::{Interceptor, InterceptorSet};
pub use request::Request;
pub use response::{RawResponse, Response, ResponseBody};
pub use retry::RetryPolicy;
pub use tokio_util::sync::CancellationToken;
pub use transport::{FormUsage, HttpCall, Transport};
