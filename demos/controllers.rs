//! Example demonstrating controllers and interceptors.
//!
//! This example shows how to:
//! - Write a controller with pre- and post-hooks
//! - Reuse a request configuration through interceptors
//! - Clone a request into a differently typed one
//!
//! Run with: `cargo run --example controllers`

use async_trait::async_trait;
use restpipe::interceptor::HeaderInterceptor;
use restpipe::{
    BearerAuth, CancellationToken, Controller, Error, HttpCall, InterceptorSet, Request,
    Response, Result, TracingController,
};
use serde::Deserialize;
use std::time::Instant;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Todo {
    id: u32,
    title: String,
    completed: bool,
}

/// Stamps every attempt and reports how long the exchange took.
struct Stopwatch {
    started: std::sync::Mutex<Option<Instant>>,
}

#[async_trait]
impl<T: Send + 'static> Controller<T> for Stopwatch {
    async fn process_request(&self, call: &mut HttpCall, _cancel: &CancellationToken) -> Result<()> {
        if let Ok(mut started) = self.started.lock() {
            *started = Some(Instant::now());
        }
        call.set_header("x-request-started", "1")
    }

    async fn process_response(
        &self,
        response: Response<T>,
        _cancel: &CancellationToken,
    ) -> Result<Response<T>> {
        if let Some(started) = self.started.lock().ok().and_then(|s| *s) {
            println!("Exchange took {:?}", started.elapsed());
        }
        Ok(response)
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("restpipe=trace,controllers=info")
        .init();

    let mut interceptors = InterceptorSet::new();
    interceptors.add_interceptor(HeaderInterceptor::new("x-client", "restpipe-demo")?);

    println!("=== Controllers ===");
    let mut request = Request::<Todo>::get("https://jsonplaceholder.typicode.com/todos/1")?
        .intercept(&interceptors)
        .with_controller(BearerAuth::new("demo-token"))
        .with_controller(TracingController::new().with_bodies())
        .with_controller(Stopwatch {
            started: std::sync::Mutex::new(None),
        });

    let response = request.send().await?;
    println!("Todo: {:?}", response.value);
    println!();

    println!("=== Clone ===");
    let mut copy: Request = Request::clone_from_request(&request, true);
    let raw = copy.send().await?;
    println!("Clone received {} bytes", raw.raw_text.len());

    Ok(())
}
