//! Example demonstrating retries, timeouts and cancellation.
//!
//! Run with: `cargo run --example retry_and_cancel`

use restpipe::retry::RetryPolicy;
use restpipe::{Error, Request};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("restpipe=debug,retry_and_cancel=info")
        .init();

    println!("=== Retries Against An Unreachable Host ===");
    let mut request: Request = Request::get("http://127.0.0.1:1/unreachable")?
        .connect_timeout(Duration::from_secs(1))
        .with_retry_policy(RetryPolicy::exponential(
            3,
            Duration::from_millis(100),
            Duration::from_secs(1),
            true,
        ));

    match request.send().await {
        Ok(response) => println!("Unexpected success: {}", response.status),
        Err(Error::RequestFailed { code, message, .. }) => {
            println!("Gave up after {} retries", request.current_retries());
            println!("  Code: {}", code);
            println!("  Message: {}", message);
        }
        Err(e) => println!("Other error: {}", e),
    }
    println!();

    println!("=== Timeout ===");
    let mut slow: Request = Request::get("https://httpbin.org/delay/5")?
        .timeout(Duration::from_secs(1))
        .retries(2);

    match slow.send().await {
        Err(Error::Timeout) => println!("Timed out, retries used: {}", slow.current_retries()),
        other => println!("Result: {:?}", other.map(|r| r.status)),
    }
    println!();

    println!("=== Cancellation ===");
    let mut cancellable: Request = Request::get("https://httpbin.org/delay/5")?.retries(5);
    let token = cancellable.cancellation_token().clone();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        token.cancel();
    });

    match cancellable.send().await {
        Err(Error::Cancelled) => println!("Request was cancelled"),
        other => println!("Result: {:?}", other.map(|r| r.status)),
    }

    Ok(())
}
