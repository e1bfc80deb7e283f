//! Basic example demonstrating simple GET and POST requests.
//!
//! This example shows how to:
//! - Create typed and untyped requests
//! - Send a JSON body
//! - Access the decoded value and the raw exchange
//!
//! Run with: `cargo run --example basic_call`

use restpipe::{Error, Request};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Post {
    #[serde(rename = "userId")]
    user_id: u32,
    id: u32,
    title: String,
    body: String,
}

#[derive(Debug, Serialize)]
struct NewPost {
    title: String,
    body: String,
    #[serde(rename = "userId")]
    user_id: u32,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("restpipe=debug,basic_call=info")
        .init();

    println!("=== GET Request Example ===");
    let mut request = Request::<Post>::get("https://jsonplaceholder.typicode.com/posts/1")?;
    let response = request.send().await?;

    println!("Post ID: {}", response.value.id);
    println!("Title: {}", response.value.title);
    println!("Status: {} {}", response.status, response.message);
    println!();

    println!("=== POST Request Example ===");
    let new_post = NewPost {
        title: "My New Post".to_string(),
        body: "This is the content of my new post!".to_string(),
        user_id: 1,
    };

    let mut create =
        Request::<Post, NewPost>::post("https://jsonplaceholder.typicode.com/posts")?;
    let response = create.send_body(&new_post).await?;

    println!("Created post ID: {}", response.value.id);
    println!("Raw response length: {} bytes", response.raw_text.len());
    println!("Content-Type: {:?}", response.header("content-type"));
    println!();

    println!("=== Untyped Request Example ===");
    let mut raw: Request = Request::get("https://jsonplaceholder.typicode.com/users/1")?;
    let response = raw.send().await?;
    let preview: String = response.value.text.chars().take(40).collect();
    println!("Body starts with: {}", preview);

    Ok(())
}
