mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::Result;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::Serialize;
use std::time::Duration;

/// Posts `body` as JSON to `url` through `client`, bounded by `timeout`.
///
/// The response is returned as-is; callers decide how to treat non-success statuses.
pub async fn post_json<C: HttpClient, T: Serialize + ?Sized>(
    client: &C,
    url: &str,
    body: &T,
    timeout: Duration,
) -> Result<reqwest::Response> {
    let mut req = reqwest::Request::new(reqwest::Method::POST, url.parse()?);
    req.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    *req.body_mut() = Some(serde_json::to_vec(body)?.into());
    *req.timeout_mut() = Some(timeout);

    Ok(client.execute(req).await?)
}
