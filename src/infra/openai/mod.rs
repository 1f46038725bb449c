//! OpenAI-compatible HTTP implementations of the assistant collaborators.

pub mod chat;
pub mod embeddings;

pub use chat::{ChatConfig, OpenAiChat};
pub use embeddings::OpenAiEmbedder;

use anyhow::{Result, anyhow};
use std::time::Duration;

use crate::services::ProviderError;

/// Turns a transport failure into a [`ProviderError`] where one applies.
fn transport_error(err: anyhow::Error) -> anyhow::Error {
    match err.downcast_ref::<reqwest::Error>() {
        Some(e) if e.is_timeout() => ProviderError::Timeout.into(),
        Some(e) if e.is_connect() => ProviderError::Unreachable.into(),
        _ => err,
    }
}

/// Reads the body of `response`, failing with the mapped [`ProviderError`]
/// when the status is not a success.
async fn checked_body(response: reqwest::Response) -> Result<String> {
    let status = response.status().as_u16();
    let body = response.text().await?;
    match ProviderError::from_status(status, &body) {
        Some(err) => Err(err.into()),
        None => Ok(body),
    }
}

/// Parses a timeout given in (possibly fractional) seconds.
pub fn parse_timeout(key: &str, value: &str) -> Result<Duration> {
    let seconds: f64 = value
        .trim()
        .parse()
        .map_err(|_| anyhow!("{key} is not a number: '{value}'"))?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(anyhow!("{key} must be positive, got '{value}'"));
    }
    Ok(Duration::from_secs_f64(seconds))
}
