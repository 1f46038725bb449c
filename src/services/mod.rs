//! Provider-neutral traits for the assistant collaborators.

pub mod chat;
pub mod embeddings;

use thiserror::Error;

/// Failure reported by an upstream model provider.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("provider rejected the credentials (status {0})")]
    Auth(u16),
    #[error("provider is rate limiting requests, retry shortly")]
    RateLimited,
    #[error("provider is temporarily unavailable (status {0})")]
    Unavailable(u16),
    #[error("provider rejected the request (status {status}): {message}")]
    BadRequest { status: u16, message: String },
    #[error("provider request timed out")]
    Timeout,
    #[error("provider could not be reached")]
    Unreachable,
    #[error("provider returned an invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Maps a non-success HTTP status to its error. Returns `None` for 1xx-3xx.
    pub fn from_status(status: u16, body: &str) -> Option<Self> {
        match status {
            401 | 403 => Some(Self::Auth(status)),
            429 => Some(Self::RateLimited),
            s if s >= 500 => Some(Self::Unavailable(s)),
            s if s >= 400 => Some(Self::BadRequest {
                status: s,
                message: error_message(body),
            }),
            _ => None,
        }
    }
}

/// Pulls `error.message` out of a provider error body, falling back to a generic message.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| "unexpected response from provider".to_string())
}
