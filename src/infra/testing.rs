//! Canned-response HTTP client for provider tests.

use async_trait::async_trait;
use count_unify::fetch::HttpClient;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct Captured {
    pub url: String,
    pub authorization: Option<String>,
    pub body: serde_json::Value,
}

pub struct StubClient {
    status: u16,
    body: String,
    pub captured: Mutex<Vec<Captured>>,
}

impl StubClient {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            captured: Mutex::new(Vec::new()),
        }
    }

    pub fn last(&self) -> Captured {
        self.captured.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl HttpClient for StubClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        let body = req
            .body()
            .and_then(|b| b.as_bytes())
            .and_then(|b| serde_json::from_slice(b).ok())
            .unwrap_or(serde_json::Value::Null);
        self.captured.lock().unwrap().push(Captured {
            url: req.url().to_string(),
            authorization: req
                .headers()
                .get(reqwest::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body,
        });

        Ok(reqwest::Response::from(
            ::http::Response::builder()
                .status(self.status)
                .body(self.body.clone())
                .unwrap(),
        ))
    }
}

/// Lets a test keep the stub while an auth wrapper owns a reference to it.
#[async_trait]
impl HttpClient for &StubClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        <StubClient as HttpClient>::execute(*self, req).await
    }
}
