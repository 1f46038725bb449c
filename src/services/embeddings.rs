//! Trait for turning text into embedding vectors.

use anyhow::Result;

#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    /// Returns one vector per input text, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
