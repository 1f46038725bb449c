//! Document retrieval artifacts: configuration, boot-time validation and the
//! in-memory embeddings index.

mod config;
mod index;

pub use config::{DocumentConfig, EmbeddingConfig};
pub use index::DocumentIndex;
