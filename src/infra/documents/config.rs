use anyhow::{Result, bail};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::infra::openai::parse_timeout;

pub const DEFAULT_CHUNK_STORE_PATH: &str = "rag_manifest.jsonl";
pub const DEFAULT_INDEX_PATH: &str = "rag_embeddings.jsonl";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-large";
pub const DEFAULT_EMBEDDING_URL: &str = "https://api.openai.com/v1/embeddings";
pub const DEFAULT_EMBEDDING_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingConfig {
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub api_key: Option<String>,
}

/// Settings for document-mode retrieval.
///
/// ```text
/// RAG_MODE=documents
/// RAG_CHUNK_STORE_PATH=rag_manifest.jsonl
/// RAG_INDEX_PATH=rag_embeddings.jsonl
/// EMBEDDING_MODEL=text-embedding-3-large
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentConfig {
    /// `true` when `RAG_MODE=documents`.
    pub enabled: bool,
    pub chunk_store_path: PathBuf,
    pub index_path: PathBuf,
    pub embedding: EmbeddingConfig,
}

impl DocumentConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout = match non_empty("EMBEDDING_TIMEOUT_SECONDS") {
            Some(v) => parse_timeout("EMBEDDING_TIMEOUT_SECONDS", &v)?,
            None => Duration::from_secs(DEFAULT_EMBEDDING_TIMEOUT_SECONDS),
        };

        Ok(Self {
            enabled: non_empty("RAG_MODE")
                .is_some_and(|mode| mode.trim().eq_ignore_ascii_case("documents")),
            chunk_store_path: non_empty("RAG_CHUNK_STORE_PATH")
                .unwrap_or_else(|| DEFAULT_CHUNK_STORE_PATH.to_string())
                .into(),
            index_path: non_empty("RAG_INDEX_PATH")
                .unwrap_or_else(|| DEFAULT_INDEX_PATH.to_string())
                .into(),
            embedding: EmbeddingConfig {
                model: non_empty("EMBEDDING_MODEL")
                    .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
                base_url: non_empty("EMBEDDING_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_EMBEDDING_URL.to_string()),
                timeout,
                api_key: non_empty("OPENAI_API_KEY"),
            },
        })
    }

    /// Checks that both retrieval artifacts are readable files.
    ///
    /// Does nothing unless document mode is enabled. Every missing artifact is
    /// named in the returned error.
    pub fn validate(&self) -> Result<()> {
        if !self.enabled {
            info!("Document retrieval disabled, skipping artifact checks");
            return Ok(());
        }

        let problems: Vec<String> = [
            ("RAG index", "RAG_INDEX_PATH", &self.index_path),
            ("RAG chunk store", "RAG_CHUNK_STORE_PATH", &self.chunk_store_path),
        ]
        .into_iter()
        .filter(|(_, _, path)| !is_readable_file(path))
        .map(|(what, key, path)| format!("{what} missing at {} (set {key}).", path.display()))
        .collect();

        if !problems.is_empty() {
            bail!(problems.join(" "));
        }

        info!(
            index = %self.index_path.display(),
            chunk_store = %self.chunk_store_path.display(),
            "Document retrieval artifacts present"
        );
        Ok(())
    }
}

fn is_readable_file(path: &Path) -> bool {
    path.is_file() && File::open(path).is_ok()
}
