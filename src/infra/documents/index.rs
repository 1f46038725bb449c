use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

#[derive(Deserialize)]
struct IndexRecord {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    metadata: Option<Value>,
    #[serde(default)]
    embedding: Option<Vec<f32>>,
}

#[derive(Debug, Clone)]
pub struct DocumentChunk {
    pub id: String,
    pub text: String,
    pub metadata: Value,
    embedding: Vec<f32>,
    norm: f32,
}

#[derive(Debug)]
pub struct SearchHit<'a> {
    pub score: f32,
    pub chunk: &'a DocumentChunk,
}

/// Embedded document chunks, one JSON object per line.
#[derive(Debug, Default)]
pub struct DocumentIndex {
    chunks: Vec<DocumentChunk>,
}

impl DocumentIndex {
    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open RAG index {}", path.display()))?;

        let mut chunks = Vec::new();
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<IndexRecord>(&line) {
                Ok(record) => chunks.push(DocumentChunk::from(record)),
                Err(e) => warn!(line = line_no + 1, error = %e, "Skipping malformed index line"),
            }
        }

        info!(chunks = chunks.len(), "RAG index loaded");
        Ok(Self { chunks })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Returns up to `top_k` chunks ranked by cosine similarity to `query`.
    pub fn search(&self, query: &[f32], top_k: usize) -> Vec<SearchHit<'_>> {
        let query_norm = norm(query);
        if query_norm == 0.0 {
            return Vec::new();
        }

        let mut hits: Vec<SearchHit<'_>> = self
            .chunks
            .iter()
            .filter(|chunk| chunk.norm > 0.0)
            .map(|chunk| {
                let dot: f32 = query.iter().zip(&chunk.embedding).map(|(q, c)| q * c).sum();
                SearchHit {
                    score: dot / (query_norm * chunk.norm),
                    chunk,
                }
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_k);
        hits
    }
}

impl From<IndexRecord> for DocumentChunk {
    fn from(record: IndexRecord) -> Self {
        let embedding = record.embedding.unwrap_or_default();
        Self {
            id: match record.id {
                Value::String(s) => s,
                other => other.to_string(),
            },
            text: record.text.unwrap_or_default(),
            metadata: record.metadata.unwrap_or(Value::Null),
            norm: norm(&embedding),
            embedding,
        }
    }
}

fn norm(values: &[f32]) -> f32 {
    values.iter().map(|v| v * v).sum::<f32>().sqrt()
}
