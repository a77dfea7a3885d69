/// Embedding wrapper around fastembed.
///
/// `TextEmbedding` is synchronous and CPU-bound, so every embed call is dispatched to
/// `tokio::task::spawn_blocking` and the model is shared through an `Arc`.
///
/// The all-MiniLM-L6-v2 model takes raw text: documents and queries share one
/// embedding space without task prefixes.
use std::sync::Arc;

use crate::error::CommonError;

pub const EMBEDDING_DIM: usize = 384;

/// Documents per ONNX inference batch, bounding peak memory on large uploads.
const DOCUMENT_BATCH_SIZE: usize = 16;

pub struct Embedder {
    model: Arc<fastembed::TextEmbedding>,
}

impl Embedder {
    /// Load the embedding model, downloading it on first run (~90MB).
    pub async fn new() -> Result<Self, CommonError> {
        let model = tokio::task::spawn_blocking(|| {
            let options = fastembed::InitOptions::new(fastembed::EmbeddingModel::AllMiniLML6V2)
                .with_show_download_progress(false);
            fastembed::TextEmbedding::try_new(options)
        })
        .await
        .map_err(|e| CommonError::Embedding(format!("spawn_blocking join error: {e}")))?
        .map_err(|e| CommonError::Embedding(format!("model initialization failed: {e}")))?;

        Ok(Self {
            model: Arc::new(model),
        })
    }

    /// Embed document chunks for indexing. Output order matches `texts`.
    pub async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, CommonError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let expected = texts.len();
        let model = Arc::clone(&self.model);
        let embeddings =
            tokio::task::spawn_blocking(move || model.embed(texts, Some(DOCUMENT_BATCH_SIZE)))
                .await
                .map_err(|e| CommonError::Embedding(format!("spawn_blocking join error: {e}")))?
                .map_err(|e| CommonError::Embedding(format!("document embedding failed: {e}")))?;

        if embeddings.len() != expected {
            return Err(CommonError::Embedding(format!(
                "embedding count mismatch: expected {expected}, got {}",
                embeddings.len()
            )));
        }
        Ok(embeddings)
    }

    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>, CommonError> {
        let input = vec![query.to_string()];
        let model = Arc::clone(&self.model);
        let mut results = tokio::task::spawn_blocking(move || model.embed(input, None))
            .await
            .map_err(|e| CommonError::Embedding(format!("spawn_blocking join error: {e}")))?
            .map_err(|e| CommonError::Embedding(format!("query embedding failed: {e}")))?;
        results
            .pop()
            .ok_or_else(|| CommonError::Embedding("empty embedding result".to_string()))
    }

    pub fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }
}
