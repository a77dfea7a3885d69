/// Retrieval over document collections.
///
/// Embeds the query, runs a top-k vector search in the collection's LanceDB table and
/// caches the hits in Redis when available.
use std::sync::Arc;

use arrow_array::{Array, Int64Array, RecordBatch, StringArray};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cache::RetrievalCache;
use crate::error::AppError;
use rag_common::embedding::Embedder;
use rag_common::vectordb::VectorDb;

const MAX_COLLECTION_NAME_LEN: usize = 128;

/// One chunk returned by a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub source: String,
    pub chunk_index: i64,
    pub text: String,
}

pub struct Retriever {
    embedder: Arc<Embedder>,
    vectordb: Arc<VectorDb>,
    cache: Arc<RetrievalCache>,
    top_k: usize,
}

impl Retriever {
    pub fn new(
        embedder: Arc<Embedder>,
        vectordb: Arc<VectorDb>,
        cache: Arc<RetrievalCache>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            vectordb,
            cache,
            top_k,
        }
    }

    /// The `top_k` chunks of `collection` nearest to `query`, closest first.
    ///
    /// A collection that has never been written to yields no chunks; the prompt is then
    /// sent with an empty context.
    pub async fn retrieve(&self, query: &str, collection: &str) -> Result<Vec<RetrievedChunk>, AppError> {
        validate_collection_name(collection)?;

        if let Some(cached) = self.cache.get(collection, query, self.top_k).await {
            info!(collection, chunks = cached.len(), "retrieval cache hit");
            return Ok(cached);
        }

        if !self.vectordb.table_exists(collection).await? {
            warn!(collection, "collection does not exist, retrieving nothing");
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed_query(query).await?;
        let batches = self
            .vectordb
            .search(collection, &query_embedding, self.top_k)
            .await?;
        let chunks = extract_chunks(&batches);
        info!(collection, chunks = chunks.len(), "retrieved chunks");

        self.cache.set(collection, query, self.top_k, &chunks).await;
        Ok(chunks)
    }

    pub async fn list_collections(&self) -> Result<Vec<String>, AppError> {
        Ok(self.vectordb.table_names().await?)
    }

    pub async fn delete_collection(&self, collection: &str) -> Result<(), AppError> {
        validate_collection_name(collection)?;
        if !self.vectordb.table_exists(collection).await? {
            return Err(AppError::NotFound(format!(
                "Collection '{collection}' does not exist"
            )));
        }
        self.vectordb.drop_table(collection).await?;
        self.cache.invalidate_collection(collection).await;
        Ok(())
    }
}

/// Join chunk texts with a blank line, in retrieval order.
pub fn combine(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Collection names become LanceDB table names and Redis key segments: ASCII letters,
/// digits, `_`, `-` and `.` only.
pub fn validate_collection_name(name: &str) -> Result<(), AppError> {
    if name.is_empty() || name.len() > MAX_COLLECTION_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "collection name must be 1 to {MAX_COLLECTION_NAME_LEN} characters"
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(AppError::BadRequest(format!(
            "invalid collection name '{name}': use letters, digits, '_', '-' or '.'"
        )));
    }
    Ok(())
}

/// Expected columns: source (Utf8), chunk_index (Int64), text (Utf8).
fn extract_chunks(batches: &[RecordBatch]) -> Vec<RetrievedChunk> {
    let mut chunks = Vec::new();

    for batch in batches {
        let schema = batch.schema();
        let source_col = column::<StringArray>(batch, &schema, "source");
        let index_col = column::<Int64Array>(batch, &schema, "chunk_index");
        let text_col = column::<StringArray>(batch, &schema, "text");

        let (Some(source_col), Some(index_col), Some(text_col)) = (source_col, index_col, text_col)
        else {
            warn!("search result batch missing expected columns");
            continue;
        };

        for row in 0..batch.num_rows() {
            chunks.push(RetrievedChunk {
                source: source_col.value(row).to_string(),
                chunk_index: index_col.value(row),
                text: text_col.value(row).to_string(),
            });
        }
    }

    chunks
}

fn column<'a, T: 'static>(
    batch: &'a RecordBatch,
    schema: &arrow_schema::Schema,
    name: &str,
) -> Option<&'a T> {
    let idx = schema.index_of(name).ok()?;
    batch.column(idx).as_any().downcast_ref::<T>()
}
