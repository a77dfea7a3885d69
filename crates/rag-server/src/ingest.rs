/// PDF ingestion: extract, chunk, embed and append to a collection table.
use std::sync::Arc;

use arrow_array::{ArrayRef, FixedSizeListArray, Float32Array, Int64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use tracing::info;

use crate::cache::RetrievalCache;
use crate::chunker::Chunker;
use crate::error::AppError;
use crate::retrieval::validate_collection_name;
use rag_common::embedding::{Embedder, EMBEDDING_DIM};
use rag_common::error::CommonError;
use rag_common::pdf::extract_pdf_text;
use rag_common::vectordb::VectorDb;

pub struct Ingestor {
    embedder: Arc<Embedder>,
    vectordb: Arc<VectorDb>,
    cache: Arc<RetrievalCache>,
    chunker: Chunker,
}

impl Ingestor {
    pub fn new(
        embedder: Arc<Embedder>,
        vectordb: Arc<VectorDb>,
        cache: Arc<RetrievalCache>,
        chunker: Chunker,
    ) -> Self {
        Self {
            embedder,
            vectordb,
            cache,
            chunker,
        }
    }

    /// Index `bytes` (a PDF named `file_name`) into `collection`, creating the
    /// collection on first use. Returns the number of chunks written.
    pub async fn ingest_pdf(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        collection: &str,
    ) -> Result<usize, AppError> {
        validate_collection_name(collection)?;

        let text = extract_pdf_text(bytes).await?;
        let chunks = self.chunker.chunk(&text);
        if chunks.is_empty() {
            return Err(AppError::BadRequest(format!(
                "No text could be extracted from '{file_name}'"
            )));
        }
        let count = chunks.len();
        info!(file_name, collection, chunks = count, "pdf chunked, embedding");

        let embeddings = self.embedder.embed_documents(chunks.clone()).await?;
        let batch = build_record_batch(file_name, &chunks, &embeddings)?;

        self.vectordb
            .append_or_create(collection, batch.schema(), vec![batch])
            .await?;
        self.cache.invalidate_collection(collection).await;

        info!(file_name, collection, chunks = count, "pdf indexed");
        Ok(count)
    }
}

pub fn chunk_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("source", DataType::Utf8, false),
        Field::new("chunk_index", DataType::Int64, false),
        Field::new("text", DataType::Utf8, false),
        Field::new(
            "embedding",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                EMBEDDING_DIM as i32,
            ),
            false,
        ),
    ]))
}

/// Build an Arrow RecordBatch from the chunks of one document and their embeddings.
///
/// Row ids are `{file_name}#{chunk_index}`; a re-upload of the same file appends new
/// rows rather than replacing the old ones.
fn build_record_batch(
    file_name: &str,
    chunks: &[String],
    embeddings: &[Vec<f32>],
) -> Result<RecordBatch, AppError> {
    if embeddings.iter().any(|e| e.len() != EMBEDDING_DIM) {
        return Err(vector_error(format!(
            "embedding dimension mismatch: expected {EMBEDDING_DIM}"
        )));
    }

    let ids: Vec<String> = (0..chunks.len()).map(|i| format!("{file_name}#{i}")).collect();
    let id_array: ArrayRef = Arc::new(StringArray::from(ids));
    let source_array: ArrayRef = Arc::new(StringArray::from(vec![file_name; chunks.len()]));
    let index_array: ArrayRef = Arc::new(Int64Array::from_iter_values(0..chunks.len() as i64));
    let text_array: ArrayRef = Arc::new(StringArray::from_iter_values(chunks.iter()));

    let flat_values: Vec<f32> = embeddings.iter().flat_map(|e| e.iter().copied()).collect();
    let embedding_array: ArrayRef = Arc::new(
        FixedSizeListArray::try_new(
            Arc::new(Field::new("item", DataType::Float32, true)),
            EMBEDDING_DIM as i32,
            Arc::new(Float32Array::from(flat_values)),
            None,
        )
        .map_err(|e| vector_error(format!("failed to build embedding array: {e}")))?,
    );

    RecordBatch::try_new(
        chunk_schema(),
        vec![id_array, source_array, index_array, text_array, embedding_array],
    )
    .map_err(|e| vector_error(format!("failed to build record batch: {e}")))
}

fn vector_error(message: String) -> AppError {
    AppError::Common(CommonError::VectorDb(message))
}
