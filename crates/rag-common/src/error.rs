/// Error types for the infrastructure shared by the RAG crates.
///
/// These cover the external systems (Redis, vector DB, embeddings, PDF decoding).
/// Service-level errors live in the server crate and wrap `CommonError` via `#[from]`.

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("vector db error: {0}")]
    VectorDb(String),

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("pdf error: {0}")]
    Pdf(String),
}
