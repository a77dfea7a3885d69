/// LanceDB vector database wrapper.
///
/// Each document collection is one LanceDB table. Tables are created on the first
/// write and appended to afterwards; the schema is owned by the caller.
use std::sync::Arc;

use arrow_array::{RecordBatch, RecordBatchIterator};
use arrow_schema::Schema;
use lancedb::query::{ExecutableQuery, QueryBase};
use tracing::info;

use crate::error::CommonError;

pub struct VectorDb {
    db: lancedb::Connection,
}

impl VectorDb {
    /// Connect to a LanceDB database at the given filesystem path.
    pub async fn connect(path: &str) -> Result<Self, CommonError> {
        let db = lancedb::connect(path)
            .execute()
            .await
            .map_err(|e| CommonError::VectorDb(format!("connection failed: {e}")))?;
        Ok(Self { db })
    }

    pub async fn table_names(&self) -> Result<Vec<String>, CommonError> {
        self.db
            .table_names()
            .execute()
            .await
            .map_err(|e| CommonError::VectorDb(format!("listing tables failed: {e}")))
    }

    pub async fn table_exists(&self, table_name: &str) -> Result<bool, CommonError> {
        Ok(self.table_names().await?.iter().any(|t| t == table_name))
    }

    /// Append `batches` to `table_name`, creating the table with `schema` if it does
    /// not exist yet.
    pub async fn append_or_create(
        &self,
        table_name: &str,
        schema: Arc<Schema>,
        batches: Vec<RecordBatch>,
    ) -> Result<(), CommonError> {
        let batch_iter = RecordBatchIterator::new(batches.into_iter().map(Ok), schema);

        if self.table_exists(table_name).await? {
            let table = self.open(table_name).await?;
            table
                .add(Box::new(batch_iter))
                .execute()
                .await
                .map_err(|e| CommonError::VectorDb(format!("append failed: {e}")))?;
            info!(table = table_name, "vector table appended");
        } else {
            self.db
                .create_table(table_name, Box::new(batch_iter))
                .execute()
                .await
                .map_err(|e| CommonError::VectorDb(format!("create table failed: {e}")))?;
            info!(table = table_name, "vector table created");
        }
        Ok(())
    }

    pub async fn drop_table(&self, table_name: &str) -> Result<(), CommonError> {
        self.db
            .drop_table(table_name)
            .await
            .map_err(|e| CommonError::VectorDb(format!("drop table failed: {e}")))?;
        info!(table = table_name, "vector table dropped");
        Ok(())
    }

    /// Search for the nearest vectors to the given query embedding.
    ///
    /// Returns up to `limit` rows as RecordBatches, including the `_distance` column
    /// added by LanceDB.
    pub async fn search(
        &self,
        table_name: &str,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<RecordBatch>, CommonError> {
        let table = self.open(table_name).await?;

        let results = table
            .vector_search(query_embedding)
            .map_err(|e| CommonError::VectorDb(format!("vector search setup failed: {e}")))?
            .limit(limit)
            .execute()
            .await
            .map_err(|e| CommonError::VectorDb(format!("vector search failed: {e}")))?;

        futures::TryStreamExt::try_collect(results)
            .await
            .map_err(|e| CommonError::VectorDb(format!("collecting search results failed: {e}")))
    }

    async fn open(&self, table_name: &str) -> Result<lancedb::Table, CommonError> {
        self.db
            .open_table(table_name)
            .execute()
            .await
            .map_err(|e| CommonError::VectorDb(format!("open table {table_name} failed: {e}")))
    }
}
