//! LanceDB-backed document store.
//!
//! Implements `VectorStore` from `recall-core` over a single `documents`
//! table. Cosine distance drives the similarity search; the reported
//! score is `1.0 / (1.0 + distance)` so higher always means closer.
//!
//! Well-known metadata keys (`conversation_id`, `chunk_index`) are stored
//! as real columns so SQL filter predicates can reach them, and restored
//! into `metadata.extra` when documents are read back.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use arrow_array::{
    Array, FixedSizeListArray, Float32Array, Int32Array, RecordBatch, RecordBatchIterator,
    StringArray,
};
use arrow_schema::{DataType, Field};
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use lancedb::DistanceType;
use lancedb::query::{ExecutableQuery, QueryBase};

use recall_core::storage::VectorStore;
use recall_types::document::{
    Document, DocumentMetadata, EXTRA_CHUNK_INDEX, EXTRA_CONVERSATION_ID, SearchFilter,
    SearchResult, Source,
};
use recall_types::error::StorageError;

use super::lance::LanceVectorStore;
use super::schema::documents_schema;

/// LanceDB-backed implementation of `VectorStore`.
///
/// The embedding dimension is fixed at construction and must match the
/// provider feeding this store; every add and search is validated
/// against it.
pub struct LanceDocumentStore {
    store: LanceVectorStore,
    dimension: usize,
}

impl LanceDocumentStore {
    /// Open or create a document store at `base_path` with the given
    /// embedding dimension.
    pub async fn new(base_path: PathBuf, dimension: usize) -> Result<Self, StorageError> {
        let store = LanceVectorStore::new(base_path)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(Self::from_store(store, dimension))
    }

    /// Wrap an already-open connection.
    pub fn from_store(store: LanceVectorStore, dimension: usize) -> Self {
        Self { store, dimension }
    }

    /// Ensure the documents table exists, creating it if needed.
    async fn ensure_documents_table(&self) -> Result<lancedb::Table, StorageError> {
        let schema = Arc::new(documents_schema(self.dimension as i32));
        self.store
            .ensure_table(LanceVectorStore::documents_table_name(), schema)
            .await
            .map_err(|e| StorageError::Query(format!("failed to ensure documents table: {e}")))
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), StorageError> {
        if vector.len() != self.dimension {
            return Err(StorageError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    /// Escape a value for use inside a single-quoted SQL string literal.
    fn escape(value: &str) -> String {
        value.replace('\'', "''")
    }

    /// Build the SQL predicate for a search filter, if any field is set.
    fn filter_predicate(filter: &SearchFilter) -> Option<String> {
        let mut clauses = Vec::new();
        if let Some(source) = filter.source {
            clauses.push(format!("source = '{source}'"));
        }
        if let Some(project_path) = &filter.project_path {
            clauses.push(format!("project_path = '{}'", Self::escape(project_path)));
        }
        if let Some(conversation_id) = &filter.conversation_id {
            clauses.push(format!(
                "conversation_id = '{}'",
                Self::escape(conversation_id)
            ));
        }
        if clauses.is_empty() {
            None
        } else {
            Some(clauses.join(" AND "))
        }
    }

    /// Build an Arrow RecordBatch from documents and their embeddings.
    fn build_record_batch(
        &self,
        documents: &[Document],
        embeddings: &[Vec<f32>],
    ) -> Result<RecordBatch, StorageError> {
        let schema = Arc::new(documents_schema(self.dimension as i32));

        let mut ids = Vec::with_capacity(documents.len());
        let mut texts = Vec::with_capacity(documents.len());
        let mut sources = Vec::with_capacity(documents.len());
        let mut project_paths: Vec<Option<String>> = Vec::with_capacity(documents.len());
        let mut conversation_ids: Vec<Option<String>> = Vec::with_capacity(documents.len());
        let mut chunk_indices: Vec<Option<i32>> = Vec::with_capacity(documents.len());
        let mut created_ats = Vec::with_capacity(documents.len());
        let mut extras = Vec::with_capacity(documents.len());

        for document in documents {
            let mut extra = document.metadata.extra.clone();
            let conversation_id = extra.remove(EXTRA_CONVERSATION_ID);
            let chunk_index = extra
                .remove(EXTRA_CHUNK_INDEX)
                .and_then(|v| v.parse::<i32>().ok());

            ids.push(document.id.clone());
            texts.push(document.text.clone());
            sources.push(document.metadata.source.to_string());
            project_paths.push(document.metadata.project_path.clone());
            conversation_ids.push(conversation_id);
            chunk_indices.push(chunk_index);
            created_ats.push(document.metadata.created_at.to_rfc3339());
            extras.push(serde_json::to_string(&extra)?);
        }

        let values = Float32Array::from(
            embeddings
                .iter()
                .flat_map(|v| v.iter().copied())
                .collect::<Vec<f32>>(),
        );
        let field = Arc::new(Field::new("item", DataType::Float32, true));
        let vector_array =
            FixedSizeListArray::new(field, self.dimension as i32, Arc::new(values), None);

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(ids)),
                Arc::new(StringArray::from(texts)),
                Arc::new(StringArray::from(sources)),
                Arc::new(StringArray::from(project_paths)),
                Arc::new(StringArray::from(conversation_ids)),
                Arc::new(Int32Array::from(chunk_indices)),
                Arc::new(StringArray::from(created_ats)),
                Arc::new(StringArray::from(extras)),
                Arc::new(vector_array),
            ],
        )
        .map_err(|e| StorageError::Query(format!("failed to build record batch: {e}")))
    }

    /// Parse RecordBatch rows back into documents, restoring the
    /// promoted metadata keys into `extra`.
    fn record_batch_to_documents(batch: &RecordBatch) -> Vec<Document> {
        let num_rows = batch.num_rows();
        if num_rows == 0 {
            return vec![];
        }

        let id_col = batch
            .column_by_name("id")
            .and_then(|c| c.as_any().downcast_ref::<StringArray>())
            .expect("id column should be StringArray");
        let text_col = batch
            .column_by_name("text")
            .and_then(|c| c.as_any().downcast_ref::<StringArray>())
            .expect("text column should be StringArray");
        let source_col = batch
            .column_by_name("source")
            .and_then(|c| c.as_any().downcast_ref::<StringArray>())
            .expect("source column should be StringArray");
        let project_path_col = batch
            .column_by_name("project_path")
            .and_then(|c| c.as_any().downcast_ref::<StringArray>())
            .expect("project_path column should be StringArray");
        let conversation_id_col = batch
            .column_by_name("conversation_id")
            .and_then(|c| c.as_any().downcast_ref::<StringArray>())
            .expect("conversation_id column should be StringArray");
        let chunk_index_col = batch
            .column_by_name("chunk_index")
            .and_then(|c| c.as_any().downcast_ref::<Int32Array>())
            .expect("chunk_index column should be Int32Array");
        let created_at_col = batch
            .column_by_name("created_at")
            .and_then(|c| c.as_any().downcast_ref::<StringArray>())
            .expect("created_at column should be StringArray");
        let extra_col = batch
            .column_by_name("extra")
            .and_then(|c| c.as_any().downcast_ref::<StringArray>())
            .expect("extra column should be StringArray");

        let mut documents = Vec::with_capacity(num_rows);

        for i in 0..num_rows {
            let source: Source = source_col
                .value(i)
                .parse()
                .unwrap_or(Source::ClaudeCode);
            let created_at = DateTime::parse_from_rfc3339(created_at_col.value(i))
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now());

            let mut extra: BTreeMap<String, String> =
                serde_json::from_str(extra_col.value(i)).unwrap_or_default();
            if !conversation_id_col.is_null(i) {
                extra.insert(
                    EXTRA_CONVERSATION_ID.to_string(),
                    conversation_id_col.value(i).to_string(),
                );
            }
            if !chunk_index_col.is_null(i) {
                extra.insert(
                    EXTRA_CHUNK_INDEX.to_string(),
                    chunk_index_col.value(i).to_string(),
                );
            }

            let project_path = if project_path_col.is_null(i) {
                None
            } else {
                Some(project_path_col.value(i).to_string())
            };

            documents.push(Document {
                id: id_col.value(i).to_string(),
                text: text_col.value(i).to_string(),
                metadata: DocumentMetadata {
                    source,
                    project_path,
                    created_at,
                    extra,
                },
            });
        }

        documents
    }
}

impl VectorStore for LanceDocumentStore {
    async fn add(&self, document: &Document, embedding: &[f32]) -> Result<String, StorageError> {
        let embeddings = vec![embedding.to_vec()];
        self.add_batch(std::slice::from_ref(document), &embeddings)
            .await?;
        Ok(document.id.clone())
    }

    async fn add_batch(
        &self,
        documents: &[Document],
        embeddings: &[Vec<f32>],
    ) -> Result<(), StorageError> {
        if documents.len() != embeddings.len() {
            return Err(StorageError::Query(format!(
                "documents and embeddings must have the same length ({} != {})",
                documents.len(),
                embeddings.len()
            )));
        }
        for embedding in embeddings {
            self.check_dimension(embedding)?;
        }
        if documents.is_empty() {
            return Ok(());
        }

        let table = self.ensure_documents_table().await?;

        let batch = self.build_record_batch(documents, embeddings)?;
        let schema = batch.schema();
        let reader = RecordBatchIterator::new(vec![Ok(batch)], schema);

        // Single-commit upsert on id: matching rows are replaced, new
        // rows inserted. Existing documents stay visible until the merge
        // commits, so an error or a dropped future cannot lose them.
        let mut merge = table.merge_insert(&["id"]);
        merge
            .when_matched_update_all(None)
            .when_not_matched_insert_all();
        merge
            .execute(Box::new(reader))
            .await
            .map_err(|e| StorageError::Query(format!("failed to upsert documents: {e}")))?;

        tracing::debug!(count = documents.len(), "documents written");
        Ok(())
    }

    async fn search(
        &self,
        query: &[f32],
        limit: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<SearchResult>, StorageError> {
        self.check_dimension(query)?;
        let table = self.ensure_documents_table().await?;

        let mut vector_query = table
            .vector_search(query)
            .map_err(|e| StorageError::Query(format!("vector search setup failed: {e}")))?
            .distance_type(DistanceType::Cosine)
            .limit(limit);

        // Filter predicates run before the limit is applied.
        if let Some(predicate) = filter.and_then(Self::filter_predicate) {
            vector_query = vector_query.only_if(predicate);
        }

        let results = vector_query
            .execute()
            .await
            .map_err(|e| StorageError::Query(format!("vector search failed: {e}")))?;

        let batches: Vec<RecordBatch> = results
            .try_collect()
            .await
            .map_err(|e| StorageError::Query(format!("failed to collect results: {e}")))?;

        let mut search_results: Vec<SearchResult> = Vec::new();
        for batch in &batches {
            if batch.num_rows() == 0 {
                continue;
            }
            let distance_col = batch
                .column_by_name("_distance")
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>());

            let documents = Self::record_batch_to_documents(batch);
            for (i, document) in documents.into_iter().enumerate() {
                let distance = distance_col.map_or(0.0, |d| d.value(i));
                search_results.push(SearchResult {
                    document,
                    score: 1.0 / (1.0 + distance),
                    distance,
                });
            }
        }

        // Descending score; equal scores break by ascending id, which for
        // generated v7 ids is insertion order.
        search_results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.document.id.cmp(&b.document.id))
        });
        search_results.truncate(limit);

        Ok(search_results)
    }

    async fn get(&self, id: &str) -> Result<Option<Document>, StorageError> {
        let table = self.ensure_documents_table().await?;

        let results = table
            .query()
            .only_if(format!("id = '{}'", Self::escape(id)))
            .limit(1)
            .execute()
            .await
            .map_err(|e| StorageError::Query(format!("failed to query document: {e}")))?;

        let batches: Vec<RecordBatch> = results
            .try_collect()
            .await
            .map_err(|e| StorageError::Query(format!("failed to collect results: {e}")))?;

        for batch in &batches {
            if let Some(document) = Self::record_batch_to_documents(batch).into_iter().next() {
                return Ok(Some(document));
            }
        }
        Ok(None)
    }

    async fn delete(&self, id: &str) -> Result<(), StorageError> {
        let table = self.ensure_documents_table().await?;
        table
            .delete(&format!("id = '{}'", Self::escape(id)))
            .await
            .map_err(|e| StorageError::Query(format!("failed to delete document: {e}")))?;
        Ok(())
    }

    async fn delete_by_conversation(&self, conversation_id: &str) -> Result<u64, StorageError> {
        let table = self.ensure_documents_table().await?;
        let predicate = format!("conversation_id = '{}'", Self::escape(conversation_id));

        let count = table
            .count_rows(Some(predicate.clone()))
            .await
            .map_err(|e| StorageError::Query(format!("failed to count documents: {e}")))?;

        table
            .delete(&predicate)
            .await
            .map_err(|e| StorageError::Query(format!("failed to delete documents: {e}")))?;

        Ok(count as u64)
    }

    async fn count(&self) -> Result<u64, StorageError> {
        let table = self.ensure_documents_table().await?;
        let count = table
            .count_rows(None)
            .await
            .map_err(|e| StorageError::Query(format!("failed to count documents: {e}")))?;
        Ok(count as u64)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
