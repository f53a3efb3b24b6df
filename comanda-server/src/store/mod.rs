//! Document store adapter
//!
//! The venue database is an external collaborator that only offers
//! single-document reads and revision-checked writes - no transactions.
//! [`DocumentStore`] is the seam: `get`/`save`/`delete` on one document
//! plus `query_partition` over a partition prefix. [`memory::MemoryStore`]
//! implements it for tests and embedding.
//!
//! Document ids are `partition:uuid`; partitions are flat namespaces, one
//! per document type.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::CoreError;
use thiserror::Error;

/// Partition keys, one per document type
pub mod partitions {
    pub const ORDERS: &str = "orders";
    pub const TICKETS: &str = "tickets";
    pub const CANCELLATIONS: &str = "cancellations";
    pub const INVENTORY: &str = "inventory";
    pub const INGREDIENTS: &str = "ingredients";
    pub const DISH_INGREDIENTS: &str = "dish_ingredients";
    pub const CLOSURES: &str = "closures";
    pub const COUNTERS: &str = "counters";
}

/// Adapter errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// The supplied revision no longer matches the stored document
    #[error("Revision conflict on {0}")]
    Conflict(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(id) => CoreError::ConcurrentModification(id),
            StoreError::NotFound(id) => CoreError::NotFound(id),
            other => CoreError::Store(other.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Opaque revision token identifying the exact version of a document read.
/// Required to authorize the document's next write.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Revision(String);

impl Revision {
    pub fn new(token: impl Into<String>) -> Self {
        Revision(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generate a fresh document id in a partition
pub fn new_doc_id(partition: &str) -> String {
    format!("{}:{}", partition, uuid::Uuid::new_v4())
}

/// Revision-checked document store
///
/// `save` with `None` creates a new document; `save` with `Some(rev)`
/// replaces the exact version that was read. Writers racing on the same
/// document see exactly one success; the loser gets [`StoreError::Conflict`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, id: &str) -> StoreResult<(Value, Revision)>;

    async fn save(&self, id: &str, doc: Value, rev: Option<&Revision>) -> StoreResult<Revision>;

    async fn delete(&self, id: &str, rev: &Revision) -> StoreResult<()>;

    /// All documents of a partition, with their current revisions
    async fn query_partition(&self, partition: &str) -> StoreResult<Vec<(Value, Revision)>>;
}

/// Typed convenience layer over the raw JSON interface
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    async fn get_typed<T: DeserializeOwned + Send>(&self, id: &str) -> StoreResult<(T, Revision)> {
        let (value, rev) = self.get(id).await?;
        let doc =
            serde_json::from_value(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok((doc, rev))
    }

    async fn save_typed<T: Serialize + Send + Sync>(
        &self,
        id: &str,
        doc: &T,
        rev: Option<&Revision>,
    ) -> StoreResult<Revision> {
        let value =
            serde_json::to_value(doc).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.save(id, value, rev).await
    }

    async fn query_typed<T: DeserializeOwned + Send>(
        &self,
        partition: &str,
    ) -> StoreResult<Vec<T>> {
        let rows = self.query_partition(partition).await?;
        rows.into_iter()
            .map(|(value, _)| {
                serde_json::from_value(value)
                    .map_err(|e| StoreError::Serialization(e.to_string()))
            })
            .collect()
    }

    async fn query_typed_with_revisions<T: DeserializeOwned + Send>(
        &self,
        partition: &str,
    ) -> StoreResult<Vec<(T, Revision)>> {
        let rows = self.query_partition(partition).await?;
        rows.into_iter()
            .map(|(value, rev)| {
                serde_json::from_value(value)
                    .map(|doc| (doc, rev))
                    .map_err(|e| StoreError::Serialization(e.to_string()))
            })
            .collect()
    }
}

impl<S: DocumentStore + ?Sized> DocumentStoreExt for S {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_id_carries_partition_prefix() {
        let id = new_doc_id(partitions::ORDERS);
        assert!(id.starts_with("orders:"));
    }

    #[test]
    fn test_conflict_maps_to_concurrent_modification() {
        let err: CoreError = StoreError::Conflict("orders:1".into()).into();
        assert!(matches!(err, CoreError::ConcurrentModification(_)));
        let err: CoreError = StoreError::NotFound("orders:1".into()).into();
        assert!(matches!(err, CoreError::NotFound(_)));
        let err: CoreError = StoreError::Backend("io".into()).into();
        assert!(matches!(err, CoreError::Store(_)));
    }
}
