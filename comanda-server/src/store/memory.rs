//! In-memory document store
//!
//! Reference implementation of [`DocumentStore`] with the same concurrency
//! contract as the production backend: per-document revision tokens,
//! compare-and-swap writes, partition-prefix queries. Used by the test
//! suite and for embedding the engine without a database.

use super::{DocumentStore, Revision, StoreError, StoreResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

struct StoredDoc {
    value: Value,
    rev: Revision,
    generation: u64,
}

/// Thread-safe in-memory store
#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<HashMap<String, StoredDoc>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_revision(generation: u64) -> Revision {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Revision::new(format!("{}-{}", generation, &suffix[..8]))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, id: &str) -> StoreResult<(Value, Revision)> {
        let docs = self.docs.read();
        let doc = docs
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Ok((doc.value.clone(), doc.rev.clone()))
    }

    async fn save(&self, id: &str, doc: Value, rev: Option<&Revision>) -> StoreResult<Revision> {
        let mut docs = self.docs.write();
        match (docs.get(id), rev) {
            // Create: the document must not exist yet
            (None, None) => {
                let new_rev = Self::next_revision(1);
                docs.insert(
                    id.to_string(),
                    StoredDoc {
                        value: doc,
                        rev: new_rev.clone(),
                        generation: 1,
                    },
                );
                Ok(new_rev)
            }
            (None, Some(_)) => Err(StoreError::NotFound(id.to_string())),
            (Some(_), None) => Err(StoreError::Conflict(id.to_string())),
            // Update: the supplied revision must match the stored one
            (Some(existing), Some(supplied)) => {
                if existing.rev != *supplied {
                    return Err(StoreError::Conflict(id.to_string()));
                }
                let generation = existing.generation + 1;
                let new_rev = Self::next_revision(generation);
                docs.insert(
                    id.to_string(),
                    StoredDoc {
                        value: doc,
                        rev: new_rev.clone(),
                        generation,
                    },
                );
                Ok(new_rev)
            }
        }
    }

    async fn delete(&self, id: &str, rev: &Revision) -> StoreResult<()> {
        let mut docs = self.docs.write();
        let existing = docs
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if existing.rev != *rev {
            return Err(StoreError::Conflict(id.to_string()));
        }
        docs.remove(id);
        Ok(())
    }

    async fn query_partition(&self, partition: &str) -> StoreResult<Vec<(Value, Revision)>> {
        let prefix = format!("{}:", partition);
        let docs = self.docs.read();
        let mut rows: Vec<(String, Value, Revision)> = docs
            .iter()
            .filter(|(id, _)| id.starts_with(&prefix))
            .map(|(id, doc)| (id.clone(), doc.value.clone(), doc.rev.clone()))
            .collect();
        // Deterministic order for callers that scan partitions
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(rows.into_iter().map(|(_, value, rev)| (value, rev)).collect())
    }
}
