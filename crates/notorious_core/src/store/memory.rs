//! In-memory document store.
//!
//! Backs unit tests and embedded use without a database. Collections are
//! plain vectors so insertion order is the natural cursor order.

use super::{document_id, Document, DocumentStore, FindOptions, Predicate, StoreError, StoreResult};
use log::trace;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Document>>> {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn insert_many(&self, collection: &str, documents: Vec<Document>) -> StoreResult<()> {
        let mut collections = self.lock();
        let stored = collections.entry(collection.to_string()).or_default();

        let mut seen = stored
            .iter()
            .map(document_id)
            .collect::<StoreResult<HashSet<_>>>()?;
        for document in &documents {
            let id = document_id(document)?;
            if !seen.insert(id) {
                return Err(StoreError::DuplicateKey {
                    collection: collection.to_string(),
                    id: id.to_string(),
                });
            }
        }
        drop(seen);

        trace!(
            "event=store_insert module=store backend=memory collection={collection} count={}",
            documents.len()
        );
        stored.extend(documents);
        Ok(())
    }

    fn delete_many(&self, collection: &str, predicate: &Predicate) -> StoreResult<u64> {
        let mut collections = self.lock();
        let Some(stored) = collections.get_mut(collection) else {
            return Ok(0);
        };

        let before = stored.len();
        stored.retain(|document| !predicate.matches(document));
        Ok((before - stored.len()) as u64)
    }

    fn replace_one(
        &self,
        collection: &str,
        predicate: &Predicate,
        document: Document,
    ) -> StoreResult<u64> {
        document_id(&document)?;
        let mut collections = self.lock();
        let Some(stored) = collections.get_mut(collection) else {
            return Ok(0);
        };

        match stored.iter_mut().find(|current| predicate.matches(current)) {
            Some(slot) => {
                *slot = document;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn find(
        &self,
        collection: &str,
        predicate: &Predicate,
        options: FindOptions,
    ) -> StoreResult<Vec<Document>> {
        let collections = self.lock();
        let Some(stored) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
        let limit = options
            .limit
            .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX));

        Ok(stored
            .iter()
            .filter(|document| predicate.matches(document))
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }

    fn count(&self, collection: &str, predicate: &Predicate) -> StoreResult<u64> {
        let collections = self.lock();
        Ok(collections.get(collection).map_or(0, |stored| {
            stored
                .iter()
                .filter(|document| predicate.matches(document))
                .count() as u64
        }))
    }
}
