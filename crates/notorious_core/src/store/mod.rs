//! Document store contract and implementations.
//!
//! # Responsibility
//! - Define the minimal document operations the repository layer needs:
//!   bulk insert, delete-many, replace-one, find and count.
//! - Provide an in-memory store and a SQLite-backed store.
//!
//! # Invariants
//! - Documents are JSON objects keyed by a string `id` field.
//! - `id` is unique per collection; violations surface as `DuplicateKey`.
//! - `find` returns documents in insertion order.

use crate::db::DbError;
use serde_json::Value;
use std::rc::Rc;
use std::sync::Arc;
use thiserror::Error;

pub mod memory;
pub mod predicate;
pub mod sqlite;

pub use memory::MemoryDocumentStore;
pub use predicate::{Predicate, ID_FIELD};
pub use sqlite::SqliteDocumentStore;

/// One stored document.
pub type Document = Value;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("duplicate document id `{id}` in collection `{collection}`")]
    DuplicateKey { collection: String, id: String },
    #[error("invalid document: {0}")]
    InvalidDocument(String),
    #[error("required table is missing: {0}")]
    MissingRequiredTable(&'static str),
}

/// Cursor window for `find`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub skip: u64,
    /// `None` returns every remaining document.
    pub limit: Option<u64>,
}

impl FindOptions {
    pub fn page(skip: u64, limit: u64) -> Self {
        Self {
            skip,
            limit: Some(limit),
        }
    }
}

/// Blocking document store. Every method addresses one named collection.
pub trait DocumentStore {
    fn insert_many(&self, collection: &str, documents: Vec<Document>) -> StoreResult<()>;

    /// Returns the number of deleted documents.
    fn delete_many(&self, collection: &str, predicate: &Predicate) -> StoreResult<u64>;

    /// Replaces the first matching document. Returns the number matched (0 or 1).
    fn replace_one(
        &self,
        collection: &str,
        predicate: &Predicate,
        document: Document,
    ) -> StoreResult<u64>;

    fn find(
        &self,
        collection: &str,
        predicate: &Predicate,
        options: FindOptions,
    ) -> StoreResult<Vec<Document>>;

    fn count(&self, collection: &str, predicate: &Predicate) -> StoreResult<u64>;
}

macro_rules! forward_document_store {
    ($($ty:ty),+ $(,)?) => {$(
        impl<T: DocumentStore + ?Sized> DocumentStore for $ty {
            fn insert_many(&self, collection: &str, documents: Vec<Document>) -> StoreResult<()> {
                (**self).insert_many(collection, documents)
            }

            fn delete_many(&self, collection: &str, predicate: &Predicate) -> StoreResult<u64> {
                (**self).delete_many(collection, predicate)
            }

            fn replace_one(
                &self,
                collection: &str,
                predicate: &Predicate,
                document: Document,
            ) -> StoreResult<u64> {
                (**self).replace_one(collection, predicate, document)
            }

            fn find(
                &self,
                collection: &str,
                predicate: &Predicate,
                options: FindOptions,
            ) -> StoreResult<Vec<Document>> {
                (**self).find(collection, predicate, options)
            }

            fn count(&self, collection: &str, predicate: &Predicate) -> StoreResult<u64> {
                (**self).count(collection, predicate)
            }
        }
    )+};
}

forward_document_store!(&T, Box<T>, Rc<T>, Arc<T>);

/// Extracts the `id` of a document, rejecting non-objects and missing ids.
pub fn document_id(document: &Document) -> StoreResult<&str> {
    document
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::InvalidDocument(format!("document has no string `{ID_FIELD}`")))
}
