//! Repository layer: unit of work and queries over a document store.
//!
//! # Responsibility
//! - Define the entity repository contract and its generic implementation.
//! - Provide per-entity specializations for notes, tags and users.
//!
//! # Invariants
//! - Reads bypass staging and always see committed store state.
//! - Repositories return semantic errors (`InvalidArgument`,
//!   `UnscopedAccess`) next to pass-through store errors.

pub mod entity_repo;
pub mod note_repo;
pub mod policy;
pub mod tag_repo;
pub mod user_repo;
