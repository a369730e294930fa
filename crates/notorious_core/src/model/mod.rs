//! Entity model for notes, tags and users.
//!
//! # Responsibility
//! - Define the aggregate base (identity, tag set, audit) and the concrete
//!   entities built on it.
//! - Provide builders and the page filter used by repository queries.
//!
//! # Invariants
//! - Every entity is identified by a stable `EntityId` generated at build time.
//! - Tag uniqueness is by tag id, never by name.

pub mod builder;
pub mod entity;
pub mod filter;
pub mod note;
pub mod tag;
pub mod user;
