//! Persistence core for Notorious notes, tags and users.
//! Entities, the unit-of-work repository and the document stores it runs on.

pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use logging::{default_log_level, init_logging, logging_status, LogSettings};
pub use model::builder::{Builder, EntityBuilder};
pub use model::entity::{DomainError, DomainResult, Entity, EntityBase, EntityId, TagSet};
pub use model::filter::{Filter, PageFilter};
pub use model::note::{Note, NoteBuilder};
pub use model::tag::{Tag, TagBuilder};
pub use model::user::{User, UserBuilder};
pub use repo::entity_repo::{
    EntityRepository, RepoError, RepoResult, Repository, TenantRepository,
};
pub use repo::note_repo::{NoteFilter, NotePolicy, NoteRepository};
pub use repo::policy::{OwnedByTenant, RepositoryPolicy, Unrestricted};
pub use repo::tag_repo::TagRepository;
pub use repo::user_repo::UserRepository;
pub use store::{
    DocumentStore, FindOptions, MemoryDocumentStore, Predicate, SqliteDocumentStore, StoreError,
    StoreResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
