//! Fluent entity construction.
//!
//! # Responsibility
//! - Collect tags and optional create audit before an entity exists.
//! - Apply them in a fixed order on `build()`: fresh id, tags, then audit.
//!
//! # Invariants
//! - Duplicate tags surface the same `DomainError::DuplicateTag` as
//!   `Entity::add_tag`.

use crate::model::entity::{DomainResult, Entity, EntityBase, EntityId};
use crate::model::tag::Tag;
use chrono::{DateTime, Utc};

/// Base-property accumulator embedded by every per-entity builder.
#[derive(Debug, Clone, Default)]
pub struct EntityBuilder {
    tags: Vec<Tag>,
    audit: Option<(EntityId, DateTime<Utc>)>,
}

impl EntityBuilder {
    /// Produces a base with a new id and the accumulated properties applied.
    pub fn build_base(self) -> DomainResult<EntityBase> {
        let mut base = EntityBase::new();
        for tag in self.tags {
            base.add_tag(tag)?;
        }
        if let Some((user, date)) = self.audit {
            base.initialise_audit(user, date);
        }
        Ok(base)
    }
}

/// Per-entity builder contract. Concrete builders supply storage for the
/// base properties and the final `build`; fluent setters are provided.
pub trait Builder: Sized {
    type Output: Entity;

    fn base_builder(&mut self) -> &mut EntityBuilder;

    fn build(self) -> DomainResult<Self::Output>;

    fn with_tags<I>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = Tag>,
    {
        self.base_builder().tags.extend(tags);
        self
    }

    fn with_tag(self, tag: Tag) -> Self {
        self.with_tags([tag])
    }

    fn with_audit(mut self, user: EntityId, date: DateTime<Utc>) -> Self {
        self.base_builder().audit = Some((user, date));
        self
    }
}
