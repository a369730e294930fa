//! Entity aggregate base.
//!
//! # Responsibility
//! - Own identity, the tag set and audit metadata shared by every entity.
//! - Expose tag/audit mutators through the `Entity` trait so every concrete
//!   aggregate gets them for free.
//!
//! # Invariants
//! - `id` is generated once and never changes.
//! - The tag set never holds two tags with the same id.
//! - Create audit is write-once; update audit is overwritten on each call.

use crate::model::tag::Tag;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;
use uuid::Uuid;

/// Stable identifier for every entity and for the users referenced in audit.
pub type EntityId = Uuid;

pub type DomainResult<T> = Result<T, DomainError>;

/// Aggregate invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("entity already has tag with id: {0}")]
    DuplicateTag(EntityId),
    #[error("entity does not have tag with id: {0}")]
    TagNotFound(EntityId),
}

/// Ordered set of tags keyed by tag id.
///
/// Serialized as a plain array of tag documents. Deserializing an array that
/// repeats a tag id fails instead of silently dropping one of the entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<Tag>", try_from = "Vec<Tag>")]
pub struct TagSet(IndexMap<EntityId, Tag>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `tag`, rejecting a second tag with the same id.
    pub fn insert(&mut self, tag: Tag) -> DomainResult<()> {
        let id = tag.id();
        if self.0.contains_key(&id) {
            return Err(DomainError::DuplicateTag(id));
        }
        self.0.insert(id, tag);
        Ok(())
    }

    /// Removes the tag with `id`, keeping the order of the remaining tags.
    pub fn remove(&mut self, id: EntityId) -> DomainResult<Tag> {
        self.0.shift_remove(&id).ok_or(DomainError::TagNotFound(id))
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.0.contains_key(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Tag> {
        self.0.get(&id)
    }

    /// Iterates tags in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.0.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<TagSet> for Vec<Tag> {
    fn from(value: TagSet) -> Self {
        value.0.into_values().collect()
    }
}

impl TryFrom<Vec<Tag>> for TagSet {
    type Error = DomainError;

    fn try_from(value: Vec<Tag>) -> Result<Self, Self::Error> {
        let mut set = TagSet::new();
        for tag in value {
            set.insert(tag)?;
        }
        Ok(set)
    }
}

/// Fields shared by every aggregate. Flattened into each entity document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityBase {
    id: EntityId,
    #[serde(default)]
    tags: TagSet,
    #[serde(default)]
    created_by_user: Option<EntityId>,
    #[serde(default)]
    created_date: Option<DateTime<Utc>>,
    #[serde(default)]
    last_modified_by_user: Option<EntityId>,
    #[serde(default)]
    last_modified_date: Option<DateTime<Utc>>,
}

impl EntityBase {
    /// Creates an empty base with a freshly generated id.
    ///
    /// Audit stays unset: provenance is recorded separately through
    /// `initialise_audit`.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            tags: TagSet::new(),
            created_by_user: None,
            created_date: None,
            last_modified_by_user: None,
            last_modified_date: None,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub fn add_tag(&mut self, tag: Tag) -> DomainResult<()> {
        self.tags.insert(tag)
    }

    pub fn remove_tag(&mut self, tag: &Tag) -> DomainResult<()> {
        self.tags.remove(tag.id()).map(|_| ())
    }

    /// Records create audit once. Returns `false` when audit was already set
    /// and the call left it untouched.
    pub fn initialise_audit(&mut self, user: EntityId, date: DateTime<Utc>) -> bool {
        if self.is_audited() {
            return false;
        }
        self.created_by_user = Some(user);
        self.created_date = Some(date);
        true
    }

    pub fn record_update(&mut self, user: EntityId, date: DateTime<Utc>) {
        self.last_modified_by_user = Some(user);
        self.last_modified_date = Some(date);
    }

    pub fn is_audited(&self) -> bool {
        self.created_by_user.is_some() || self.created_date.is_some()
    }

    pub fn created_by_user(&self) -> Option<EntityId> {
        self.created_by_user
    }

    pub fn created_date(&self) -> Option<DateTime<Utc>> {
        self.created_date
    }

    pub fn last_modified_by_user(&self) -> Option<EntityId> {
        self.last_modified_by_user
    }

    pub fn last_modified_date(&self) -> Option<DateTime<Utc>> {
        self.last_modified_date
    }
}

impl Default for EntityBase {
    fn default() -> Self {
        Self::new()
    }
}

/// Contract for every persisted aggregate.
///
/// Implementors only expose their `EntityBase`; tag and audit behavior comes
/// from the provided methods.
pub trait Entity: Clone + Debug + Serialize + DeserializeOwned {
    /// Name of the document collection holding this entity type.
    const COLLECTION: &'static str;

    fn base(&self) -> &EntityBase;

    fn base_mut(&mut self) -> &mut EntityBase;

    fn id(&self) -> EntityId {
        self.base().id()
    }

    fn tags(&self) -> &TagSet {
        self.base().tags()
    }

    fn has_tag(&self, id: EntityId) -> bool {
        self.base().tags().contains(id)
    }

    /// # Errors
    /// - `DomainError::DuplicateTag` when a tag with the same id is attached.
    fn add_tag(&mut self, tag: Tag) -> DomainResult<()> {
        self.base_mut().add_tag(tag)
    }

    /// # Errors
    /// - `DomainError::TagNotFound` when no tag with that id is attached.
    fn remove_tag(&mut self, tag: &Tag) -> DomainResult<()> {
        self.base_mut().remove_tag(tag)
    }

    /// Write-once: later calls leave the first recorded values in place.
    fn initialise_audit(&mut self, user: EntityId, date: DateTime<Utc>) -> bool {
        self.base_mut().initialise_audit(user, date)
    }

    fn record_update(&mut self, user: EntityId, date: DateTime<Utc>) {
        self.base_mut().record_update(user, date)
    }

    fn created_by_user(&self) -> Option<EntityId> {
        self.base().created_by_user()
    }

    fn created_date(&self) -> Option<DateTime<Utc>> {
        self.base().created_date()
    }

    fn last_modified_by_user(&self) -> Option<EntityId> {
        self.base().last_modified_by_user()
    }

    fn last_modified_date(&self) -> Option<DateTime<Utc>> {
        self.base().last_modified_date()
    }
}
