//! Tag entity: a named classification label.

use crate::model::builder::{Builder, EntityBuilder};
use crate::model::entity::{DomainResult, Entity, EntityBase};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(flatten)]
    base: EntityBase,
    name: String,
}

impl Tag {
    /// Immutable after construction.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Entity for Tag {
    const COLLECTION: &'static str = "Tag";

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }
}

/// Builder for `Tag`; the name is required up front.
#[derive(Debug, Clone)]
pub struct TagBuilder {
    base: EntityBuilder,
    name: String,
}

impl TagBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: EntityBuilder::default(),
            name: name.into(),
        }
    }
}

impl Builder for TagBuilder {
    type Output = Tag;

    fn base_builder(&mut self) -> &mut EntityBuilder {
        &mut self.base
    }

    fn build(self) -> DomainResult<Tag> {
        Ok(Tag {
            base: self.base.build_base()?,
            name: self.name,
        })
    }
}
