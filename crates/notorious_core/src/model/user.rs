//! User entity: the actor referenced by audit fields.

use crate::model::builder::{Builder, EntityBuilder};
use crate::model::entity::{DomainResult, Entity, EntityBase};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    base: EntityBase,
}

impl Entity for User {
    const COLLECTION: &'static str = "User";

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserBuilder {
    base: EntityBuilder,
}

impl UserBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Builder for UserBuilder {
    type Output = User;

    fn base_builder(&mut self) -> &mut EntityBuilder {
        &mut self.base
    }

    fn build(self) -> DomainResult<User> {
        Ok(User {
            base: self.base.build_base()?,
        })
    }
}
