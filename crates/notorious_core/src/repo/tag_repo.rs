//! Tag repository.

use crate::model::filter::Filter;
use crate::model::tag::Tag;
use crate::repo::entity_repo::EntityRepository;

pub type TagRepository<S> = EntityRepository<Tag, Filter, S>;
