//! User repository.

use crate::model::filter::Filter;
use crate::model::user::User;
use crate::repo::entity_repo::EntityRepository;

pub type UserRepository<S> = EntityRepository<User, Filter, S>;
