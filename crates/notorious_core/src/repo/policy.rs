//! Default scoping predicates applied by repositories.
//!
//! A policy decides which documents a tenant may read or write, and how a
//! caller filter maps to a predicate. Policies compose: `OwnedByTenant` adds
//! tenant ownership on top of any inner policy.

use crate::model::entity::EntityId;
use crate::store::Predicate;

/// Document field holding the creating user.
pub const CREATED_BY_FIELD: &str = "created_by_user";

pub trait RepositoryPolicy<F> {
    /// Intersected with every read.
    fn default_read_predicate(&self, _tenant: EntityId) -> Predicate {
        Predicate::All
    }

    /// Intersected with every delete and replace.
    fn default_write_predicate(&self, _tenant: EntityId) -> Predicate {
        Predicate::All
    }

    /// Domain predicate for a caller filter. The base contributes none.
    fn map_filter(&self, _filter: &F) -> Predicate {
        Predicate::All
    }
}

/// No restriction beyond the tenancy gate itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unrestricted;

impl<F> RepositoryPolicy<F> for Unrestricted {}

/// Restricts reads and writes to documents created by the current tenant.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnedByTenant<P = Unrestricted> {
    inner: P,
}

impl<P> OwnedByTenant<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<F, P: RepositoryPolicy<F>> RepositoryPolicy<F> for OwnedByTenant<P> {
    fn default_read_predicate(&self, tenant: EntityId) -> Predicate {
        owner_predicate(tenant) & self.inner.default_read_predicate(tenant)
    }

    fn default_write_predicate(&self, tenant: EntityId) -> Predicate {
        owner_predicate(tenant) & self.inner.default_write_predicate(tenant)
    }

    fn map_filter(&self, filter: &F) -> Predicate {
        self.inner.map_filter(filter)
    }
}

fn owner_predicate(tenant: EntityId) -> Predicate {
    Predicate::eq(CREATED_BY_FIELD, tenant.to_string())
}
