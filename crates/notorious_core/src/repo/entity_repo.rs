//! Generic entity repository: unit of work plus query engine.
//!
//! # Responsibility
//! - Stage inserts, replaces and deletes, then flush them in one batch per
//!   kind on `save_changes`.
//! - Answer id/filter queries directly against the store, always intersected
//!   with the policy's default read predicate.
//! - Gate every store access behind tenancy.
//!
//! # Invariants
//! - Flush order is deletions, then insertions, then updates.
//! - Staging is de-duplicated by entity id; the last staged snapshot wins.
//! - The same id cannot be staged for both insert and update in one batch.
//! - A buffer is cleared only after its phase reached the store successfully.
//!   Updates leave the buffer one by one, as each replace succeeds.
//! - Audit is stamped on written copies, never on staged snapshots.

use crate::clock::{Clock, SystemClock};
use crate::model::entity::{DomainError, Entity, EntityId};
use crate::model::filter::PageFilter;
use crate::repo::policy::{RepositoryPolicy, Unrestricted};
use crate::store::{DocumentStore, FindOptions, Predicate, StoreError};
use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use log::{debug, info, warn};
use std::marker::PhantomData;
use thiserror::Error;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("cannot access data collections without setting tenancy")]
    UnscopedAccess,
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Store(StoreError::Serialization(value))
    }
}

/// Repository contract shared by every entity type.
pub trait Repository<E: Entity, F> {
    /// Returns `Ok(None)` when no visible entity has `id`.
    fn get_by_id(&self, id: EntityId) -> RepoResult<Option<E>>;
    /// Order of the result is store-defined.
    fn get_by_ids(&self, ids: &[EntityId]) -> RepoResult<Vec<E>>;
    fn get(&self, filter: &F) -> RepoResult<Vec<E>>;
    fn add(&mut self, entity: &E) -> RepoResult<()>;
    fn update(&mut self, entity: &E) -> RepoResult<()>;
    fn delete(&mut self, entity: &E) -> RepoResult<()>;
    fn save_changes(&mut self) -> RepoResult<()>;
}

/// Tenancy gate. Store access fails with `UnscopedAccess` until set.
pub trait TenantRepository {
    fn set_tenancy(&mut self, user_id: EntityId) -> RepoResult<()>;
    fn tenancy(&self) -> Option<EntityId>;
}

/// Store-backed repository for entity `E`, queried with filter `F`.
///
/// Not synchronized: one repository belongs to one unit of work at a time.
pub struct EntityRepository<E, F, S, P = Unrestricted> {
    store: S,
    policy: P,
    clock: Box<dyn Clock>,
    tenant: Option<EntityId>,
    inserts: IndexMap<EntityId, E>,
    updates: IndexMap<EntityId, E>,
    deletions: IndexSet<EntityId>,
    _filter: PhantomData<fn() -> F>,
}

impl<E, F, S, P> EntityRepository<E, F, S, P>
where
    E: Entity,
    F: PageFilter,
    S: DocumentStore,
    P: RepositoryPolicy<F>,
{
    pub fn new(store: S) -> Self
    where
        P: Default,
    {
        Self::with_policy(store, P::default())
    }

    pub fn with_policy(store: S, policy: P) -> Self {
        Self {
            store,
            policy,
            clock: Box::new(SystemClock),
            tenant: None,
            inserts: IndexMap::new(),
            updates: IndexMap::new(),
            deletions: IndexSet::new(),
            _filter: PhantomData,
        }
    }

    /// Replaces the clock used to stamp audit on flush.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn has_pending_changes(&self) -> bool {
        !(self.inserts.is_empty() && self.updates.is_empty() && self.deletions.is_empty())
    }

    /// Number of documents visible under the default read predicate.
    pub fn count(&self) -> RepoResult<u64> {
        let predicate = self.read_scope()?;
        Ok(self.store.count(E::COLLECTION, &predicate)?)
    }

    fn tenant(&self) -> RepoResult<EntityId> {
        self.tenant.ok_or(RepoError::UnscopedAccess)
    }

    fn read_scope(&self) -> RepoResult<Predicate> {
        let tenant = self.tenant()?;
        Ok(self.policy.default_read_predicate(tenant))
    }

    fn find(&self, predicate: Predicate, options: FindOptions) -> RepoResult<Vec<E>> {
        let documents = self.store.find(E::COLLECTION, &predicate, options)?;
        let entities = documents
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<E>, _>>()?;
        Ok(entities)
    }

    fn flush_deletions(&mut self, tenant: EntityId) -> RepoResult<()> {
        if self.deletions.is_empty() {
            return Ok(());
        }

        let predicate = self.policy.default_write_predicate(tenant)
            & Predicate::id_in(self.deletions.iter().copied());
        let deleted = self.store.delete_many(E::COLLECTION, &predicate)?;
        debug!(
            "event=flush_deletions module=repo status=ok collection={} staged={} deleted={deleted}",
            E::COLLECTION,
            self.deletions.len()
        );
        self.deletions.clear();
        Ok(())
    }

    fn flush_inserts(&mut self, tenant: EntityId, now: DateTime<Utc>) -> RepoResult<()> {
        if self.inserts.is_empty() {
            return Ok(());
        }

        // Audit goes on copies; staged snapshots stay unstamped until stored.
        let documents = self
            .inserts
            .values()
            .map(|entity| {
                let mut stamped = entity.clone();
                stamped.initialise_audit(tenant, now);
                serde_json::to_value(&stamped)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let count = documents.len();
        self.store.insert_many(E::COLLECTION, documents)?;
        debug!(
            "event=flush_inserts module=repo status=ok collection={} inserted={count}",
            E::COLLECTION
        );
        self.inserts.clear();
        Ok(())
    }

    fn flush_updates(&mut self, tenant: EntityId, now: DateTime<Utc>) -> RepoResult<()> {
        if self.updates.is_empty() {
            return Ok(());
        }

        let mut replaced = 0;
        let mut failure = None;
        for (id, entity) in &self.updates {
            match self.replace_staged(tenant, now, *id, entity) {
                Ok(()) => replaced += 1,
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }
        self.updates.drain(..replaced);
        if let Some(err) = failure {
            return Err(err);
        }

        debug!(
            "event=flush_updates module=repo status=ok collection={} updated={replaced}",
            E::COLLECTION
        );
        Ok(())
    }

    fn replace_staged(
        &self,
        tenant: EntityId,
        now: DateTime<Utc>,
        id: EntityId,
        entity: &E,
    ) -> RepoResult<()> {
        let predicate = self.policy.default_write_predicate(tenant) & Predicate::id_eq(id);
        let mut stamped = entity.clone();
        if stamped.created_by_user().is_none() && stamped.created_date().is_none() {
            carry_create_audit(&self.store, &predicate, &mut stamped)?;
        }
        stamped.record_update(tenant, now);
        let document = serde_json::to_value(&stamped)?;
        let matched = self
            .store
            .replace_one(E::COLLECTION, &predicate, document)?;
        if matched == 0 {
            warn!(
                "event=flush_update module=repo status=no_match collection={} id={id}",
                E::COLLECTION
            );
        }
        Ok(())
    }
}

/// Copies create audit from the stored document into a snapshot that lacks it,
/// so a replace never erases provenance.
fn carry_create_audit<E: Entity, S: DocumentStore>(
    store: &S,
    predicate: &Predicate,
    entity: &mut E,
) -> RepoResult<()> {
    let Some(document) = store
        .find(E::COLLECTION, predicate, FindOptions::page(0, 1))?
        .pop()
    else {
        return Ok(());
    };
    let stored: E = serde_json::from_value(document)?;
    if let (Some(user), Some(date)) = (stored.created_by_user(), stored.created_date()) {
        entity.initialise_audit(user, date);
    }
    Ok(())
}

impl<E, F, S, P> Repository<E, F> for EntityRepository<E, F, S, P>
where
    E: Entity,
    F: PageFilter,
    S: DocumentStore,
    P: RepositoryPolicy<F>,
{
    fn get_by_id(&self, id: EntityId) -> RepoResult<Option<E>> {
        let predicate = self.read_scope()? & Predicate::id_eq(id);
        let mut found = self.find(predicate, FindOptions::page(0, 1))?;
        Ok(found.pop())
    }

    fn get_by_ids(&self, ids: &[EntityId]) -> RepoResult<Vec<E>> {
        if ids.is_empty() {
            return Err(RepoError::InvalidArgument(
                "must provide ids in order to get by ids".to_string(),
            ));
        }

        let predicate = self.read_scope()? & Predicate::id_in(ids.iter().copied());
        self.find(predicate, FindOptions::default())
    }

    fn get(&self, filter: &F) -> RepoResult<Vec<E>> {
        if filter.take() == 0 {
            return Err(RepoError::InvalidArgument(
                "filter take must be positive".to_string(),
            ));
        }

        let predicate = self.read_scope()? & self.policy.map_filter(filter);
        self.find(predicate, FindOptions::page(filter.skip(), filter.take()))
    }

    fn add(&mut self, entity: &E) -> RepoResult<()> {
        let id = entity.id();
        if self.updates.contains_key(&id) {
            return Err(RepoError::InvalidArgument(format!(
                "entity {id} is already staged for update"
            )));
        }
        self.inserts.insert(id, entity.clone());
        Ok(())
    }

    fn update(&mut self, entity: &E) -> RepoResult<()> {
        let id = entity.id();
        if self.inserts.contains_key(&id) {
            return Err(RepoError::InvalidArgument(format!(
                "entity {id} is already staged for insert"
            )));
        }
        self.updates.insert(id, entity.clone());
        Ok(())
    }

    fn delete(&mut self, entity: &E) -> RepoResult<()> {
        self.deletions.insert(entity.id());
        Ok(())
    }

    /// Flushes staged deletions, insertions and updates, in that order.
    ///
    /// There is no transaction across phases. When a phase fails, earlier
    /// phases are already committed and their buffers cleared, while the
    /// failing phase and every later one stay staged for the caller to retry
    /// or discard. Within the update phase, entities already replaced are
    /// released, so a retry only replays the remaining ones. A retry stamps
    /// audit with the tenant and clock current at that call.
    fn save_changes(&mut self) -> RepoResult<()> {
        if !self.has_pending_changes() {
            return Ok(());
        }

        let tenant = self.tenant()?;
        let now = self.clock.now();
        let (deletions, inserts, updates) =
            (self.deletions.len(), self.inserts.len(), self.updates.len());

        self.flush_deletions(tenant)?;
        self.flush_inserts(tenant, now)?;
        self.flush_updates(tenant, now)?;

        info!(
            "event=save_changes module=repo status=ok collection={} deletions={deletions} inserts={inserts} updates={updates}",
            E::COLLECTION
        );
        Ok(())
    }
}

impl<E, F, S, P> TenantRepository for EntityRepository<E, F, S, P> {
    fn set_tenancy(&mut self, user_id: EntityId) -> RepoResult<()> {
        if user_id.is_nil() {
            return Err(RepoError::InvalidArgument(
                "tenancy requires a non-nil user id".to_string(),
            ));
        }
        self.tenant = Some(user_id);
        Ok(())
    }

    fn tenancy(&self) -> Option<EntityId> {
        self.tenant
    }
}

#[cfg(test)]
mod tests {
    use super::{EntityRepository, RepoError, Repository, TenantRepository};
    use crate::model::builder::Builder;
    use crate::model::filter::Filter;
    use crate::model::user::{User, UserBuilder};
    use crate::store::MemoryDocumentStore;
    use uuid::Uuid;

    type UserRepo<'a> = EntityRepository<User, Filter, &'a MemoryDocumentStore>;

    #[test]
    fn add_then_update_same_entity_is_rejected() {
        let store = MemoryDocumentStore::new();
        let mut repo = UserRepo::new(&store);
        let user = UserBuilder::new().build().unwrap();

        repo.add(&user).unwrap();
        let err = repo.update(&user).unwrap_err();
        assert!(matches!(err, RepoError::InvalidArgument(_)));
    }

    #[test]
    fn nil_tenancy_is_rejected() {
        let store = MemoryDocumentStore::new();
        let mut repo = UserRepo::new(&store);

        let err = repo.set_tenancy(Uuid::nil()).unwrap_err();
        assert!(matches!(err, RepoError::InvalidArgument(_)));
        assert_eq!(repo.tenancy(), None);
    }

    #[test]
    fn zero_take_is_rejected() {
        let store = MemoryDocumentStore::new();
        let mut repo = UserRepo::new(&store);
        repo.set_tenancy(Uuid::new_v4()).unwrap();

        let err = repo.get(&Filter::new(0, 0)).unwrap_err();
        assert!(matches!(err, RepoError::InvalidArgument(_)));
    }

    #[test]
    fn staging_does_not_require_tenancy_but_flushing_does() {
        let store = MemoryDocumentStore::new();
        let mut repo = UserRepo::new(&store);
        let user = UserBuilder::new().build().unwrap();

        repo.add(&user).unwrap();
        assert!(repo.has_pending_changes());
        let err = repo.save_changes().unwrap_err();
        assert!(matches!(err, RepoError::UnscopedAccess));
        assert!(repo.has_pending_changes());
    }
}
