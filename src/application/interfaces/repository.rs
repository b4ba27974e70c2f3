use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{DomainError, Entity, Filter};

/// Typed CRUD and query operations over one document collection.
///
/// Each call performs a single round trip to the store. Lookups that find
/// nothing return `None`; `update` and `remove` of a missing identifier
/// complete without error and without effect.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    async fn get_all(&self) -> Result<Vec<T>, DomainError>;

    async fn get(&self, id: Uuid) -> Result<Option<T>, DomainError>;

    async fn get_all_filtered(&self, filter: &Filter) -> Result<Vec<T>, DomainError>;

    /// First entity matching `filter`, in store order.
    async fn get_filtered(&self, filter: &Filter) -> Result<Option<T>, DomainError>;

    /// Fails with `InvalidArgument` for an entity without identity and with
    /// `DuplicateKey` when the identifier is already stored.
    async fn create(&self, entity: &T) -> Result<(), DomainError>;

    /// Replaces the stored document sharing `entity`'s identifier. Never inserts.
    async fn update(&self, entity: &T) -> Result<(), DomainError>;

    async fn remove(&self, id: Uuid) -> Result<(), DomainError>;

    async fn count(&self) -> Result<u64, DomainError>;
}
