use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use bson::Document;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::{DocumentCollection, DocumentStore, Repository};
use crate::domain::{DomainError, Entity, Filter};

/// [`Repository`] for any [`Entity`] over one named document collection.
///
/// The collection binding is fixed at construction.
pub struct DocumentRepository<T> {
    collection: Arc<dyn DocumentCollection>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> DocumentRepository<T> {
    pub fn new(store: &dyn DocumentStore, collection_name: &str) -> Self {
        Self::with_collection(store.collection(collection_name))
    }

    pub fn with_collection(collection: Arc<dyn DocumentCollection>) -> Self {
        Self {
            collection,
            _entity: PhantomData,
        }
    }

    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }

    fn id_filter(id: Uuid) -> Filter {
        Filter::by_id(T::ID_FIELD, id)
    }

    fn ensure_identity(entity: &T, operation: &str) -> Result<(), DomainError> {
        if entity.has_identity() {
            Ok(())
        } else {
            Err(DomainError::invalid_argument(format!(
                "cannot {} an entity without an identifier",
                operation
            )))
        }
    }

    fn to_document(entity: &T) -> Result<Document, DomainError> {
        Ok(bson::to_document(entity)?)
    }

    fn from_document(document: Document) -> Result<T, DomainError> {
        Ok(bson::from_document(document)?)
    }

    fn from_documents(documents: Vec<Document>) -> Result<Vec<T>, DomainError> {
        documents.into_iter().map(Self::from_document).collect()
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for DocumentRepository<T> {
    async fn get_all(&self) -> Result<Vec<T>, DomainError> {
        let documents = self.collection.find(&Filter::All).await?;
        debug!(
            "Loaded {} documents from {}",
            documents.len(),
            self.collection_name()
        );
        Self::from_documents(documents)
    }

    async fn get(&self, id: Uuid) -> Result<Option<T>, DomainError> {
        self.collection
            .find_one(&Self::id_filter(id))
            .await?
            .map(Self::from_document)
            .transpose()
    }

    async fn get_all_filtered(&self, filter: &Filter) -> Result<Vec<T>, DomainError> {
        let documents = self.collection.find(filter).await?;
        debug!(
            "Filter matched {} documents in {}",
            documents.len(),
            self.collection_name()
        );
        Self::from_documents(documents)
    }

    async fn get_filtered(&self, filter: &Filter) -> Result<Option<T>, DomainError> {
        self.collection
            .find_one(filter)
            .await?
            .map(Self::from_document)
            .transpose()
    }

    async fn create(&self, entity: &T) -> Result<(), DomainError> {
        Self::ensure_identity(entity, "create")?;
        let document = Self::to_document(entity)?;

        self.collection.insert_one(document).await?;
        debug!("Created {} in {}", entity.id(), self.collection_name());
        Ok(())
    }

    async fn update(&self, entity: &T) -> Result<(), DomainError> {
        Self::ensure_identity(entity, "update")?;
        let document = Self::to_document(entity)?;

        let matched = self
            .collection
            .replace_one(&Self::id_filter(entity.id()), document)
            .await?;
        if matched == 0 {
            warn!(
                "Update of {} in {} matched no document",
                entity.id(),
                self.collection_name()
            );
        } else {
            debug!("Updated {} in {}", entity.id(), self.collection_name());
        }
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> Result<(), DomainError> {
        let deleted = self.collection.delete_one(&Self::id_filter(id)).await?;
        if deleted == 0 {
            warn!(
                "Remove of {} from {} matched no document",
                id,
                self.collection_name()
            );
        } else {
            debug!("Removed {} from {}", id, self.collection_name());
        }
        Ok(())
    }

    async fn count(&self) -> Result<u64, DomainError> {
        self.collection.count(&Filter::All).await
    }
}
