use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use tracing::{debug, info};

use crate::application::{DocumentStore, Repository};
use crate::connector::{
    DocumentRepository, InMemoryDocumentStore, MongoDbSettings, MongoDocumentStore,
};
use crate::domain::{DomainError, Entity};

/// Identity of the running service. The service name doubles as the
/// database name.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub service_name: String,
}

impl ServiceSettings {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.service_name.trim().is_empty() {
            return Err(DomainError::config("service name must not be empty"));
        }
        Ok(())
    }
}

pub struct ContainerConfig {
    pub mongo: MongoDbSettings,
    pub service: ServiceSettings,
    /// Keep documents in process memory instead of connecting to MongoDB.
    pub memory_storage: bool,
}

type RegistryKey = (TypeId, String);

/// Composition root: owns the single database handle for the process and
/// hands out one repository per (entity type, collection name) pair.
pub struct Container {
    store: Arc<dyn DocumentStore>,
    repositories: Mutex<HashMap<RegistryKey, Arc<dyn Any + Send + Sync>>>,
    config: ContainerConfig,
}

impl Container {
    pub async fn new(config: ContainerConfig) -> Result<Self> {
        config.service.validate()?;

        let store: Arc<dyn DocumentStore> = if config.memory_storage {
            debug!("Using in-memory document storage");
            Arc::new(InMemoryDocumentStore::new(&config.service.service_name))
        } else {
            let store =
                MongoDocumentStore::connect(&config.mongo, &config.service.service_name).await?;
            store.ping().await?;
            info!(
                "Connected to MongoDB at {} database {}",
                config.mongo.redacted(),
                store.name()
            );
            Arc::new(store)
        };

        Ok(Self::with_store(store, config))
    }

    /// Builds a container around an already constructed store.
    pub fn with_store(store: Arc<dyn DocumentStore>, config: ContainerConfig) -> Self {
        Self {
            store,
            repositories: Mutex::new(HashMap::new()),
            config,
        }
    }

    pub fn store(&self) -> Arc<dyn DocumentStore> {
        Arc::clone(&self.store)
    }

    /// Repository for `T` over `collection_name`, constructed on first use.
    /// Later calls with the same pair return the same instance.
    pub fn repository<T: Entity>(&self, collection_name: &str) -> Arc<dyn Repository<T>> {
        let key = (TypeId::of::<T>(), collection_name.to_string());
        let mut repositories = self
            .repositories
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(existing) = repositories.get(&key) {
            if let Ok(repository) = Arc::clone(existing).downcast::<DocumentRepository<T>>() {
                return repository;
            }
        }

        debug!(
            "Registering {} repository for collection {}",
            std::any::type_name::<T>(),
            collection_name
        );
        let repository = Arc::new(DocumentRepository::<T>::new(
            self.store.as_ref(),
            collection_name,
        ));
        repositories.insert(key, Arc::clone(&repository) as Arc<dyn Any + Send + Sync>);
        repository
    }

    /// Eagerly registers the repository for `T` over `collection_name`.
    pub fn register_repository<T: Entity>(&self, collection_name: &str) -> &Self {
        self.repository::<T>(collection_name);
        self
    }

    pub fn registered_count(&self) -> usize {
        self.repositories
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn database_name(&self) -> &str {
        self.store.name()
    }

    pub fn memory_storage(&self) -> bool {
        self.config.memory_storage
    }

    pub fn mongo_settings(&self) -> &MongoDbSettings {
        &self.config.mongo
    }
}
