pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

pub use application::{DocumentCollection, DocumentStore, Repository};

pub use connector::{
    Container, ContainerConfig, DocumentRepository, InMemoryDocumentCollection,
    InMemoryDocumentStore, MongoDbSettings, MongoDocumentStore, ServiceSettings,
};

pub use domain::{uuid_as_string, Comparison, DomainError, Entity, Filter, Item};
