use std::sync::Arc;

use async_trait::async_trait;
use bson::Document;

use crate::domain::{DomainError, Filter};

/// A database handle that hands out named collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Name of the database this handle is bound to.
    fn name(&self) -> &str;

    fn collection(&self, name: &str) -> Arc<dyn DocumentCollection>;

    /// Round trip to the server to verify connectivity.
    async fn ping(&self) -> Result<(), DomainError>;
}

/// Untyped document operations on one named collection.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    fn name(&self) -> &str;

    async fn find(&self, filter: &Filter) -> Result<Vec<Document>, DomainError>;

    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, DomainError>;

    async fn insert_one(&self, document: Document) -> Result<(), DomainError>;

    /// Replaces the first match. Returns the number of matched documents.
    async fn replace_one(&self, filter: &Filter, document: Document) -> Result<u64, DomainError>;

    /// Deletes the first match. Returns the number of deleted documents.
    async fn delete_one(&self, filter: &Filter) -> Result<u64, DomainError>;

    async fn count(&self, filter: &Filter) -> Result<u64, DomainError>;
}
