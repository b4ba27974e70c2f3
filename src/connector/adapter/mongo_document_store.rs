use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bson::{doc, Bson, Document};
use futures_util::TryStreamExt;
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::{Client, Collection, Database};
use tracing::debug;

use crate::application::{DocumentCollection, DocumentStore};
use crate::domain::{DomainError, Filter};

/// Server error code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Where to reach the MongoDB server.
#[derive(Clone)]
pub struct MongoDbSettings {
    pub host: String,
    pub port: u16,
    /// Full `mongodb://` URI. Takes precedence over `host` and `port`.
    pub connection_string: Option<String>,
}

impl MongoDbSettings {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connection_string: None,
        }
    }

    pub fn with_connection_string(mut self, uri: impl Into<String>) -> Self {
        self.connection_string = Some(uri.into());
        self
    }

    pub fn connection_string(&self) -> String {
        match &self.connection_string {
            Some(uri) => uri.clone(),
            None => format!("mongodb://{}:{}", self.host, self.port),
        }
    }

    /// Connection string with any credentials masked, safe to log or print.
    pub fn redacted(&self) -> String {
        redact_uri(&self.connection_string())
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        match &self.connection_string {
            Some(uri) if !uri.starts_with("mongodb://") && !uri.starts_with("mongodb+srv://") => {
                Err(DomainError::config(format!(
                    "connection string must use the mongodb:// or mongodb+srv:// scheme, got '{}'",
                    redact_uri(uri)
                )))
            }
            Some(_) => Ok(()),
            None if self.host.trim().is_empty() => {
                Err(DomainError::config("MongoDB host must not be empty"))
            }
            None if self.port == 0 => Err(DomainError::config("MongoDB port must not be 0")),
            None => Ok(()),
        }
    }
}

impl Default for MongoDbSettings {
    fn default() -> Self {
        Self::new("localhost", 27017)
    }
}

impl fmt::Debug for MongoDbSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoDbSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field(
                "connection_string",
                &self.connection_string.as_deref().map(redact_uri),
            )
            .finish()
    }
}

/// Replaces the `user:password@` part of a URI authority with `***@`.
fn redact_uri(uri: &str) -> String {
    let (scheme, rest) = match uri.find("://") {
        Some(index) => uri.split_at(index + 3),
        None => ("", uri),
    };
    let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);

    match authority.rfind('@') {
        Some(at) => format!("{}***@{}{}", scheme, &authority[at + 1..], tail),
        None => uri.to_string(),
    }
}

/// [`DocumentStore`] backed by one MongoDB database.
pub struct MongoDocumentStore {
    database: Database,
}

impl MongoDocumentStore {
    /// Builds a client for `settings` and selects `database_name`. The driver
    /// connects lazily; call [`DocumentStore::ping`] to verify the server.
    pub async fn connect(
        settings: &MongoDbSettings,
        database_name: &str,
    ) -> Result<Self, DomainError> {
        settings.validate()?;

        let client = Client::with_uri_str(settings.connection_string())
            .await
            .map_err(|e| map_mongo_error("Failed to create MongoDB client", e))?;

        debug!("MongoDB client created for database {}", database_name);

        Ok(Self::with_database(client.database(database_name)))
    }

    pub fn with_database(database: Database) -> Self {
        Self { database }
    }

    /// Drops the whole database this store is bound to.
    pub async fn drop_database(&self) -> Result<(), DomainError> {
        self.database
            .drop()
            .await
            .map_err(|e| map_mongo_error("Failed to drop database", e))
    }
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    fn name(&self) -> &str {
        self.database.name()
    }

    fn collection(&self, name: &str) -> Arc<dyn DocumentCollection> {
        Arc::new(MongoDocumentCollection {
            collection: self.database.collection::<Document>(name),
        })
    }

    async fn ping(&self) -> Result<(), DomainError> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| map_mongo_error("Failed to reach MongoDB", e))?;
        Ok(())
    }
}

pub struct MongoDocumentCollection {
    collection: Collection<Document>,
}

#[async_trait]
impl DocumentCollection for MongoDocumentCollection {
    fn name(&self) -> &str {
        self.collection.name()
    }

    async fn find(&self, filter: &Filter) -> Result<Vec<Document>, DomainError> {
        let cursor = self
            .collection
            .find(to_query(filter))
            .await
            .map_err(|e| map_mongo_error("Failed to query documents", e))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| map_mongo_error("Failed to read query results", e))
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, DomainError> {
        self.collection
            .find_one(to_query(filter))
            .await
            .map_err(|e| map_mongo_error("Failed to query document", e))
    }

    async fn insert_one(&self, document: Document) -> Result<(), DomainError> {
        self.collection
            .insert_one(document)
            .await
            .map_err(|e| map_mongo_error("Failed to insert document", e))?;
        Ok(())
    }

    async fn replace_one(&self, filter: &Filter, document: Document) -> Result<u64, DomainError> {
        let result = self
            .collection
            .replace_one(to_query(filter), document)
            .await
            .map_err(|e| map_mongo_error("Failed to replace document", e))?;
        Ok(result.matched_count)
    }

    async fn delete_one(&self, filter: &Filter) -> Result<u64, DomainError> {
        let result = self
            .collection
            .delete_one(to_query(filter))
            .await
            .map_err(|e| map_mongo_error("Failed to delete document", e))?;
        Ok(result.deleted_count)
    }

    async fn count(&self, filter: &Filter) -> Result<u64, DomainError> {
        self.collection
            .count_documents(to_query(filter))
            .await
            .map_err(|e| map_mongo_error("Failed to count documents", e))
    }
}

/// Translates a [`Filter`] into a MongoDB query document.
pub fn to_query(filter: &Filter) -> Document {
    match filter {
        Filter::All => Document::new(),
        Filter::Eq(field, value) => field_operator(field, "$eq", value.clone()),
        Filter::Ne(field, value) => field_operator(field, "$ne", value.clone()),
        Filter::Compare(field, op, value) => field_operator(field, op.as_str(), value.clone()),
        Filter::In(field, values) => field_operator(field, "$in", Bson::Array(values.clone())),
        Filter::Exists(field, exists) => field_operator(field, "$exists", Bson::Boolean(*exists)),
        Filter::And(filters) if filters.is_empty() => Document::new(),
        Filter::And(filters) => doc! { "$and": clauses(filters) },
        // `$or` rejects an empty array; an empty disjunction matches nothing.
        Filter::Or(filters) if filters.is_empty() => doc! { "$expr": false },
        Filter::Or(filters) => doc! { "$or": clauses(filters) },
        Filter::Not(inner) => doc! { "$nor": [to_query(inner)] },
    }
}

fn field_operator(field: &str, operator: &str, value: Bson) -> Document {
    let mut condition = Document::new();
    condition.insert(operator, value);

    let mut query = Document::new();
    query.insert(field, condition);
    query
}

fn clauses(filters: &[Filter]) -> Vec<Bson> {
    filters
        .iter()
        .map(|f| Bson::Document(to_query(f)))
        .collect()
}

fn map_mongo_error(context: &str, err: MongoError) -> DomainError {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE =>
        {
            DomainError::duplicate_key(format!("{}: {}", context, write_error.message))
        }
        ErrorKind::BsonSerialization(_) | ErrorKind::BsonDeserialization(_) => {
            DomainError::serialization(format!("{}: {}", context, err))
        }
        _ => DomainError::storage(format!("{}: {}", context, err)),
    }
}
