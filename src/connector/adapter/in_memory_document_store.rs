use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use bson::{Bson, Document};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::{DocumentCollection, DocumentStore};
use crate::domain::{Comparison, DomainError, Filter};

const ID_KEY: &str = "_id";

/// Process-local document store. Collections keep insertion order and
/// enforce `_id` uniqueness the way a MongoDB collection does.
pub struct InMemoryDocumentStore {
    name: String,
    collections: StdMutex<HashMap<String, Arc<InMemoryDocumentCollection>>>,
}

impl InMemoryDocumentStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collections: StdMutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new("memory")
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn collection(&self, name: &str) -> Arc<dyn DocumentCollection> {
        let mut collections = self
            .collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let collection = collections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(InMemoryDocumentCollection::new(name)));
        Arc::clone(collection) as Arc<dyn DocumentCollection>
    }

    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}

pub struct InMemoryDocumentCollection {
    name: String,
    documents: Mutex<Vec<Document>>,
}

impl InMemoryDocumentCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl DocumentCollection for InMemoryDocumentCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(&self, filter: &Filter) -> Result<Vec<Document>, DomainError> {
        let documents = self.documents.lock().await;
        Ok(documents
            .iter()
            .filter(|doc| evaluate(filter, doc))
            .cloned()
            .collect())
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, DomainError> {
        let documents = self.documents.lock().await;
        Ok(documents.iter().find(|doc| evaluate(filter, doc)).cloned())
    }

    async fn insert_one(&self, document: Document) -> Result<(), DomainError> {
        let mut documents = self.documents.lock().await;

        if let Some(id) = document.get(ID_KEY) {
            let duplicate = documents.iter().any(|existing| {
                existing
                    .get(ID_KEY)
                    .is_some_and(|other| values_equal(other, id))
            });
            if duplicate {
                return Err(DomainError::duplicate_key(format!(
                    "collection {} already contains _id {}",
                    self.name, id
                )));
            }
        }

        documents.push(document);
        debug!(
            "In-memory collection {} holds {} documents",
            self.name,
            documents.len()
        );
        Ok(())
    }

    async fn replace_one(&self, filter: &Filter, document: Document) -> Result<u64, DomainError> {
        let mut documents = self.documents.lock().await;

        match documents.iter_mut().find(|doc| evaluate(filter, doc)) {
            Some(existing) => {
                let mut replacement = document;
                // The stored _id is immutable; keep it when the replacement omits it.
                if !replacement.contains_key(ID_KEY) {
                    if let Some(id) = existing.get(ID_KEY) {
                        replacement.insert(ID_KEY, id.clone());
                    }
                }
                *existing = replacement;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_one(&self, filter: &Filter) -> Result<u64, DomainError> {
        let mut documents = self.documents.lock().await;

        match documents.iter().position(|doc| evaluate(filter, doc)) {
            Some(index) => {
                documents.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn count(&self, filter: &Filter) -> Result<u64, DomainError> {
        let documents = self.documents.lock().await;
        Ok(documents.iter().filter(|doc| evaluate(filter, doc)).count() as u64)
    }
}

/// Evaluates `filter` against `document` with MongoDB query semantics.
fn evaluate(filter: &Filter, document: &Document) -> bool {
    match filter {
        Filter::All => true,
        Filter::Eq(field, value) => field_equals(lookup(document, field), value),
        Filter::Ne(field, value) => !field_equals(lookup(document, field), value),
        Filter::Compare(field, op, value) => match lookup(document, field) {
            Some(Bson::Array(items)) => items.iter().any(|item| satisfies(item, *op, value)),
            Some(actual) => satisfies(actual, *op, value),
            None => false,
        },
        Filter::In(field, values) => {
            let actual = lookup(document, field);
            values.iter().any(|value| field_equals(actual, value))
        }
        Filter::Exists(field, expected) => lookup(document, field).is_some() == *expected,
        Filter::And(filters) => filters.iter().all(|f| evaluate(f, document)),
        Filter::Or(filters) => filters.iter().any(|f| evaluate(f, document)),
        Filter::Not(inner) => !evaluate(inner, document),
    }
}

fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        match current {
            Bson::Document(nested) => current = nested.get(segment)?,
            _ => return None,
        }
    }
    Some(current)
}

/// Missing fields equal `null`; array fields match when any element does.
fn field_equals(actual: Option<&Bson>, expected: &Bson) -> bool {
    match actual {
        None => matches!(expected, Bson::Null),
        Some(Bson::Array(items)) if !matches!(expected, Bson::Array(_)) => {
            items.iter().any(|item| values_equal(item, expected))
        }
        Some(value) => values_equal(value, expected),
    }
}

fn values_equal(a: &Bson, b: &Bson) -> bool {
    match compare_numbers(a, b) {
        Some(ordering) => ordering == Ordering::Equal,
        None => a == b,
    }
}

fn satisfies(actual: &Bson, op: Comparison, bound: &Bson) -> bool {
    match compare(actual, bound) {
        Some(ordering) => match op {
            Comparison::Gt => ordering == Ordering::Greater,
            Comparison::Gte => ordering != Ordering::Less,
            Comparison::Lt => ordering == Ordering::Less,
            Comparison::Lte => ordering != Ordering::Greater,
        },
        None => false,
    }
}

/// Orders values of the same kind; mismatched kinds are incomparable.
fn compare(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let Some(ordering) = compare_numbers(a, b) {
        return Some(ordering);
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.cmp(y)),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => Some(x.bytes().cmp(&y.bytes())),
        _ => None,
    }
}

/// Integers compare exactly; only a `Double` operand widens both sides to f64.
fn compare_numbers(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_integer(a), as_integer(b)) {
        return Some(x.cmp(&y));
    }
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y),
        _ => None,
    }
}

fn as_integer(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(v) => Some(i64::from(*v)),
        Bson::Int64(v) => Some(*v),
        _ => None,
    }
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}
