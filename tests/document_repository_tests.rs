use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bson::Document;
use docrepo::{
    uuid_as_string, DocumentCollection, DocumentRepository, DocumentStore, DomainError, Entity,
    Filter, InMemoryDocumentCollection, InMemoryDocumentStore, Item, Repository,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct God {
    #[serde(rename = "_id", with = "uuid_as_string")]
    id: Uuid,
    name: String,
    domain: String,
    power: i32,
}

impl God {
    fn new(name: &str, domain: &str, power: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            domain: domain.to_string(),
            power,
        }
    }
}

impl Entity for God {
    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }
}

/// Wraps a collection and counts every call that reaches it.
struct CountingCollection {
    inner: InMemoryDocumentCollection,
    calls: AtomicUsize,
}

impl CountingCollection {
    fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryDocumentCollection::new(name),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentCollection for CountingCollection {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn find(&self, filter: &Filter) -> Result<Vec<Document>, DomainError> {
        self.record();
        self.inner.find(filter).await
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, DomainError> {
        self.record();
        self.inner.find_one(filter).await
    }

    async fn insert_one(&self, document: Document) -> Result<(), DomainError> {
        self.record();
        self.inner.insert_one(document).await
    }

    async fn replace_one(&self, filter: &Filter, document: Document) -> Result<u64, DomainError> {
        self.record();
        self.inner.replace_one(filter, document).await
    }

    async fn delete_one(&self, filter: &Filter) -> Result<u64, DomainError> {
        self.record();
        self.inner.delete_one(filter).await
    }

    async fn count(&self, filter: &Filter) -> Result<u64, DomainError> {
        self.record();
        self.inner.count(filter).await
    }
}

fn gods_repository() -> DocumentRepository<God> {
    let store = InMemoryDocumentStore::new("catalog");
    DocumentRepository::new(&store, "gods")
}

fn counting_repository() -> (DocumentRepository<God>, Arc<CountingCollection>) {
    let collection = CountingCollection::new("gods");
    let repository = DocumentRepository::with_collection(collection.clone());
    (repository, collection)
}

#[tokio::test]
async fn create_then_get_returns_equal_entity() {
    let repo = gods_repository();
    let zeus = God::new("Zeus", "sky", 10);

    repo.create(&zeus).await.expect("create");

    let found = repo.get(zeus.id).await.expect("get").expect("zeus exists");
    assert_eq!(found, zeus);
}

#[tokio::test]
async fn get_all_on_empty_collection_returns_empty_vec() {
    let repo = gods_repository();

    let all = repo.get_all().await.expect("get_all");
    assert!(all.is_empty(), "empty collection should yield no entities");
}

#[tokio::test]
async fn get_all_returns_every_entity_in_insertion_order() {
    let repo = gods_repository();
    let gods = [
        God::new("Zeus", "sky", 10),
        God::new("Poseidon", "sea", 9),
        God::new("Hades", "underworld", 9),
    ];
    for god in &gods {
        repo.create(god).await.expect("create");
    }

    let all = repo.get_all().await.expect("get_all");
    assert_eq!(all, gods.to_vec());
}

#[tokio::test]
async fn create_and_update_without_identity_fail_before_reaching_store() {
    let (repo, collection) = counting_repository();
    let mut nameless = God::new("Chaos", "void", 0);
    nameless.set_id(Uuid::nil());

    let err = repo.create(&nameless).await.expect_err("create must fail");
    assert!(err.is_invalid_argument());

    let err = repo.update(&nameless).await.expect_err("update must fail");
    assert!(err.is_invalid_argument());

    assert_eq!(collection.calls(), 0, "store must not be contacted");
}

#[tokio::test]
async fn each_operation_is_a_single_store_call() {
    let (repo, collection) = counting_repository();
    let athena = God::new("Athena", "wisdom", 8);

    repo.create(&athena).await.expect("create");
    assert_eq!(collection.calls(), 1);

    repo.get(athena.id).await.expect("get");
    assert_eq!(collection.calls(), 2);

    repo.update(&athena).await.expect("update");
    assert_eq!(collection.calls(), 3);

    repo.get_all().await.expect("get_all");
    assert_eq!(collection.calls(), 4);

    repo.remove(athena.id).await.expect("remove");
    assert_eq!(collection.calls(), 5);
}

#[tokio::test]
async fn unknown_id_is_absent_and_remove_succeeds() {
    let repo = gods_repository();
    let unknown = Uuid::new_v4();

    assert!(repo.get(unknown).await.expect("get").is_none());
    repo.remove(unknown).await.expect("remove of unknown id");
}

#[tokio::test]
async fn remove_twice_is_idempotent() {
    let repo = gods_repository();
    let ares = God::new("Ares", "war", 7);
    let apollo = God::new("Apollo", "sun", 7);
    repo.create(&ares).await.expect("create ares");
    repo.create(&apollo).await.expect("create apollo");

    repo.remove(ares.id).await.expect("first remove");
    let after_first = repo.get_all().await.expect("get_all");

    repo.remove(ares.id).await.expect("second remove");
    let after_second = repo.get_all().await.expect("get_all");

    assert_eq!(after_first, vec![apollo.clone()]);
    assert_eq!(after_second, after_first);
}

#[tokio::test]
async fn update_replaces_stored_entity() {
    let repo = gods_repository();
    let hermes = God::new("Hermes", "travel", 6);
    repo.create(&hermes).await.expect("create");

    let mut changed = hermes.clone();
    changed.domain = "messengers".to_string();
    changed.power = 7;
    repo.update(&changed).await.expect("update");

    let found = repo.get(hermes.id).await.expect("get").expect("hermes exists");
    assert_eq!(found, changed);
    assert_ne!(found, hermes);
}

#[tokio::test]
async fn update_of_missing_entity_does_not_insert() {
    let repo = gods_repository();
    let ghost = God::new("Ghost", "nothing", 0);

    repo.update(&ghost).await.expect("update of missing entity");

    assert!(repo.get(ghost.id).await.expect("get").is_none());
    assert_eq!(repo.count().await.expect("count"), 0);
}

#[tokio::test]
async fn duplicate_create_is_a_store_failure() {
    let repo = gods_repository();
    let hera = God::new("Hera", "marriage", 8);
    repo.create(&hera).await.expect("create");

    let err = repo.create(&hera).await.expect_err("duplicate create");
    assert!(err.is_duplicate_key());
    assert!(err.is_store_failure());
    assert_eq!(repo.count().await.expect("count"), 1);
}

#[tokio::test]
async fn filters_select_only_matching_entities() {
    let repo = gods_repository();
    let zeus = God::new("Zeus", "sky", 10);
    let poseidon = God::new("Poseidon", "sea", 9);
    let hephaestus = God::new("Hephaestus", "forge", 5);
    for god in [&zeus, &poseidon, &hephaestus] {
        repo.create(god).await.expect("create");
    }

    let sea = Filter::eq("domain", "sea");
    let matched = repo.get_all_filtered(&sea).await.expect("get_all_filtered");
    assert_eq!(matched, vec![poseidon.clone()]);

    let first = repo.get_filtered(&sea).await.expect("get_filtered");
    assert_eq!(first, Some(poseidon.clone()));

    let strong = Filter::gte("power", 9);
    let strong_gods = repo.get_all_filtered(&strong).await.expect("strong gods");
    assert_eq!(strong_gods, vec![zeus.clone(), poseidon.clone()]);

    let none = Filter::eq("domain", "love");
    assert!(repo.get_filtered(&none).await.expect("no match").is_none());
    assert!(repo
        .get_all_filtered(&none)
        .await
        .expect("no match")
        .is_empty());
}

#[tokio::test]
async fn get_filtered_returns_first_match_in_insertion_order() {
    let repo = gods_repository();
    let zeus = God::new("Zeus", "sky", 10);
    let poseidon = God::new("Poseidon", "sea", 9);
    let hades = God::new("Hades", "underworld", 9);
    for god in [&zeus, &poseidon, &hades] {
        repo.create(god).await.expect("create");
    }

    let strong = repo
        .get_filtered(&Filter::gte("power", 9))
        .await
        .expect("strong");
    assert_eq!(strong, Some(zeus));

    let nine = repo
        .get_filtered(&Filter::eq("power", 9))
        .await
        .expect("power nine");
    assert_eq!(nine, Some(poseidon));
}

#[tokio::test]
async fn repositories_share_store_but_not_collections() {
    let store = InMemoryDocumentStore::new("catalog");
    let gods: DocumentRepository<God> = DocumentRepository::new(&store, "gods");
    let items: DocumentRepository<Item> = DocumentRepository::new(&store, "items");
    let gods_again: DocumentRepository<God> = DocumentRepository::new(&store, "gods");

    gods.create(&God::new("Iris", "rainbow", 3))
        .await
        .expect("create god");
    items
        .create(&Item::new("Nectar", "Drink of the gods", 4.0))
        .await
        .expect("create item");

    assert_eq!(gods.collection_name(), "gods");
    assert_eq!(gods.count().await.expect("count"), 1);
    assert_eq!(items.count().await.expect("count"), 1);
    assert_eq!(gods_again.count().await.expect("count"), 1);
    assert_eq!(store.name(), "catalog");
}

#[tokio::test]
async fn concurrent_creates_on_one_repository() {
    let repo: Arc<dyn Repository<God>> = Arc::new(gods_repository());

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move {
                let god = God::new(&format!("Minor god {}", i), "misc", i);
                repo.create(&god).await
            })
        })
        .collect();

    for handle in handles {
        handle.await.expect("join").expect("create");
    }

    assert_eq!(repo.count().await.expect("count"), 16);
}
