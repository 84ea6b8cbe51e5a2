//! Every `KvBackend` must behave the same behind `MarketStore`.

use cm_core::models::Listing;
use cm_core::traits::{Collection, KvBackend, MockSeedSource};
use cm_services::MarketStore;
use cm_store_local::{LocalFileStore, MemoryStore, StaticSeed};
use integration_tests::listing;
use std::sync::Arc;

async fn backend_contract(backend: &dyn KvBackend) {
    assert_eq!(backend.read("wishlist").await.unwrap(), None);

    backend.write("wishlist", r#"["a"]"#).await.unwrap();
    backend.write("wishlist", r#"["a","b"]"#).await.unwrap();
    assert_eq!(backend.read("wishlist").await.unwrap().as_deref(), Some(r#"["a","b"]"#));

    backend.remove("wishlist").await.unwrap();
    assert_eq!(backend.read("wishlist").await.unwrap(), None);
    // Removing an absent key is not an error.
    backend.remove("wishlist").await.unwrap();
}

async fn store_contract(backend: Arc<dyn KvBackend>) {
    let seed = vec![
        listing("s1", "Statistics", "MAT", 120.0, "2024-01-01T00:00:00Z"),
        listing("s2", "Biology", "BIO", 80.0, "2024-01-02T00:00:00Z"),
    ];
    let store = MarketStore::new(backend.clone(), Arc::new(StaticSeed::new(seed.clone())));
    assert_eq!(store.initialize().await.unwrap(), seed);

    let exported = store.export(Collection::Listings).await.unwrap();
    store.clear_all().await.unwrap();
    assert!(store.listings().await.is_empty());
    store.import(Collection::Listings, &exported).await.unwrap();
    assert_eq!(store.listings().await, seed);

    backend.write("reports", "corrupt").await.unwrap();
    let reports: Vec<cm_core::models::Report> = store.get(Collection::Reports).await;
    assert!(reports.is_empty());
}

#[tokio::test]
async fn memory_backend() {
    let backend = Arc::new(MemoryStore::new());
    backend_contract(backend.as_ref()).await;
    store_contract(backend).await;
}

#[tokio::test]
async fn local_file_backend() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(LocalFileStore::new(dir.path().join("data")));
    backend_contract(backend.as_ref()).await;
    store_contract(backend.clone()).await;
    assert!(dir.path().join("data").join("listings.json").exists());
}

#[cfg(feature = "db-sqlite")]
#[tokio::test]
async fn sqlite_backend() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("market.db").display());
    let backend = Arc::new(cm_store_sqlite::SqliteKvStore::new(&url).await.unwrap());
    backend_contract(backend.as_ref()).await;
    store_contract(backend).await;
}

#[tokio::test]
async fn seed_is_fetched_only_without_persisted_listings() {
    let backend = Arc::new(MemoryStore::new());
    let mut seed = MockSeedSource::new();
    seed.expect_fetch()
        .times(1)
        .returning(|| Ok(vec![listing("only", "Chemistry", "CHE", 90.0, "2024-01-01T00:00:00Z")]));
    let store = MarketStore::new(backend, Arc::new(seed));

    let first: Vec<Listing> = store.initialize().await.unwrap();
    let second = store.initialize().await.unwrap();
    assert_eq!(first, second);
}
