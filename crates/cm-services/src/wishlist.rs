use crate::store::MarketStore;
use cm_core::error::Result;
use cm_core::models::Listing;
use cm_core::traits::Collection;
use std::sync::Arc;

/// Ordered set of listing ids the user wants to keep an eye on.
///
/// Ids are not required to reference existing listings; dangling ids are
/// simply skipped when resolving `items`.
pub struct WishlistService {
    store: Arc<MarketStore>,
}

impl WishlistService {
    pub fn new(store: Arc<MarketStore>) -> Self {
        Self { store }
    }

    pub async fn ids(&self) -> Vec<String> {
        self.store.get(Collection::Wishlist).await
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.ids().await.iter().any(|w| w == id)
    }

    /// Returns `false` when the id was already present.
    pub async fn add(&self, id: &str) -> Result<bool> {
        let mut ids: Vec<String> = self.store.load(Collection::Wishlist).await?;
        if ids.iter().any(|w| w == id) {
            return Ok(false);
        }
        ids.push(id.to_string());
        self.store.put(Collection::Wishlist, &ids).await?;
        tracing::debug!(id, "added to wishlist");
        Ok(true)
    }

    /// Returns `false` when the id was not present.
    pub async fn remove(&self, id: &str) -> Result<bool> {
        let mut ids: Vec<String> = self.store.load(Collection::Wishlist).await?;
        let before = ids.len();
        ids.retain(|w| w != id);
        if ids.len() == before {
            return Ok(false);
        }
        self.store.put(Collection::Wishlist, &ids).await?;
        tracing::debug!(id, "removed from wishlist");
        Ok(true)
    }

    /// Flips membership and reports whether the id is now wishlisted.
    pub async fn toggle(&self, id: &str) -> Result<bool> {
        if self.remove(id).await? {
            Ok(false)
        } else {
            self.add(id).await
        }
    }

    /// Wishlisted entries of `listings`, in collection order.
    pub async fn items(&self, listings: &[Listing]) -> Vec<Listing> {
        let ids = self.ids().await;
        listings
            .iter()
            .filter(|l| ids.contains(&l.id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cm_core::error::AppError;
    use cm_core::traits::MockKvBackend;
    use cm_store_local::{MemoryStore, StaticSeed};

    fn service() -> WishlistService {
        let seed = StaticSeed::from_json(
            r#"[
              {"id": "a", "title": "A", "tag": "Book", "department": "CSE", "condition": "Used",
               "price": 1, "seller_name": "s", "seller_contact": "c", "created_at": "2024-01-01T00:00:00Z"},
              {"id": "b", "title": "B", "tag": "Book", "department": "CSE", "condition": "Used",
               "price": 2, "seller_name": "s", "seller_contact": "c", "created_at": "2024-01-02T00:00:00Z"}
            ]"#,
        )
        .unwrap();
        WishlistService::new(Arc::new(MarketStore::new(
            Arc::new(MemoryStore::new()),
            Arc::new(seed),
        )))
    }

    #[tokio::test]
    async fn add_is_idempotent() {
        let wl = service();
        assert!(wl.add("a").await.unwrap());
        assert!(!wl.add("a").await.unwrap());
        assert_eq!(wl.ids().await, ["a"]);
    }

    #[tokio::test]
    async fn toggle_flips_membership() {
        let wl = service();
        assert!(wl.toggle("b").await.unwrap());
        assert!(wl.contains("b").await);
        assert!(!wl.toggle("b").await.unwrap());
        assert!(!wl.contains("b").await);
        assert!(!wl.remove("b").await.unwrap());
    }

    #[tokio::test]
    async fn items_follow_collection_order_and_skip_dangling_ids() {
        let wl = service();
        let listings = wl.store.initialize().await.unwrap();
        for id in ["b", "gone", "a"] {
            wl.add(id).await.unwrap();
        }
        let titles: Vec<String> = wl.items(&listings).await.into_iter().map(|l| l.title).collect();
        assert_eq!(titles, ["A", "B"]);
    }

    #[tokio::test]
    async fn failed_read_leaves_the_wishlist_alone() {
        let mut backend = MockKvBackend::new();
        backend
            .expect_read()
            .returning(|_| Err(anyhow::anyhow!("permission denied")));
        backend.expect_write().never();
        let wl = WishlistService::new(Arc::new(MarketStore::new(
            Arc::new(backend),
            Arc::new(StaticSeed::default()),
        )));
        assert!(matches!(wl.add("a").await, Err(AppError::Storage(_))));
        assert!(matches!(wl.toggle("a").await, Err(AppError::Storage(_))));
    }
}
