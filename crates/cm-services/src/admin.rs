//! # Admin Surface
//!
//! Bulk export, import and clear sit behind a passphrase check. A successful
//! `unlock` hands out an `AdminSession` borrowing the console; there is no
//! other way to reach these operations.

use crate::store::MarketStore;
use cm_core::error::{AppError, Result};
use cm_core::models::Report;
use cm_core::traits::{AdminGate, Collection};
use std::sync::Arc;

pub struct AdminConsole {
    store: Arc<MarketStore>,
    gate: Arc<dyn AdminGate>,
}

impl AdminConsole {
    pub fn new(store: Arc<MarketStore>, gate: Arc<dyn AdminGate>) -> Self {
        Self { store, gate }
    }

    pub async fn unlock(&self, passphrase: &str) -> Result<AdminSession<'_>> {
        if !self.gate.verify(passphrase).await {
            tracing::warn!("admin unlock rejected");
            return Err(AppError::Unauthorized("incorrect admin passphrase".into()));
        }
        tracing::info!("admin unlocked");
        Ok(AdminSession { store: &self.store })
    }
}

pub struct AdminSession<'a> {
    store: &'a MarketStore,
}

impl AdminSession<'_> {
    pub async fn export(&self, kind: Collection) -> Result<Vec<u8>> {
        self.store.export(kind).await
    }

    pub async fn import(&self, kind: Collection, document: &[u8]) -> Result<usize> {
        self.store.import(kind, document).await
    }

    pub async fn clear_all(&self) -> Result<()> {
        self.store.clear_all().await
    }

    pub async fn reports(&self) -> Vec<Report> {
        self.store.get(Collection::Reports).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cm_core::traits::MockAdminGate;
    use cm_store_local::{MemoryStore, StaticSeed};
    use mockall::predicate::function;

    fn console(gate: MockAdminGate) -> AdminConsole {
        let store = MarketStore::new(Arc::new(MemoryStore::new()), Arc::new(StaticSeed::default()));
        AdminConsole::new(Arc::new(store), Arc::new(gate))
    }

    #[tokio::test]
    async fn wrong_passphrase_is_unauthorized() {
        let mut gate = MockAdminGate::new();
        gate.expect_verify().returning(|_| false);
        let console = console(gate);
        assert!(matches!(console.unlock("guess").await, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn unlocked_session_reaches_the_store() {
        let mut gate = MockAdminGate::new();
        gate.expect_verify()
            .with(function(|p: &str| p == "open sesame"))
            .times(1)
            .returning(|_| true);
        let console = console(gate);
        let session = console.unlock("open sesame").await.unwrap();

        assert_eq!(session.import(Collection::Wishlist, br#"["x"]"#).await.unwrap(), 1);
        assert_eq!(session.export(Collection::Wishlist).await.unwrap(), br#"["x"]"#);
        assert!(session.reports().await.is_empty());

        session.clear_all().await.unwrap();
        assert_eq!(session.export(Collection::Wishlist).await.unwrap(), b"[]");
    }
}
