//! campus-market/crates/cm-services/src/lib.rs
//!
//! Marketplace use cases built on the `cm-core` ports: the typed store,
//! listing lifecycle, wishlist, reports, saved-search alerts, thumbnails
//! and the passphrase-gated admin surface.

pub mod admin;
pub mod images;
pub mod listings;
pub mod reports;
pub mod saved_searches;
pub mod store;
pub mod wishlist;

pub use admin::{AdminConsole, AdminSession};
pub use listings::ListingService;
pub use reports::ReportService;
pub use saved_searches::{SavedSearchService, SearchMatches};
pub use store::MarketStore;
pub use wishlist::WishlistService;

use cm_core::traits::{AdminGate, Clock, KvBackend, SeedSource};
use std::sync::Arc;

/// Every service wired to one store. Built once per process.
pub struct Marketplace {
    pub store: Arc<MarketStore>,
    pub listings: ListingService,
    pub wishlist: WishlistService,
    pub reports: ReportService,
    pub searches: SavedSearchService,
    pub admin: AdminConsole,
}

impl Marketplace {
    pub fn new(
        backend: Arc<dyn KvBackend>,
        seed: Arc<dyn SeedSource>,
        gate: Arc<dyn AdminGate>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = Arc::new(MarketStore::new(backend, seed));
        Self {
            listings: ListingService::new(store.clone(), clock.clone()),
            wishlist: WishlistService::new(store.clone()),
            reports: ReportService::new(store.clone(), clock.clone()),
            searches: SavedSearchService::new(store.clone(), clock),
            admin: AdminConsole::new(store.clone(), gate),
            store,
        }
    }
}
