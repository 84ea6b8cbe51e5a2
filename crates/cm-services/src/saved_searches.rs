//! # Saved searches and new-match alerts
//!
//! A saved search is a sparse filter snapshot. Alerts compare matches
//! against one global watermark: the instant of the previous check.

use crate::store::MarketStore;
use chrono::{DateTime, Utc};
use cm_core::error::{AppError, Result};
use cm_core::filter::{FilterState, ListingFilter, SortMode};
use cm_core::matching::{self, generate_search_name};
use cm_core::models::{generate_id, Listing, SavedSearch};
use cm_core::traits::{Clock, Collection};
use serde::Serialize;
use std::sync::Arc;

/// New listings found for one saved search during a check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchMatches {
    pub search: SavedSearch,
    pub new_listings: Vec<Listing>,
}

pub struct SavedSearchService {
    store: Arc<MarketStore>,
    clock: Arc<dyn Clock>,
}

impl SavedSearchService {
    pub fn new(store: Arc<MarketStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn list(&self) -> Vec<SavedSearch> {
        self.store.get(Collection::SavedSearches).await
    }

    pub async fn get(&self, id: &str) -> Result<SavedSearch> {
        self.list()
            .await
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| AppError::not_found("SavedSearch", id))
    }

    /// Stores the sparse projection of `filters`. A blank or missing name is
    /// generated from the filter contents.
    pub async fn save(&self, filters: &ListingFilter, name: Option<&str>) -> Result<SavedSearch> {
        let filters = filters.normalized();
        if !filters.is_active() {
            return Err(AppError::validation("filters", "no filters to save"));
        }
        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => n.to_string(),
            None => generate_search_name(&filters),
        };
        let search = SavedSearch {
            id: generate_id(),
            name,
            filters,
            created_at: self.clock.now(),
            notifications_enabled: true,
        };

        let mut searches: Vec<SavedSearch> = self.store.load(Collection::SavedSearches).await?;
        searches.push(search.clone());
        self.store.put(Collection::SavedSearches, &searches).await?;
        tracing::info!(id = %search.id, name = %search.name, "search saved");
        Ok(search)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let mut searches: Vec<SavedSearch> = self.store.load(Collection::SavedSearches).await?;
        let before = searches.len();
        searches.retain(|s| s.id != id);
        if searches.len() == before {
            return Err(AppError::not_found("SavedSearch", id));
        }
        self.store.put(Collection::SavedSearches, &searches).await?;
        tracing::info!(id, "search deleted");
        Ok(())
    }

    pub async fn toggle_notifications(&self, id: &str) -> Result<SavedSearch> {
        let mut searches: Vec<SavedSearch> = self.store.load(Collection::SavedSearches).await?;
        let search = searches
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| AppError::not_found("SavedSearch", id))?;
        search.notifications_enabled = !search.notifications_enabled;
        let updated = search.clone();

        self.store.put(Collection::SavedSearches, &searches).await?;
        tracing::info!(id, enabled = updated.notifications_enabled, "search notifications toggled");
        Ok(updated)
    }

    pub fn matching(&self, search: &SavedSearch, listings: &[Listing]) -> Vec<Listing> {
        matching::matching_listings(search, listings)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Current match count for every saved search, in saved order.
    pub async fn match_counts(&self, listings: &[Listing]) -> Vec<(SavedSearch, usize)> {
        self.list()
            .await
            .into_iter()
            .map(|s| {
                let count = matching::matching_listings(&s, listings).len();
                (s, count)
            })
            .collect()
    }

    pub fn expand(&self, search: &SavedSearch, sort: SortMode) -> FilterState {
        matching::expand(search, sort)
    }

    /// Matches created since the previous check, for searches with
    /// notifications on. Searches without new matches are left out.
    ///
    /// The watermark moves to now on every call, even when nothing matched,
    /// so a listing is reported at most once. When the watermark cannot be
    /// read the check is skipped and the watermark stays where it was.
    pub async fn check_new_matches(&self, listings: &[Listing]) -> Vec<SearchMatches> {
        let watermark = match self.store.last_search_check().await {
            Ok(at) => at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            Err(e) => {
                tracing::warn!(error = %e, "search watermark unreadable, skipping check");
                return Vec::new();
            }
        };

        let found: Vec<SearchMatches> = self
            .list()
            .await
            .into_iter()
            .filter(|s| s.notifications_enabled)
            .filter_map(|search| {
                let new_listings: Vec<Listing> = matching::new_matches_since(&search, listings, watermark)
                    .into_iter()
                    .cloned()
                    .collect();
                (!new_listings.is_empty()).then_some(SearchMatches { search, new_listings })
            })
            .collect();

        let now = self.clock.now();
        if let Err(e) = self.store.set_last_search_check(now).await {
            tracing::warn!(error = %e, "could not advance the search watermark");
        }
        tracing::debug!(%watermark, %now, searches = found.len(), "checked saved searches");
        found
    }
}
