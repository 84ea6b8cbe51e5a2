//! # MarketStore
//!
//! Typed repository over a string-document `KvBackend`. Display reads fail
//! soft: an absent or corrupt document is an empty collection. Mutations
//! load strictly, so a failed read never turns into an overwrite. Writes
//! replace a whole document in one backend call.

use chrono::{DateTime, Utc};
use cm_core::error::{AppError, Result};
use cm_core::models::{Listing, Report, SavedSearch};
use cm_core::traits::{Collection, KvBackend, SeedSource, LAST_SEARCH_CHECK_KEY};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
struct Watermark {
    checked_at: DateTime<Utc>,
}

pub struct MarketStore {
    backend: Arc<dyn KvBackend>,
    seed: Arc<dyn SeedSource>,
}

impl MarketStore {
    pub fn new(backend: Arc<dyn KvBackend>, seed: Arc<dyn SeedSource>) -> Self {
        Self { backend, seed }
    }

    /// Deserialized collection for `kind`; empty when absent, unreadable or corrupt.
    pub async fn get<T: DeserializeOwned>(&self, kind: Collection) -> Vec<T> {
        let raw = match self.backend.read(kind.key()).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(key = kind.key(), error = %e, "read failed, using empty collection");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(key = kind.key(), error = %e, "corrupt document, using empty collection");
                Vec::new()
            }
        }
    }

    /// Collection for `kind` as the base of a read-modify-write.
    ///
    /// Only an absent document is empty. A backend failure is `Storage` and
    /// a document that does not parse is `Internal`; either way the caller
    /// must not write.
    pub async fn load<T: DeserializeOwned>(&self, kind: Collection) -> Result<Vec<T>> {
        let Some(raw) = self.backend.read(kind.key()).await? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw)
            .map_err(|e| AppError::Internal(format!("stored {} document is corrupt: {e}", kind.key())))
    }

    pub async fn put<T: Serialize>(&self, kind: Collection, items: &[T]) -> Result<()> {
        let raw = serde_json::to_string(items)
            .map_err(|e| AppError::Internal(format!("serializing {}: {e}", kind.key())))?;
        self.backend.write(kind.key(), &raw).await?;
        tracing::debug!(key = kind.key(), count = items.len(), "collection saved");
        Ok(())
    }

    pub async fn listings(&self) -> Vec<Listing> {
        self.get(Collection::Listings).await
    }

    /// Loads listings, seeding them on first run.
    ///
    /// A persisted document always wins, even an empty one. Only when nothing
    /// usable is stored is the seed fetched and persisted. A failed fetch
    /// yields an empty collection and stores nothing, so the next start
    /// tries again.
    pub async fn initialize(&self) -> Result<Vec<Listing>> {
        if let Some(raw) = self.backend.read(Collection::Listings.key()).await? {
            match serde_json::from_str::<Vec<Listing>>(&raw) {
                Ok(listings) => {
                    tracing::debug!(count = listings.len(), "using persisted listings");
                    return Ok(listings);
                }
                Err(e) => tracing::warn!(error = %e, "persisted listings are corrupt, reseeding"),
            }
        }

        let seeded = match self.seed.fetch().await {
            Ok(listings) => listings,
            Err(e) => {
                tracing::warn!(error = %e, "seed fetch failed, starting empty");
                return Ok(Vec::new());
            }
        };
        self.put(Collection::Listings, &seeded).await?;
        tracing::info!(count = seeded.len(), "listings seeded");
        Ok(seeded)
    }

    /// The exact persisted document for `kind` (`[]` when nothing is stored).
    pub async fn export(&self, kind: Collection) -> Result<Vec<u8>> {
        let raw = self.backend.read(kind.key()).await?;
        Ok(raw.unwrap_or_else(|| "[]".to_string()).into_bytes())
    }

    /// Replaces the whole collection for `kind` with an imported document.
    ///
    /// The document must be a JSON array whose every element is a record of
    /// the kind's shape; anything else is rejected before the store is touched.
    /// Returns the number of records stored.
    pub async fn import(&self, kind: Collection, document: &[u8]) -> Result<usize> {
        let (raw, count) = match kind {
            Collection::Listings => {
                let listings: Vec<Listing> = parse_sequence(document)?;
                check_listings(&listings)?;
                (encode(&listings)?, listings.len())
            }
            Collection::Wishlist | Collection::SessionListings => {
                let ids = dedup_ids(parse_sequence(document)?);
                (encode(&ids)?, ids.len())
            }
            Collection::Reports => {
                let reports: Vec<Report> = parse_sequence(document)?;
                (encode(&reports)?, reports.len())
            }
            Collection::SavedSearches => {
                let searches: Vec<SavedSearch> = parse_sequence(document)?;
                (encode(&searches)?, searches.len())
            }
        };
        self.backend.write(kind.key(), &raw).await?;
        tracing::info!(key = kind.key(), count, "collection imported");
        Ok(count)
    }

    /// Removes listings, wishlist, reports and session ids. Irreversible.
    ///
    /// Every key is attempted; failures are reported together afterwards.
    pub async fn clear_all(&self) -> Result<()> {
        let mut failed = Vec::new();
        for kind in Collection::PRIMARY {
            if let Err(e) = self.backend.remove(kind.key()).await {
                tracing::warn!(key = kind.key(), error = %e, "remove failed");
                failed.push(format!("{}: {e:#}", kind.key()));
            }
        }
        if !failed.is_empty() {
            return Err(AppError::Storage(format!("clear incomplete ({})", failed.join("; "))));
        }
        tracing::info!("all primary collections cleared");
        Ok(())
    }

    /// Instant of the previous saved-search check.
    ///
    /// `None` when never checked or when the stored watermark is corrupt.
    /// A backend failure is an error, not "never checked".
    pub async fn last_search_check(&self) -> Result<Option<DateTime<Utc>>> {
        let Some(raw) = self.backend.read(LAST_SEARCH_CHECK_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<Watermark>(&raw) {
            Ok(w) => Ok(Some(w.checked_at)),
            Err(e) => {
                tracing::warn!(error = %e, "corrupt search watermark, treating as never checked");
                Ok(None)
            }
        }
    }

    pub async fn set_last_search_check(&self, at: DateTime<Utc>) -> Result<()> {
        let raw = encode(&Watermark { checked_at: at })?;
        self.backend.write(LAST_SEARCH_CHECK_KEY, &raw).await?;
        Ok(())
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| AppError::Internal(format!("serializing: {e}")))
}

fn parse_sequence<T: DeserializeOwned>(document: &[u8]) -> Result<Vec<T>> {
    let value: serde_json::Value = serde_json::from_slice(document)
        .map_err(|e| AppError::ImportFormat(format!("not a JSON document: {e}")))?;
    if !value.is_array() {
        return Err(AppError::ImportFormat("expected a JSON array".into()));
    }
    serde_json::from_value(value)
        .map_err(|e| AppError::ImportFormat(format!("record has the wrong shape: {e}")))
}

fn check_listings(listings: &[Listing]) -> Result<()> {
    let mut seen = HashSet::new();
    for l in listings {
        if !seen.insert(l.id.as_str()) {
            return Err(AppError::ImportFormat(format!("duplicate listing id '{}'", l.id)));
        }
        if !(l.price >= 0.0) {
            return Err(AppError::ImportFormat(format!("listing '{}' has a negative price", l.id)));
        }
    }
    Ok(())
}

fn dedup_ids(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}
