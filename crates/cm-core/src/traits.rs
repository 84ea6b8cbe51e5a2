//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use crate::models::Listing;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// The independently keyed collections kept in persistent storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Listings,
    Wishlist,
    Reports,
    SessionListings,
    SavedSearches,
}

impl Collection {
    /// Removed by a bulk clear. Saved searches survive it.
    pub const PRIMARY: [Collection; 4] = [
        Collection::Listings,
        Collection::Wishlist,
        Collection::Reports,
        Collection::SessionListings,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Collection::Listings => "listings",
            Collection::Wishlist => "wishlist",
            Collection::Reports => "reports",
            Collection::SessionListings => "session_listings",
            Collection::SavedSearches => "saved_searches",
        }
    }

    /// Conventional download name for an exported document.
    pub fn export_file_name(&self) -> String {
        format!("{}.json", self.key())
    }
}

impl std::str::FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "listings" => Ok(Collection::Listings),
            "wishlist" => Ok(Collection::Wishlist),
            "reports" => Ok(Collection::Reports),
            "session_listings" | "session-listings" => Ok(Collection::SessionListings),
            "saved_searches" | "saved-searches" => Ok(Collection::SavedSearches),
            other => Err(format!("unknown collection '{other}'")),
        }
    }
}

/// Key of the auxiliary document holding the last saved-search check instant.
pub const LAST_SEARCH_CHECK_KEY: &str = "last_search_check";

/// String-document persistence contract, the shape of browser local storage.
///
/// A `write` replaces the whole document in one step; readers never observe
/// a partially written value.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait KvBackend: Send + Sync {
    async fn read(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn write(&self, key: &str, value: &str) -> anyhow::Result<()>;
    async fn remove(&self, key: &str) -> anyhow::Result<()>;
}

/// Provider of the default listing collection used on first run.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SeedSource: Send + Sync {
    async fn fetch(&self) -> anyhow::Result<Vec<Listing>>;
}

/// Gate in front of the bulk export/import/clear operations.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AdminGate: Send + Sync {
    async fn verify(&self, passphrase: &str) -> bool;
}

/// Source of "now". Injected so watermark logic is testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[cfg(any(test, feature = "testing"))]
#[derive(Debug)]
pub struct ManualClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

#[cfg(any(test, feature = "testing"))]
impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: std::sync::Mutex::new(start) }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap() = at;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

#[cfg(any(test, feature = "testing"))]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
