//! `SeedSource` implementations for the first-run listing collection.

use anyhow::Context;
use async_trait::async_trait;
use cm_core::models::Listing;
use cm_core::traits::SeedSource;
use std::path::PathBuf;

/// Reads a JSON array of listings from disk on every fetch.
pub struct FileSeedSource {
    path: PathBuf,
}

impl FileSeedSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SeedSource for FileSeedSource {
    async fn fetch(&self) -> anyhow::Result<Vec<Listing>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading seed {}", self.path.display()))?;
        let listings: Vec<Listing> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing seed {}", self.path.display()))?;
        tracing::info!(path = %self.path.display(), count = listings.len(), "seed loaded");
        Ok(listings)
    }
}

/// A seed held in memory, e.g. a dataset compiled into the binary.
#[derive(Debug, Clone, Default)]
pub struct StaticSeed {
    listings: Vec<Listing>,
}

impl StaticSeed {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self { listings }
    }

    /// Parses an embedded JSON document.
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let listings = serde_json::from_str(raw).context("parsing embedded seed")?;
        Ok(Self { listings })
    }
}

#[async_trait]
impl SeedSource for StaticSeed {
    async fn fetch(&self) -> anyhow::Result<Vec<Listing>> {
        Ok(self.listings.clone())
    }
}
