//! # campus-market Binary
//!
//! Assembles the marketplace from settings and compile-time features, then
//! runs one command (or a `shell` of commands) against it.

mod cli;
mod commands;
mod logging;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use cm_auth_simple::PassphraseGate;
use cm_config::{Settings, StorageBackend};
use cm_core::traits::{KvBackend, SeedSource, SystemClock};
use cm_services::Marketplace;
use cm_store_local::{FileSeedSource, LocalFileStore, MemoryStore, StaticSeed};
use commands::App;
use std::sync::Arc;

#[cfg(feature = "db-sqlite")]
use cm_store_sqlite::SqliteKvStore;

/// Listings installed on first run when no `seed.path` is configured.
const BUNDLED_SEED: &str = include_str!("../data/listings.json");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (mut settings, dotenv) = Settings::load(cli.config.as_deref())?;
    logging::init(&settings.log)?;
    dotenv.log();

    let market = build_marketplace(&mut settings).await?;
    market
        .store
        .initialize()
        .await
        .context("loading listings")?;

    let mut app = App::new(market, cli.json);
    app.run(cli.command).await
}

async fn build_marketplace(settings: &mut Settings) -> anyhow::Result<Marketplace> {
    let backend: Arc<dyn KvBackend> = match settings.storage.backend {
        StorageBackend::Local => Arc::new(LocalFileStore::new(settings.storage.data_dir.clone())),
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        #[cfg(feature = "db-sqlite")]
        StorageBackend::Sqlite => Arc::new(SqliteKvStore::new(&settings.storage.sqlite_url).await?),
        #[cfg(not(feature = "db-sqlite"))]
        StorageBackend::Sqlite => anyhow::bail!("this build has no sqlite support (feature `db-sqlite`)"),
    };

    let seed: Arc<dyn SeedSource> = match &settings.seed.path {
        Some(path) => Arc::new(FileSeedSource::new(path)),
        None => Arc::new(StaticSeed::from_json(BUNDLED_SEED)?),
    };

    let gate = Arc::new(PassphraseGate::new(settings.admin.passphrase_hash.take()));

    tracing::info!(backend = ?settings.storage.backend, "campus-market ready");
    Ok(Marketplace::new(backend, seed, gate, Arc::new(SystemClock)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bundled_seed_is_valid() {
        let listings = StaticSeed::from_json(BUNDLED_SEED).unwrap().fetch().await.unwrap();
        assert!(!listings.is_empty());
        let mut ids: Vec<&str> = listings.iter().map(|l| l.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), listings.len());
    }
}
