//! # cm-config
//!
//! Layered settings for campus-market: built-in defaults, then an optional
//! TOML file, then `CAMPUS_MARKET__*` environment variables. A `.env` file in
//! the working directory is loaded into the environment first.
//!
//! `CAMPUS_MARKET__STORAGE__BACKEND=sqlite` sets `storage.backend`.

use config::{Config, Environment, File, FileFormat};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_PREFIX: &str = "CAMPUS_MARKET";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON document per key under `data_dir`.
    Local,
    Sqlite,
    /// Nothing survives the process.
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Deserialize)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
    pub sqlite_url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SeedSettings {
    /// Seed document to use instead of the bundled dataset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminSettings {
    /// Argon2 PHC string. Absent or blank locks the admin commands.
    #[serde(default, deserialize_with = "non_blank_secret")]
    pub passphrase_hash: Option<SecretString>,
}

#[derive(Debug, Deserialize)]
pub struct LogSettings {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub storage: StorageSettings,
    #[serde(default)]
    pub seed: SeedSettings,
    #[serde(default)]
    pub admin: AdminSettings,
    pub log: LogSettings,
}

fn non_blank_secret<'de, D: Deserializer<'de>>(d: D) -> Result<Option<SecretString>, D::Error> {
    Ok(Option::<String>::deserialize(d)?
        .filter(|s| !s.trim().is_empty())
        .map(SecretString::from))
}

/// What happened to the optional `.env` file during `Settings::load`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DotEnv {
    Loaded(PathBuf),
    Absent,
    Unreadable(String),
}

impl DotEnv {
    fn from_result(result: dotenvy::Result<PathBuf>) -> Self {
        match result {
            Ok(path) => DotEnv::Loaded(path),
            Err(e) if e.not_found() => DotEnv::Absent,
            Err(e) => DotEnv::Unreadable(e.to_string()),
        }
    }

    pub fn log(&self) {
        match self {
            DotEnv::Loaded(path) => tracing::debug!(path = %path.display(), ".env loaded"),
            DotEnv::Absent => {}
            DotEnv::Unreadable(error) => tracing::warn!(%error, "ignoring unreadable .env"),
        }
    }
}

impl Settings {
    /// Loads `.env`, then layers defaults, `path` and the process environment.
    ///
    /// Runs before logging is installed, so the `.env` outcome is returned
    /// for the caller to log once a subscriber exists.
    pub fn load(path: Option<&Path>) -> Result<(Self, DotEnv), ConfigError> {
        let dotenv = DotEnv::from_result(dotenvy::dotenv());
        Ok((Self::from_sources(path, None)?, dotenv))
    }

    /// Same layering as `load`, with an explicit variable map standing in for
    /// the process environment when `env` is given.
    pub fn from_sources(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("storage.backend", "local")?
            .set_default("storage.data_dir", "./data")?
            .set_default("storage.sqlite_url", "sqlite://./data/campus-market.db")?
            .set_default("log.level", "info")?
            .set_default("log.format", "text")?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .source(env.map(|vars| vars.into_iter().collect()));

        let settings: Settings = builder.add_source(environment).build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Rejects settings the selected backend cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.storage.backend {
            StorageBackend::Local if self.storage.data_dir.as_os_str().is_empty() => Err(
                ConfigError::Invalid("storage.data_dir is required for the local backend".into()),
            ),
            StorageBackend::Sqlite if self.storage.sqlite_url.trim().is_empty() => Err(
                ConfigError::Invalid("storage.sqlite_url is required for the sqlite backend".into()),
            ),
            _ if self.log.level.trim().is_empty() => {
                Err(ConfigError::Invalid("log.level must not be empty".into()))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn defaults_apply_without_sources() {
        let s = Settings::from_sources(None, env(&[])).unwrap();
        assert_eq!(s.storage.backend, StorageBackend::Local);
        assert_eq!(s.storage.data_dir, PathBuf::from("./data"));
        assert_eq!(s.log.format, LogFormat::Text);
        assert!(s.seed.path.is_none());
        assert!(s.admin.passphrase_hash.is_none());
    }

    #[test]
    fn environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("market.toml");
        std::fs::write(
            &path,
            r#"
            [storage]
            backend = "sqlite"
            sqlite_url = "sqlite://from-file.db"

            [log]
            format = "json"

            [admin]
            passphrase_hash = "$argon2id$v=19$placeholder"
            "#,
        )
        .unwrap();

        let s = Settings::from_sources(
            Some(&path),
            env(&[("CAMPUS_MARKET__STORAGE__SQLITE_URL", "sqlite://from-env.db")]),
        )
        .unwrap();
        assert_eq!(s.storage.backend, StorageBackend::Sqlite);
        assert_eq!(s.storage.sqlite_url, "sqlite://from-env.db");
        assert_eq!(s.log.format, LogFormat::Json);
        assert_eq!(
            s.admin.passphrase_hash.as_ref().map(|h| h.expose_secret().to_string()),
            Some("$argon2id$v=19$placeholder".to_string())
        );
    }

    #[test]
    fn blank_admin_hash_is_absent() {
        let s = Settings::from_sources(None, env(&[("CAMPUS_MARKET__ADMIN__PASSPHRASE_HASH", "  ")]))
            .unwrap();
        assert!(s.admin.passphrase_hash.is_none());
    }

    #[test]
    fn unknown_backend_fails_to_load() {
        let err = Settings::from_sources(None, env(&[("CAMPUS_MARKET__STORAGE__BACKEND", "redis")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn empty_sqlite_url_is_invalid() {
        let err = Settings::from_sources(
            None,
            env(&[
                ("CAMPUS_MARKET__STORAGE__BACKEND", "sqlite"),
                ("CAMPUS_MARKET__STORAGE__SQLITE_URL", ""),
            ]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(Settings::from_sources(Some(&missing), env(&[])).is_err());
    }

    #[test]
    fn dotenv_outcome_is_kept_for_later_logging() {
        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "no .env");
        assert_eq!(DotEnv::from_result(Err(dotenvy::Error::Io(missing))), DotEnv::Absent);

        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(
            DotEnv::from_result(Err(dotenvy::Error::Io(denied))),
            DotEnv::Unreadable(_)
        ));

        let path = PathBuf::from("/srv/market/.env");
        assert_eq!(DotEnv::from_result(Ok(path.clone())), DotEnv::Loaded(path));
    }
}
