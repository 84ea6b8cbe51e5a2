//! Filesystem implementation of `KvBackend`: one JSON document per key.

use anyhow::{bail, Context};
use async_trait::async_trait;
use cm_core::traits::KvBackend;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

pub struct LocalFileStore {
    /// Directory holding `<key>.json` documents (e.g., "./data")
    root_path: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root_path: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    /// Keys map directly to file names, so anything path-like is refused.
    fn document_path(&self, key: &str) -> anyhow::Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            bail!("invalid storage key '{key}'");
        }
        Ok(self.root_path.join(format!("{key}.json")))
    }
}

#[async_trait]
impl KvBackend for LocalFileStore {
    async fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.document_path(key)?;
        match fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    /// Writes to a sibling temp file and renames it over the target, so a
    /// crash mid-write leaves the previous document intact.
    async fn write(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.document_path(key)?;
        fs::create_dir_all(&self.root_path)
            .await
            .with_context(|| format!("creating {}", self.root_path.display()))?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("replacing {}", path.display()))?;
        tracing::debug!(key, bytes = value.len(), "document written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        let path = self.document_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_read_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path().join("nested"));

        assert_eq!(store.read("listings").await.unwrap(), None);
        store.write("listings", "[1,2]").await.unwrap();
        assert_eq!(store.read("listings").await.unwrap().as_deref(), Some("[1,2]"));
        assert!(dir.path().join("nested/listings.json").exists());
        assert!(!dir.path().join("nested/listings.json.tmp").exists());

        store.write("listings", "[]").await.unwrap();
        assert_eq!(store.read("listings").await.unwrap().as_deref(), Some("[]"));

        store.remove("listings").await.unwrap();
        store.remove("listings").await.unwrap();
        assert_eq!(store.read("listings").await.unwrap(), None);
    }

    #[tokio::test]
    async fn rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path());
        assert!(store.write("../escape", "x").await.is_err());
        assert!(store.read("a/b").await.is_err());
    }
}
