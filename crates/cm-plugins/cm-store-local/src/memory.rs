//! In-process `KvBackend`. Nothing survives the process; used by tests and
//! the `memory` storage setting.

use async_trait::async_trait;
use cm_core::traits::KvBackend;
use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl KvBackend for MemoryStore {
    async fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.documents.get(key).map(|v| v.value().clone()))
    }

    async fn write(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.documents.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.documents.remove(key);
        Ok(())
    }
}
