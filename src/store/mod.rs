use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;

pub mod session;

pub use session::{key_prefix, Session};

/// Flat key-value namespace holding each user's serialized collections.
/// Values are opaque blobs; keys are already sanitized by the session layer.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Bytes>>;
    async fn put(&self, key: &str, value: Bytes) -> anyhow::Result<()>;
}

/// One file per key under a data directory.
#[derive(Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("create data dir {}", root.display()))?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KvStore for FileStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Bytes>> {
        let path = self.path_for(key);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
        }
    }

    async fn put(&self, key: &str, value: Bytes) -> anyhow::Result<()> {
        let path = self.path_for(key);
        tokio::fs::write(&path, &value)
            .await
            .with_context(|| format!("write {}", path.display()))
    }
}

/// In-memory store used by tests and `AppState::fake`.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Bytes>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Bytes>> {
        Ok(self.entries.lock().expect("store lock").get(key).cloned())
    }

    async fn put(&self, key: &str, value: Bytes) -> anyhow::Result<()> {
        self.entries
            .lock()
            .expect("store lock")
            .insert(key.to_string(), value);
        Ok(())
    }
}
