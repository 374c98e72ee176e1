use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::models::PriceRecord;
use crate::{AppError, Result};

/// File-backed price history, one JSON object keyed by item name.
///
/// All access goes through one mutex-guarded owner; every mutation rewrites
/// the whole file before the lock is released, so concurrent trackers never
/// lose updates to the read-modify-write cycle. Handles are cheap to clone.
#[derive(Clone)]
pub struct HistoryStore {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    path: PathBuf,
    records: BTreeMap<String, PriceRecord>,
}

impl HistoryStore {
    /// Opens the store, loading existing records. A missing file starts empty.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let records = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner { path, records })),
        })
    }

    /// Inserts a fresh armed record if the item is unknown, no-op otherwise.
    pub async fn ensure_item(&self, name: &str, link: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if !inner.records.contains_key(name) {
            debug!(item = name, "Creating fresh history record");
            inner
                .records
                .insert(name.to_string(), PriceRecord::new(link.to_string()));
            inner.save().await?;
        }
        Ok(())
    }

    pub async fn append_observation(&self, name: &str, timestamp: String, price: f64) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let record = inner
            .records
            .get_mut(name)
            .ok_or_else(|| AppError::Internal(format!("no history record for item {}", name)))?;
        record.price.push((timestamp, price));
        inner.save().await
    }

    /// Flips the armed flag off. Never flips it back on.
    pub async fn disarm(&self, name: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let record = inner
            .records
            .get_mut(name)
            .ok_or_else(|| AppError::Internal(format!("no history record for item {}", name)))?;
        record.notification = false;
        inner.save().await
    }

    pub async fn is_armed(&self, name: &str) -> Result<bool> {
        let inner = self.inner.lock().await;
        inner
            .records
            .get(name)
            .map(|record| record.notification)
            .ok_or_else(|| AppError::Internal(format!("no history record for item {}", name)))
    }

    pub async fn snapshot(&self) -> BTreeMap<String, PriceRecord> {
        self.inner.lock().await.records.clone()
    }

    /// Replaces the in-memory records and rewrites the file.
    pub async fn save_all(&self, records: BTreeMap<String, PriceRecord>) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.records = records;
        inner.save().await
    }
}

impl Inner {
    // Called with the store mutex held; the write must finish before the
    // lock is released, but it must not block the executor thread.
    async fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.records)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}
