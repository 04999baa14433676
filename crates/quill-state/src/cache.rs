//! Durable cache
//!
//! The host environment owns the storage medium; the store only needs a
//! named-slot key/value interface. Two adapters are provided:
//! - [`MemoryCache`]: in-process, moka-backed
//! - [`FileCache`]: one JSON file per slot in a directory

use crate::error::CacheError;
use async_trait::async_trait;
use moka::future::Cache;
use serde_json::Value;
use std::fmt::Debug;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Check that a slot name maps to storage
///
/// Accepts non-empty names made of ASCII alphanumerics, `-` and `_`.
///
/// # Errors
/// Returns [`CacheError::InvalidSlot`] for any other name
pub fn validate_slot(slot: &str) -> Result<(), CacheError> {
    let valid = !slot.is_empty()
        && slot
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(CacheError::InvalidSlot(slot.to_string()))
    }
}

/// Named-slot durable key/value store
#[async_trait]
pub trait DurableCache: Send + Sync + Debug {
    /// Read a slot
    ///
    /// # Returns
    /// `Ok(None)` when the slot has never been written
    async fn load(&self, slot: &str) -> Result<Option<Value>, CacheError>;

    /// Overwrite a slot
    async fn store(&self, slot: &str, value: Value) -> Result<(), CacheError>;

    /// Remove a slot (no-op when absent)
    async fn clear(&self, slot: &str) -> Result<(), CacheError>;
}

/// In-process cache
#[derive(Debug, Clone)]
pub struct MemoryCache {
    inner: Cache<String, Arc<Value>>,
}

impl MemoryCache {
    /// Create cache with max slot capacity
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
        }
    }

    /// Create cache pre-seeded with one slot
    pub async fn seeded(slot: &str, value: Value) -> Self {
        let cache = Self::default();
        cache.inner.insert(slot.to_string(), Arc::new(value)).await;
        cache
    }
}

impl Default for MemoryCache {
    /// Create cache with default capacity (64 slots)
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl DurableCache for MemoryCache {
    async fn load(&self, slot: &str) -> Result<Option<Value>, CacheError> {
        Ok(self.inner.get(slot).await.map(|v| Value::clone(&v)))
    }

    async fn store(&self, slot: &str, value: Value) -> Result<(), CacheError> {
        self.inner.insert(slot.to_string(), Arc::new(value)).await;
        Ok(())
    }

    async fn clear(&self, slot: &str) -> Result<(), CacheError> {
        self.inner.invalidate(slot).await;
        Ok(())
    }
}

/// File-backed cache: `<dir>/<slot>.json`
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Create cache rooted at directory (created on first write)
    #[inline]
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for slot
    ///
    /// # Errors
    /// Returns error if [`validate_slot`] rejects the name
    pub fn slot_path(&self, slot: &str) -> Result<PathBuf, CacheError> {
        validate_slot(slot)?;
        Ok(self.dir.join(format!("{slot}.json")))
    }
}

#[async_trait]
impl DurableCache for FileCache {
    async fn load(&self, slot: &str) -> Result<Option<Value>, CacheError> {
        let path = self.slot_path(slot)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::io_error(path, e)),
        }
    }

    async fn store(&self, slot: &str, value: Value) -> Result<(), CacheError> {
        let path = self.slot_path(slot)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CacheError::io_error(&self.dir, e))?;

        // Readers never observe a partially written slot
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(&value)?;
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| CacheError::io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| CacheError::io_error(&path, e))?;
        Ok(())
    }

    async fn clear(&self, slot: &str) -> Result<(), CacheError> {
        let path = self.slot_path(slot)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io_error(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn memory_cache_roundtrip() {
        let cache = MemoryCache::default();
        assert!(cache.load("research").await.unwrap().is_none());

        cache.store("research", json!({"title": "X"})).await.unwrap();
        assert_eq!(cache.load("research").await.unwrap(), Some(json!({"title": "X"})));

        cache.clear("research").await.unwrap();
        assert!(cache.load("research").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn memory_cache_seeded() {
        let cache = MemoryCache::seeded("research", json!({"title": "X"})).await;
        assert!(cache.load("research").await.unwrap().is_some());
        assert!(cache.load("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_cache_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("nested"));

        assert!(cache.load("research").await.unwrap().is_none());
        cache.store("research", json!({"title": "X"})).await.unwrap();
        assert_eq!(cache.load("research").await.unwrap(), Some(json!({"title": "X"})));
        assert!(dir.path().join("nested/research.json").exists());
        assert!(!dir.path().join("nested/research.json.tmp").exists());

        cache.clear("research").await.unwrap();
        cache.clear("research").await.unwrap();
        assert!(cache.load("research").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_cache_rejects_path_like_slots() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());

        for slot in ["", "../escape", "a/b", "a.b", "my notes"] {
            assert!(matches!(
                cache.store(slot, json!({})).await,
                Err(CacheError::InvalidSlot(_))
            ));
        }
    }

    #[test]
    fn slot_names() {
        for slot in ["research", "run-7", "session_2"] {
            assert!(validate_slot(slot).is_ok(), "{slot}");
        }
        for slot in ["", "my notes", "caf\u{e9}", "a:b"] {
            assert!(matches!(validate_slot(slot), Err(CacheError::InvalidSlot(_))), "{slot}");
        }
    }

    #[tokio::test]
    async fn file_cache_corrupt_slot_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("research.json"), b"{ not json").unwrap();
        let cache = FileCache::new(dir.path());

        assert!(matches!(
            cache.load("research").await,
            Err(CacheError::Serialization(_))
        ));
    }
}
