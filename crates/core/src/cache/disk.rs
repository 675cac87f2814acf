//! Disk-backed store for transformed images
//!
//! One file per `TransformKey` directly under the cache root. Writes go to a
//! temporary sibling first and are renamed into place, so a concurrent reader
//! can never observe a partially written entry as a hit. Concurrent writers
//! for the same key race benignly: both produce byte-identical output and the
//! last rename wins.

use super::TransformKey;
use crate::errors::CacheError;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::{debug, trace, warn};

/// Suffix counter distinguishing temporary files of concurrent in-process writes
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Disk cache keyed by the deterministic `TransformKey` file name
#[derive(Debug, Clone)]
pub struct ImageCache {
    root: PathBuf,
}

impl ImageCache {
    /// Create a cache rooted at the given directory
    ///
    /// The directory is not created here; `store` establishes it lazily with
    /// mkdir-p semantics on the first write.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// The absolute path a key's entry lives at
    pub fn entry_path(&self, key: &TransformKey) -> PathBuf {
        self.root.join(key.file_name())
    }

    /// Look up an entry, returning its bytes on a hit
    ///
    /// A missing file is a miss, not an error. Because entries are renamed
    /// into place atomically, any file we can open is complete.
    pub async fn lookup(&self, key: &TransformKey) -> Result<Option<Bytes>, CacheError> {
        let path = self.entry_path(key);
        match fs::read(&path).await {
            Ok(bytes) => {
                trace!(path = %path.display(), size_bytes = bytes.len(), "cache hit");
                Ok(Some(Bytes::from(bytes)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                trace!(path = %path.display(), "cache miss");
                Ok(None)
            }
            Err(source) => Err(CacheError::Read { path, source }),
        }
    }

    /// Store an entry, returning the path it was written to
    ///
    /// Directory creation is best-effort: if it fails, the subsequent write
    /// surfaces the real error. The bytes land in a temporary sibling that is
    /// renamed over the final path; on any failure the temporary file is
    /// removed best-effort and the original error propagates.
    pub async fn store(&self, key: &TransformKey, bytes: &[u8]) -> Result<PathBuf, CacheError> {
        if let Err(e) = fs::create_dir_all(&self.root).await {
            debug!(root = %self.root.display(), error = %e, "cache directory creation failed");
        }

        let path = self.entry_path(key);
        let tmp = tmp_path(&path);

        if let Err(source) = fs::write(&tmp, bytes).await {
            remove_best_effort(&tmp).await;
            return Err(CacheError::Write { path, source });
        }

        if let Err(source) = fs::rename(&tmp, &path).await {
            remove_best_effort(&tmp).await;
            return Err(CacheError::Write { path, source });
        }

        debug!(path = %path.display(), size_bytes = bytes.len(), "cache entry stored");
        Ok(path)
    }
}

/// Temporary sibling path for an in-flight write
fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.push_str(&format!(
        ".tmp-{}-{}",
        std::process::id(),
        TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    path.with_file_name(name)
}

async fn remove_best_effort(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "failed to remove temporary cache file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{FitMode, ImageClass};
    use tempfile::TempDir;

    fn test_key() -> TransformKey {
        TransformKey::new(
            ImageClass::Public,
            "profile.png",
            Some(160),
            Some(160),
            FitMode::Cover,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_store_then_lookup() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ImageCache::new(temp_dir.path());
        let key = test_key();

        assert!(cache.lookup(&key).await.unwrap().is_none());

        let path = cache.store(&key, b"webp bytes").await.unwrap();
        assert_eq!(path, cache.entry_path(&key));
        assert_eq!(
            cache.lookup(&key).await.unwrap().unwrap(),
            Bytes::from_static(b"webp bytes")
        );
    }

    #[tokio::test]
    async fn test_store_creates_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        let cache = ImageCache::new(&nested);

        cache.store(&test_key(), b"data").await.unwrap();
        assert!(nested.exists());
    }

    #[tokio::test]
    async fn test_store_leaves_no_temporary_files() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ImageCache::new(temp_dir.path());

        cache.store(&test_key(), b"data").await.unwrap();

        let mut entries = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect::<Vec<_>>();
        entries.sort();
        assert_eq!(entries, vec![test_key().file_name()]);
    }

    #[tokio::test]
    async fn test_overwrite_is_last_write_wins() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ImageCache::new(temp_dir.path());
        let key = test_key();

        cache.store(&key, b"first").await.unwrap();
        cache.store(&key, b"second").await.unwrap();

        assert_eq!(
            cache.lookup(&key).await.unwrap().unwrap(),
            Bytes::from_static(b"second")
        );
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_collide() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ImageCache::new(temp_dir.path());
        let key_a = test_key();
        let key_b = TransformKey::new(
            ImageClass::Public,
            "profile.png",
            Some(320),
            Some(320),
            FitMode::Cover,
        )
        .unwrap();

        cache.store(&key_a, b"small").await.unwrap();
        cache.store(&key_b, b"large").await.unwrap();

        assert_eq!(
            cache.lookup(&key_a).await.unwrap().unwrap(),
            Bytes::from_static(b"small")
        );
        assert_eq!(
            cache.lookup(&key_b).await.unwrap().unwrap(),
            Bytes::from_static(b"large")
        );
    }
}
