//! Shared index handle.
//!
//! One logical index is shared between ingestion (exclusive writer) and
//! retrieval (concurrent readers). Readers never observe a partially
//! applied batch: a batch is applied and persisted under a single write lock.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use docsearch_types::{Chunk, IndexStatus, RecordId};
use tracing::{debug, info};

use crate::error::VectorError;
use crate::index::VectorIndex;
use crate::store;

/// Cloneable handle to the process-wide index and its on-disk location.
///
/// The slot is `None` until the first ingestion creates an index or an
/// existing one is loaded.
#[derive(Clone)]
pub struct SharedIndex {
    inner: Arc<RwLock<Option<VectorIndex>>>,
    dir: PathBuf,
}

impl SharedIndex {
    /// Handle with no index yet, persisting into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
            dir: dir.into(),
        }
    }

    /// Load the index stored in `dir`, or start empty if none exists.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, VectorError> {
        let dir = dir.into();
        let index = if store::index_exists(&dir) {
            Some(store::load(&dir)?)
        } else {
            debug!(path = ?dir, "No persisted index found");
            None
        };
        Ok(Self {
            inner: Arc::new(RwLock::new(index)),
            dir,
        })
    }

    /// Wrap an already built index.
    pub fn from_index(index: VectorIndex, dir: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(index))),
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Run `f` with shared access to the current index.
    pub fn read<T>(&self, f: impl FnOnce(Option<&VectorIndex>) -> T) -> Result<T, VectorError> {
        let guard = self
            .inner
            .read()
            .map_err(|e| VectorError::Lock(format!("Failed to acquire read lock: {}", e)))?;
        Ok(f(guard.as_ref()))
    }

    /// Run `f` with exclusive access to the index slot.
    pub fn update<T>(
        &self,
        f: impl FnOnce(&mut Option<VectorIndex>) -> Result<T, VectorError>,
    ) -> Result<T, VectorError> {
        let mut guard = self
            .inner
            .write()
            .map_err(|e| VectorError::Lock(format!("Failed to acquire write lock: {}", e)))?;
        f(&mut *guard)
    }

    /// Like [`update`](Self::update), then persist before releasing the lock.
    ///
    /// `f` runs against a staged copy of the slot. The copy replaces the
    /// shared index only after it has been saved, so a failed `f` or a failed
    /// save leaves both memory and disk unchanged and the call can be retried.
    pub fn update_and_persist<T>(
        &self,
        f: impl FnOnce(&mut Option<VectorIndex>) -> Result<T, VectorError>,
    ) -> Result<T, VectorError> {
        let mut guard = self
            .inner
            .write()
            .map_err(|e| VectorError::Lock(format!("Failed to acquire write lock: {}", e)))?;
        let mut staged = guard.clone();
        let out = f(&mut staged)?;
        if let Some(index) = staged.as_ref() {
            store::save(index, &self.dir)?;
        }
        *guard = staged;
        Ok(out)
    }

    /// Append a batch, creating the index with `dimension` if none exists,
    /// and persist.
    pub fn append(
        &self,
        dimension: usize,
        records: Vec<(Vec<f32>, Chunk)>,
    ) -> Result<Vec<RecordId>, VectorError> {
        self.update_and_persist(|slot| {
            if let Some(index) = slot.as_mut() {
                return index.add(records);
            }
            let mut index = VectorIndex::new(dimension)?;
            let ids = index.add(records)?;
            info!(dim = dimension, "Created vector index");
            *slot = Some(index);
            Ok(ids)
        })
    }

    /// Merge every record of `other` into the shared index and persist.
    ///
    /// With no current index, one is created matching `other`.
    pub fn merge_from(&self, other: &VectorIndex) -> Result<Vec<RecordId>, VectorError> {
        self.update_and_persist(|slot| {
            if let Some(index) = slot.as_mut() {
                return index.merge(other);
            }
            let mut index = VectorIndex::with_metric(other.dimension(), other.metric())?;
            let ids = index.merge(other)?;
            *slot = Some(index);
            Ok(ids)
        })
    }

    pub fn status(&self) -> Result<IndexStatus, VectorError> {
        self.read(|index| match index {
            Some(index) => IndexStatus {
                has_index: true,
                record_count: index.len(),
                dimension: Some(index.dimension()),
            },
            None => IndexStatus::default(),
        })
    }

    /// Persist the current index, if any.
    ///
    /// Saving rewrites the shared temp files, so it holds the write lock.
    pub fn flush(&self) -> Result<(), VectorError> {
        self.update(|slot| match slot.as_ref() {
            Some(index) => store::save(index, &self.dir),
            None => Ok(()),
        })
    }

    /// Replace the in-memory index with what is on disk.
    pub fn reload(&self) -> Result<(), VectorError> {
        self.update(|slot| {
            *slot = Some(store::load(&self.dir)?);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tempfile::TempDir;

    fn batch(texts: &[&str]) -> Vec<(Vec<f32>, Chunk)> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| (vec![1.0, i as f32], Chunk::new(*t, Default::default(), i)))
            .collect()
    }

    #[test]
    fn test_new_has_no_index() {
        let temp = TempDir::new().unwrap();
        let shared = SharedIndex::new(temp.path());
        assert_eq!(shared.status().unwrap(), IndexStatus::default());
        assert!(shared.read(|index| index.is_none()).unwrap());
    }

    #[test]
    fn test_append_creates_and_persists() {
        let temp = TempDir::new().unwrap();
        let shared = SharedIndex::new(temp.path());

        let ids = shared.append(2, batch(&["a", "b"])).unwrap();
        assert_eq!(ids, vec![RecordId(1), RecordId(2)]);
        assert!(store::index_exists(temp.path()));

        let status = shared.status().unwrap();
        assert!(status.has_index);
        assert_eq!(status.record_count, 2);
        assert_eq!(status.dimension, Some(2));

        let reopened = SharedIndex::open(temp.path()).unwrap();
        assert_eq!(reopened.status().unwrap(), status);
    }

    #[test]
    fn test_failed_append_leaves_no_index() {
        let temp = TempDir::new().unwrap();
        let shared = SharedIndex::new(temp.path());

        let bad = vec![(vec![f32::NAN, 0.0], Chunk::new("x", Default::default(), 0))];
        assert!(shared.append(2, bad).is_err());
        assert!(!shared.status().unwrap().has_index);
        assert!(!store::index_exists(temp.path()));
    }

    #[test]
    fn test_append_dimension_mismatch() {
        let temp = TempDir::new().unwrap();
        let shared = SharedIndex::new(temp.path());
        shared.append(2, batch(&["a"])).unwrap();

        let wrong = vec![(vec![1.0, 0.0, 0.0], Chunk::new("y", Default::default(), 0))];
        assert!(matches!(
            shared.append(3, wrong),
            Err(VectorError::DimensionMismatch { expected: 2, actual: 3 })
        ));
        assert_eq!(shared.status().unwrap().record_count, 1);
    }

    #[test]
    fn test_merge_into_empty_handle() {
        let temp = TempDir::new().unwrap();
        let shared = SharedIndex::new(temp.path());

        let mut other = VectorIndex::new(2).unwrap();
        other.add(batch(&["x", "y", "z"])).unwrap();

        let ids = shared.merge_from(&other).unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(shared.status().unwrap().record_count, 3);
        assert!(store::index_exists(temp.path()));
    }

    #[test]
    fn test_reload_picks_up_disk_state() {
        let temp = TempDir::new().unwrap();
        let writer = SharedIndex::new(temp.path());
        writer.append(2, batch(&["a"])).unwrap();

        let reader = SharedIndex::open(temp.path()).unwrap();
        writer.append(2, batch(&["b", "c"])).unwrap();
        assert_eq!(reader.status().unwrap().record_count, 1);

        reader.reload().unwrap();
        assert_eq!(reader.status().unwrap().record_count, 3);
    }

    #[test]
    fn test_reload_without_artifacts_fails() {
        let temp = TempDir::new().unwrap();
        let shared = SharedIndex::new(temp.path());
        assert!(matches!(shared.reload(), Err(VectorError::IndexNotFound(_))));
    }

    #[test]
    fn test_readers_see_whole_batches() {
        let temp = TempDir::new().unwrap();
        let shared = SharedIndex::new(temp.path());
        shared.append(2, batch(&["seed"])).unwrap();

        let writer = {
            let shared = shared.clone();
            thread::spawn(move || {
                for _ in 0..20 {
                    shared.append(2, batch(&["a", "b", "c", "d", "e"])).unwrap();
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        let len = shared.read(|index| index.map_or(0, |i| i.len())).unwrap();
                        assert_eq!((len - 1) % 5, 0);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
        assert_eq!(shared.status().unwrap().record_count, 101);
    }

    #[test]
    fn test_failed_persist_leaves_index_unchanged() {
        let temp = TempDir::new().unwrap();
        let not_a_dir = temp.path().join("index-file");
        std::fs::write(&not_a_dir, b"occupied").unwrap();
        let shared = SharedIndex::new(&not_a_dir);

        assert!(shared.append(2, batch(&["a"])).is_err());
        assert!(!shared.status().unwrap().has_index);

        assert!(shared.append(2, batch(&["a"])).is_err());
        assert!(!shared.status().unwrap().has_index);
    }

    #[test]
    fn test_failed_persist_keeps_existing_records() {
        let temp = TempDir::new().unwrap();
        let index_dir = temp.path().join("index");
        let shared = SharedIndex::new(&index_dir);
        shared.append(2, batch(&["a", "b"])).unwrap();

        std::fs::remove_dir_all(&index_dir).unwrap();
        std::fs::write(&index_dir, b"occupied").unwrap();

        assert!(shared.append(2, batch(&["c"])).is_err());
        assert_eq!(shared.status().unwrap().record_count, 2);

        std::fs::remove_file(&index_dir).unwrap();
        let ids = shared.append(2, batch(&["c"])).unwrap();
        assert_eq!(ids, vec![RecordId(3)]);
        assert_eq!(shared.status().unwrap().record_count, 3);
    }

    #[test]
    fn test_concurrent_flushes_all_succeed() {
        let temp = TempDir::new().unwrap();
        let shared = SharedIndex::new(temp.path());
        let texts: Vec<String> = (0..500).map(|i| format!("chunk {}", i)).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        shared.append(2, batch(&refs)).unwrap();

        let flushers: Vec<_> = (0..6)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..20 {
                        shared.flush().unwrap();
                    }
                })
            })
            .collect();
        for f in flushers {
            f.join().unwrap();
        }

        let reopened = SharedIndex::open(temp.path()).unwrap();
        assert_eq!(reopened.status().unwrap().record_count, 500);
    }
}
