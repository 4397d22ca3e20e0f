//! File-backed store for the `nowServing` and `queue` lists.

use std::{
    ops::{Deref, DerefMut},
    path::{Path, PathBuf},
};

use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::dao::{json_file, models::QueueLists, storage::StorageResult};

/// Queue lists guarded by a single store-wide lock.
///
/// Every read-modify-write of the lists goes through [`QueueStore::lock`]; the lock is
/// released when the returned guard is dropped, on every exit path.
pub struct QueueStore {
    path: PathBuf,
    lists: Mutex<QueueLists>,
}

impl QueueStore {
    /// Load the lists from `path`, creating an empty file when missing.
    pub async fn load(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let lists: QueueLists = json_file::load_or_init(&path).await?;
        info!(
            path = %path.display(),
            now_serving = lists.now_serving.len(),
            queue = lists.queue.len(),
            "loaded queue state"
        );
        Ok(Self::with_lists(path, lists))
    }

    /// Build a store around already-known lists without touching the disk.
    pub fn with_lists(path: impl Into<PathBuf>, lists: QueueLists) -> Self {
        Self {
            path: path.into(),
            lists: Mutex::new(lists),
        }
    }

    /// Acquire exclusive access to the lists.
    pub async fn lock(&self) -> QueueGuard<'_> {
        QueueGuard {
            lists: self.lists.lock().await,
            path: &self.path,
        }
    }

    /// Clone the current lists, holding the lock only for the copy.
    pub async fn snapshot(&self) -> QueueLists {
        self.lists.lock().await.clone()
    }
}

/// Exclusive handle on the queue lists.
pub struct QueueGuard<'a> {
    lists: MutexGuard<'a, QueueLists>,
    path: &'a Path,
}

impl QueueGuard<'_> {
    /// Overwrite the backing file with the lists as they are now.
    pub async fn persist(&self) -> StorageResult<()> {
        debug!(
            now_serving = self.lists.now_serving.len(),
            queue = self.lists.queue.len(),
            "writing queue state"
        );
        json_file::write(self.path, &*self.lists).await
    }

    /// Apply `edit` to a copy of the lists and keep it only once it is on disk.
    ///
    /// A failed write leaves the guarded lists exactly as they were.
    pub async fn update<T>(
        &mut self,
        edit: impl FnOnce(&mut QueueLists) -> T,
    ) -> StorageResult<T> {
        let mut next = self.lists.clone();
        let output = edit(&mut next);
        json_file::write(self.path, &next).await?;
        *self.lists = next;
        Ok(output)
    }
}

impl Deref for QueueGuard<'_> {
    type Target = QueueLists;

    fn deref(&self) -> &Self::Target {
        &self.lists
    }
}

impl DerefMut for QueueGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.lists
    }
}
