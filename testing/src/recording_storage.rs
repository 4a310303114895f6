//! Storage double recording every save.

#![allow(clippy::module_name_repetitions)]

use futures::future::BoxFuture;
use statefold_core::{Storage, StorageError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// In-memory storage recording every successful save.
///
/// `load` returns the last saved state, or the seed given at construction, or
/// [`StorageError::Empty`] for [`RecordingStorage::empty`]. Failures can be
/// scripted: the next `n` loads or saves fail with a transient
/// [`StorageError::Backend`].
///
/// # Example
///
/// ```
/// use statefold_core::Storage;
/// use statefold_testing::RecordingStorage;
///
/// # tokio_test::block_on(async {
/// let storage = RecordingStorage::new(0);
/// storage.fail_saves(1);
///
/// assert!(storage.save(&1).await.is_err());
/// assert!(storage.save(&2).await.is_ok());
/// assert_eq!(storage.saved(), vec![2]);
/// # });
/// ```
#[derive(Debug)]
pub struct RecordingStorage<S> {
    seed: Option<S>,
    saved: Mutex<Vec<S>>,
    loads: AtomicUsize,
    failing_loads: AtomicUsize,
    failing_saves: AtomicUsize,
}

impl<S> RecordingStorage<S> {
    /// Storage whose first load returns `seed`.
    #[must_use]
    pub fn new(seed: S) -> Self {
        Self::with_seed(Some(seed))
    }

    /// Storage with nothing saved: loads fail with [`StorageError::Empty`]
    /// until the first save.
    #[must_use]
    pub fn empty() -> Self {
        Self::with_seed(None)
    }

    fn with_seed(seed: Option<S>) -> Self {
        Self {
            seed,
            saved: Mutex::new(Vec::new()),
            loads: AtomicUsize::new(0),
            failing_loads: AtomicUsize::new(0),
            failing_saves: AtomicUsize::new(0),
        }
    }

    /// Make the next `count` loads fail.
    pub fn fail_loads(&self, count: usize) {
        self.failing_loads.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` saves fail.
    pub fn fail_saves(&self, count: usize) {
        self.failing_saves.store(count, Ordering::SeqCst);
    }

    /// Number of `load` calls so far, failed ones included.
    #[must_use]
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    fn records(&self) -> MutexGuard<'_, Vec<S>> {
        self.saved.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: Clone> RecordingStorage<S> {
    /// Every successfully saved state, oldest first.
    #[must_use]
    pub fn saved(&self) -> Vec<S> {
        self.records().clone()
    }

    /// The most recently saved state.
    #[must_use]
    pub fn last_saved(&self) -> Option<S> {
        self.records().last().cloned()
    }
}

/// Consume one scripted failure, if any is left.
fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
        .is_ok()
}

impl<S> Storage<S> for RecordingStorage<S>
where
    S: Clone + Send + Sync,
{
    fn load(&self) -> BoxFuture<'_, Result<S, StorageError>> {
        Box::pin(async move {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if take_failure(&self.failing_loads) {
                return Err(StorageError::Backend("scripted load failure".into()));
            }
            self.last_saved()
                .or_else(|| self.seed.clone())
                .ok_or(StorageError::Empty)
        })
    }

    fn save<'a>(&'a self, state: &'a S) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            if take_failure(&self.failing_saves) {
                return Err(StorageError::Backend("scripted save failure".into()));
            }
            self.records().push(state.clone());
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[tokio::test]
    async fn load_prefers_last_save_over_seed() {
        let storage = RecordingStorage::new("seed");
        assert_eq!(storage.load().await.unwrap(), "seed");

        storage.save(&"saved").await.unwrap();
        assert_eq!(storage.load().await.unwrap(), "saved");
        assert_eq!(storage.load_count(), 2);
    }

    #[tokio::test]
    async fn empty_storage_fails_until_first_save() {
        let storage = RecordingStorage::<u8>::empty();
        assert!(matches!(storage.load().await, Err(StorageError::Empty)));

        storage.save(&4).await.unwrap();
        assert_eq!(storage.load().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn scripted_failures_are_transient_and_run_out() {
        let storage = RecordingStorage::new(0_u8);
        storage.fail_loads(2);

        let first = storage.load().await.unwrap_err();
        assert!(first.is_transient());
        assert!(storage.load().await.is_err());
        assert_eq!(storage.load().await.unwrap(), 0);
    }
}
