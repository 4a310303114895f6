use futures::future::BoxFuture;
use statefold_core::{Storage, StorageError};
use tokio::sync::RwLock;

/// Keeps the last saved state in memory.
///
/// Loads never fail: before the first save, `load` returns the seed value.
/// Share it through an `Arc` to resume a later run from where the previous
/// one stopped.
#[derive(Debug)]
pub struct MemoryStorage<S> {
    state: RwLock<S>,
}

impl<S> MemoryStorage<S> {
    /// Create a storage whose first `load` returns `initial`.
    #[must_use]
    pub fn new(initial: S) -> Self {
        Self {
            state: RwLock::new(initial),
        }
    }
}

impl<S: Clone> MemoryStorage<S> {
    /// Last saved (or seed) state.
    pub async fn snapshot(&self) -> S {
        self.state.read().await.clone()
    }
}

impl<S> Storage<S> for MemoryStorage<S>
where
    S: Clone + Send + Sync,
{
    fn load(&self) -> BoxFuture<'_, Result<S, StorageError>> {
        Box::pin(async move { Ok(self.snapshot().await) })
    }

    fn save<'a>(&'a self, state: &'a S) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            *self.state.write().await = state.clone();
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[tokio::test]
    async fn load_returns_seed_until_saved() {
        let storage = MemoryStorage::new("seed".to_string());
        assert_eq!(storage.load().await.unwrap(), "seed");

        storage.save(&"saved".to_string()).await.unwrap();
        assert_eq!(storage.load().await.unwrap(), "saved");
        assert_eq!(storage.snapshot().await, "saved");
    }
}
