use futures::future::BoxFuture;
use statefold_core::{Storage, StorageError};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};

/// Decorator supplying a default state when the first load fails.
///
/// Only the very first `load` may fall back; from then on, load errors of the
/// decorated storage propagate. `save` always passes through.
pub struct InitialValueStorage<T, S, F> {
    inner: T,
    initial: F,
    first_load: AtomicBool,
    _state: PhantomData<fn() -> S>,
}

impl<T, S, F> InitialValueStorage<T, S, F>
where
    T: Storage<S>,
    F: Fn() -> S + Send + Sync,
{
    /// Wrap `inner`, producing `initial()` if its first load fails.
    #[must_use]
    pub const fn new(inner: T, initial: F) -> Self {
        Self {
            inner,
            initial,
            first_load: AtomicBool::new(true),
            _state: PhantomData,
        }
    }

    /// The decorated storage.
    #[must_use]
    pub const fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T, S, F> fmt::Debug for InitialValueStorage<T, S, F>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitialValueStorage")
            .field("inner", &self.inner)
            .field("first_load", &self.first_load.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl<T, S, F> Storage<S> for InitialValueStorage<T, S, F>
where
    T: Storage<S>,
    S: Send,
    F: Fn() -> S + Send + Sync,
{
    fn load(&self) -> BoxFuture<'_, Result<S, StorageError>> {
        Box::pin(async move {
            let first = self.first_load.swap(false, Ordering::SeqCst);
            match self.inner.load().await {
                Err(error) if first => {
                    tracing::debug!(error = %error, "No stored state, using initial value");
                    Ok((self.initial)())
                }
                result => result,
            }
        })
    }

    fn save<'a>(&'a self, state: &'a S) -> BoxFuture<'a, Result<(), StorageError>> {
        self.inner.save(state)
    }
}
