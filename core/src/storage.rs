//! Storage abstraction for engine state.
//!
//! A [`Storage`] provides the initial state of an engine run and receives every
//! state the engine emits, always before that state is converted into a model.
//! Because a storage may outlive a run, a new run against the same storage
//! resumes from whatever the previous run saved last.
//!
//! # Implementations
//!
//! - `MemoryStorage` (in `statefold-runtime`): last saved value kept in memory
//! - `FileStorage` (in `statefold-runtime`): durable, one file per storage
//! - `InitialValueStorage` (in `statefold-runtime`): first-load fallback decorator
//! - `RecordingStorage` (in `statefold-testing`): records saves for assertions
//!
//! # Dyn Compatibility
//!
//! Methods return boxed futures instead of using `async fn` so the engine can
//! hold storages as `Arc<dyn Storage<S>>`.

use futures::future::BoxFuture;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while loading or saving state.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Nothing has been saved yet and no default is available.
    #[error("No state has been saved yet")]
    Empty,

    /// I/O failure in a durable backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored bytes could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Any other backend failure.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Whether retrying the same operation may succeed.
    ///
    /// Missing state and undecodable bytes do not fix themselves; I/O and
    /// backend failures might.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Backend(_))
    }
}

/// Load/save hook for engine state.
///
/// # Contract
///
/// - `load` returns the last saved state, or an error when there is none.
///   Decorators such as `InitialValueStorage` supply defaults.
/// - `save` is idempotent and is called once per emitted fold step.
///
/// Storage failures are terminal for an engine run once the configured retry
/// policy is exhausted.
pub trait Storage<S>: Send + Sync {
    /// Load the last saved state.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Empty`] when nothing has been saved yet, or a
    /// backend-specific error.
    fn load(&self) -> BoxFuture<'_, Result<S, StorageError>>;

    /// Save `state` as the latest state.
    ///
    /// # Errors
    ///
    /// Returns a backend-specific error when the state could not be stored.
    fn save<'a>(&'a self, state: &'a S) -> BoxFuture<'a, Result<(), StorageError>>;
}

// Lets one storage back several runs, e.g. a restart against the same file.
impl<S, T> Storage<S> for Arc<T>
where
    T: Storage<S> + ?Sized,
{
    fn load(&self) -> BoxFuture<'_, Result<S, StorageError>> {
        (**self).load()
    }

    fn save<'a>(&'a self, state: &'a S) -> BoxFuture<'a, Result<(), StorageError>> {
        (**self).save(state)
    }
}
