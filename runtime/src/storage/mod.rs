//! Storage implementations.
//!
//! - [`MemoryStorage`]: process-local, seeded with an initial value
//! - [`FileStorage`]: one file per storage, JSON or bincode, atomic writes
//! - [`InitialValueStorage`]: supplies a default when the very first load fails
//!
//! [`StorageExt::with_initial_value`] wraps any storage in an
//! [`InitialValueStorage`].

mod file;
mod initial_value;
mod memory;

pub use file::{Encoding, FileStorage};
pub use initial_value::InitialValueStorage;
pub use memory::MemoryStorage;

use statefold_core::Storage;

/// Convenience adapters for every [`Storage`].
pub trait StorageExt<S>: Storage<S> + Sized {
    /// Fall back to `initial()` if the first `load` fails.
    ///
    /// # Example
    ///
    /// ```rust
    /// use statefold_runtime::{FileStorage, StorageExt};
    ///
    /// let storage = FileStorage::<Vec<String>>::new("/tmp/tasks.json")
    ///     .with_initial_value(Vec::new);
    /// # let _ = storage;
    /// ```
    fn with_initial_value<F>(self, initial: F) -> InitialValueStorage<Self, S, F>
    where
        F: Fn() -> S + Send + Sync,
    {
        InitialValueStorage::new(self, initial)
    }
}

impl<S, T> StorageExt<S> for T where T: Storage<S> {}
