//! # Statefold Runtime
//!
//! Runtime implementation for the statefold state-folding engine.
//!
//! This crate provides the [`Engine`] that folds feature outcomes into state,
//! the two stock feature shapes, and the storages an engine run loads from and
//! saves to.
//!
//! ## Core Components
//!
//! - **Engine**: merges feature outcomes, folds them, persists and emits models
//! - **Configuration**: everything one run needs, validated by a builder
//! - **Features**: [`SingleResultFeature`] (pure) and [`MultipleResultFeature`]
//!   (asynchronous, several reducers per event)
//! - **Storages**: [`MemoryStorage`], [`FileStorage`], [`InitialValueStorage`]
//! - **Attachment**: drives a run into a display callback on a Tokio task
//!
//! ## Example
//!
//! ```rust
//! use futures::StreamExt;
//! use statefold_core::{FeatureError, Reducer, Trigger};
//! use statefold_runtime::{Configuration, Engine, MemoryStorage, SingleResultFeature};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let add = Arc::new(SingleResultFeature::new("add", |amount: i32| {
//!     Reducer::new(move |total: i32| total + amount)
//! }));
//!
//! let configuration = Configuration::<i32, String>::builder()
//!     .feature(add.clone())
//!     .storage(MemoryStorage::new(0))
//!     .converter(|total: &i32| format!("total = {total}"))
//!     .on_error(|_: &FeatureError| Reducer::identity())
//!     .build()?;
//!
//! let engine = Engine::new();
//! let mut models = engine.run(configuration);
//!
//! assert_eq!(models.next().await.transpose()?, Some("total = 0".to_string()));
//! add.trigger(5);
//! assert_eq!(models.next().await.transpose()?, Some("total = 5".to_string()));
//! # Ok(())
//! # }
//! ```

use std::any::Any;

/// Consumer helper driving a run into a display callback
pub mod attachment;

/// Run configuration and its builder
pub mod configuration;

/// The folding engine
pub mod engine;

/// Stock feature implementations
pub mod feature;

/// Metric names recorded by the engine and features
pub mod metrics;

/// Retry logic with exponential backoff
pub mod retry;

/// Storage implementations
pub mod storage;

/// Error types for engine runs and configuration
pub mod error {
    use statefold_core::StorageError;
    use thiserror::Error;

    /// Terminal failure of an engine run.
    ///
    /// Recoverable failures (failed interactions, dead feature streams) never
    /// reach the model stream; they are folded into state by reducers. An
    /// `EngineError` is always the last item before the stream ends.
    #[derive(Error, Debug)]
    pub enum EngineError {
        /// Loading or saving state failed after the retry policy was exhausted
        #[error("Storage {operation} failed: {source}")]
        Storage {
            /// `"load"` or `"save"`
            operation: &'static str,
            /// The last storage error
            #[source]
            source: StorageError,
        },
    }

    /// Errors raised while building a [`Configuration`](crate::Configuration).
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum ConfigurationError {
        /// A required component was never set
        #[error("Configuration is missing a {0}")]
        Missing(&'static str),

        /// Two features share a name, which would make logs ambiguous
        #[error("Duplicate feature name: {0}")]
        DuplicateFeature(String),
    }
}

pub use attachment::Attachment;
pub use configuration::{Configuration, ConfigurationBuilder};
pub use engine::{Engine, EngineStatus, ModelStream};
pub use error::{ConfigurationError, EngineError};
pub use feature::{
    Interaction, MultipleResultFeature, ReducerStream, SingleResultFeature, round_trip,
};
pub use retry::RetryPolicy;
pub use storage::{Encoding, FileStorage, InitialValueStorage, MemoryStorage, StorageExt};

/// Render a panic payload for logs and error values.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;

    #[test]
    fn panic_message_reads_str_and_string_payloads() {
        let payload = std::panic::catch_unwind(|| panic!("static message")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let payload =
            std::panic::catch_unwind(|| panic!("formatted {}", "message")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "formatted message");

        let payload = std::panic::catch_unwind(|| std::panic::panic_any(7_u8)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }

    #[test]
    fn configuration_error_messages() {
        assert_eq!(
            ConfigurationError::Missing("storage").to_string(),
            "Configuration is missing a storage"
        );
        assert_eq!(
            ConfigurationError::DuplicateFeature("load".into()).to_string(),
            "Duplicate feature name: load"
        );
    }

    #[test]
    fn engine_error_names_the_operation() {
        let error = EngineError::Storage {
            operation: "save",
            source: statefold_core::StorageError::Backend("disk full".into()),
        };
        assert_eq!(
            error.to_string(),
            "Storage save failed: Storage backend error: disk full"
        );
    }
}
