//! # Statefold Testing
//!
//! Testing utilities and helpers for the statefold state-folding engine.
//!
//! This crate provides:
//! - [`RecordingStorage`]: in-memory storage recording every save, scriptable
//!   to fail
//! - [`FeatureHarness`]: subscribes to one feature and folds its outcomes
//! - [`next_model`] / [`take_models`]: model-stream helpers with timeouts
//! - [`properties`]: proptest strategies for fold properties
//!
//! ## Example
//!
//! ```ignore
//! use statefold_testing::{RecordingStorage, next_model, DEFAULT_TIMEOUT};
//!
//! #[tokio::test]
//! async fn first_model_is_saved() {
//!     let storage = Arc::new(RecordingStorage::new(TasksState::default()));
//!     let mut models = Engine::new().run(configuration(storage.clone()));
//!
//!     let model = next_model(&mut models, DEFAULT_TIMEOUT).await.unwrap();
//!     assert_eq!(storage.saved().len(), 1);
//! }
//! ```

use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::time::Duration;
use thiserror::Error;

mod feature_harness;
mod recording_storage;

pub use feature_harness::FeatureHarness;
pub use recording_storage::RecordingStorage;

/// How long helpers wait for the next item before giving up.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Failures reported by the helpers of this crate.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// Nothing arrived within the timeout
    #[error("Timed out after {0:?} waiting for the next item")]
    Timeout(Duration),

    /// The stream ended before the expected item
    #[error("Stream ended")]
    Ended,

    /// The stream yielded an error item
    #[error("Stream failed: {0}")]
    Failed(String),
}

/// Wait for the next model, failing on timeout, end of stream or an error
/// item.
///
/// # Errors
///
/// See [`HarnessError`].
pub async fn next_model<M, E, St>(models: &mut St, timeout: Duration) -> Result<M, HarnessError>
where
    St: Stream<Item = Result<M, E>> + Unpin,
    E: Display,
{
    match tokio::time::timeout(timeout, models.next()).await {
        Err(_) => Err(HarnessError::Timeout(timeout)),
        Ok(None) => Err(HarnessError::Ended),
        Ok(Some(Err(error))) => Err(HarnessError::Failed(error.to_string())),
        Ok(Some(Ok(model))) => Ok(model),
    }
}

/// Collect the next `count` models, each within `timeout`.
///
/// # Errors
///
/// See [`HarnessError`].
pub async fn take_models<M, E, St>(
    models: &mut St,
    count: usize,
    timeout: Duration,
) -> Result<Vec<M>, HarnessError>
where
    St: Stream<Item = Result<M, E>> + Unpin,
    E: Display,
{
    let mut taken = Vec::with_capacity(count);
    for _ in 0..count {
        taken.push(next_model(models, timeout).await?);
    }
    Ok(taken)
}

/// Whether the stream stays silent (no item, no end) for `window`.
pub async fn stays_quiet<St>(models: &mut St, window: Duration) -> bool
where
    St: Stream + Unpin,
{
    tokio::time::timeout(window, models.next()).await.is_err()
}

/// Install a `fmt` subscriber honouring `RUST_LOG`, writing through the test
/// harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Property-based testing utilities using proptest.
///
/// [`Probe`](properties::Probe) is a minimal state with one persistent field
/// and one transient flag; [`steps`](properties::steps) generates fold inputs
/// for it.
pub mod properties {
    use proptest::prelude::*;
    use statefold_core::Reducer;

    /// Minimal state: a running total plus a one-shot flag.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Probe {
        /// Sum of every applied delta
        pub total: i64,
        /// Transient: set by a step, reset before the next one
        pub flash: bool,
    }

    /// One generated fold input.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Step {
        /// Added to the total
        pub delta: i64,
        /// Whether the step raises the transient flag
        pub flash: bool,
    }

    impl Step {
        /// The reducer applying this step.
        #[must_use]
        pub fn reducer(self) -> Reducer<Probe> {
            Reducer::named("step", move |probe: Probe| Probe {
                total: probe.total + self.delta,
                flash: probe.flash || self.flash,
            })
        }
    }

    /// Transient cleaner for [`Probe`].
    #[must_use]
    pub const fn clean(probe: Probe) -> Probe {
        Probe {
            flash: false,
            ..probe
        }
    }

    /// Up to `max_len` steps with small deltas.
    pub fn steps(max_len: usize) -> impl Strategy<Value = Vec<Step>> {
        prop::collection::vec(
            (-1_000_i64..1_000, any::<bool>()).prop_map(|(delta, flash)| Step { delta, flash }),
            0..max_len,
        )
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use futures::stream;

    #[tokio::test]
    async fn next_model_reports_each_outcome() {
        let mut models = stream::iter(vec![Ok(1), Err("boom")]);

        assert_eq!(next_model(&mut models, DEFAULT_TIMEOUT).await.unwrap(), 1);
        assert!(matches!(
            next_model(&mut models, DEFAULT_TIMEOUT).await,
            Err(HarnessError::Failed(message)) if message == "boom"
        ));
        assert!(matches!(
            next_model(&mut models, DEFAULT_TIMEOUT).await,
            Err(HarnessError::Ended)
        ));
    }

    #[tokio::test]
    async fn silent_stream_times_out() {
        let mut models = stream::pending::<Result<u8, String>>();
        let window = Duration::from_millis(20);

        assert!(matches!(
            next_model(&mut models, window).await,
            Err(HarnessError::Timeout(_))
        ));
        assert!(stays_quiet(&mut models, window).await);
    }

    #[tokio::test]
    async fn take_models_collects_in_order() {
        let mut models = stream::iter(vec![Ok::<_, String>(1), Ok(2), Ok(3)]);
        assert_eq!(
            take_models(&mut models, 2, DEFAULT_TIMEOUT).await.unwrap(),
            vec![1, 2]
        );
    }

    #[test]
    fn probe_step_raises_flash_and_clean_resets_it() {
        let step = properties::Step {
            delta: 3,
            flash: true,
        };
        let probe = step.reducer().apply(properties::Probe::default());
        assert!(probe.flash);
        assert_eq!(properties::clean(probe).total, 3);
    }
}
