//! The folding engine.
//!
//! One call to [`Engine::run`] is one run: the initial state is loaded and
//! cleaned, every feature's outcome stream is merged in arrival order, and
//! each outcome is folded into the current state. Every state that passes the
//! equality filter is saved, converted and emitted, in that order.
//!
//! # Recovery
//!
//! A feature stream that yields an error is resubscribed, and the error is
//! folded through the configuration's
//! [`ErrorReducerFactory`](statefold_core::ErrorReducerFactory). Storage
//! failures are retried per the configuration's [`RetryPolicy`]; once
//! exhausted, the run ends with [`EngineError::Storage`].

use crate::configuration::Configuration;
use crate::error::EngineError;
use crate::metrics::{
    FEATURE_RECOVERED, FOLD_DURATION, FOLD_STEPS, MODELS_EMITTED, MODELS_SUPPRESSED, RUNS_ENDED,
    RUNS_STARTED, STORAGE_FAILURES,
};
use crate::retry::{RetryPolicy, retry_with_predicate};
use futures::StreamExt;
use futures::stream::{BoxStream, select_all};
use statefold_core::{ErrorReducerFactory, Feature, Outcome, Storage, StorageError};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

/// Models emitted by one engine run.
///
/// An `Err` item is terminal: the stream ends right after it.
pub type ModelStream<M> = BoxStream<'static, Result<M, EngineError>>;

/// Whether any run started by an [`Engine`] is being polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// No run is active
    Idle,
    /// At least one run is active
    Running,
}

/// Executes [`Configuration`]s.
///
/// The engine itself holds no state between runs apart from run bookkeeping;
/// state lives in each run and in its storage.
#[derive(Debug, Default)]
pub struct Engine {
    next_run: AtomicU64,
    active_runs: Arc<AtomicUsize>,
}

impl Engine {
    /// Create an idle engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> EngineStatus {
        if self.active_runs.load(Ordering::SeqCst) == 0 {
            EngineStatus::Idle
        } else {
            EngineStatus::Running
        }
    }

    /// Start a run.
    ///
    /// Feature subscriptions are registered immediately, so events triggered
    /// after this call are never lost. Loading, folding and saving only
    /// happen while the returned stream is polled; dropping it cancels the
    /// run, leaving the last saved state in storage.
    ///
    /// The first item is the model of the (cleaned) initial state. The stream
    /// ends when every feature stream has ended, which stock features never
    /// do, or right after a terminal [`EngineError`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use futures::StreamExt;
    /// use statefold_core::{FeatureError, Reducer};
    /// use statefold_runtime::{Configuration, Engine, MemoryStorage};
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let configuration = Configuration::<u8, u8>::builder()
    ///     .storage(MemoryStorage::new(7))
    ///     .converter(|state: &u8| *state)
    ///     .on_error(|_: &FeatureError| Reducer::identity())
    ///     .build()
    ///     .unwrap();
    ///
    /// // Without features the run emits the initial model and completes.
    /// let models: Vec<_> = Engine::new().run(configuration).collect().await;
    /// assert_eq!(models.len(), 1);
    /// # }
    /// ```
    pub fn run<S, M>(&self, configuration: Configuration<S, M>) -> ModelStream<M>
    where
        S: Clone + Send + Sync + 'static,
        M: Send + 'static,
    {
        let run = self.next_run.fetch_add(1, Ordering::Relaxed) + 1;
        let active_runs = Arc::clone(&self.active_runs);

        let Configuration {
            name,
            features,
            storage,
            converter,
            cleaner,
            equality,
            error_factory,
            storage_retry,
        } = configuration;

        let mut outcomes = select_all(
            features
                .into_iter()
                .map(|feature| supervise(feature, Arc::clone(&error_factory))),
        );

        Box::pin(async_stream::stream! {
            let _guard = RunGuard::start(active_runs, run, name.clone());

            let loaded = match load(storage.as_ref(), &storage_retry).await {
                Ok(state) => state,
                Err(error) => {
                    tracing::error!(run, configuration = %name, error = %error, "Initial load failed");
                    yield Err(error);
                    return;
                }
            };

            let mut state = cleaner.clean(loaded);
            if let Err(error) = save(storage.as_ref(), &storage_retry, &state).await {
                tracing::error!(run, configuration = %name, error = %error, "Saving initial state failed");
                yield Err(error);
                return;
            }
            metrics::counter!(MODELS_EMITTED).increment(1);
            tracing::debug!(run, configuration = %name, "Emitting initial model");
            yield Ok(converter.convert(&state));
            let mut last_emitted = state.clone();

            while let Some(outcome) = outcomes.next().await {
                let started = Instant::now();
                tracing::trace!(run, configuration = %name, ?outcome, "Applying outcome");
                state = outcome.apply(cleaner.clean(state));
                metrics::histogram!(FOLD_DURATION).record(started.elapsed().as_secs_f64());
                metrics::counter!(FOLD_STEPS).increment(1);

                if equality.equal(&last_emitted, &state) {
                    metrics::counter!(MODELS_SUPPRESSED).increment(1);
                    tracing::debug!(run, configuration = %name, "State unchanged, model suppressed");
                    continue;
                }

                if let Err(error) = save(storage.as_ref(), &storage_retry, &state).await {
                    tracing::error!(run, configuration = %name, error = %error, "Saving state failed");
                    yield Err(error);
                    return;
                }

                metrics::counter!(MODELS_EMITTED).increment(1);
                tracing::debug!(run, configuration = %name, "Emitting model");
                yield Ok(converter.convert(&state));
                last_emitted = state.clone();
            }

            tracing::info!(run, configuration = %name, "All features completed");
        })
    }
}

/// Tracks one active run for [`Engine::status`], logging start and end.
struct RunGuard {
    active_runs: Arc<AtomicUsize>,
    run: u64,
    configuration: String,
}

impl RunGuard {
    fn start(active_runs: Arc<AtomicUsize>, run: u64, configuration: String) -> Self {
        active_runs.fetch_add(1, Ordering::SeqCst);
        metrics::counter!(RUNS_STARTED).increment(1);
        tracing::info!(run, configuration = %configuration, "Engine run started");
        Self {
            active_runs,
            run,
            configuration,
        }
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.active_runs.fetch_sub(1, Ordering::SeqCst);
        metrics::counter!(RUNS_ENDED).increment(1);
        tracing::info!(
            run = self.run,
            configuration = %self.configuration,
            "Engine run ended"
        );
    }
}

/// Follow one feature, resubscribing whenever its stream fails.
///
/// The first subscription is made before returning.
fn supervise<S>(
    feature: Arc<dyn Feature<S>>,
    error_factory: Arc<dyn ErrorReducerFactory<S>>,
) -> BoxStream<'static, Outcome<S>>
where
    S: 'static,
{
    let mut outcomes = feature.outcomes();

    Box::pin(async_stream::stream! {
        loop {
            match outcomes.next().await {
                Some(Ok(outcome)) => yield outcome,
                Some(Err(error)) => {
                    tracing::warn!(
                        component = feature.name(),
                        error = %error,
                        "Feature stream failed, resubscribing"
                    );
                    metrics::counter!(FEATURE_RECOVERED, "component" => feature.name().to_string())
                        .increment(1);
                    outcomes = feature.outcomes();
                    yield Outcome::single(error_factory.create(&error));
                }
                None => {
                    tracing::warn!(component = feature.name(), "Feature stream completed");
                    break;
                }
            }
        }
    })
}

async fn load<S>(storage: &dyn Storage<S>, policy: &RetryPolicy) -> Result<S, EngineError> {
    retry_with_predicate(policy, "load", || storage.load(), StorageError::is_transient)
        .await
        .map_err(|source| storage_failure("load", source))
}

async fn save<S>(storage: &dyn Storage<S>, policy: &RetryPolicy, state: &S) -> Result<(), EngineError> {
    retry_with_predicate(policy, "save", || storage.save(state), StorageError::is_transient)
        .await
        .map_err(|source| storage_failure("save", source))
}

fn storage_failure(operation: &'static str, source: StorageError) -> EngineError {
    metrics::counter!(STORAGE_FAILURES, "operation" => operation).increment(1);
    EngineError::Storage { operation, source }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::feature::SingleResultFeature;
    use crate::storage::MemoryStorage;
    use statefold_core::{FeatureError, OutcomeStream, Reducer, Trigger};
    use std::sync::Mutex;

    fn counter_configuration(
        feature: Arc<dyn Feature<i32>>,
        storage: Arc<MemoryStorage<i32>>,
    ) -> Configuration<i32, i32> {
        Configuration::builder()
            .feature(feature)
            .storage(storage)
            .converter(|state: &i32| *state)
            .on_error(|_: &FeatureError| Reducer::new(|_: i32| -1))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn initial_state_is_emitted_and_saved() {
        let storage = Arc::new(MemoryStorage::new(4));
        let configuration = Configuration::<i32, i32>::builder()
            .storage(Arc::clone(&storage))
            .converter(|state: &i32| state * 10)
            .on_error(|_: &FeatureError| Reducer::identity())
            .build()
            .unwrap();

        let models: Vec<_> = Engine::new().run(configuration).collect().await;

        assert_eq!(models.len(), 1);
        assert_eq!(*models[0].as_ref().unwrap(), 40);
        assert_eq!(storage.snapshot().await, 4);
    }

    #[tokio::test]
    async fn status_follows_the_run_lifetime() {
        let feature = Arc::new(SingleResultFeature::new("add", |n: i32| {
            Reducer::new(move |total: i32| total + n)
        }));
        let engine = Engine::new();
        assert_eq!(engine.status(), EngineStatus::Idle);

        let mut models = engine.run(counter_configuration(
            feature,
            Arc::new(MemoryStorage::new(0)),
        ));
        assert_eq!(engine.status(), EngineStatus::Idle);

        models.next().await.unwrap().unwrap();
        assert_eq!(engine.status(), EngineStatus::Running);

        drop(models);
        assert_eq!(engine.status(), EngineStatus::Idle);
    }

    /// Yields one outcome, fails, then behaves on the next subscription.
    struct FlakyFeature {
        subscriptions: Mutex<u32>,
    }

    impl Feature<i32> for FlakyFeature {
        fn name(&self) -> &str {
            "flaky"
        }

        fn outcomes(&self) -> OutcomeStream<i32> {
            let mut subscriptions = self.subscriptions.lock().unwrap();
            *subscriptions += 1;
            if *subscriptions == 1 {
                futures::stream::iter(vec![
                    Ok(Outcome::single(Reducer::new(|n: i32| n + 1))),
                    Err(anyhow::anyhow!("connection reset")),
                ])
                .boxed()
            } else {
                futures::stream::iter(vec![Ok(Outcome::single(Reducer::new(|n: i32| n + 100)))])
                    .chain(futures::stream::pending())
                    .boxed()
            }
        }
    }

    #[tokio::test]
    async fn failed_feature_stream_is_folded_and_resubscribed() {
        let feature = Arc::new(FlakyFeature {
            subscriptions: Mutex::new(0),
        });
        let storage = Arc::new(MemoryStorage::new(0));
        let mut models = Engine::new().run(counter_configuration(feature.clone(), storage));

        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(models.next().await.unwrap().unwrap());
        }

        // initial, +1, error reducer, +100 from the fresh subscription
        assert_eq!(seen, vec![0, 1, -1, 99]);
        assert_eq!(*feature.subscriptions.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn triggers_before_first_poll_are_not_lost() {
        let feature = Arc::new(SingleResultFeature::new("add", |n: i32| {
            Reducer::new(move |total: i32| total + n)
        }));
        let mut models = Engine::new().run(counter_configuration(
            feature.clone(),
            Arc::new(MemoryStorage::new(0)),
        ));

        feature.trigger(3);

        assert_eq!(models.next().await.unwrap().unwrap(), 0);
        assert_eq!(models.next().await.unwrap().unwrap(), 3);
    }
}
