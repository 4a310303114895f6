//! Multiple-result features: asynchronous interactions producing several
//! reducers over time per event.
//!
//! The canonical interaction is a three-phase round trip: a start reducer
//! raising an in-progress flag, then either a success reducer folding the
//! data in or a failure reducer raising an error flag. [`round_trip`] builds
//! exactly that shape.
//!
//! # Failure containment
//!
//! An interaction may fail by yielding an `Err` item, by panicking while its
//! stream is created, or by panicking while it is polled. In every case the
//! failure is turned into a single reducer from the feature's own
//! [`ErrorReducerFactory`], that interaction stops, and the feature keeps
//! serving later events.

use super::channel::EventChannel;
use crate::metrics::INTERACTION_FAILURES;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use statefold_core::{
    ErrorReducerFactory, Feature, FeatureError, Outcome, OutcomeStream, Reducer, Trigger,
};
use std::fmt::Debug;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Reducers produced by one interaction, in the order they must be folded.
///
/// An `Err` item ends the interaction and is replaced by the feature's
/// failure reducer.
pub type ReducerStream<S> = BoxStream<'static, Result<Reducer<S>, FeatureError>>;

/// Asynchronous work started for each event of a [`MultipleResultFeature`].
///
/// Implemented for every `Fn(E) -> ReducerStream<S>` closure.
pub trait Interaction<E, S>: Send + Sync {
    /// Start processing `event`.
    fn process(&self, event: E) -> ReducerStream<S>;
}

impl<E, S, F> Interaction<E, S> for F
where
    F: Fn(E) -> ReducerStream<S> + Send + Sync,
{
    fn process(&self, event: E) -> ReducerStream<S> {
        self(event)
    }
}

/// Build the canonical in-progress / success / failure interaction.
///
/// Yields `start` (when given), then awaits `work`. On success the value is
/// handed to `success`; on failure the error is yielded, which the owning
/// feature turns into its failure reducer.
///
/// # Example
///
/// ```rust
/// use statefold_core::{FeatureError, Reducer};
/// use statefold_runtime::{ReducerStream, round_trip};
///
/// #[derive(Clone, Debug, Default)]
/// struct Screen {
///     loading: bool,
///     items: Vec<String>,
/// }
///
/// fn load(_: ()) -> ReducerStream<Screen> {
///     round_trip(
///         Some(Reducer::new(|s: Screen| Screen { loading: true, ..s })),
///         async { Ok::<_, FeatureError>(vec!["milk".to_string()]) },
///         |items| Reducer::new(move |_: Screen| Screen { loading: false, items }),
///     )
/// }
/// # let _ = load(());
/// ```
pub fn round_trip<S, T, Fut, F>(start: Option<Reducer<S>>, work: Fut, success: F) -> ReducerStream<S>
where
    S: 'static,
    T: Send + 'static,
    Fut: Future<Output = Result<T, FeatureError>> + Send + 'static,
    F: FnOnce(T) -> Reducer<S> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        if let Some(start) = start {
            yield Ok(start);
        }
        yield work.await.map(success);
    })
}

/// Feature running an asynchronous [`Interaction`] per event.
///
/// Interactions for different events run concurrently (up to the configured
/// limit); the reducers of one interaction keep their order.
pub struct MultipleResultFeature<E, S> {
    channel: EventChannel<E>,
    interaction: Arc<dyn Interaction<E, S>>,
    on_error: Arc<dyn ErrorReducerFactory<S>>,
    max_concurrent: Option<usize>,
}

impl<E, S> MultipleResultFeature<E, S>
where
    E: Clone + Debug + Send + Sync + 'static,
    S: 'static,
{
    /// Create a feature named `name`.
    ///
    /// # Arguments
    ///
    /// * `name` - Component tag for logs and metrics
    /// * `interaction` - Work started for each event
    /// * `on_error` - Builds the failure reducer when an interaction fails
    #[must_use]
    pub fn new<I, H>(name: impl Into<String>, interaction: I, on_error: H) -> Self
    where
        I: Interaction<E, S> + 'static,
        H: ErrorReducerFactory<S> + 'static,
    {
        Self {
            channel: EventChannel::new(name),
            interaction: Arc::new(interaction),
            on_error: Arc::new(on_error),
            max_concurrent: None,
        }
    }

    /// Process `event` at the start of every subscription.
    #[must_use]
    pub fn with_start_event(mut self, event: E) -> Self {
        self.channel.set_start_event(event);
        self
    }

    /// Limit how many interactions run at once (default unlimited).
    #[must_use]
    pub const fn with_max_concurrent(mut self, limit: usize) -> Self {
        self.max_concurrent = Some(limit);
        self
    }
}

impl<E, S> Feature<S> for MultipleResultFeature<E, S>
where
    E: Clone + Debug + Send + Sync + 'static,
    S: 'static,
{
    fn name(&self) -> &str {
        self.channel.name()
    }

    fn outcomes(&self) -> OutcomeStream<S> {
        let interaction = Arc::clone(&self.interaction);
        let on_error = Arc::clone(&self.on_error);
        let name = self.channel.shared_name();

        self.channel
            .subscribe()
            .flat_map_unordered(self.max_concurrent, move |event| {
                tracing::debug!(component = %name, ?event, "Processing event");
                contain(
                    Arc::clone(&name),
                    interaction.as_ref(),
                    Arc::clone(&on_error),
                    event,
                )
            })
            .boxed()
    }
}

impl<E, S> Trigger<E> for MultipleResultFeature<E, S>
where
    E: Clone + Debug + Send + Sync + 'static,
    S: 'static,
{
    fn trigger(&self, event: E) {
        self.channel.send(event);
    }
}

/// Run one interaction, turning its first failure into the failure reducer.
fn contain<E, S>(
    name: Arc<str>,
    interaction: &dyn Interaction<E, S>,
    on_error: Arc<dyn ErrorReducerFactory<S>>,
    event: E,
) -> OutcomeStream<S>
where
    S: 'static,
{
    let reducers = match panic::catch_unwind(AssertUnwindSafe(|| interaction.process(event))) {
        Ok(reducers) => reducers,
        Err(payload) => {
            let error = anyhow::anyhow!(
                "interaction panicked: {}",
                crate::panic_message(payload.as_ref())
            );
            stream::iter([Err(error)]).boxed()
        }
    };

    Box::pin(async_stream::stream! {
        let mut reducers = AssertUnwindSafe(reducers).catch_unwind();

        while let Some(item) = reducers.next().await {
            let error = match item {
                Ok(Ok(reducer)) => {
                    tracing::trace!(component = %name, ?reducer, "Emitting reducer");
                    yield Ok::<_, FeatureError>(Outcome::single(reducer));
                    continue;
                }
                Ok(Err(error)) => error,
                Err(payload) => anyhow::anyhow!(
                    "interaction panicked: {}",
                    crate::panic_message(payload.as_ref())
                ),
            };

            tracing::warn!(component = %name, error = %error, "Interaction failed");
            metrics::counter!(INTERACTION_FAILURES, "component" => name.to_string()).increment(1);
            yield Ok(Outcome::single(on_error.create(&error)));
            break;
        }
    })
}
