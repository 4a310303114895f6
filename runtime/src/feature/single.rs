//! Single-result features: one reducer per event, computed synchronously.

use super::channel::EventChannel;
use futures::StreamExt;
use statefold_core::{Feature, FeatureError, Outcome, OutcomeStream, Reducer, Trigger};
use std::fmt::Debug;
use std::sync::Arc;

type CreateReducer<E, S> = Arc<dyn Fn(E) -> Reducer<S> + Send + Sync>;

/// Feature wrapping a pure `Event -> Reducer` mapping.
///
/// Every triggered event yields exactly one outcome, in trigger order. Use it
/// for UI intents that only flip state, such as opening a dialog.
///
/// # Example
///
/// ```rust
/// use statefold_core::Reducer;
/// use statefold_runtime::SingleResultFeature;
///
/// #[derive(Clone, Debug)]
/// struct OpenDetails(u32);
///
/// #[derive(Clone, Debug, Default)]
/// struct Screen {
///     details: Option<u32>,
/// }
///
/// let feature = SingleResultFeature::new("open_details", |OpenDetails(id)| {
///     Reducer::new(move |_: Screen| Screen { details: Some(id) })
/// });
/// # let _ = feature;
/// ```
pub struct SingleResultFeature<E, S> {
    channel: EventChannel<E>,
    create: CreateReducer<E, S>,
}

impl<E, S> SingleResultFeature<E, S>
where
    E: Clone + Debug + Send + Sync + 'static,
    S: 'static,
{
    /// Create a feature named `name` mapping each event through `create`.
    #[must_use]
    pub fn new<F>(name: impl Into<String>, create: F) -> Self
    where
        F: Fn(E) -> Reducer<S> + Send + Sync + 'static,
    {
        Self {
            channel: EventChannel::new(name),
            create: Arc::new(create),
        }
    }

    /// Process `event` at the start of every subscription.
    #[must_use]
    pub fn with_start_event(mut self, event: E) -> Self {
        self.channel.set_start_event(event);
        self
    }
}

impl<E, S> Feature<S> for SingleResultFeature<E, S>
where
    E: Clone + Debug + Send + Sync + 'static,
    S: 'static,
{
    fn name(&self) -> &str {
        self.channel.name()
    }

    fn outcomes(&self) -> OutcomeStream<S> {
        let create = Arc::clone(&self.create);
        let name = self.channel.shared_name();

        self.channel
            .subscribe()
            .map(move |event| {
                tracing::debug!(component = %name, ?event, "Processing event");
                let reducer = create(event);
                tracing::trace!(component = %name, ?reducer, "Emitting reducer");
                Ok::<_, FeatureError>(Outcome::single(reducer))
            })
            .boxed()
    }
}

impl<E, S> Trigger<E> for SingleResultFeature<E, S>
where
    E: Clone + Debug + Send + Sync + 'static,
    S: 'static,
{
    fn trigger(&self, event: E) {
        self.channel.send(event);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn adder() -> SingleResultFeature<i32, i32> {
        SingleResultFeature::new("adder", |amount: i32| {
            Reducer::new(move |total: i32| total + amount)
        })
    }

    #[tokio::test]
    async fn one_outcome_per_event_in_trigger_order() {
        let feature = adder();
        let mut outcomes = feature.outcomes();

        feature.trigger(1);
        feature.trigger(10);

        let first = outcomes.next().await.unwrap().unwrap();
        let second = outcomes.next().await.unwrap().unwrap();
        assert_eq!(second.apply(first.apply(0)), 11);
    }

    #[tokio::test]
    async fn start_event_is_processed_on_subscription() {
        let feature = adder().with_start_event(100);
        let mut outcomes = feature.outcomes();

        let outcome = outcomes.next().await.unwrap().unwrap();
        assert_eq!(outcome.apply(0), 100);
    }

    #[tokio::test]
    async fn events_before_subscription_are_dropped() {
        let feature = adder();
        feature.trigger(5);

        let mut outcomes = feature.outcomes();
        feature.trigger(7);

        let outcome = outcomes.next().await.unwrap().unwrap();
        assert_eq!(outcome.apply(0), 7);
    }

    #[test]
    fn name_is_the_component_tag() {
        assert_eq!(adder().name(), "adder");
    }
}
