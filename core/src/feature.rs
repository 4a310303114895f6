//! Features: long-lived producers of outcomes.
//!
//! A feature binds one event type to a production rule. Consumers push events
//! in through [`Trigger::trigger`]; the engine pulls outcomes out through
//! [`Feature::outcomes`]. The two sides are separate traits:
//! the engine never needs to know a feature's event type, and consumers never
//! need to see its outcome stream.
//!
//! # Failure contract
//!
//! A feature is expected to contain its own failures: an interaction that
//! fails should surface as an ordinary "failure" reducer, not as an error
//! item. An `Err` item on the outcome stream means the subscription is dead;
//! the engine turns it into a reducer through its
//! [`ErrorReducerFactory`](crate::policy::ErrorReducerFactory), drops the
//! stream and calls [`Feature::outcomes`] again.
//!
//! # Implementations
//!
//! - `SingleResultFeature` (in `statefold-runtime`): pure `Event -> Reducer`
//! - `MultipleResultFeature` (in `statefold-runtime`): asynchronous
//!   `Event -> stream of Reducer`

use crate::outcome::Outcome;
use futures::stream::BoxStream;

/// Failure value surfaced by features and interactions.
///
/// Any error type converts into it with `?`, which keeps interaction code free
/// of error plumbing.
pub type FeatureError = anyhow::Error;

/// Outcome stream returned by [`Feature::outcomes`].
///
/// `Ok` items are folded by the engine; an `Err` item ends the subscription.
pub type OutcomeStream<S> = BoxStream<'static, Result<Outcome<S>, FeatureError>>;

/// Engine-facing side of a feature.
///
/// # Subscription semantics
///
/// Every call to [`outcomes`](Self::outcomes) creates a new, independent
/// subscription. Implementations must register the subscription *before*
/// returning, so that events triggered after the call are observed even if
/// the returned stream has not been polled yet. Events triggered while no
/// subscription exists are dropped.
///
/// # Thread Safety
///
/// Features are shared between the engine (which subscribes) and the consumer
/// (which triggers), typically behind an `Arc`, hence `Send + Sync`.
pub trait Feature<S>: Send + Sync {
    /// Name used as the component tag in logs and metrics.
    ///
    /// Names must be unique within one configuration.
    fn name(&self) -> &str;

    /// Subscribe to this feature's outcomes.
    fn outcomes(&self) -> OutcomeStream<S>;
}

/// Consumer-facing side of a feature.
pub trait Trigger<E>: Send + Sync {
    /// Enqueue an event for processing.
    ///
    /// Fire-and-forget: never blocks and never fails. Processing happens when
    /// the engine pulls the feature's outcomes.
    fn trigger(&self, event: E);
}
