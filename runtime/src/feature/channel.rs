//! Inbound event channel shared by both feature shapes.

use crate::metrics::EVENTS_RECEIVED;
use futures::stream::BoxStream;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

/// Fans triggered events out to every live subscription.
///
/// A feature may be subscribed several times (resubscription after a failure,
/// consecutive runs). Each subscription only sees events sent after it was
/// created, and owns an unbounded queue: no event is lost however far the
/// subscriber falls behind.
pub(crate) struct EventChannel<E> {
    name: Arc<str>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<E>>>,
    start_event: Option<E>,
}

impl<E> EventChannel<E>
where
    E: Clone + Debug + Send + Sync + 'static,
{
    pub(crate) fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self {
            name: Arc::from(name),
            subscribers: Mutex::new(Vec::new()),
            start_event: None,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    pub(crate) fn set_start_event(&mut self, event: E) {
        self.start_event = Some(event);
    }

    fn subscribers(&self) -> MutexGuard<'_, Vec<mpsc::UnboundedSender<E>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliver `event` to every live subscription, forgetting dropped ones.
    pub(crate) fn send(&self, event: E) {
        tracing::debug!(component = %self.name, ?event, "Received event");
        metrics::counter!(EVENTS_RECEIVED, "component" => self.name.to_string()).increment(1);

        let mut subscribers = self.subscribers();
        subscribers.retain(|subscriber| subscriber.send(event.clone()).is_ok());

        if subscribers.is_empty() {
            tracing::debug!(component = %self.name, "No active subscription, event dropped");
        }
    }

    /// Register a subscription now and return its events as a stream.
    ///
    /// The start event, if any, is the first item of every subscription.
    pub(crate) fn subscribe(&self) -> BoxStream<'static, E> {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        self.subscribers().push(sender);

        let name = Arc::clone(&self.name);
        let start_event = self.start_event.clone();

        Box::pin(async_stream::stream! {
            if let Some(event) = start_event {
                tracing::debug!(component = %name, ?event, "Processing start event");
                yield event;
            }

            while let Some(event) = receiver.recv().await {
                yield event;
            }
        })
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        self.subscribers().len()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn subscription_sees_events_sent_after_subscribing() {
        let channel = EventChannel::new("numbers");
        channel.send(1); // dropped, nobody listens yet

        let mut events = channel.subscribe();
        channel.send(2);
        channel.send(3);

        assert_eq!(events.next().await, Some(2));
        assert_eq!(events.next().await, Some(3));
    }

    #[tokio::test]
    async fn start_event_comes_first_on_every_subscription() {
        let mut channel = EventChannel::new("numbers");
        channel.set_start_event(0);

        let mut first = channel.subscribe();
        let mut second = channel.subscribe();
        channel.send(7);

        assert_eq!(first.next().await, Some(0));
        assert_eq!(first.next().await, Some(7));
        assert_eq!(second.next().await, Some(0));
        assert_eq!(second.next().await, Some(7));
    }

    #[tokio::test]
    async fn idle_subscription_keeps_every_event() {
        let channel = EventChannel::new("numbers");
        let events = channel.subscribe();

        for value in 0..1_000 {
            channel.send(value);
        }
        drop(channel);

        let received: Vec<_> = events.collect().await;
        assert_eq!(received, (0..1_000).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn dropped_subscriptions_are_forgotten_on_next_send() {
        let channel = EventChannel::new("numbers");
        let kept = channel.subscribe();
        drop(channel.subscribe());
        assert_eq!(channel.subscriber_count(), 2);

        channel.send(1);
        assert_eq!(channel.subscriber_count(), 1);
        drop(kept);

        channel.send(2);
        assert_eq!(channel.subscriber_count(), 0);
    }
}
