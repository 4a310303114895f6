//! Drive an engine run into a display callback.
//!
//! [`Engine::attach`] is the consumer lifecycle in one call: it subscribes to
//! the model stream on a Tokio task and hands every model to a display
//! callback. Dropping or detaching the [`Attachment`] cancels the run.

use crate::configuration::Configuration;
use crate::engine::Engine;
use crate::error::EngineError;
use futures::StreamExt;
use std::panic::{self, AssertUnwindSafe};
use tokio::task::JoinHandle;

/// Handle to an attached run.
///
/// The run is cancelled when the handle is dropped.
#[derive(Debug)]
pub struct Attachment {
    task: Option<JoinHandle<()>>,
}

impl Attachment {
    /// Cancel the run.
    ///
    /// Feature subscriptions and in-flight interactions are dropped; the last
    /// saved state stays in storage.
    pub fn detach(mut self) {
        self.cancel();
    }

    /// Whether the run has ended on its own (completion or terminal failure).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait until the run ends on its own.
    pub async fn finished(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(error) = task.await {
                tracing::error!(error = %error, "Attachment task failed");
            }
        }
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            tracing::debug!("Detaching from engine run");
            task.abort();
        }
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl Engine {
    /// Run `configuration`, handing every model to `display`.
    ///
    /// A panicking `display` is logged and the model is skipped; the run
    /// continues.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn attach<S, M, D>(&self, configuration: Configuration<S, M>, display: D) -> Attachment
    where
        S: Clone + Send + Sync + 'static,
        M: Send + 'static,
        D: FnMut(M) + Send + 'static,
    {
        self.attach_with_stalling(configuration, display, |_: &EngineError| {})
    }

    /// Like [`attach`](Self::attach), calling `stalling` once if the run ends
    /// with a terminal error.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn attach_with_stalling<S, M, D, T>(
        &self,
        configuration: Configuration<S, M>,
        mut display: D,
        stalling: T,
    ) -> Attachment
    where
        S: Clone + Send + Sync + 'static,
        M: Send + 'static,
        D: FnMut(M) + Send + 'static,
        T: FnOnce(&EngineError) + Send + 'static,
    {
        let mut models = self.run(configuration);

        let task = tokio::spawn(async move {
            let failure = loop {
                match models.next().await {
                    Some(Ok(model)) => {
                        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| display(model)))
                        {
                            tracing::error!(
                                panic = %crate::panic_message(payload.as_ref()),
                                "Display callback panicked, model skipped"
                            );
                        }
                    }
                    Some(Err(error)) => break Some(error),
                    None => break None,
                }
            };

            if let Some(error) = failure {
                tracing::error!(error = %error, "Engine run failed, stalling");
                stalling(&error);
            }
        });

        Attachment { task: Some(task) }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;
    use crate::engine::EngineStatus;
    use crate::feature::SingleResultFeature;
    use crate::storage::MemoryStorage;
    use statefold_core::{FeatureError, Reducer, Storage, StorageError, Trigger};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn adder() -> Arc<SingleResultFeature<i32, i32>> {
        Arc::new(SingleResultFeature::new("add", |n: i32| {
            Reducer::new(move |total: i32| total + n)
        }))
    }

    fn configuration(feature: Arc<SingleResultFeature<i32, i32>>) -> Configuration<i32, i32> {
        Configuration::builder()
            .feature(feature)
            .storage(MemoryStorage::new(0))
            .converter(|state: &i32| *state)
            .on_error(|_: &FeatureError| Reducer::identity())
            .build()
            .unwrap()
    }

    async fn recv(models: &mut mpsc::UnboundedReceiver<i32>) -> i32 {
        tokio::time::timeout(Duration::from_secs(1), models.recv())
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn display_receives_every_model() {
        let feature = adder();
        let (tx, mut models) = mpsc::unbounded_channel();
        let engine = Engine::new();
        let _attachment = engine.attach(configuration(feature.clone()), move |model| {
            tx.send(model).unwrap();
        });

        assert_eq!(recv(&mut models).await, 0);
        feature.trigger(2);
        assert_eq!(recv(&mut models).await, 2);
    }

    #[tokio::test]
    async fn panicking_display_does_not_end_the_run() {
        let feature = adder();
        let (tx, mut models) = mpsc::unbounded_channel();
        let engine = Engine::new();
        let _attachment = engine.attach(configuration(feature.clone()), move |model: i32| {
            assert!(model != 1, "cannot display one");
            tx.send(model).unwrap();
        });

        assert_eq!(recv(&mut models).await, 0);
        feature.trigger(1);
        feature.trigger(1);
        assert_eq!(recv(&mut models).await, 2);
    }

    #[tokio::test]
    async fn detach_cancels_the_run() {
        let feature = adder();
        let (tx, mut models) = mpsc::unbounded_channel();
        let engine = Engine::new();
        let attachment = engine.attach(configuration(feature.clone()), move |model| {
            let _ = tx.send(model);
        });
        assert_eq!(recv(&mut models).await, 0);
        assert_eq!(engine.status(), EngineStatus::Running);

        attachment.detach();

        tokio::time::timeout(Duration::from_secs(1), async {
            while engine.status() == EngineStatus::Running {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        feature.trigger(5);
        assert!(models.recv().await.is_none());
    }

    struct Unavailable;

    impl Storage<i32> for Unavailable {
        fn load(&self) -> futures::future::BoxFuture<'_, Result<i32, StorageError>> {
            Box::pin(async { Err(StorageError::Empty) })
        }

        fn save<'a>(
            &'a self,
            _: &'a i32,
        ) -> futures::future::BoxFuture<'a, Result<(), StorageError>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[tokio::test]
    async fn stalling_is_called_on_terminal_failure() {
        let configuration = Configuration::<i32, i32>::builder()
            .storage(Unavailable)
            .converter(|state: &i32| *state)
            .on_error(|_: &FeatureError| Reducer::identity())
            .build()
            .unwrap();
        let (tx, mut stalled) = mpsc::unbounded_channel();

        let attachment = Engine::new().attach_with_stalling(
            configuration,
            |_: i32| panic!("nothing should be displayed"),
            move |error: &EngineError| {
                tx.send(error.to_string()).unwrap();
            },
        );
        attachment.finished().await;

        assert_eq!(
            stalled.recv().await.unwrap(),
            "Storage load failed: No state has been saved yet"
        );
    }
}
