//! Fold one feature's outcomes in isolation.

#![allow(clippy::module_name_repetitions)]

use crate::{DEFAULT_TIMEOUT, HarnessError};
use futures::StreamExt;
use statefold_core::{Feature, OutcomeStream};
use std::time::Duration;

/// Subscribes to a feature and folds its outcomes over a state.
///
/// The subscription is registered in [`new`](Self::new), so events triggered
/// afterwards are observed. No transient cleaning or equality filtering
/// happens here: the harness shows exactly what the feature produces.
///
/// # Example
///
/// ```ignore
/// let feature = load_tasks_feature(repository);
/// let mut harness = FeatureHarness::new(&feature, ViewState::default());
///
/// feature.trigger(LoadTasks);
/// assert!(harness.next().await?.loading);
/// assert!(!harness.next().await?.loading);
/// ```
pub struct FeatureHarness<S> {
    outcomes: OutcomeStream<S>,
    state: Option<S>,
    timeout: Duration,
}

impl<S> FeatureHarness<S> {
    /// Subscribe to `feature`, folding from `initial`.
    #[must_use]
    pub fn new(feature: &dyn Feature<S>, initial: S) -> Self {
        Self {
            outcomes: feature.outcomes(),
            state: Some(initial),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Wait at most `timeout` per outcome (default [`DEFAULT_TIMEOUT`]).
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fold the next outcome and return the new state.
    ///
    /// # Errors
    ///
    /// - [`HarnessError::Timeout`] if no outcome arrives in time
    /// - [`HarnessError::Ended`] if the feature stream ended
    /// - [`HarnessError::Failed`] if the feature stream yielded an error
    pub async fn next(&mut self) -> Result<&S, HarnessError> {
        let outcome = match tokio::time::timeout(self.timeout, self.outcomes.next()).await {
            Err(_) => return Err(HarnessError::Timeout(self.timeout)),
            Ok(None) => return Err(HarnessError::Ended),
            Ok(Some(Err(error))) => return Err(HarnessError::Failed(error.to_string())),
            Ok(Some(Ok(outcome))) => outcome,
        };

        let state = self.state.take().ok_or(HarnessError::Ended)?;
        Ok(self.state.insert(outcome.apply(state)))
    }

    /// Fold the next `count` outcomes and return the resulting state.
    ///
    /// # Errors
    ///
    /// See [`next`](Self::next).
    pub async fn fold(&mut self, count: usize) -> Result<&S, HarnessError> {
        for _ in 0..count {
            self.next().await?;
        }
        self.state.as_ref().ok_or(HarnessError::Ended)
    }

    /// Current state, if no fold is in progress.
    #[must_use]
    pub const fn state(&self) -> Option<&S> {
        self.state.as_ref()
    }
}
