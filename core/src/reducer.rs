//! Reducers: the atomic unit of state mutation.
//!
//! A [`Reducer`] turns one state value into the next. It is created by a
//! feature in response to an event and consumed exactly once by the engine's
//! fold step.
//!
//! # Contract
//!
//! Reducers must be **pure** and **total**: no I/O, no failure for any
//! reachable state. Anything fallible belongs to the feature that produced
//! the reducer, never to the reducer itself. A reducer that panics is treated
//! as a programming error and is not recovered by the engine.
//!
//! # Example
//!
//! ```
//! use statefold_core::reducer::Reducer;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Counter {
//!     value: i32,
//! }
//!
//! let increment = Reducer::named("increment", |state: Counter| Counter {
//!     value: state.value + 1,
//! });
//!
//! assert_eq!(increment.apply(Counter { value: 41 }), Counter { value: 42 });
//! ```

use std::fmt;

/// Boxed state transition held by a [`Reducer`].
type Transition<S> = Box<dyn FnOnce(S) -> S + Send>;

/// A pure `State -> State` transition.
///
/// Reducers are values produced by features and applied once by the engine.
/// They never see any state other than the one they are applied to, which is
/// what keeps features free of shared mutable state.
///
/// The optional label only exists for diagnostics; it shows up in `Debug`
/// output and in the engine's trace records.
pub struct Reducer<S> {
    label: Option<&'static str>,
    transition: Transition<S>,
}

impl<S> Reducer<S> {
    /// Create an unlabelled reducer from a transition function.
    #[must_use]
    pub fn new<F>(transition: F) -> Self
    where
        F: FnOnce(S) -> S + Send + 'static,
    {
        Self {
            label: None,
            transition: Box::new(transition),
        }
    }

    /// Create a reducer with a label used in logs.
    #[must_use]
    pub fn named<F>(label: &'static str, transition: F) -> Self
    where
        F: FnOnce(S) -> S + Send + 'static,
    {
        Self {
            label: Some(label),
            transition: Box::new(transition),
        }
    }

    /// A reducer that returns the state unchanged.
    ///
    /// Folding it still counts as a fold step, so transient fields are
    /// cleaned and a model is emitted (unless suppressed by state equality).
    #[must_use]
    pub fn identity() -> Self
    where
        S: 'static,
    {
        Self::named("identity", |state| state)
    }

    /// The label given at construction, if any.
    #[must_use]
    pub const fn label(&self) -> Option<&'static str> {
        self.label
    }

    /// Apply the transition, consuming the reducer.
    #[must_use]
    pub fn apply(self, state: S) -> S {
        (self.transition)(state)
    }
}

impl<S> fmt::Debug for Reducer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label {
            Some(label) => write!(f, "Reducer({label})"),
            None => write!(f, "Reducer(<anonymous>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_runs_transition() {
        let reducer = Reducer::new(|n: i32| n * 2);
        assert_eq!(reducer.apply(21), 42);
    }

    #[test]
    fn identity_keeps_state() {
        let reducer: Reducer<String> = Reducer::identity();
        assert_eq!(reducer.apply("same".to_string()), "same");
    }

    #[test]
    fn debug_shows_label() {
        let named: Reducer<i32> = Reducer::named("double", |n| n * 2);
        let anonymous: Reducer<i32> = Reducer::new(|n| n);

        assert_eq!(format!("{named:?}"), "Reducer(double)");
        assert_eq!(format!("{anonymous:?}"), "Reducer(<anonymous>)");
        assert_eq!(named.label(), Some("double"));
    }
}
