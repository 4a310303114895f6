//! Outcomes: what a feature produces for one fold step.
//!
//! An [`Outcome`] wraps the reducer (or the short, ordered batch of reducers)
//! that a feature emits at one point in time. The engine folds one outcome per
//! step: transient fields are cleaned once, then every reducer in the outcome
//! is applied in order, and at most one model is emitted for the whole batch.
//!
//! A single-result feature emits exactly one outcome per event. A multi-result
//! feature emits one outcome per phase (start, success or failure).

use crate::reducer::Reducer;
use smallvec::{SmallVec, smallvec};
use std::fmt;

/// Reducers applied within one fold step, in order.
///
/// Almost every outcome carries a single reducer, hence the inline capacity.
pub type Reducers<S> = SmallVec<[Reducer<S>; 1]>;

/// One fold step's worth of reducers, produced by a feature.
pub struct Outcome<S> {
    reducers: Reducers<S>,
}

impl<S> Outcome<S> {
    /// An outcome carrying a single reducer.
    #[must_use]
    pub fn single(reducer: Reducer<S>) -> Self {
        Self {
            reducers: smallvec![reducer],
        }
    }

    /// An outcome applying several reducers, in order, within one fold step.
    ///
    /// An empty batch is allowed: folding it behaves like folding an identity
    /// reducer.
    #[must_use]
    pub fn batch(reducers: impl IntoIterator<Item = Reducer<S>>) -> Self {
        Self {
            reducers: reducers.into_iter().collect(),
        }
    }

    /// Number of reducers in this outcome.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    /// Whether this outcome carries no reducer at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }

    /// Labels of the carried reducers, for diagnostics.
    pub fn labels(&self) -> impl Iterator<Item = Option<&'static str>> + '_ {
        self.reducers.iter().map(Reducer::label)
    }

    /// Apply every reducer in order, starting from `state`.
    #[must_use]
    pub fn apply(self, state: S) -> S {
        self.reducers
            .into_iter()
            .fold(state, |current, reducer| reducer.apply(current))
    }
}

impl<S> fmt::Debug for Outcome<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.reducers.iter()).finish()
    }
}

impl<S> From<Reducer<S>> for Outcome<S> {
    fn from(reducer: Reducer<S>) -> Self {
        Self::single(reducer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_applies_its_reducer() {
        let outcome = Outcome::single(Reducer::new(|n: i32| n + 1));
        assert_eq!(outcome.len(), 1);
        assert_eq!(outcome.apply(1), 2);
    }

    #[test]
    fn batch_applies_in_order() {
        let outcome = Outcome::batch([
            Reducer::new(|s: String| s + "a"),
            Reducer::new(|s: String| s + "b"),
            Reducer::new(|s: String| s + "c"),
        ]);

        assert_eq!(outcome.apply(String::new()), "abc");
    }

    #[test]
    fn empty_batch_is_identity() {
        let outcome: Outcome<i32> = Outcome::batch([]);
        assert!(outcome.is_empty());
        assert_eq!(outcome.apply(7), 7);
    }

    #[test]
    fn labels_follow_reducers() {
        let outcome: Outcome<i32> =
            Outcome::batch([Reducer::named("start", |n| n), Reducer::new(|n| n)]);

        let labels: Vec<_> = outcome.labels().collect();
        assert_eq!(labels, vec![Some("start"), None]);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn batch_equals_sequential_singles(deltas in prop::collection::vec(-1000i64..1000, 0..16), start in -1000i64..1000) {
                let batch = Outcome::batch(deltas.iter().map(|&d| Reducer::new(move |n: i64| n + d)));
                let sequential = deltas
                    .iter()
                    .fold(start, |n, &d| Outcome::single(Reducer::new(move |m: i64| m + d)).apply(n));

                prop_assert_eq!(batch.apply(start), sequential);
            }
        }
    }
}
