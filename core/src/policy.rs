//! Policies the engine applies around every fold step.
//!
//! - [`TransientCleaner`]: resets one-shot fields before each fold step
//! - [`StateEquality`]: decides when a new state is not worth emitting
//! - [`StateConverter`]: projects state into the externally visible model
//! - [`ErrorReducerFactory`]: turns a failure into a recoverable transition
//!
//! Every policy is implemented for plain closures, so most configurations
//! never name these traits:
//!
//! ```
//! use statefold_core::policy::{StateConverter, TransientCleaner};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Screen {
//!     items: Vec<String>,
//!     show_saved: bool,
//! }
//!
//! let cleaner = |state: Screen| Screen { show_saved: false, ..state };
//! let converter = |state: &Screen| state.items.len();
//!
//! let cleaned = cleaner.clean(Screen { items: vec!["a".into()], show_saved: true });
//! assert!(!cleaned.show_saved);
//! assert_eq!(converter.convert(&cleaned), 1);
//! ```

use crate::feature::FeatureError;
use crate::reducer::Reducer;

/// Resets the transient (one-shot) fields of a state.
///
/// Applied to the freshly loaded state and immediately before every fold
/// step, so a one-shot signal set by reducer N is visible in exactly one
/// model.
pub trait TransientCleaner<S>: Send + Sync {
    /// Return `state` with every transient field set to its neutral value.
    fn clean(&self, state: S) -> S;
}

impl<S, F> TransientCleaner<S> for F
where
    F: Fn(S) -> S + Send + Sync,
{
    fn clean(&self, state: S) -> S {
        self(state)
    }
}

/// Cleaner for states without transient fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepAll;

impl<S> TransientCleaner<S> for KeepAll {
    fn clean(&self, state: S) -> S {
        state
    }
}

/// Decides whether two states are indistinguishable to the outside world.
///
/// When `equal(previous_emitted, next)` holds, the engine keeps folding from
/// `next` but neither persists, converts nor emits it.
pub trait StateEquality<S>: Send + Sync {
    /// Whether `previous` and `next` would produce the same observable model.
    fn equal(&self, previous: &S, next: &S) -> bool;
}

impl<S, F> StateEquality<S> for F
where
    F: Fn(&S, &S) -> bool + Send + Sync,
{
    fn equal(&self, previous: &S, next: &S) -> bool {
        self(previous, next)
    }
}

/// Default equality: no two states are equivalent, every fold step emits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverEqual;

impl<S> StateEquality<S> for NeverEqual {
    fn equal(&self, _previous: &S, _next: &S) -> bool {
        false
    }
}

/// Equality through the state's own `PartialEq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Structural;

impl<S: PartialEq> StateEquality<S> for Structural {
    fn equal(&self, previous: &S, next: &S) -> bool {
        previous == next
    }
}

/// Projects a state into the model handed to consumers.
pub trait StateConverter<S, M>: Send + Sync {
    /// Build the model for `state`.
    fn convert(&self, state: &S) -> M;
}

impl<S, M, F> StateConverter<S, M> for F
where
    F: Fn(&S) -> M + Send + Sync,
{
    fn convert(&self, state: &S) -> M {
        self(state)
    }
}

/// Turns a failure into a reducer recording it in state.
///
/// The produced reducer must keep the already accumulated state and only set
/// the failure indicator. Factories never fail themselves.
pub trait ErrorReducerFactory<S>: Send + Sync {
    /// Create the reducer recording `error`.
    fn create(&self, error: &FeatureError) -> Reducer<S>;
}

impl<S, F> ErrorReducerFactory<S> for F
where
    F: Fn(&FeatureError) -> Reducer<S> + Send + Sync,
{
    fn create(&self, error: &FeatureError) -> Reducer<S> {
        self(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Flags {
        transient: bool,
        failed: bool,
        value: i32,
    }

    const fn flags(transient: bool, value: i32) -> Flags {
        Flags {
            transient,
            failed: false,
            value,
        }
    }

    #[test]
    fn keep_all_returns_state_untouched() {
        assert_eq!(KeepAll.clean(flags(true, 1)), flags(true, 1));
    }

    #[test]
    fn closure_cleaner_resets_transient_fields() {
        let cleaner = |state: Flags| Flags {
            transient: false,
            ..state
        };
        assert_eq!(cleaner.clean(flags(true, 3)), flags(false, 3));
    }

    #[test]
    fn never_equal_never_suppresses() {
        assert!(!NeverEqual.equal(&flags(false, 1), &flags(false, 1)));
    }

    #[test]
    fn structural_uses_partial_eq() {
        assert!(Structural.equal(&flags(false, 1), &flags(false, 1)));
        assert!(!Structural.equal(&flags(false, 1), &flags(false, 2)));
    }

    #[test]
    fn closure_equality_can_ignore_fields() {
        let same_value = |a: &Flags, b: &Flags| a.value == b.value;
        assert!(same_value.equal(&flags(true, 1), &flags(false, 1)));
    }

    #[test]
    fn error_factory_keeps_accumulated_state() {
        let factory = |_: &FeatureError| {
            Reducer::named("failed", |state: Flags| Flags {
                failed: true,
                ..state
            })
        };

        let reducer = factory.create(&anyhow::anyhow!("boom"));
        let state = reducer.apply(flags(false, 9));

        assert!(state.failed);
        assert_eq!(state.value, 9);
    }
}
