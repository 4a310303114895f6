//! # Statefold Core
//!
//! Core traits and types for the statefold state-folding engine.
//!
//! This crate defines the contracts between features, the engine and its
//! consumers. The engine itself lives in `statefold-runtime`.
//!
//! ## Core Concepts
//!
//! - **State**: everything the engine tracks for one screen or session
//! - **Model**: the externally visible projection of state
//! - **Event**: the payload of one externally triggered intent
//! - **Reducer**: pure `State -> State` transition ([`Reducer`])
//! - **Outcome**: the reducer(s) folded in one step ([`Outcome`])
//! - **Feature**: turns events into outcomes over time ([`Feature`], [`Trigger`])
//! - **Storage**: loads the initial state and persists every emitted one ([`Storage`])
//!
//! ## Data Flow
//!
//! ```text
//! consumer ── trigger(event) ──► Feature ── outcomes ──┐
//! consumer ── trigger(event) ──► Feature ── outcomes ──┤ merge (arrival order)
//!                                                      ▼
//!                        clean transients ─► apply reducers ─► distinct?
//!                                                      │
//!                              save ◄──────────────────┘
//!                                │
//!                                ▼
//!                      convert ─► Model ─► consumer
//! ```
//!
//! ## Example
//!
//! ```
//! use statefold_core::{Outcome, Reducer};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct TasksState {
//!     loading: bool,
//!     tasks: Vec<String>,
//! }
//!
//! let start = Reducer::named("load.start", |s: TasksState| TasksState { loading: true, ..s });
//! let done = Reducer::named("load.success", |_: TasksState| TasksState {
//!     loading: false,
//!     tasks: vec!["write docs".to_string()],
//! });
//!
//! let state = TasksState { loading: false, tasks: vec![] };
//! let state = Outcome::single(start).apply(state);
//! assert!(state.loading);
//! let state = Outcome::single(done).apply(state);
//! assert_eq!(state.tasks.len(), 1);
//! ```

pub mod feature;
pub mod outcome;
pub mod policy;
pub mod reducer;
pub mod storage;

pub use feature::{Feature, FeatureError, OutcomeStream, Trigger};
pub use outcome::{Outcome, Reducers};
pub use policy::{
    ErrorReducerFactory, KeepAll, NeverEqual, StateConverter, StateEquality, Structural,
    TransientCleaner,
};
pub use reducer::Reducer;
pub use storage::{Storage, StorageError};

// Re-export so implementors don't need a direct dependency
pub use futures::future::BoxFuture;
pub use futures::stream::BoxStream;
