//! Stock feature implementations.
//!
//! Both shapes own an event channel: [`Trigger::trigger`] sends into it and
//! every [`Feature::outcomes`] call registers a fresh subscription with its own
//! unbounded queue.
//!
//! [`Trigger::trigger`]: statefold_core::Trigger::trigger
//! [`Feature::outcomes`]: statefold_core::Feature::outcomes

mod channel;
mod multiple;
mod single;

pub use multiple::{Interaction, MultipleResultFeature, ReducerStream, round_trip};
pub use single::SingleResultFeature;
