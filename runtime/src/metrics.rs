//! Metric names and descriptions for engine observability.
//!
//! The runtime records through the `metrics` facade only; installing a
//! recorder or exporter is up to the host application. Call
//! [`describe_metrics`] once after installing a recorder to attach help text
//! and units.
//!
//! # Example
//!
//! ```rust
//! // With whatever recorder the application installed:
//! statefold_runtime::metrics::describe_metrics();
//! ```

use metrics::{Unit, describe_counter, describe_histogram};

/// Engine runs started.
pub const RUNS_STARTED: &str = "engine.runs.started";
/// Engine runs ended (disposed, completed or failed).
pub const RUNS_ENDED: &str = "engine.runs.ended";
/// Outcomes folded into state.
pub const FOLD_STEPS: &str = "engine.fold.steps";
/// Time spent cleaning and applying one outcome.
pub const FOLD_DURATION: &str = "engine.fold.duration_seconds";
/// Models handed to the consumer.
pub const MODELS_EMITTED: &str = "engine.models.emitted";
/// Fold steps whose state was judged equal to the last emitted one.
pub const MODELS_SUPPRESSED: &str = "engine.models.suppressed";
/// Feature stream errors recovered through the error reducer factory.
pub const FEATURE_RECOVERED: &str = "engine.feature.recovered";
/// Storage operation retries.
pub const STORAGE_RETRIES: &str = "engine.storage.retries";
/// Storage failures that ended a run.
pub const STORAGE_FAILURES: &str = "engine.storage.failures";
/// Events received by features.
pub const EVENTS_RECEIVED: &str = "feature.events.received";
/// Interactions that failed and were turned into failure reducers.
pub const INTERACTION_FAILURES: &str = "feature.interaction.failures";

/// Register descriptions for every metric the runtime records.
pub fn describe_metrics() {
    describe_counter!(RUNS_STARTED, Unit::Count, "Engine runs started");
    describe_counter!(RUNS_ENDED, Unit::Count, "Engine runs ended");
    describe_counter!(FOLD_STEPS, Unit::Count, "Outcomes folded into state");
    describe_histogram!(
        FOLD_DURATION,
        Unit::Seconds,
        "Time spent cleaning transients and applying one outcome"
    );
    describe_counter!(MODELS_EMITTED, Unit::Count, "Models emitted to consumers");
    describe_counter!(
        MODELS_SUPPRESSED,
        Unit::Count,
        "Fold steps suppressed by state equality"
    );
    describe_counter!(
        FEATURE_RECOVERED,
        Unit::Count,
        "Feature stream errors recovered and resubscribed"
    );
    describe_counter!(STORAGE_RETRIES, Unit::Count, "Storage operation retries");
    describe_counter!(
        STORAGE_FAILURES,
        Unit::Count,
        "Storage failures that ended a run"
    );
    describe_counter!(EVENTS_RECEIVED, Unit::Count, "Events triggered on features");
    describe_counter!(
        INTERACTION_FAILURES,
        Unit::Count,
        "Interactions turned into failure reducers"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describing_without_recorder_is_a_no_op() {
        describe_metrics();
    }

    #[test]
    fn names_are_namespaced() {
        for name in [
            RUNS_STARTED,
            RUNS_ENDED,
            FOLD_STEPS,
            FOLD_DURATION,
            MODELS_EMITTED,
            MODELS_SUPPRESSED,
            FEATURE_RECOVERED,
            STORAGE_RETRIES,
            STORAGE_FAILURES,
        ] {
            assert!(name.starts_with("engine."), "{name}");
        }
        for name in [EVENTS_RECEIVED, INTERACTION_FAILURES] {
            assert!(name.starts_with("feature."), "{name}");
        }
    }
}
