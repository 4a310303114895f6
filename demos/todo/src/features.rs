//! Features of the tasks screen.
//!
//! Repository-backed features are [`MultipleResultFeature`]s shaped by
//! [`round_trip`]: an in-progress reducer, then success or failure.
//! Navigation features are [`SingleResultFeature`]s.

use crate::repository::TasksRepository;
use crate::types::{Filter, TaskId, ViewState};
use statefold_core::{FeatureError, Reducer};
use statefold_runtime::{MultipleResultFeature, ReducerStream, SingleResultFeature, round_trip};
use std::sync::Arc;

/// Load the tasks listed under a filter.
#[must_use]
pub fn load_tasks(repository: Arc<dyn TasksRepository>) -> MultipleResultFeature<Filter, ViewState> {
    MultipleResultFeature::new(
        "load_tasks",
        move |filter: Filter| -> ReducerStream<ViewState> {
            let repository = Arc::clone(&repository);
            round_trip(
                Some(Reducer::named("load_tasks.start", move |state: ViewState| {
                    ViewState {
                        loading: true,
                        filter,
                        ..state
                    }
                })),
                async move { Ok::<_, FeatureError>(filter.apply(repository.tasks().await?)) },
                |tasks| {
                    Reducer::named("load_tasks.success", move |state: ViewState| ViewState {
                        tasks,
                        loading: false,
                        ..state
                    })
                },
            )
        },
        |_: &FeatureError| {
            Reducer::named("load_tasks.failure", |state: ViewState| ViewState {
                loading: false,
                show_loading_tasks_error: true,
                ..state
            })
        },
    )
}

/// Mark a task complete, then reload the list.
#[must_use]
pub fn complete_task(
    repository: Arc<dyn TasksRepository>,
) -> MultipleResultFeature<TaskId, ViewState> {
    MultipleResultFeature::new(
        "complete_task",
        move |id: TaskId| -> ReducerStream<ViewState> {
            let repository = Arc::clone(&repository);
            round_trip(
                Some(Reducer::named("complete_task.start", |state: ViewState| {
                    ViewState {
                        complete_in_progress: true,
                        ..state
                    }
                })),
                async move {
                    repository.complete_task(id).await?;
                    Ok::<_, FeatureError>(repository.tasks().await?)
                },
                |tasks| {
                    Reducer::named("complete_task.success", move |state: ViewState| {
                        ViewState {
                            tasks: state.filter.apply(tasks),
                            complete_in_progress: false,
                            show_task_marked_complete: true,
                            ..state
                        }
                    })
                },
            )
        },
        |_: &FeatureError| {
            Reducer::named("complete_task.failure", |state: ViewState| ViewState {
                complete_in_progress: false,
                ..state
            })
        },
    )
}

/// Mark a task active, then reload the list.
#[must_use]
pub fn activate_task(
    repository: Arc<dyn TasksRepository>,
) -> MultipleResultFeature<TaskId, ViewState> {
    MultipleResultFeature::new(
        "activate_task",
        move |id: TaskId| -> ReducerStream<ViewState> {
            let repository = Arc::clone(&repository);
            round_trip(
                Some(Reducer::named("activate_task.start", |state: ViewState| {
                    ViewState {
                        activate_in_progress: true,
                        ..state
                    }
                })),
                async move {
                    repository.activate_task(id).await?;
                    Ok::<_, FeatureError>(repository.tasks().await?)
                },
                |tasks| {
                    Reducer::named("activate_task.success", move |state: ViewState| {
                        ViewState {
                            tasks: state.filter.apply(tasks),
                            activate_in_progress: false,
                            show_task_marked_active: true,
                            ..state
                        }
                    })
                },
            )
        },
        |_: &FeatureError| {
            Reducer::named("activate_task.failure", |state: ViewState| ViewState {
                activate_in_progress: false,
                ..state
            })
        },
    )
}

/// Navigate to the add-task screen.
#[must_use]
pub fn show_add_task() -> SingleResultFeature<(), ViewState> {
    SingleResultFeature::new("show_add_task", |()| {
        Reducer::named("show_add_task", |state: ViewState| ViewState {
            show_add_task: true,
            ..state
        })
    })
}

/// Navigate to the details of a task.
#[must_use]
pub fn open_task_details() -> SingleResultFeature<TaskId, ViewState> {
    SingleResultFeature::new("open_task_details", |id: TaskId| {
        Reducer::named("open_task_details", move |state: ViewState| ViewState {
            open_task_details: Some(id),
            ..state
        })
    })
}
