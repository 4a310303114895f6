//! Presenter wiring the tasks-screen features into one engine configuration.

use crate::features;
use crate::repository::TasksRepository;
use crate::types::{Filter, TaskId, TasksModel, ViewState};
use statefold_core::{Feature, FeatureError, Reducer, Storage, Trigger};
use statefold_runtime::{
    Attachment, Configuration, ConfigurationError, Engine, ModelStream, MultipleResultFeature,
    SingleResultFeature,
};
use std::sync::Arc;

/// Reset every one-shot signal.
#[must_use]
pub fn clean(state: ViewState) -> ViewState {
    ViewState {
        show_loading_tasks_error: false,
        show_add_task: false,
        open_task_details: None,
        show_task_marked_active: false,
        show_task_marked_complete: false,
        ..state
    }
}

/// Project the view state into what the screen displays.
#[must_use]
pub fn convert(state: &ViewState) -> TasksModel {
    TasksModel {
        tasks: state.tasks.clone(),
        in_progress: state.loading || state.activate_in_progress || state.complete_in_progress,
        show_loading_tasks_error: state.show_loading_tasks_error,
        show_add_task: state.show_add_task,
        show_task_details: state.open_task_details,
        show_task_marked_active: state.show_task_marked_active,
        show_task_marked_complete: state.show_task_marked_complete,
    }
}

/// The tasks screen: triggers for every user intent plus the engine run
/// feeding the view.
pub struct TasksPresenter {
    engine: Engine,
    configuration: Configuration<ViewState, TasksModel>,
    load_tasks: Arc<MultipleResultFeature<Filter, ViewState>>,
    complete_task: Arc<MultipleResultFeature<TaskId, ViewState>>,
    activate_task: Arc<MultipleResultFeature<TaskId, ViewState>>,
    show_add_task: Arc<SingleResultFeature<(), ViewState>>,
    open_task_details: Arc<SingleResultFeature<TaskId, ViewState>>,
    attachment: Option<Attachment>,
}

impl TasksPresenter {
    /// Assemble the screen over `repository`, persisting its state in
    /// `storage`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the configuration is rejected.
    pub fn new(
        repository: Arc<dyn TasksRepository>,
        storage: impl Storage<ViewState> + 'static,
    ) -> Result<Self, ConfigurationError> {
        let load_tasks = Arc::new(features::load_tasks(Arc::clone(&repository)));
        let complete_task = Arc::new(features::complete_task(Arc::clone(&repository)));
        let activate_task = Arc::new(features::activate_task(repository));
        let show_add_task = Arc::new(features::show_add_task());
        let open_task_details = Arc::new(features::open_task_details());

        let all: [Arc<dyn Feature<ViewState>>; 5] = [
            load_tasks.clone(),
            complete_task.clone(),
            activate_task.clone(),
            show_add_task.clone(),
            open_task_details.clone(),
        ];

        let configuration = Configuration::builder()
            .name("tasks")
            .features(all)
            .storage(storage)
            .cleaner(clean)
            .converter(convert)
            .on_error(|error: &FeatureError| {
                tracing::warn!(error = %error, "Tasks screen recovered from a failed feature");
                Reducer::named("tasks.recovered", |state: ViewState| ViewState {
                    loading: false,
                    activate_in_progress: false,
                    complete_in_progress: false,
                    ..state
                })
            })
            .build()?;

        Ok(Self {
            engine: Engine::new(),
            configuration,
            load_tasks,
            complete_task,
            activate_task,
            show_add_task,
            open_task_details,
            attachment: None,
        })
    }

    /// The assembled configuration.
    #[must_use]
    pub const fn configuration(&self) -> &Configuration<ViewState, TasksModel> {
        &self.configuration
    }

    /// Start a run without a view attached.
    #[must_use]
    pub fn run(&self) -> ModelStream<TasksModel> {
        self.engine.run(self.configuration.clone())
    }

    /// Attach a view and load every task.
    ///
    /// A view already attached is detached first.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn take_view<D>(&mut self, display: D)
    where
        D: FnMut(TasksModel) + Send + 'static,
    {
        self.drop_view();
        self.attachment = Some(self.engine.attach_with_stalling(
            self.configuration.clone(),
            display,
            |error| tracing::error!(error = %error, "Tasks screen stalled"),
        ));
        self.load_tasks(Filter::All);
    }

    /// Detach the current view, if any.
    pub fn drop_view(&mut self) {
        if let Some(attachment) = self.attachment.take() {
            attachment.detach();
        }
    }

    /// Load or refresh the tasks under `filter`.
    pub fn load_tasks(&self, filter: Filter) {
        self.load_tasks.trigger(filter);
    }

    /// Mark a task complete.
    pub fn complete_task(&self, id: TaskId) {
        self.complete_task.trigger(id);
    }

    /// Mark a task active.
    pub fn activate_task(&self, id: TaskId) {
        self.activate_task.trigger(id);
    }

    /// Open the add-task screen.
    pub fn add_new_task(&self) {
        self.show_add_task.trigger(());
    }

    /// Open the details of a task.
    pub fn open_task_details(&self, id: TaskId) {
        self.open_task_details.trigger(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Task;

    #[test]
    fn clean_keeps_persistent_fields() {
        let state = ViewState {
            tasks: vec![Task::new(1, "Buy milk")],
            filter: Filter::Active,
            loading: true,
            show_add_task: true,
            open_task_details: Some(TaskId(1)),
            show_loading_tasks_error: true,
            ..ViewState::default()
        };

        let cleaned = clean(state.clone());
        assert_eq!(cleaned.tasks, state.tasks);
        assert_eq!(cleaned.filter, Filter::Active);
        assert!(cleaned.loading);
        assert!(!cleaned.show_add_task);
        assert_eq!(cleaned.open_task_details, None);
        assert!(!cleaned.show_loading_tasks_error);
    }

    #[test]
    fn any_operation_in_flight_shows_progress() {
        let idle = ViewState::default();
        assert!(!convert(&idle).in_progress);

        let completing = ViewState {
            complete_in_progress: true,
            ..ViewState::default()
        };
        assert!(convert(&completing).in_progress);
    }
}
