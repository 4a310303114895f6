//! Domain types for the tasks screen.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single task
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,
    /// Short title
    pub title: String,
    /// Whether the task is done
    pub completed: bool,
}

impl Task {
    /// An active task.
    #[must_use]
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id: TaskId(id),
            title: title.into(),
            completed: false,
        }
    }

    /// The same task, marked completed.
    #[must_use]
    pub fn completed(self) -> Self {
        Self {
            completed: true,
            ..self
        }
    }

    /// Whether the task still needs doing.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.completed
    }
}

/// Which tasks the screen lists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Filter {
    /// Every task
    #[default]
    All,
    /// Tasks not yet completed
    Active,
    /// Completed tasks only
    Completed,
}

impl Filter {
    /// Whether `task` is listed under this filter.
    #[must_use]
    pub const fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => task.is_active(),
            Self::Completed => task.completed,
        }
    }

    /// Keep the tasks listed under this filter.
    #[must_use]
    pub fn apply(self, tasks: Vec<Task>) -> Vec<Task> {
        tasks.into_iter().filter(|task| self.matches(task)).collect()
    }
}

/// Everything the tasks screen tracks.
///
/// Fields marked transient are one-shot signals: the presenter's cleaner
/// resets them before every fold step, so each shows up in one model only.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct ViewState {
    /// Tasks listed under `filter`
    pub tasks: Vec<Task>,
    /// Filter of the last load
    pub filter: Filter,
    /// A load is in flight
    pub loading: bool,
    /// A task is being marked active
    pub activate_in_progress: bool,
    /// A task is being marked complete
    pub complete_in_progress: bool,
    /// Transient: the last load failed
    pub show_loading_tasks_error: bool,
    /// Transient: navigate to the add-task screen
    pub show_add_task: bool,
    /// Transient: navigate to the details of this task
    pub open_task_details: Option<TaskId>,
    /// Transient: a task was marked active
    pub show_task_marked_active: bool,
    /// Transient: a task was marked complete
    pub show_task_marked_complete: bool,
}

/// What the tasks screen displays.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct TasksModel {
    /// Tasks to list
    pub tasks: Vec<Task>,
    /// Any operation is in flight
    pub in_progress: bool,
    /// Show the "could not load tasks" message
    pub show_loading_tasks_error: bool,
    /// Navigate to the add-task screen
    pub show_add_task: bool,
    /// Navigate to these task details
    pub show_task_details: Option<TaskId>,
    /// Show the "task marked active" message
    pub show_task_marked_active: bool,
    /// Show the "task marked complete" message
    pub show_task_marked_complete: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tasks() -> Vec<Task> {
        vec![
            Task::new(1, "Buy milk"),
            Task::new(2, "Write docs").completed(),
            Task::new(3, "Call home"),
        ]
    }

    #[test]
    fn filters_select_matching_tasks() {
        assert_eq!(Filter::All.apply(tasks()).len(), 3);
        assert_eq!(
            Filter::Active
                .apply(tasks())
                .iter()
                .map(|task| task.id)
                .collect::<Vec<_>>(),
            vec![TaskId(1), TaskId(3)]
        );
        assert_eq!(Filter::Completed.apply(tasks())[0].id, TaskId(2));
    }

    proptest! {
        #[test]
        fn active_and_completed_partition_all(done in prop::collection::vec(any::<bool>(), 0..20)) {
            let tasks: Vec<Task> = done
                .iter()
                .enumerate()
                .map(|(id, &completed)| Task { id: TaskId(id as u64), title: String::new(), completed })
                .collect();

            let active = Filter::Active.apply(tasks.clone()).len();
            let completed = Filter::Completed.apply(tasks.clone()).len();
            prop_assert_eq!(active + completed, Filter::All.apply(tasks).len());
        }
    }
}
