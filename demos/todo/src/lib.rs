//! Tasks screen demo for the statefold engine.
//!
//! A to-do list screen whose every user intent is a feature:
//!
//! - `load_tasks`, `complete_task`, `activate_task`: repository round trips
//!   with an in-progress flag
//! - `show_add_task`, `open_task_details`: one-shot navigation signals
//!
//! [`TasksPresenter`] assembles them into one configuration, cleans the
//! one-shot signals before every step, and converts the state into the
//! [`TasksModel`] the screen displays.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use statefold_runtime::MemoryStorage;
//! use todo::{InMemoryTasksRepository, Task, TasksPresenter, ViewState};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = Arc::new(InMemoryTasksRepository::new(vec![Task::new(1, "Buy milk")]));
//! let mut presenter = TasksPresenter::new(repository, MemoryStorage::new(ViewState::default()))?;
//!
//! presenter.take_view(|model| println!("{} tasks", model.tasks.len()));
//! presenter.add_new_task();
//! # Ok(())
//! # }
//! ```

pub mod features;
pub mod presenter;
pub mod repository;
pub mod types;

pub use presenter::TasksPresenter;
pub use repository::{InMemoryTasksRepository, RepositoryError, TasksRepository};
pub use types::{Filter, Task, TaskId, TasksModel, ViewState};
