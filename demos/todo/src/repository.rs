//! Task persistence seen by the features.

use crate::types::{Task, TaskId};
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Failures of a [`TasksRepository`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The backing source cannot be reached
    #[error("Tasks repository is unavailable")]
    Unavailable,

    /// No task has this id
    #[error("Task not found: {0}")]
    NotFound(TaskId),
}

/// Source of truth for tasks.
pub trait TasksRepository: Send + Sync {
    /// Every task, in insertion order.
    fn tasks(&self) -> BoxFuture<'_, Result<Vec<Task>, RepositoryError>>;

    /// Mark a task completed.
    fn complete_task(&self, id: TaskId) -> BoxFuture<'_, Result<(), RepositoryError>>;

    /// Mark a task active again.
    fn activate_task(&self, id: TaskId) -> BoxFuture<'_, Result<(), RepositoryError>>;
}

/// Process-local repository.
///
/// [`set_available(false)`](Self::set_available) makes every call fail with
/// [`RepositoryError::Unavailable`], standing in for a lost connection.
#[derive(Debug)]
pub struct InMemoryTasksRepository {
    tasks: Mutex<Vec<Task>>,
    available: AtomicBool,
}

impl InMemoryTasksRepository {
    /// Repository holding `tasks`.
    #[must_use]
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            available: AtomicBool::new(true),
        }
    }

    /// Toggle whether calls succeed.
    pub fn set_available(&self, available: bool) {
        tracing::debug!(available, "Tasks repository availability changed");
        self.available.store(available, Ordering::SeqCst);
    }

    fn guard(&self) -> Result<MutexGuard<'_, Vec<Task>>, RepositoryError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable);
        }
        Ok(self.tasks.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn mark(&self, id: TaskId, completed: bool) -> Result<(), RepositoryError> {
        let mut tasks = self.guard()?;
        let task = tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or(RepositoryError::NotFound(id))?;
        task.completed = completed;
        Ok(())
    }
}

impl Default for InMemoryTasksRepository {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl TasksRepository for InMemoryTasksRepository {
    fn tasks(&self) -> BoxFuture<'_, Result<Vec<Task>, RepositoryError>> {
        Box::pin(async move { Ok(self.guard()?.clone()) })
    }

    fn complete_task(&self, id: TaskId) -> BoxFuture<'_, Result<(), RepositoryError>> {
        Box::pin(async move { self.mark(id, true) })
    }

    fn activate_task(&self, id: TaskId) -> BoxFuture<'_, Result<(), RepositoryError>> {
        Box::pin(async move { self.mark(id, false) })
    }
}
