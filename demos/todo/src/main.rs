//! Tasks screen demo binary
//!
//! Drives a short session against an in-memory repository, persisting the
//! screen state to a JSON file so a second launch restores it.

use statefold_runtime::{FileStorage, StorageExt};
use std::sync::Arc;
use std::time::Duration;
use todo::{Filter, InMemoryTasksRepository, Task, TaskId, TasksModel, TasksPresenter, ViewState};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const MODEL_TIMEOUT: Duration = Duration::from_secs(2);

/// Print the next `count` models.
async fn show(models: &mut mpsc::UnboundedReceiver<TasksModel>, count: usize) -> anyhow::Result<()> {
    for _ in 0..count {
        let model = tokio::time::timeout(MODEL_TIMEOUT, models.recv())
            .await?
            .ok_or_else(|| anyhow::anyhow!("view detached"))?;
        let tasks: Vec<_> = model
            .tasks
            .iter()
            .map(|task| format!("{}{}", task.title, if task.completed { " (done)" } else { "" }))
            .collect();
        println!(
            "  model: in_progress={} error={} add={} details={:?} marked_complete={} tasks={tasks:?}",
            model.in_progress,
            model.show_loading_tasks_error,
            model.show_add_task,
            model.show_task_details,
            model.show_task_marked_complete,
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo=debug,statefold_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Tasks Screen: statefold engine ===\n");

    let path = std::env::temp_dir().join("statefold-todo").join("tasks.json");
    println!("State file: {}", path.display());

    let repository = Arc::new(InMemoryTasksRepository::new(vec![
        Task::new(1, "Buy milk"),
        Task::new(2, "Write docs"),
        Task::new(3, "Call home").completed(),
    ]));
    let storage = FileStorage::<ViewState>::new(&path).with_initial_value(ViewState::default);
    let mut presenter = TasksPresenter::new(repository.clone(), storage)?;

    let (tx, mut models) = mpsc::unbounded_channel();
    presenter.take_view(move |model| {
        let _ = tx.send(model);
    });

    println!("\n>>> Attached view (restored state, then load all tasks)");
    show(&mut models, 3).await?;

    println!("\n>>> Add new task");
    presenter.add_new_task();
    show(&mut models, 1).await?;

    println!("\n>>> Open task details #1");
    presenter.open_task_details(TaskId(1));
    show(&mut models, 1).await?;

    println!("\n>>> Complete task #1");
    presenter.complete_task(TaskId(1));
    show(&mut models, 2).await?;

    println!("\n>>> Refresh while the repository is unavailable");
    repository.set_available(false);
    presenter.load_tasks(Filter::All);
    show(&mut models, 2).await?;

    repository.set_available(true);
    presenter.drop_view();

    println!("\n=== Session Complete ===");
    println!("\nRun again to see the persisted tasks restored, with one-shot flags cleared.");
    Ok(())
}
