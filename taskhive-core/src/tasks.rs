/// Task consistency manager
///
/// Every mutation that touches the task↔list relation goes through this
/// module. It resolves the entities, authorizes the actor via the central
/// policy (owner of the task's list, or Admin/Super Admin), and hands the
/// paired writes to the store so the bidirectional invariant (a task exists
/// iff its list's collection contains its id) holds at every observable
/// point.

use uuid::Uuid;

use crate::auth::policy::{Actor, Policy, PolicyError};
use crate::models::{CreateTask, Task, TaskList, UpdateTask};
use crate::store::{Store, StoreError};

/// Error type for task operations
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// Malformed or missing required input
    #[error("{0}")]
    Invalid(&'static str),

    /// Referenced entity absent
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Resolves a task and the list that owns it, authorizing the actor against
/// the list's owner. The shared prologue of every task mutation.
async fn resolve_authorized(
    store: &dyn Store,
    policy: &Policy,
    actor: &Actor,
    task_id: Uuid,
) -> Result<(Task, TaskList), TaskError> {
    let task = store
        .find_task(task_id)
        .await?
        .ok_or(TaskError::NotFound("task"))?;
    let list = store
        .find_task_list(task.task_list)
        .await?
        .ok_or(TaskError::NotFound("task list"))?;

    policy.require_list_access(actor, list.owner)?;
    Ok((task, list))
}

/// Creates a task inside an existing list.
///
/// Fails `NotFound` if the list is absent, `Forbidden` unless the actor owns
/// the list or is Admin/Super Admin, `Invalid` when the due date or list id
/// is missing. Task record and list membership are persisted as one unit.
pub async fn create_task(
    store: &dyn Store,
    policy: &Policy,
    actor: &Actor,
    input: CreateTask,
) -> Result<Task, TaskError> {
    if input.title.trim().is_empty() {
        return Err(TaskError::Invalid("title is required"));
    }
    let due_date = input.due_date.ok_or(TaskError::Invalid("due date is required"))?;
    let list_id = input
        .task_list
        .ok_or(TaskError::Invalid("task list id is required"))?;

    let list = store
        .find_task_list(list_id)
        .await?
        .ok_or(TaskError::NotFound("task list"))?;
    policy.require_list_access(actor, list.owner)?;

    let task = Task::new(
        input.title,
        input.description,
        due_date,
        input.status.unwrap_or_default(),
        input.assigned_user,
        list_id,
    );

    let task = store.insert_task_in_list(task).await?;
    tracing::debug!(task_id = %task.id, list_id = %list_id, "task created");
    Ok(task)
}

/// Deletes a task and detaches it from its list's collection.
pub async fn delete_task(
    store: &dyn Store,
    policy: &Policy,
    actor: &Actor,
    task_id: Uuid,
) -> Result<(), TaskError> {
    let (task, list) = resolve_authorized(store, policy, actor, task_id).await?;

    store.remove_task_from_list(task.id, list.id).await?;
    tracing::debug!(task_id = %task.id, list_id = %list.id, "task deleted");
    Ok(())
}

/// Fetches a single task.
///
/// Deliberately unrestricted by ownership: any authenticated actor may read
/// any task by id (see DESIGN.md).
pub async fn get_task(store: &dyn Store, task_id: Uuid) -> Result<Task, TaskError> {
    store
        .find_task(task_id)
        .await?
        .ok_or(TaskError::NotFound("task"))
}

/// Applies a partial update. The owning list is immutable: a supplied
/// `task_list` value is rejected with `Invalid` rather than ignored.
pub async fn update_task(
    store: &dyn Store,
    policy: &Policy,
    actor: &Actor,
    task_id: Uuid,
    patch: UpdateTask,
) -> Result<Task, TaskError> {
    if patch.task_list.is_some() {
        return Err(TaskError::Invalid("a task cannot be moved to another task list"));
    }

    let (mut task, _list) = resolve_authorized(store, policy, actor, task_id).await?;

    if let Some(title) = patch.title {
        if title.trim().is_empty() {
            return Err(TaskError::Invalid("title cannot be blank"));
        }
        task.title = title;
    }
    if let Some(description) = patch.description {
        task.description = Some(description);
    }
    if let Some(due_date) = patch.due_date {
        task.due_date = due_date;
    }
    if let Some(status) = patch.status {
        task.status = status;
    }
    task.updated_at = chrono::Utc::now();

    store.update_task(&task).await?;
    Ok(task)
}

/// Assigns a user to a task.
///
/// Target-user existence is deliberately not validated (see DESIGN.md).
pub async fn assign_user(
    store: &dyn Store,
    policy: &Policy,
    actor: &Actor,
    task_id: Uuid,
    user_id: Uuid,
) -> Result<Task, TaskError> {
    let (mut task, _list) = resolve_authorized(store, policy, actor, task_id).await?;

    task.assigned_user = Some(user_id);
    task.updated_at = chrono::Utc::now();
    store.update_task(&task).await?;
    Ok(task)
}

/// Clears a task's assignee.
pub async fn unassign_user(
    store: &dyn Store,
    policy: &Policy,
    actor: &Actor,
    task_id: Uuid,
) -> Result<Task, TaskError> {
    let (mut task, _list) = resolve_authorized(store, policy, actor, task_id).await?;

    task.assigned_user = None;
    task.updated_at = chrono::Utc::now();
    store.update_task(&task).await?;
    Ok(task)
}

/// Task lists visible to an actor: the ones they own plus the ones holding
/// at least one task assigned to them, deduplicated by id.
pub async fn list_for_user(store: &dyn Store, actor: &Actor) -> Result<Vec<TaskList>, TaskError> {
    let mut lists = store.task_lists_owned_by(actor.id).await?;
    let mut seen: std::collections::HashSet<Uuid> = lists.iter().map(|l| l.id).collect();

    for task in store.tasks_assigned_to(actor.id).await? {
        if seen.insert(task.task_list) {
            if let Some(list) = store.find_task_list(task.task_list).await? {
                lists.push(list);
            }
        }
    }

    Ok(lists)
}
