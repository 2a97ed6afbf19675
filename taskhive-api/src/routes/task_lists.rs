/// Task-list endpoints
///
/// - `POST /api/v1/task-lists/create`
/// - `GET /api/v1/task-lists/`: lists visible to the caller
/// - `GET /api/v1/task-lists/get-all`: every list (admin only)
/// - `GET /api/v1/task-lists/:id`
/// - `PATCH /api/v1/task-lists/update/:id`
/// - `DELETE /api/v1/task-lists/:id`
///
/// Deleting a list does not delete the tasks it contains; they stay fetchable
/// by id (see DESIGN.md).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use taskhive_core::auth::policy::Actor;
use taskhive_core::models::TaskList;
use taskhive_core::tasks;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Create request
#[derive(Debug, Deserialize)]
pub struct CreateTaskListRequest {
    pub name: String,
}

/// Update request; only the name can change, ownership is immutable
#[derive(Debug, Deserialize)]
pub struct UpdateTaskListRequest {
    pub name: String,
}

/// `POST /api/v1/task-lists/create`
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateTaskListRequest>,
) -> ApiResult<(StatusCode, Json<TaskList>)> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name is required".to_string()));
    }

    let list = state
        .store
        .create_task_list(TaskList::new(req.name, actor.id))
        .await?;

    tracing::info!(list_id = %list.id, owner = %actor.id, "task list created");
    Ok((StatusCode::CREATED, Json(list)))
}

/// `GET /api/v1/task-lists/`
///
/// Lists the caller owns, plus lists holding at least one task assigned
/// to them.
pub async fn mine(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<Vec<TaskList>>> {
    let lists = tasks::list_for_user(&*state.store, &actor).await?;
    Ok(Json(lists))
}

/// `GET /api/v1/task-lists/get-all`: Admin/Super Admin only.
pub async fn get_all(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<Vec<TaskList>>> {
    state.policy.require_admin(&actor)?;

    let lists = state.store.list_task_lists().await?;
    Ok(Json(lists))
}

/// `GET /api/v1/task-lists/:id`
///
/// # Errors
///
/// - `403`: caller is neither the owner nor Admin/Super Admin
/// - `404`: list absent
pub async fn get_by_id(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskList>> {
    let list = state
        .store
        .find_task_list(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("task list not found".to_string()))?;

    state.policy.require_list_access(&actor, list.owner)?;
    Ok(Json(list))
}

/// `PATCH /api/v1/task-lists/update/:id`
pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskListRequest>,
) -> ApiResult<Json<TaskList>> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name is required".to_string()));
    }

    let mut list = state
        .store
        .find_task_list(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("task list not found".to_string()))?;
    state.policy.require_list_access(&actor, list.owner)?;

    list.name = req.name;
    list.updated_at = chrono::Utc::now();
    state.store.update_task_list(&list).await?;

    Ok(Json(list))
}

/// `DELETE /api/v1/task-lists/:id`
///
/// Removes the list record only; member tasks are not cascaded.
pub async fn remove(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let list = state
        .store
        .find_task_list(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("task list not found".to_string()))?;
    state.policy.require_list_access(&actor, list.owner)?;

    state.store.delete_task_list(id).await?;

    tracing::info!(list_id = %id, "task list deleted");
    Ok(Json(json!({ "message": "task list deleted successfully" })))
}
