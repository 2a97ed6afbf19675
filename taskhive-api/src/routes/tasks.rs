/// Task endpoints
///
/// Thin HTTP wrappers over `taskhive_core::tasks`, which does the
/// authorization and keeps the task↔list relation consistent.
///
/// - `POST /api/v1/tasks/create`
/// - `PATCH /api/v1/tasks/update/:id`
/// - `GET /api/v1/tasks/:id`
/// - `DELETE /api/v1/tasks/:id`
/// - `POST /api/v1/tasks/assign/:task_id`
/// - `POST /api/v1/tasks/unassign/:task_id`

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use taskhive_core::auth::policy::Actor;
use taskhive_core::models::{CreateTask, Task, UpdateTask};
use taskhive_core::tasks;

use crate::{app::AppState, error::ApiResult};

/// Assignment request
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub user_id: Uuid,
}

/// `POST /api/v1/tasks/create`
///
/// # Errors
///
/// - `400`: blank title, missing due date or task list id
/// - `403`: caller neither owns the target list nor is Admin/Super Admin
/// - `404`: target list absent
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<CreateTask>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = tasks::create_task(&*state.store, &state.policy, &actor, input).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// `PATCH /api/v1/tasks/update/:id`
///
/// Partial update; a supplied `task_list` value is rejected because a task
/// cannot move between lists.
pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateTask>,
) -> ApiResult<Json<Task>> {
    let task = tasks::update_task(&*state.store, &state.policy, &actor, id, patch).await?;
    Ok(Json(task))
}

/// `GET /api/v1/tasks/:id`
///
/// Any authenticated caller may read any task by id.
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = tasks::get_task(&*state.store, id).await?;
    Ok(Json(task))
}

/// `DELETE /api/v1/tasks/:id`
pub async fn remove(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    tasks::delete_task(&*state.store, &state.policy, &actor, id).await?;
    Ok(Json(json!({ "message": "task deleted successfully" })))
}

/// `POST /api/v1/tasks/assign/:task_id`
pub async fn assign(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<AssignRequest>,
) -> ApiResult<Json<Task>> {
    let task = tasks::assign_user(&*state.store, &state.policy, &actor, task_id, req.user_id).await?;
    Ok(Json(task))
}

/// `POST /api/v1/tasks/unassign/:task_id`
pub async fn unassign(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = tasks::unassign_user(&*state.store, &state.policy, &actor, task_id).await?;
    Ok(Json(task))
}
