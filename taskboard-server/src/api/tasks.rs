//! Owner-scoped task endpoints.
//!
//! Every handler takes the owner from [`AuthUser`]; request bodies cannot
//! name an owner.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use taskboard_core::validation::{WriteMode, validate_task};
use taskboard_core::{ListParams, Task, TaskInput, TaskPage, TaskQuery, TaskStats};

use super::AppState;
use super::auth::AuthUser;
use super::error::ApiErrorResponse;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    pub message: String,
    pub task: Task,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// `GET /api/tasks?page&limit&search&priority&status&sort`
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<TaskPage>, ApiErrorResponse> {
    let Query(params) = params?;
    let query = TaskQuery::from_params(&params);
    let page = state.db.list_tasks(&identity.user_id, &query).await?;
    Ok(Json(page))
}

/// `POST /api/tasks`
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    payload: Result<Json<TaskInput>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiErrorResponse> {
    let Json(input) = payload?;
    let fields = validate_task(&input, WriteMode::Create)?;
    let task = state.db.create_task(&identity.user_id, fields).await?;

    Ok((
        StatusCode::CREATED,
        Json(TaskResponse {
            message: "Task created successfully".into(),
            task,
        }),
    ))
}

/// `PUT /api/tasks/{id}`: full replacement of the task's fields.
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<TaskInput>, JsonRejection>,
) -> Result<Json<TaskResponse>, ApiErrorResponse> {
    let Json(input) = payload?;
    let fields = validate_task(&input, WriteMode::Replace)?;
    let task = state.db.update_task(&identity.user_id, &id, fields).await?;

    Ok(Json(TaskResponse {
        message: "Task updated successfully".into(),
        task,
    }))
}

/// `DELETE /api/tasks/{id}`
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiErrorResponse> {
    state.db.delete_task(&identity.user_id, &id).await?;
    Ok(Json(MessageResponse {
        message: "Task deleted successfully".into(),
    }))
}

/// `GET /api/tasks/stats`: totals over every task the caller owns.
pub async fn task_stats(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<TaskStats>, ApiErrorResponse> {
    Ok(Json(state.db.task_stats(&identity.user_id).await?))
}
