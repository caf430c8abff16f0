/// Task endpoints
///
/// # Endpoints
///
/// - `POST /v1/tasks` - Create a task
/// - `GET /v1/tasks?assignee_id=` - Tasks assigned to a user (defaults to the caller)
/// - `GET /v1/teams/:team_id/tasks` - Tasks owned by a team
/// - `GET|PATCH|DELETE /v1/tasks/:task_id`
/// - `PATCH /v1/tasks/:task_id/status`
/// - `POST|DELETE /v1/tasks/:task_id/assignees/:user_id`
///
/// Priority and status travel as `LOW|MEDIUM|HIGH` and
/// `TO_DO|IN_PROGRESS|BLOCKED|DONE`; anything else is a 400.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tasktrack_shared::{
    auth::middleware::AuthContext,
    models::task::{CreateTask, Task, UpdateTask},
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<String>,
    pub team_id: Option<Uuid>,

    #[serde(default)]
    pub assignee_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<String>,
    pub status: Option<String>,

    /// Replaces the assignee set when present
    pub assignee_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    pub assignee_id: Option<Uuid>,
}

/// Creates a task owned by the caller
///
/// # Errors
///
/// - `400 Bad Request`: Unknown priority
/// - `409 Conflict`: `team_id` names no team
pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate()?;

    let task = state
        .tasks
        .create(
            &auth.user,
            CreateTask {
                title: req.title,
                description: req.description,
                due_date: req.due_date,
                priority: req.priority,
                team_id: req.team_id,
                assignee_ids: req.assignee_ids,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let assignee_id = query.assignee_id.unwrap_or(auth.user.id);
    Ok(Json(state.tasks.list_by_assignee(assignee_id).await?))
}

pub async fn list_team_tasks(
    State(state): State<AppState>,
    Path(team_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(state.tasks.list_by_team(team_id).await?))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    Ok(Json(state.tasks.get(task_id).await?))
}

/// Creator, team admin, or an assignee
pub async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    auth: AuthContext,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;

    let task = state
        .tasks
        .update(
            &auth.user,
            task_id,
            UpdateTask {
                title: req.title,
                description: req.description,
                due_date: req.due_date,
                priority: req.priority,
                status: req.status,
                assignee_ids: req.assignee_ids,
            },
        )
        .await?;

    Ok(Json(task))
}

/// Creator or team admin
pub async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    auth: AuthContext,
) -> ApiResult<StatusCode> {
    state.tasks.delete(&auth.user, task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Creator, team admin, or an assignee
pub async fn change_status(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    auth: AuthContext,
    Json(req): Json<ChangeStatusRequest>,
) -> ApiResult<Json<Task>> {
    let task = state
        .tasks
        .change_status(&auth.user, task_id, &req.status)
        .await?;

    Ok(Json(task))
}

pub async fn assign_user(
    State(state): State<AppState>,
    Path((task_id, user_id)): Path<(Uuid, Uuid)>,
    auth: AuthContext,
) -> ApiResult<Json<Task>> {
    Ok(Json(state.tasks.assign(&auth.user, task_id, user_id).await?))
}

pub async fn unassign_user(
    State(state): State<AppState>,
    Path((task_id, user_id)): Path<(Uuid, Uuid)>,
    auth: AuthContext,
) -> ApiResult<Json<Task>> {
    Ok(Json(state.tasks.unassign(&auth.user, task_id, user_id).await?))
}
