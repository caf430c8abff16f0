/// Team endpoints
///
/// # Endpoints
///
/// - `POST /v1/teams` - Create a team; the caller becomes its admin
/// - `GET /v1/teams?user_id=` - Teams a user belongs to (defaults to the caller)
/// - `GET|PATCH|DELETE /v1/teams/:team_id`
/// - `GET /v1/teams/:team_id/members`
/// - `POST|DELETE /v1/teams/:team_id/members/:user_id`
///
/// Mutations are permission-checked in the service layer; reads are open to
/// any authenticated user.

use crate::{app::AppState, error::ApiResult, routes::users::UserResponse};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tasktrack_shared::{
    auth::middleware::AuthContext,
    models::team::{CreateTeam, Team, UpdateTeam},
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTeamRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTeamRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListTeamsQuery {
    pub user_id: Option<Uuid>,
}

pub async fn create_team(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateTeamRequest>,
) -> ApiResult<(StatusCode, Json<Team>)> {
    req.validate()?;

    let team = state
        .teams
        .create(
            &auth.user,
            CreateTeam {
                name: req.name,
                description: req.description,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(team)))
}

pub async fn list_teams(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<ListTeamsQuery>,
) -> ApiResult<Json<Vec<Team>>> {
    let user_id = query.user_id.unwrap_or(auth.user.id);
    let teams = state.teams.list_for_user(user_id).await?;
    Ok(Json(teams))
}

pub async fn get_team(
    State(state): State<AppState>,
    Path(team_id): Path<Uuid>,
) -> ApiResult<Json<Team>> {
    Ok(Json(state.teams.get(team_id).await?))
}

/// Admin only
pub async fn update_team(
    State(state): State<AppState>,
    Path(team_id): Path<Uuid>,
    auth: AuthContext,
    Json(req): Json<UpdateTeamRequest>,
) -> ApiResult<Json<Team>> {
    req.validate()?;

    let team = state
        .teams
        .update(
            &auth.user,
            team_id,
            UpdateTeam {
                name: req.name,
                description: req.description,
            },
        )
        .await?;

    Ok(Json(team))
}

/// Admin only; refused with 409 while the team still owns tasks
pub async fn delete_team(
    State(state): State<AppState>,
    Path(team_id): Path<Uuid>,
    auth: AuthContext,
) -> ApiResult<StatusCode> {
    state.teams.delete(&auth.user, team_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_members(
    State(state): State<AppState>,
    Path(team_id): Path<Uuid>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let members = state.teams.list_members(team_id).await?;
    Ok(Json(members.into_iter().map(UserResponse::from).collect()))
}

pub async fn add_member(
    State(state): State<AppState>,
    Path((team_id, user_id)): Path<(Uuid, Uuid)>,
    auth: AuthContext,
) -> ApiResult<Json<Team>> {
    Ok(Json(state.teams.add_member(&auth.user, team_id, user_id).await?))
}

/// Admin may remove anyone but themselves; members may remove themselves
pub async fn remove_member(
    State(state): State<AppState>,
    Path((team_id, user_id)): Path<(Uuid, Uuid)>,
    auth: AuthContext,
) -> ApiResult<Json<Team>> {
    Ok(Json(
        state.teams.remove_member(&auth.user, team_id, user_id).await?,
    ))
}
