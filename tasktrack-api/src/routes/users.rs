/// Profile endpoints for the authenticated user
///
/// - `GET /v1/users/me`
/// - `PATCH /v1/users/me`
/// - `DELETE /v1/users/me`

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tasktrack_shared::{auth::middleware::AuthContext, models::user::User, services::users::ProfileUpdate};
use uuid::Uuid;
use validator::Validate;

/// Public view of a user; never carries the password hash
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            display_name: user.display_name,
            roles: user.roles,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: Option<String>,

    #[validate(length(max = 100, message = "Display name must be at most 100 characters"))]
    pub display_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
}

pub async fn get_profile(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<UserResponse>> {
    let user = state.users.get_profile(&auth.user).await?;
    Ok(Json(user.into()))
}

/// Updates the caller's profile
///
/// Changing the username invalidates tokens issued under the old one.
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<UserResponse>> {
    req.validate()?;

    let user = state
        .users
        .update_profile(
            &auth.user,
            ProfileUpdate {
                username: req.username,
                display_name: req.display_name,
                email: req.email,
                password: req.password,
            },
        )
        .await?;

    Ok(Json(user.into()))
}

pub async fn delete_account(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<StatusCode> {
    state.users.delete_account(&auth.user).await?;
    Ok(StatusCode::NO_CONTENT)
}
