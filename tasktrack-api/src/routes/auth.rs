/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Create an account and get a token
/// - `POST /v1/auth/login` - Exchange credentials for a token

use crate::{app::AppState, error::ApiResult, routes::users::UserResponse};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tasktrack_shared::services::auth::{Registration, Session};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Defaults to the username
    #[validate(length(max = 100, message = "Display name must be at most 100 characters"))]
    pub display_name: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username or email address
    #[validate(length(min = 1, message = "Username or email is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token response shared by register and login
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,

    /// Always "Bearer"
    pub token_type: String,

    /// Token lifetime in seconds
    pub expires_in: i64,

    pub user: UserResponse,
}

impl AuthResponse {
    fn from_session(session: Session, state: &AppState) -> Self {
        Self {
            token: session.token,
            token_type: "Bearer".to_string(),
            expires_in: state.auth.codec().ttl().num_seconds(),
            user: session.user.into(),
        }
    }
}

/// Register a new user
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "email": "alice@example.com",
///   "password": "correct horse",
///   "display_name": "Alice"
/// }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: Username or email already taken
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    let session = state
        .auth
        .register(Registration {
            username: req.username,
            email: req.email,
            password: req.password,
            display_name: req.display_name,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse::from_session(session, &state)),
    ))
}

/// Login endpoint
///
/// ```text
/// POST /v1/auth/login
/// Content-Type: application/json
///
/// { "username": "alice@example.com", "password": "correct horse" }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown user or wrong password (indistinguishable)
/// - `422 Unprocessable Entity`: Validation failed
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let session = state.auth.login(&req.username, &req.password).await?;

    Ok(Json(AuthResponse::from_session(session, &state)))
}
