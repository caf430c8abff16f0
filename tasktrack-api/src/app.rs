/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tasktrack_api::{app::{build_router, AppState}, config::Config};
/// use tasktrack_shared::db::pool::{create_pool, PoolConfig};
/// use tasktrack_shared::store::postgres::PgStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(PoolConfig::new(config.database.url.clone())).await?;
/// let state = AppState::new(Arc::new(PgStore::new(pool)), config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, routes};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tasktrack_shared::{
    auth::{
        jwt::TokenCodec,
        middleware::{bearer_token, AuthContext},
        password::{Argon2Hasher, CredentialHasher},
    },
    error::ServiceError,
    services::{AuthService, TaskService, TeamService, UserService},
    store::Store,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request via Axum's `State` extractor; everything inside
/// is reference counted.
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend
    pub store: Arc<dyn Store>,

    pub auth: AuthService,
    pub users: UserService,
    pub teams: TeamService,
    pub tasks: TaskService,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates state with the production Argon2 parameters
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self::with_hasher(store, config, Arc::new(Argon2Hasher::default()))
    }

    /// Creates state with a custom credential hasher
    pub fn with_hasher(store: Arc<dyn Store>, config: Config, hasher: Arc<dyn CredentialHasher>) -> Self {
        let codec = TokenCodec::new(&config.jwt.secret, config.jwt.ttl());

        Self {
            auth: AuthService::new(store.clone(), codec, hasher.clone()),
            users: UserService::new(store.clone(), hasher),
            teams: TeamService::new(store.clone()),
            tasks: TaskService::new(store.clone()),
            store,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET /health                                   (public)
/// └── /v1/
///     ├── /auth/            POST register, login    (public)
///     ├── /users/me         GET, PATCH, DELETE
///     ├── /teams            POST, GET ?user_id=
///     │   └── /:team_id     GET, PATCH, DELETE
///     │       ├── /members            GET
///     │       ├── /members/:user_id   POST, DELETE
///     │       └── /tasks              GET
///     └── /tasks            POST, GET ?assignee_id=
///         └── /:task_id     GET, PATCH, DELETE
///             ├── /status             PATCH
///             └── /assignees/:user_id POST, DELETE
/// ```
///
/// Everything under `/v1` except `/auth` requires `Authorization: Bearer <token>`.
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let protected_routes = Router::new()
        .route(
            "/users/me",
            get(routes::users::get_profile)
                .patch(routes::users::update_profile)
                .delete(routes::users::delete_account),
        )
        .route(
            "/teams",
            post(routes::teams::create_team).get(routes::teams::list_teams),
        )
        .route(
            "/teams/:team_id",
            get(routes::teams::get_team)
                .patch(routes::teams::update_team)
                .delete(routes::teams::delete_team),
        )
        .route("/teams/:team_id/members", get(routes::teams::list_members))
        .route(
            "/teams/:team_id/members/:user_id",
            post(routes::teams::add_member).delete(routes::teams::remove_member),
        )
        .route("/teams/:team_id/tasks", get(routes::tasks::list_team_tasks))
        .route(
            "/tasks",
            post(routes::tasks::create_task).get(routes::tasks::list_tasks),
        )
        .route(
            "/tasks/:task_id",
            get(routes::tasks::get_task)
                .patch(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/tasks/:task_id/status", patch(routes::tasks::change_status))
        .route(
            "/tasks/:task_id/assignees/:user_id",
            post(routes::tasks::assign_user).delete(routes::tasks::unassign_user),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    let cors = if state.config.api.cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Bearer token authentication layer
///
/// Validates the token, resolves the acting user, and inserts an
/// [`AuthContext`] into the request extensions. A token whose subject no
/// longer exists is treated like an invalid token.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())?.to_string();

    let user = state.auth.authenticate(&token).await.map_err(|e| match e {
        ServiceError::NotFound(_) => {
            ApiError::Unauthorized("Token subject no longer exists".to_string())
        }
        other => ApiError::from(other),
    })?;

    req.extensions_mut().insert(AuthContext::new(user));

    Ok(next.run(req).await)
}
