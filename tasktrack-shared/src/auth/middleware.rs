/// Request authentication glue for Axum
///
/// The router's auth layer validates the bearer token, resolves the acting
/// user and inserts an [`AuthContext`] into the request extensions. Handlers
/// take `AuthContext` as an extractor and pass `auth.user` explicitly to the
/// services; nothing reads the identity from ambient state.
///
/// # Example
///
/// ```
/// use tasktrack_shared::auth::middleware::AuthContext;
///
/// async fn whoami(auth: AuthContext) -> String {
///     format!("Hello, {}!", auth.user.username)
/// }
/// ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::models::user::User;

/// Authenticated caller, added to request extensions by the auth layer
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Resolved acting user
    pub user: User,
}

impl AuthContext {
    pub fn new(user: User) -> Self {
        Self { user }
    }
}

/// Error type for request authentication
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization` header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Header present but not `Bearer <token>`
    #[error("{0}")]
    InvalidFormat(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::MissingCredentials => StatusCode::UNAUTHORIZED,
            AuthError::InvalidFormat(_) => StatusCode::BAD_REQUEST,
        };

        (status, self.to_string()).into_response()
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat("Authorization header is not valid UTF-8".to_string()))?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?
        .trim();

    if token.is_empty() {
        return Err(AuthError::InvalidFormat("Empty Bearer token".to_string()));
    }

    Ok(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::MissingCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
        assert_eq!(bearer_token(&HeaderMap::new()), Err(AuthError::MissingCredentials));
        assert!(matches!(
            bearer_token(&headers("Basic dXNlcjpwYXNz")),
            Err(AuthError::InvalidFormat(_))
        ));
        assert!(matches!(
            bearer_token(&headers("Bearer   ")),
            Err(AuthError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_auth_error_into_response() {
        let response = AuthError::MissingCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::InvalidFormat("test".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
