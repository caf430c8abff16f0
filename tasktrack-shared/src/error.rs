/// Service error taxonomy
///
/// Every orchestrator returns [`ServiceError`]. Leaf errors convert into it
/// with `?`:
///
/// | Source                                 | Becomes        |
/// |----------------------------------------|----------------|
/// | `JwtError` (any)                       | `InvalidToken` |
/// | `AuthzError::Forbidden`                | `Forbidden`    |
/// | `StoreError::UniqueViolation`          | `Conflict`     |
/// | `StoreError::ForeignKeyViolation`      | `Conflict`     |
/// | `StoreError::Decode` / `Database`      | `Internal`     |
/// | `PasswordError`                        | `Internal`     |
/// | `UnknownVariant`                       | `BadRequest`   |
///
/// `Forbidden` carries no detail so that callers cannot tell which rule
/// denied them.

use crate::auth::{authorization::AuthzError, jwt::JwtError, password::PasswordError};
use crate::models::UnknownVariant;
use crate::store::StoreError;

/// Result alias for service calls
pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Bad credentials
    #[error("Invalid username or password")]
    Unauthorized,

    /// Malformed, tampered, or expired token
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Referenced entity does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Authenticated but not entitled
    #[error("Not authorized to perform this operation")]
    Forbidden,

    /// Duplicate or dangling reference
    #[error("{0}")]
    Conflict(String),

    /// Unparseable input value
    #[error("{0}")]
    BadRequest(String),

    /// Unexpected lower-layer failure; detail is for logs only
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(what: &str) -> Self {
        ServiceError::NotFound(what.to_string())
    }
}

impl From<JwtError> for ServiceError {
    fn from(err: JwtError) -> Self {
        tracing::debug!(error = %err, "Token rejected");
        ServiceError::InvalidToken
    }
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Forbidden => ServiceError::Forbidden,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(constraint) => ServiceError::Conflict(match constraint.as_str() {
                "users_username_key" => "Username is already taken".to_string(),
                "users_email_key" => "Email is already in use".to_string(),
                other => format!("Duplicate value violates {}", other),
            }),
            StoreError::ForeignKeyViolation(constraint) => ServiceError::Conflict(match constraint.as_str() {
                "tasks_team_id_fkey" => "Referenced team does not exist or still has tasks".to_string(),
                "teams_admin_id_fkey" => "User still administers a team".to_string(),
                "tasks_creator_id_fkey" => "User still owns tasks".to_string(),
                other => format!("Reference violates {}", other),
            }),
            StoreError::Decode(msg) => ServiceError::Internal(msg),
            StoreError::Database(e) => ServiceError::Internal(e.to_string()),
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<UnknownVariant> for ServiceError {
    fn from(err: UnknownVariant) -> Self {
        ServiceError::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_conflict() {
        let err: ServiceError = StoreError::UniqueViolation("users_email_key".to_string()).into();
        assert!(matches!(err, ServiceError::Conflict(ref msg) if msg.contains("Email")));

        let err: ServiceError = StoreError::ForeignKeyViolation("tasks_team_id_fkey".to_string()).into();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let err: ServiceError = StoreError::Decode("bad row".to_string()).into();
        assert!(matches!(err, ServiceError::Internal(_)));
    }

    #[test]
    fn test_forbidden_is_uniform() {
        let err: ServiceError = AuthzError::Forbidden.into();
        assert_eq!(err.to_string(), "Not authorized to perform this operation");
    }

    #[test]
    fn test_unknown_variant_is_bad_request() {
        let err: ServiceError = "URGENT"
            .parse::<crate::models::task::Priority>()
            .unwrap_err()
            .into();
        assert!(matches!(err, ServiceError::BadRequest(ref msg) if msg.contains("URGENT")));
    }
}
