/// Login, registration, and token-based authentication
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tasktrack_shared::auth::{jwt::TokenCodec, password::Argon2Hasher};
/// use tasktrack_shared::services::auth::{AuthService, Registration};
/// use tasktrack_shared::store::memory::MemoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let auth = AuthService::new(
///     Arc::new(MemoryStore::new()),
///     TokenCodec::new("secret", chrono::Duration::hours(1)),
///     Arc::new(Argon2Hasher::with_params(4096, 1, 1)?),
/// );
///
/// auth.register(Registration {
///     username: "alice".to_string(),
///     email: "alice@example.com".to_string(),
///     password: "correct horse".to_string(),
///     display_name: None,
/// })
/// .await?;
///
/// let session = auth.login("alice@example.com", "correct horse").await?;
/// assert_eq!(auth.authenticate(&session.token).await?.username, "alice");
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::access::{self, Authorized};
use crate::auth::{authorization::Operation, identity, jwt::TokenCodec, password::CredentialHasher};
use crate::error::{ServiceError, ServiceResult};
use crate::models::user::{NewUser, User};
use crate::store::Store;

/// Input for account registration
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,

    /// Plaintext; hashed before it reaches the store
    pub password: String,

    pub display_name: Option<String>,
}

/// Issued token and the user it was issued for
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    codec: TokenCodec,
    hasher: Arc<dyn CredentialHasher>,

    /// Verified against when the login names no account, so that unknown
    /// and known accounts cost the same hash check
    dummy_hash: Arc<str>,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, codec: TokenCodec, hasher: Arc<dyn CredentialHasher>) -> Self {
        let dummy_hash = hasher.hash("tasktrack-dummy-password").unwrap_or_else(|e| {
            warn!(error = %e, "Failed to prepare dummy password hash");
            String::new()
        });

        Self {
            store,
            codec,
            hasher,
            dummy_hash: dummy_hash.into(),
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    fn issue(&self, user: User) -> ServiceResult<Session> {
        let token = self
            .codec
            .issue(&user.username)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;

        Ok(Session { token, user })
    }

    /// Authenticates by username or email
    ///
    /// Unknown accounts and wrong passwords are indistinguishable. The token
    /// subject is always the stored username.
    pub async fn login(&self, username_or_email: &str, password: &str) -> ServiceResult<Session> {
        let mut tx = self.store.begin().await?;

        let user = match tx.find_user_by_username(username_or_email).await? {
            Some(user) => Some(user),
            None => tx.find_user_by_email(username_or_email).await?,
        };
        drop(tx);

        let verified = match &user {
            Some(user) => self.hasher.verify(password, &user.password_hash),
            None => {
                self.hasher.verify(password, &self.dummy_hash);
                false
            }
        };

        let user = match user {
            Some(user) if verified => user,
            _ => {
                warn!(login = username_or_email, "Failed login attempt");
                return Err(ServiceError::Unauthorized);
            }
        };

        info!(user_id = %user.id, "User logged in");
        self.issue(user)
    }

    /// Creates an account and returns a token for it
    pub async fn register(&self, registration: Registration) -> ServiceResult<Session> {
        let password_hash = self.hasher.hash(&registration.password)?;
        let mut tx = self.store.begin().await?;

        if tx.find_user_by_username(&registration.username).await?.is_some() {
            return Err(ServiceError::Conflict("Username is already taken".to_string()));
        }
        if tx.find_user_by_email(&registration.email).await?.is_some() {
            return Err(ServiceError::Conflict("Email is already in use".to_string()));
        }

        let user = User::new(NewUser {
            username: registration.username,
            email: registration.email,
            display_name: registration.display_name,
            password_hash,
        });

        tx.insert_user(&user).await?;
        tx.commit().await?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        self.issue(user)
    }

    /// Validates a token and resolves its subject
    ///
    /// # Errors
    ///
    /// `InvalidToken` for a bad or expired token, `NotFound` if the subject
    /// no longer exists.
    pub async fn authenticate(&self, token: &str) -> ServiceResult<User> {
        let subject = self.codec.subject_of(token)?;

        let mut tx = self.store.begin().await?;
        let user = identity::resolve(&mut *tx, &subject).await?;

        Ok(user)
    }

    /// Authenticates `token` and checks `operation` on `entity_id`
    ///
    /// Returns the acting user on success. Failures are `InvalidToken`,
    /// `NotFound` (actor, entity, or named user), or `Forbidden`.
    pub async fn authorize(&self, token: &str, operation: Operation, entity_id: Uuid) -> ServiceResult<User> {
        let actor = self.authenticate(token).await?;

        let mut tx = self.store.begin().await?;
        let _: Authorized = access::authorize(&mut *tx, actor.id, &operation, entity_id).await?;

        Ok(actor)
    }
}
