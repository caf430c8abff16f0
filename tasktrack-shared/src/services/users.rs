/// Self-service profile management
///
/// Every call acts on the caller's own account; there is no way to address
/// another user here.

use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use super::access;
use crate::auth::password::CredentialHasher;
use crate::error::{ServiceError, ServiceResult};
use crate::models::user::User;
use crate::store::Store;

/// Partial profile update; only `Some` fields are applied
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,

    /// Plaintext; re-hashed before storing
    pub password: Option<String>,
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
    hasher: Arc<dyn CredentialHasher>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { store, hasher }
    }

    /// Current snapshot of the caller's account
    pub async fn get_profile(&self, actor: &User) -> ServiceResult<User> {
        let mut tx = self.store.begin().await?;
        let user = access::load_user(&mut *tx, actor.id).await?;

        Ok(user)
    }

    /// Updates the caller's account
    ///
    /// A changed username leaves previously issued tokens pointing at the
    /// old name; they stop resolving.
    pub async fn update_profile(&self, actor: &User, update: ProfileUpdate) -> ServiceResult<User> {
        let password_hash = match &update.password {
            Some(password) => Some(self.hasher.hash(password)?),
            None => None,
        };

        let mut tx = self.store.begin().await?;
        let mut user = access::load_user(&mut *tx, actor.id).await?;

        if let Some(username) = update.username {
            if username != user.username {
                if tx.find_user_by_username(&username).await?.is_some() {
                    return Err(ServiceError::Conflict("Username is already taken".to_string()));
                }
                user.username = username;
            }
        }

        if let Some(email) = update.email {
            if email != user.email {
                if tx.find_user_by_email(&email).await?.is_some() {
                    return Err(ServiceError::Conflict("Email is already in use".to_string()));
                }
                user.email = email;
            }
        }

        if let Some(display_name) = update.display_name {
            user.display_name = display_name;
        }

        if let Some(password_hash) = password_hash {
            user.password_hash = password_hash;
        }

        user.updated_at = Utc::now();
        tx.update_user(&user).await?;
        tx.commit().await?;

        info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }

    /// Deletes the caller's account
    ///
    /// # Errors
    ///
    /// `Conflict` while the user still administers a team or has created tasks.
    pub async fn delete_account(&self, actor: &User) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;

        if !tx.delete_user(actor.id).await? {
            return Err(ServiceError::not_found("User"));
        }
        tx.commit().await?;

        info!(user_id = %actor.id, "Account deleted");
        Ok(())
    }
}
