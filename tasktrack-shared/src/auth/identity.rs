/// Identity resolver
///
/// Maps a validated token subject (a username) to the stored user. The
/// permission engine only ever sees the resolved snapshot, so a deleted user
/// loses all authority immediately even while their token is unexpired.

use crate::error::{ServiceError, ServiceResult};
use crate::models::user::User;
use crate::store::StoreTx;

/// Loads the user named by `subject`
///
/// # Errors
///
/// `ServiceError::NotFound` if no user has that username.
pub async fn resolve<T>(tx: &mut T, subject: &str) -> ServiceResult<User>
where
    T: StoreTx + ?Sized,
{
    match tx.find_user_by_username(subject).await? {
        Some(user) => Ok(user),
        None => {
            tracing::debug!(subject, "Token subject does not resolve to a user");
            Err(ServiceError::not_found("User"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::NewUser;
    use crate::store::{memory::MemoryStore, Store};

    #[tokio::test]
    async fn test_resolve_known_and_unknown_subject() {
        let store = MemoryStore::new();
        let alice = User::new(NewUser {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            display_name: None,
            password_hash: "hash".to_string(),
        });

        let mut tx = store.begin().await.unwrap();
        tx.insert_user(&alice).await.unwrap();

        assert_eq!(resolve(&mut *tx, "alice").await.unwrap().id, alice.id);
        assert!(matches!(
            resolve(&mut *tx, "ghost").await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
