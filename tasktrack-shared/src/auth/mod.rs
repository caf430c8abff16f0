/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: credential verifier (Argon2id behind [`password::CredentialHasher`])
/// - [`jwt`]: session token codec
/// - [`identity`]: token subject to user resolution
/// - [`authorization`]: the permission engine
/// - [`middleware`]: Axum request glue (`AuthContext`, bearer extraction)
///
/// # Example
///
/// ```
/// use tasktrack_shared::auth::jwt::TokenCodec;
/// use tasktrack_shared::auth::password::{Argon2Hasher, CredentialHasher};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hasher = Argon2Hasher::with_params(4096, 1, 1)?;
/// let hash = hasher.hash("user_password")?;
/// assert!(hasher.verify("user_password", &hash));
///
/// let codec = TokenCodec::new("secret", chrono::Duration::hours(1));
/// let token = codec.issue("alice")?;
/// assert_eq!(codec.subject_of(&token)?, "alice");
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod identity;
pub mod jwt;
pub mod middleware;
pub mod password;
