/// Credential verification using Argon2id
///
/// The hashing algorithm is pluggable through the [`CredentialHasher`] trait.
/// [`Argon2Hasher`] is the production implementation.
///
/// # Security
///
/// - **Algorithm**: Argon2id
/// - **Memory**: 64 MB (65536 KB)
/// - **Iterations**: 3 passes
/// - **Parallelism**: 4 lanes
/// - **Output**: 32-byte hash
///
/// Verification never surfaces an error to the caller: a malformed stored
/// hash, an unsupported algorithm and a wrong password all read as "not
/// verified", so the result cannot be used as an oracle.
///
/// # Example
///
/// ```
/// use tasktrack_shared::auth::password::{Argon2Hasher, CredentialHasher};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hasher = Argon2Hasher::default();
/// let hash = hasher.hash("super_secret_password_123")?;
///
/// assert!(hasher.verify("super_secret_password_123", &hash));
/// assert!(!hasher.verify("wrong_password", &hash));
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Invalid hashing parameters
    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),
}

/// One-way password hash and comparison
pub trait CredentialHasher: Send + Sync {
    /// Hashes a plaintext password into a self-describing (PHC) string
    fn hash(&self, password: &str) -> Result<String, PasswordError>;

    /// Checks a plaintext password against a stored hash
    ///
    /// Returns `false` on mismatch and on any failure while verifying.
    fn verify(&self, password: &str, stored_hash: &str) -> bool;
}

/// Argon2id implementation of [`CredentialHasher`]
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Creates a hasher with custom cost parameters
    ///
    /// # Arguments
    ///
    /// * `m_cost` - Memory in KiB
    /// * `t_cost` - Number of passes
    /// * `p_cost` - Parallel lanes
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, PasswordError> {
        let params = Params::new(m_cost, t_cost, p_cost, Some(32))
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        // 64 MB, 3 iterations, 4 lanes, 32-byte output
        let params = Params::new(65536, 3, 4, Some(32)).unwrap_or_default();
        Self { params }
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

        Ok(password_hash.to_string())
    }

    fn verify(&self, password: &str, stored_hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(stored_hash) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::debug!(error = %e, "Stored password hash could not be parsed");
                return false;
            }
        };

        // Parameters come from the stored hash, not from `self.params`
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> Argon2Hasher {
        Argon2Hasher::with_params(4096, 1, 1).expect("valid params")
    }

    #[test]
    fn test_default_params_in_hash() {
        let hash = Argon2Hasher::default()
            .hash("test_password_123")
            .expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=65536"));
        assert!(hash.contains("t=3"));
        assert!(hash.contains("p=4"));
    }

    #[test]
    fn test_hash_produces_different_salts() {
        let hasher = fast_hasher();

        let hash1 = hasher.hash("same_password").unwrap();
        let hash2 = hasher.hash("same_password").unwrap();

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_correct_and_incorrect() {
        let hasher = fast_hasher();
        let hash = hasher.hash("correct_password").unwrap();

        assert!(hasher.verify("correct_password", &hash));
        assert!(!hasher.verify("wrong_password", &hash));
        assert!(!hasher.verify("", &hash));
    }

    #[test]
    fn test_verify_malformed_hash_is_not_an_error() {
        let hasher = fast_hasher();

        assert!(!hasher.verify("password", "invalid_hash"));
        assert!(!hasher.verify("password", "$argon2id$invalid"));
        assert!(!hasher.verify("password", ""));
    }

    #[test]
    fn test_verify_uses_params_from_hash() {
        let hash = fast_hasher().hash("unicode-密码-パスワード").unwrap();

        // A hasher with different params still verifies
        assert!(Argon2Hasher::default().verify("unicode-密码-パスワード", &hash));
    }

    #[test]
    fn test_invalid_params_rejected() {
        assert!(matches!(
            Argon2Hasher::with_params(1, 0, 0),
            Err(PasswordError::InvalidParams(_))
        ));
    }
}
