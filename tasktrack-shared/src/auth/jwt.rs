/// Session token codec
///
/// Issues and validates stateless bearer tokens carrying a single identity
/// claim (the username). Tokens are never persisted and cannot be revoked;
/// expiry is the only invalidation mechanism.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: Configurable TTL, checked exactly (no leeway)
/// - **Validation**: Signature, expiration, and issuer checks
/// - **Key material**: Any non-empty secret is accepted (see [`TokenCodec::new`])
///
/// # Example
///
/// ```
/// use tasktrack_shared::auth::jwt::TokenCodec;
/// use chrono::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let codec = TokenCodec::new("not-a-very-good-secret", Duration::hours(24));
///
/// let token = codec.issue("alice")?;
/// assert!(codec.validate(&token));
/// assert_eq!(codec.subject_of(&token)?, "alice");
/// # Ok(())
/// # }
/// ```

use base64::{
    engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD},
    Engine as _,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Issuer claim written into every token
pub const ISSUER: &str = "tasktrack";

/// Minimum HS256 key length in bytes
const MIN_KEY_LEN: usize = 32;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Malformed, unsigned, tampered, or otherwise unacceptable token
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// JWT claims structure
///
/// - `sub`: Subject (username)
/// - `iss`: Issuer (always "tasktrack")
/// - `iat`: Issued at timestamp
/// - `exp`: Expiration timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Checks if the claims have expired relative to `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// Signs and verifies session tokens with a symmetric key
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Creates a codec from an operator-supplied secret
    ///
    /// If the secret decodes as base64 (standard or URL-safe, padded or not)
    /// to at least 32 bytes, the decoded bytes are the key. Otherwise the key
    /// is the SHA-256 digest of the raw secret. Derivation never fails.
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let key = derive_key(secret);

        Self {
            encoding_key: EncodingKey::from_secret(&key),
            decoding_key: DecodingKey::from_secret(&key),
            ttl,
        }
    }

    /// Configured token lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for `subject`, valid from now until now + TTL
    pub fn issue(&self, subject: &str) -> Result<String, JwtError> {
        self.issue_at(subject, Utc::now())
    }

    /// Issues a token as if the current time were `now`
    pub fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> Result<String, JwtError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| JwtError::CreateError("Token lifetime overflows the clock".to_string()))?;

        let claims = Claims {
            sub: subject.to_string(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
    }

    /// Returns true if the token has a valid signature and has not expired
    pub fn validate(&self, token: &str) -> bool {
        self.claims_of(token).is_ok()
    }

    /// Extracts the subject from a token that passes validation
    pub fn subject_of(&self, token: &str) -> Result<String, JwtError> {
        self.claims_of(token).map(|claims| claims.sub)
    }

    /// Verifies the token and returns its claims
    pub fn claims_of(&self, token: &str) -> Result<Claims, JwtError> {
        self.claims_at(token, Utc::now())
    }

    fn claims_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::InvalidToken(e.to_string()),
            })?;

        // The library tolerates exp == now
        if token_data.claims.is_expired_at(now) {
            return Err(JwtError::Expired);
        }

        Ok(token_data.claims)
    }
}

fn derive_key(secret: &str) -> Vec<u8> {
    for engine in [&STANDARD, &URL_SAFE, &STANDARD_NO_PAD, &URL_SAFE_NO_PAD] {
        if let Ok(bytes) = engine.decode(secret) {
            if bytes.len() >= MIN_KEY_LEN {
                return bytes;
            }
        }
    }

    Sha256::digest(secret.as_bytes()).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new("test-secret", Duration::hours(24))
    }

    #[test]
    fn test_issue_then_validate() {
        let codec = codec();
        let token = codec.issue("alice").unwrap();

        assert!(codec.validate(&token));
        assert_eq!(codec.subject_of(&token).unwrap(), "alice");

        let claims = codec.claims_of(&token).unwrap();
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = codec();
        let issued = Utc::now() - codec.ttl() - Duration::seconds(1);
        let token = codec.issue_at("alice", issued).unwrap();

        assert!(!codec.validate(&token));
        assert!(matches!(codec.subject_of(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_expiry_is_exact() {
        let codec = TokenCodec::new("test-secret", Duration::seconds(60));
        let issued = Utc::now() + Duration::seconds(600);
        let token = codec.issue_at("alice", issued).unwrap();
        let exp = issued + Duration::seconds(60);

        // jsonwebtoken's own exp check uses the real clock; this one uses `exp`
        assert!(matches!(codec.claims_at(&token, exp), Err(JwtError::Expired)));
        assert!(codec.claims_at(&token, exp - Duration::seconds(1)).is_ok());
    }

    #[test]
    fn test_oversized_ttl_is_an_error() {
        let codec = TokenCodec::new("secret", Duration::MAX);

        assert!(matches!(codec.issue("alice"), Err(JwtError::CreateError(_))));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = codec().issue("alice").unwrap();
        let other = TokenCodec::new("another-secret", Duration::hours(24));

        assert!(!other.validate(&token));
        assert!(matches!(other.subject_of(&token), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn test_malformed_and_tampered_tokens_rejected() {
        let codec = codec();
        assert!(!codec.validate(""));
        assert!(!codec.validate("not.a.jwt"));

        let token = codec.issue("alice").unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(r#"{"sub":"mallory","iss":"tasktrack","iat":0,"exp":9999999999}"#);
        parts[1] = &forged;

        assert!(!codec.validate(&parts.join(".")));
    }

    #[test]
    fn test_low_entropy_secret_derives_full_length_key() {
        assert_eq!(derive_key("x").len(), 32);
        assert_eq!(derive_key("x"), derive_key("x"));
        assert_ne!(derive_key("x"), derive_key("y"));

        let codec = TokenCodec::new("x", Duration::minutes(5));
        let token = codec.issue("bob").unwrap();
        assert_eq!(codec.subject_of(&token).unwrap(), "bob");
    }

    #[test]
    fn test_base64_secret_used_directly() {
        let raw = [7u8; 48];

        assert_eq!(derive_key(&STANDARD.encode(raw)), raw.to_vec());
        assert_eq!(derive_key(&URL_SAFE_NO_PAD.encode(raw)), raw.to_vec());

        // Decodes, but too short to be used as-is
        let short = STANDARD.encode([7u8; 16]);
        assert_eq!(derive_key(&short), Sha256::digest(short.as_bytes()).to_vec());
    }
}
