/// Configuration management for the API server
///
/// Loaded from environment variables; a `.env` file is honoured in development.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `JWT_SECRET`: Token signing secret (required, any non-empty value)
/// - `JWT_EXPIRATION_SECONDS`: Token lifetime (default: 86400)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: *)
/// - `PRODUCTION`: Enables production-only behaviour (default: false)
/// - `RUST_LOG`: Log filter (default: debug for tasktrack crates)
///
/// # Example
///
/// ```no_run
/// use tasktrack_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Production mode (restricts CORS, hides debug detail)
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Signing secret
    ///
    /// Base64 that decodes to 32+ bytes is used as the key directly; anything
    /// else is hashed into a 32-byte key. Generate with: `openssl rand -base64 32`
    pub secret: String,

    /// Token lifetime in seconds
    pub expiration_seconds: i64,
}

impl JwtConfig {
    /// Token lifetime; saturates at `Duration::MAX` for out-of-range values
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::try_seconds(self.expiration_seconds).unwrap_or(chrono::Duration::MAX)
    }
}

/// Parses `JWT_EXPIRATION_SECONDS`
///
/// The value must be positive and small enough that `now + ttl` is still a
/// representable timestamp.
fn parse_expiration(raw: &str) -> anyhow::Result<i64> {
    let seconds = raw
        .parse::<i64>()
        .context("JWT_EXPIRATION_SECONDS must be an integer")?;

    if seconds <= 0 {
        anyhow::bail!("JWT_EXPIRATION_SECONDS must be positive");
    }

    let ttl = chrono::Duration::try_seconds(seconds)
        .with_context(|| format!("JWT_EXPIRATION_SECONDS is out of range: {}", seconds))?;

    if chrono::Utc::now().checked_add_signed(ttl).is_none() {
        anyhow::bail!("JWT_EXPIRATION_SECONDS is too large: {}", seconds);
    }

    Ok(seconds)
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a numeric or
    /// boolean variable does not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let port = var_or("API_PORT", "8080")
            .parse::<u16>()
            .context("API_PORT must be a valid port number")?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = var_or("DATABASE_MAX_CONNECTIONS", "10")
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        let expiration_seconds = parse_expiration(&var_or("JWT_EXPIRATION_SECONDS", "86400"))?;

        let production = var_or("PRODUCTION", "false")
            .parse::<bool>()
            .context("PRODUCTION must be true or false")?;

        Ok(Self {
            api: ApiConfig {
                host: var_or("API_HOST", "0.0.0.0"),
                port,
                cors_origins: parse_origins(&var_or("CORS_ORIGINS", "*")),
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expiration_seconds,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
            },
            jwt: JwtConfig {
                secret: "short".to_string(),
                expiration_seconds: 3600,
            },
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(test_config().bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_jwt_ttl() {
        assert_eq!(test_config().jwt.ttl(), chrono::Duration::hours(1));
    }

    #[test]
    fn test_parse_expiration() {
        assert_eq!(parse_expiration("86400").unwrap(), 86400);

        for bad in ["0", "-5", "soon", "9223372036854775", "9223372036854775807"] {
            assert!(parse_expiration(bad).is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_out_of_range_ttl_saturates() {
        let mut config = test_config();
        config.jwt.expiration_seconds = i64::MAX;

        assert_eq!(config.jwt.ttl(), chrono::Duration::MAX);
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("https://a.example, https://b.example ,"),
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(parse_origins("*"), vec!["*"]);
    }
}
