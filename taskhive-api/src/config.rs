/// Configuration management for the API server
///
/// Loads configuration from environment variables (a `.env` file is honored
/// in development via dotenvy).
///
/// # Environment Variables
///
/// - `API_HOST` / `API_PORT`: bind address (default 0.0.0.0:8080)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `JWT_SECRET`: token signing secret, at least 32 bytes (required)
/// - `ACCESS_TOKEN_TTL_MINUTES`: access token lifetime (default 15)
/// - `REFRESH_TOKEN_TTL_DAYS`: refresh token lifetime (default 7)
/// - `SUPER_ADMIN_EMAIL`: the single operator address gating user-admin
///   operations (default SuperAdmin@gmail.com)
/// - `CORS_ORIGINS`: comma-separated allowed origins, or `*` (default `*`)

use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `["*"]` enables permissive mode
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// JWT signing secret. Generate with `openssl rand -hex 32`.
    pub jwt_secret: String,

    /// Access token lifetime, minutes-scale
    pub access_ttl_minutes: i64,

    /// Refresh token lifetime, days-scale
    pub refresh_ttl_days: i64,

    /// The distinguished bootstrap operator address
    pub super_admin_email: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let access_ttl_minutes = env::var("ACCESS_TOKEN_TTL_MINUTES")
            .unwrap_or_else(|_| "15".to_string())
            .parse::<i64>()?;
        let refresh_ttl_days = env::var("REFRESH_TOKEN_TTL_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse::<i64>()?;

        let super_admin_email =
            env::var("SUPER_ADMIN_EMAIL").unwrap_or_else(|_| "SuperAdmin@gmail.com".to_string());

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            auth: AuthConfig {
                jwt_secret,
                access_ttl_minutes,
                refresh_ttl_days,
                super_admin_email,
            },
        })
    }

    /// Returns the server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_address() {
        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/taskhive".to_string(),
                max_connections: 10,
            },
            auth: AuthConfig {
                jwt_secret: "test-secret-key-at-least-32-bytes-long".to_string(),
                access_ttl_minutes: 15,
                refresh_ttl_days: 7,
                super_admin_email: "SuperAdmin@gmail.com".to_string(),
            },
        };

        assert_eq!(config.bind_address(), "127.0.0.1:3000");
    }
}
