/// Configuration management for the API server
///
/// Configuration is read once from environment variables at startup. A
/// `.env` file is loaded first when present (development).
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Token signing secret, at least 32 characters (required)
/// - `JWT_EXPIRES_IN_HOURS`: Token lifetime (default: 168)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 5000)
/// - `CORS_ORIGIN`: Comma-separated allowed origins (default: `*`)
/// - `FRONTEND_URL`: Base URL for OAuth redirects (default: http://localhost:3000)
/// - `UPLOAD_DIR`: Directory for uploaded files (default: uploads)
/// - `MAX_UPLOAD_BYTES`: Request body limit (default: 10485760)
/// - `CONVERTER_URL`: External code converter endpoint (optional)
/// - `APP_ENV`: `production` enables HSTS and strict workflow listing
/// - `LOG_FORMAT`: `json` switches logs to JSON lines
///
/// # Example
///
/// ```no_run
/// use qconvert_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;

/// Minimum accepted length of `JWT_SECRET`
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Uploaded file storage
    pub storage: StorageConfig,

    /// External code converter
    pub converter: ConverterConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Frontend base URL used for OAuth redirects
    pub frontend_url: String,

    /// Production mode
    pub production: bool,

    /// Emit JSON log lines
    pub json_logs: bool,
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
    /// Secret key for JWT signing
    ///
    /// Must be at least 32 characters. Generate with `openssl rand -hex 32`.
    pub secret: String,

    /// Token lifetime in hours
    pub expires_in_hours: i64,
}

/// Upload storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding uploaded files
    pub upload_dir: String,

    /// Maximum request body size in bytes
    pub max_upload_bytes: usize,
}

/// Code converter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Endpoint of the converter service; unset means unconfigured
    pub url: Option<String>,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    /// - `JWT_SECRET` is shorter than 32 characters
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let api_host = var_or("API_HOST", "0.0.0.0");
        let api_port = var_or("API_PORT", "5000")
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("API_PORT is invalid: {}", e))?;

        let cors_origins = var_or("CORS_ORIGIN", "*")
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = var_or("DATABASE_MAX_CONNECTIONS", "10")
            .parse::<u32>()
            .map_err(|e| anyhow::anyhow!("DATABASE_MAX_CONNECTIONS is invalid: {}", e))?;

        let jwt_secret = lookup("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            anyhow::bail!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            );
        }

        let expires_in_hours = var_or("JWT_EXPIRES_IN_HOURS", "168")
            .parse::<i64>()
            .map_err(|e| anyhow::anyhow!("JWT_EXPIRES_IN_HOURS is invalid: {}", e))?;

        if expires_in_hours <= 0 {
            anyhow::bail!("JWT_EXPIRES_IN_HOURS must be positive");
        }

        let max_upload_bytes = var_or("MAX_UPLOAD_BYTES", "10485760")
            .parse::<usize>()
            .map_err(|e| anyhow::anyhow!("MAX_UPLOAD_BYTES is invalid: {}", e))?;

        let timeout_seconds = var_or("CONVERTER_TIMEOUT_SECONDS", "30")
            .parse::<u64>()
            .map_err(|e| anyhow::anyhow!("CONVERTER_TIMEOUT_SECONDS is invalid: {}", e))?;

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                frontend_url: var_or("FRONTEND_URL", "http://localhost:3000")
                    .trim_end_matches('/')
                    .to_string(),
                production: var_or("APP_ENV", "development").eq_ignore_ascii_case("production"),
                json_logs: var_or("LOG_FORMAT", "text").eq_ignore_ascii_case("json"),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expires_in_hours,
            },
            storage: StorageConfig {
                upload_dir: var_or("UPLOAD_DIR", "uploads"),
                max_upload_bytes,
            },
            converter: ConverterConfig {
                url: lookup("CONVERTER_URL").filter(|v| !v.trim().is_empty()),
                timeout_seconds,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Whether any origin may call the API
    pub fn allows_any_origin(&self) -> bool {
        self.api.cors_origins.iter().any(|o| o == "*")
    }
}
