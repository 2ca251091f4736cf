// src/config.rs

use std::{env, fmt, net::SocketAddr, path::PathBuf};

use dotenvy::dotenv;

use crate::comments::policy::DeletePolicy;

/// Default lifetime of a session token (one day).
pub const DEFAULT_JWT_EXPIRATION: u64 = 60 * 60 * 24;

/// Default upload limit (5 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. `None` runs against the in-memory repository.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub bind_addr: SocketAddr,
    pub cors_origins: Vec<String>,

    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub admin_name: String,

    /// What happens to replies when their parent comment is deleted.
    pub comment_delete_policy: DeletePolicy,

    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,

    pub resend_api_key: Option<String>,
    pub contact_from: String,
    pub contact_to: Option<String>,
}

/// Raised when the environment cannot produce a usable `Config`.
#[derive(Debug)]
pub struct ConfigError(pub String);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "configuration error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let jwt_secret = required("JWT_SECRET")?;

        let jwt_expiration = parse_or("JWT_EXPIRATION", DEFAULT_JWT_EXPIRATION)?;

        let bind_addr = optional("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError(format!("BIND_ADDR: {}", e)))?;

        let cors_origins = optional("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://127.0.0.1:3000".to_string(),
                ]
            });

        let comment_delete_policy = match optional("COMMENT_DELETE_POLICY") {
            Some(raw) => raw
                .parse::<DeletePolicy>()
                .map_err(|e| ConfigError(format!("COMMENT_DELETE_POLICY: {}", e)))?,
            None => DeletePolicy::default(),
        };

        Ok(Self {
            database_url: optional("DATABASE_URL"),
            jwt_secret,
            jwt_expiration,
            rust_log: optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            bind_addr,
            cors_origins,
            admin_email: optional("ADMIN_EMAIL"),
            admin_password: optional("ADMIN_PASSWORD"),
            admin_name: optional("ADMIN_NAME").unwrap_or_else(|| "Admin".to_string()),
            comment_delete_policy,
            upload_dir: optional("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            resend_api_key: optional("RESEND_API_KEY"),
            contact_from: optional("CONTACT_FROM")
                .unwrap_or_else(|| "Portfolio <onboarding@resend.dev>".to_string()),
            contact_to: optional("CONTACT_TO"),
        })
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn required(key: &str) -> Result<String, ConfigError> {
    optional(key).ok_or_else(|| ConfigError(format!("{} must be set", key)))
}

fn parse_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match optional(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError(format!("{}: {}", key, e))),
        None => Ok(default),
    }
}
