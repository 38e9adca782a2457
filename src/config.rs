// src/config.rs

use std::env;
use dotenvy::dotenv;

/// Admin bearer tokens live for a fixed seven days.
pub const ADMIN_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Placeholder shown in place of a soft-deleted comment's content.
pub const DELETED_COMMENT_PLACEHOLDER: &str = "[deleted comment]";

pub const COMMENT_MAX_CHARS: u64 = 500;
pub const AUTHOR_MAX_CHARS: u64 = 50;

#[derive(Debug, Clone)]
pub struct Config {
    /// When absent the server runs on the in-memory store.
    pub database_url: Option<String>,
    /// Signs and verifies admin bearer tokens.
    pub admin_jwt_secret: String,
    /// Verifies user session tokens issued by the sign-in layer.
    pub session_secret: String,
    pub rust_log: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub admin_name: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());

        let admin_jwt_secret = env::var("ADMIN_JWT_SECRET")
            .expect("ADMIN_JWT_SECRET must be set");

        let session_secret = env::var("SESSION_SECRET")
            .expect("SESSION_SECRET must be set");

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://127.0.0.1:3000".to_string(),
                ]
            });

        Self {
            database_url,
            admin_jwt_secret,
            session_secret,
            rust_log,
            port,
            cors_origins,
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            admin_name: env::var("ADMIN_NAME").unwrap_or_else(|_| "Admin".to_string()),
        }
    }
}
