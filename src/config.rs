// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Attempts scoring below this overall score mark a scenario for remediation.
pub const REMEDIATION_THRESHOLD: f64 = 7.0;

/// Upper bound of every score in the system (attempt, category, specialty).
pub const MAX_SCORE: f64 = 10.0;

/// Default page size for the ranking endpoint.
pub const DEFAULT_RANKING_LIMIT: i64 = 5;

/// Default number of practice recommendations.
pub const DEFAULT_RECOMMENDATION_LIMIT: i64 = 3;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let admin_username = env::var("ADMIN_USERNAME").ok();
        let admin_password = env::var("ADMIN_PASSWORD").ok();

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            admin_username,
            admin_password,
        }
    }
}
