use std::env;
use std::fmt::Display;
use std::ops::RangeInclusive;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a number, got {value:?}")]
    Invalid { name: &'static str, value: String },
    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: String,
        min: String,
        max: String,
    },
    #[error("JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must differ")]
    SharedSecret,
}

/// Accepted access token lifetimes: one minute to one day.
const ACCESS_MINUTES: RangeInclusive<i64> = 1..=24 * 60;
/// Accepted refresh token lifetimes: one day to one year.
const REFRESH_DAYS: RangeInclusive<i64> = 1..=365;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_access_secret: String,
    pub jwt_refresh_secret: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
    /// Marks the refresh cookie `Secure`; set when `APP_ENV=production`.
    pub secure_cookies: bool,
    pub cors_origins: Vec<String>,
    pub static_files_path: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT", 8080)?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:expenses.db?mode=rwc".to_string()),
            jwt_access_secret: env::var("JWT_ACCESS_SECRET")
                .unwrap_or_else(|_| "development-access-secret-change-in-production".to_string()),
            jwt_refresh_secret: env::var("JWT_REFRESH_SECRET")
                .unwrap_or_else(|_| "development-refresh-secret-change-in-production".to_string()),
            access_token_minutes: parse_bounded_var("JWT_ACCESS_EXPIRES_MINUTES", 15, ACCESS_MINUTES)?,
            refresh_token_days: parse_bounded_var("JWT_REFRESH_EXPIRES_DAYS", 7, REFRESH_DAYS)?,
            secure_cookies: env::var("APP_ENV")
                .map(|v| v.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:5173,http://localhost:3000".to_string())
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            static_files_path: env::var("STATIC_FILES_PATH").ok(),
        };

        if config.jwt_access_secret == config.jwt_refresh_secret {
            return Err(ConfigError::SharedSecret);
        }

        Ok(config)
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

fn parse_bounded_var<T>(
    name: &'static str,
    default: T,
    range: RangeInclusive<T>,
) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Display,
{
    let value = parse_var(name, default)?;
    if !range.contains(&value) {
        return Err(ConfigError::OutOfRange {
            name,
            value: value.to_string(),
            min: range.start().to_string(),
            max: range.end().to_string(),
        });
    }
    Ok(value)
}

#[cfg(test)]
impl Config {
    /// Fixed configuration for tests; never touches the environment.
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: "sqlite::memory:".to_string(),
            jwt_access_secret: "test-access-secret".to_string(),
            jwt_refresh_secret: "test-refresh-secret".to_string(),
            access_token_minutes: 15,
            refresh_token_days: 7,
            secure_cookies: false,
            cors_origins: vec!["http://localhost:5173".to_string()],
            static_files_path: None,
        }
    }
}
