/// Configuration management for Blog Service
///
/// Loads configuration from environment variables.
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const DEV_JWT_SECRET: &str = "development-only-secret-change-me-please";
const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Token signing
    pub auth: AuthConfig,
    /// Feed paging and caching
    pub feed: FeedConfig,
    /// Uploaded images
    pub media: MediaConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// HTTP port
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL, or `memory` for the in-process store
    pub url: String,
    /// Max connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Min connections in pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.url.eq_ignore_ascii_case("memory")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub posts_per_page: usize,
    pub cache_ttl_secs: u64,
    pub cache_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Directory images are written under
    pub root: String,
    pub max_upload_bytes: usize,
}

// Default values
fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    2
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app = AppConfig {
            env: lookup("APP_ENV").unwrap_or_else(|| "development".to_string()),
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 8000)?,
        };

        let database = DatabaseConfig {
            url: lookup("DATABASE_URL").context("DATABASE_URL environment variable not set")?,
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", default_max_connections())?,
            min_connections: parse_or(&lookup, "DB_MIN_CONNECTIONS", default_min_connections())?,
        };

        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) => secret,
            None if app.is_production() => bail!("JWT_SECRET must be set in production"),
            None => DEV_JWT_SECRET.to_string(),
        };
        if app.is_production() && jwt_secret.len() < MIN_PRODUCTION_SECRET_LEN {
            bail!(
                "JWT_SECRET must be at least {} bytes in production",
                MIN_PRODUCTION_SECRET_LEN
            );
        }
        let auth = AuthConfig {
            jwt_secret,
            token_ttl_hours: parse_or(&lookup, "JWT_TOKEN_TTL_HOURS", 24)?,
        };

        let feed = FeedConfig {
            posts_per_page: parse_or(&lookup, "POSTS_PER_PAGE", 10)?,
            cache_ttl_secs: parse_or(&lookup, "FEED_CACHE_TTL_SECS", 20)?,
            cache_enabled: parse_or(&lookup, "FEED_CACHE_ENABLED", true)?,
        };
        if feed.posts_per_page == 0 {
            bail!("POSTS_PER_PAGE must be greater than zero");
        }

        let media = MediaConfig {
            root: lookup("MEDIA_ROOT").unwrap_or_else(|| "./media".to_string()),
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", 5 * 1024 * 1024)?,
        };

        Ok(Config {
            app,
            database,
            auth,
            feed,
            media,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid value for {}: {:?} ({})", key, raw, e)),
        None => Ok(default),
    }
}
