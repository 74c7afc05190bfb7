//! Server configuration, read from command line flags or environment variables.

use std::{path::PathBuf, time::Duration};

use clap::{Parser, ValueEnum};

use crate::db::PoolConfig;

/// The origins that may always call the API from a browser.
pub const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://localhost:3000"];

/// The sender used for one-time code emails when none is configured.
pub const DEFAULT_EMAIL_FROM: &str = "Expense Tracker <onboarding@resend.dev>";

/// Selects defaults that differ between local development and deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Verbose logging.
    Debug,
    /// Info level logging.
    Release,
}

/// The REST API server for the expense tracker.
///
/// Every flag may also be set with the environment variable named in its help text.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// File path to the application SQLite database.
    #[arg(long, env = "DATABASE_PATH", default_value = "expense_tracker.db")]
    pub db_path: PathBuf,

    /// The port to serve the API from.
    #[arg(short, long, env = "BACKEND_PORT", default_value_t = 8080)]
    pub port: u16,

    /// The secret used to sign access tokens.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Extra origins allowed to make cross-origin requests, comma separated.
    #[arg(long, env = "CORS_ORIGIN", value_delimiter = ',')]
    pub cors_origin: Vec<String>,

    /// API key for the Resend email service. Password resets are disabled without it.
    #[arg(long, env = "RESEND_API_KEY", hide_env_values = true)]
    pub resend_api_key: Option<String>,

    /// The sender address for one-time code emails.
    #[arg(long, env = "EMAIL_FROM", default_value = DEFAULT_EMAIL_FROM)]
    pub email_from: String,

    /// Whether the server runs in debug or release mode.
    #[arg(long, env = "RUN_MODE", value_enum, default_value_t = RunMode::Debug)]
    pub mode: RunMode,

    /// The maximum number of pooled database connections.
    #[arg(long, env = "DB_POOL_MAX_SIZE", default_value_t = 10)]
    pub pool_max_size: u32,

    /// The number of idle database connections the pool keeps open.
    #[arg(long, env = "DB_POOL_MIN_IDLE", default_value_t = 2)]
    pub pool_min_idle: u32,

    /// File path for the debug log.
    #[arg(long, env = "LOG_PATH", default_value = "debug.log")]
    pub log_path: PathBuf,
}

impl Config {
    /// The default origins followed by any configured extras, without blanks or duplicates.
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins: Vec<String> = DEFAULT_CORS_ORIGINS
            .iter()
            .map(|origin| origin.to_string())
            .collect();

        for origin in &self.cors_origin {
            let origin = origin.trim();

            if !origin.is_empty() && !origins.iter().any(|existing| existing == origin) {
                origins.push(origin.to_owned());
            }
        }

        origins
    }

    /// The connection pool settings.
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            max_size: self.pool_max_size.max(1),
            min_idle: self.pool_min_idle.min(self.pool_max_size.max(1)),
            max_lifetime: Duration::from_secs(60 * 60),
            connection_timeout: Duration::from_secs(10),
        }
    }

    /// The API key for the email provider, if one was set to a non-blank value.
    pub fn email_api_key(&self) -> Option<&str> {
        self.resend_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}
