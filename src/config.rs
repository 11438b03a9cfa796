//! Configuration for the admin API
//!
//! CLI arguments and environment variable handling using clap.
//! Every flag can also be set from the environment (or a `.env` file).

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use uuid::Uuid;

use crate::budget::BudgetLimits;

/// Secret used when DEV_MODE is on and no JWT_SECRET is configured
pub const DEV_JWT_SECRET: &str = "dev-mode-secret-not-for-production-use-123456";

/// MoodCycle admin API
///
/// Serves the content files edited from the admin panel and the budget
/// status of the companion chat service.
#[derive(Parser, Debug, Clone)]
#[command(name = "moodcycle-admin")]
#[command(about = "Content admin API for MoodCycle")]
pub struct Args {
    /// Unique node identifier for this instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:4000")]
    pub listen: SocketAddr,

    /// Directory holding the JSON content documents
    #[arg(long, env = "DATA_DIR", default_value = "api/src/data")]
    pub data_dir: PathBuf,

    /// Username of the single admin account
    #[arg(long, env = "ADMIN_USERNAME", default_value = "jeza")]
    pub admin_username: String,

    /// Plaintext admin password
    #[arg(long, env = "JEZA_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    /// Argon2 PHC hash of the admin password (takes precedence over JEZA_PASSWORD)
    #[arg(long, env = "JEZA_PASSWORD_HASH", hide_env_values = true)]
    pub admin_password_hash: Option<String>,

    /// JWT secret for token signing (required in production)
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// JWT token expiry in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "86400")]
    pub jwt_expiry_seconds: u64,

    /// Enable development mode (fixed dev JWT secret when none is set)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Append admin audit events as JSONL to this file
    #[arg(long, env = "AUDIT_LOG_PATH")]
    pub audit_log_path: Option<PathBuf>,

    /// Budget limits for the chat service
    #[command(flatten)]
    pub budget: BudgetArgs,

    /// Print an Argon2 hash of the given password and exit
    #[arg(long, value_name = "PASSWORD")]
    pub hash_password: Option<String>,
}

/// Spend limits in dollars
#[derive(Parser, Debug, Clone)]
pub struct BudgetArgs {
    /// Daily spend limit
    #[arg(long, env = "DAILY_BUDGET_LIMIT", default_value = "10")]
    pub daily_budget_limit: f64,

    /// Weekly spend limit
    #[arg(long, env = "WEEKLY_BUDGET_LIMIT", default_value = "50")]
    pub weekly_budget_limit: f64,

    /// Monthly spend limit
    #[arg(long, env = "MONTHLY_BUDGET_LIMIT", default_value = "150")]
    pub monthly_budget_limit: f64,
}

impl BudgetArgs {
    pub fn limits(&self) -> BudgetLimits {
        BudgetLimits {
            daily: self.daily_budget_limit,
            weekly: self.weekly_budget_limit,
            monthly: self.monthly_budget_limit,
        }
    }
}

impl Args {
    /// Effective JWT secret (dev secret only in dev mode)
    pub fn jwt_secret(&self) -> Option<String> {
        match &self.jwt_secret {
            Some(secret) => Some(secret.clone()),
            None if self.dev_mode => Some(DEV_JWT_SECRET.to_string()),
            None => None,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.jwt_secret.is_none() {
            return Err("JWT_SECRET is required in production mode".to_string());
        }

        if self.admin_username.trim().is_empty() {
            return Err("ADMIN_USERNAME must not be empty".to_string());
        }

        if self.jwt_expiry_seconds == 0 {
            return Err("JWT_EXPIRY_SECONDS must be greater than zero".to_string());
        }

        let limits = self.budget.limits();
        for (name, limit) in [
            ("DAILY_BUDGET_LIMIT", limits.daily),
            ("WEEKLY_BUDGET_LIMIT", limits.weekly),
            ("MONTHLY_BUDGET_LIMIT", limits.monthly),
        ] {
            if !(limit.is_finite() && limit > 0.0) {
                return Err(format!("{name} must be a positive number"));
            }
        }

        Ok(())
    }

    /// Arguments for tests: dev mode, given data directory, known credentials
    pub fn for_tests(data_dir: PathBuf) -> Self {
        let data_dir = data_dir.to_string_lossy().into_owned();
        Self::parse_from([
            "moodcycle-admin",
            "--dev-mode",
            "--data-dir",
            data_dir.as_str(),
            "--admin-password",
            "moon-phase-password",
            "--jwt-secret",
            "test-secret-that-is-at-least-32-characters-long",
        ])
    }
}
