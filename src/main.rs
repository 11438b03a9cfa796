//! MoodCycle admin API server

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use moodcycle_admin::{auth::hash_password, config::Args, server, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Hash helper for JEZA_PASSWORD_HASH
    if let Some(password) = &args.hash_password {
        let hash = hash_password(password).context("failed to hash password")?;
        println!("{hash}");
        return Ok(());
    }

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("moodcycle_admin={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  MoodCycle admin API");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Data directory: {}", args.data_dir.display());
    info!("Admin user: {}", args.admin_username);
    let limits = args.budget.limits();
    info!(
        "Budget limits: ${} daily, ${} weekly, ${} monthly",
        limits.daily, limits.weekly, limits.monthly
    );
    info!("======================================");

    if !args.data_dir.is_dir() {
        warn!(
            "Data directory {} does not exist - content routes will fail",
            args.data_dir.display()
        );
    }

    let audit_path = args.audit_log_path.clone();
    let state = AppState::new(args).context("failed to initialise application state")?;

    if let Some(path) = audit_path {
        if let Err(e) = state.audit.init_file(path.clone()).await {
            warn!("Audit log {} unavailable: {}", path.display(), e);
        }
    }

    server::run(Arc::new(state)).await?;
    Ok(())
}
