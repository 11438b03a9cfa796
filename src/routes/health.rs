//! Health check endpoint
//!
//! GET /api/health reports liveness plus build and budget information.
//! It never requires authentication and always answers 200 while the
//! process is serving.

use hyper::{Response, StatusCode};
use serde::Serialize;

use super::common::{json_response, ResponseBody};
use crate::budget::BudgetStatus;
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: VersionInfo,
    pub timestamp: String,
    /// "development" or "production"
    pub mode: &'static str,
    pub node_id: String,
    pub budget: BudgetStatus,
}

/// Build information captured by build.rs
#[derive(Serialize)]
pub struct VersionInfo {
    pub version: &'static str,
    pub commit: &'static str,
    pub commit_full: &'static str,
    pub build_time: &'static str,
}

impl VersionInfo {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
            commit_full: option_env!("GIT_COMMIT_FULL").unwrap_or("unknown"),
            build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        }
    }
}

pub async fn health_check(state: &AppState) -> Response<ResponseBody> {
    let response = HealthResponse {
        status: "healthy",
        version: VersionInfo::current(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        mode: if state.args.dev_mode {
            "development"
        } else {
            "production"
        },
        node_id: state.args.node_id.to_string(),
        budget: state.budget.status().await,
    };

    json_response(StatusCode::OK, &response)
}
