//! Admin login
//!
//! - POST /api/admin/auth - exchange the admin username/password for a JWT

use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::common::{error_response, json_response, parse_json_body, BoxError, ResponseBody};
use crate::auth::{AdminRole, TokenInput};
use crate::server::AppState;
use crate::types::AdminError;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AdminUser {
    pub username: String,
    pub role: AdminRole,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user: AdminUser,
    /// Token lifetime in seconds
    pub expires_in: u64,
}

/// POST /api/admin/auth
///
/// Any mismatch in username or password is a 401; a token is only issued
/// when both match the configured credential.
pub async fn handle_login<B>(req: Request<B>, state: &AppState) -> Response<ResponseBody>
where
    B: hyper::body::Body,
    B::Error: Into<BoxError>,
{
    let body: LoginRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(e),
    };

    if !state.credential.verify(&body.username, &body.password) {
        warn!(username = %body.username, "Admin login failed");
        state.audit.log_login(&body.username, false).await;
        return error_response(AdminError::Unauthorized("Invalid credentials".into()));
    }

    let token = match state.jwt.generate_token(TokenInput {
        username: body.username.clone(),
        role: AdminRole::Admin,
        permissions: None,
    }) {
        Ok(t) => t,
        Err(e) => return error_response(e),
    };

    info!(username = %body.username, "Admin logged in");
    state.audit.log_login(&body.username, true).await;

    json_response(
        StatusCode::OK,
        &LoginResponse {
            success: true,
            token,
            user: AdminUser {
                username: body.username,
                role: AdminRole::Admin,
            },
            expires_in: state.jwt.expiry_seconds(),
        },
    )
}
