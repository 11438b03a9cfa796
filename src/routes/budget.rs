//! Budget endpoints
//!
//! - GET  /api/admin/budget        - spend per window
//! - POST /api/admin/budget/check  - `{estimatedCost?}` admission decision
//! - POST /api/admin/budget/usage  - `{deviceId?, usage}` record actual spend
//! - POST /api/admin/budget/reset  - zero all windows (`budget` permission)

use hyper::{Request, Response};
use serde::{Deserialize, Serialize};

use super::common::{error_response, parse_json_body, success_response, BoxError, ResponseBody};
use crate::auth::{require_admin, require_permission, PERMISSION_BUDGET};
use crate::budget::{mask_device_id, BudgetAlert, BudgetLimits, BudgetStatus, CostBreakdown, TokenUsage};
use crate::server::AppState;
use crate::types::AdminError;

type Outcome = Result<Response<ResponseBody>, AdminError>;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckRequest {
    #[serde(default)]
    estimated_cost: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageRequest {
    #[serde(default)]
    device_id: Option<String>,
    #[serde(default)]
    usage: TokenUsage,
}

#[derive(Serialize)]
struct StatusBody {
    limits: BudgetLimits,
    #[serde(flatten)]
    status: BudgetStatus,
}

#[derive(Serialize)]
struct UsageTracked {
    cost: CostBreakdown,
    alerts: Vec<BudgetAlert>,
}

async fn status_body(state: &AppState) -> StatusBody {
    StatusBody {
        limits: state.budget.limits().await,
        status: state.budget.status().await,
    }
}

pub async fn get_status<B>(req: Request<B>, state: &AppState) -> Response<ResponseBody> {
    if let Err(e) = require_admin(req.headers(), &state.jwt) {
        return error_response(e);
    }
    success_response(&status_body(state).await)
}

pub async fn check_request<B>(req: Request<B>, state: &AppState) -> Response<ResponseBody>
where
    B: hyper::body::Body,
    B::Error: Into<BoxError>,
{
    check(req, state).await.unwrap_or_else(error_response)
}

async fn check<B>(req: Request<B>, state: &AppState) -> Outcome
where
    B: hyper::body::Body,
    B::Error: Into<BoxError>,
{
    require_admin(req.headers(), &state.jwt)?;
    let body: CheckRequest = parse_json_body(req).await?;

    if let Some(cost) = body.estimated_cost {
        if !(cost.is_finite() && cost >= 0.0) {
            return Err(AdminError::BadRequest(
                "estimatedCost must be a non-negative number".into(),
            ));
        }
    }

    let decision = state.budget.can_make_request(body.estimated_cost).await;
    Ok(success_response(&decision))
}

pub async fn track_usage<B>(req: Request<B>, state: &AppState) -> Response<ResponseBody>
where
    B: hyper::body::Body,
    B::Error: Into<BoxError>,
{
    track(req, state).await.unwrap_or_else(error_response)
}

async fn track<B>(req: Request<B>, state: &AppState) -> Outcome
where
    B: hyper::body::Body,
    B::Error: Into<BoxError>,
{
    require_admin(req.headers(), &state.jwt)?;
    let body: UsageRequest = parse_json_body(req).await?;

    let cost = state.budget.calculate_cost(&body.usage);
    let device_id = body.device_id.as_deref();
    let alerts = state.budget.track_usage(device_id, &cost).await;
    state
        .audit
        .log_budget_usage(&mask_device_id(device_id), cost.dollar_cost, alerts.len())
        .await;

    Ok(success_response(&UsageTracked { cost, alerts }))
}

pub async fn reset<B>(req: Request<B>, state: &AppState) -> Response<ResponseBody> {
    let claims = match require_admin(req.headers(), &state.jwt)
        .and_then(|claims| require_permission(&claims, PERMISSION_BUDGET).map(|_| claims))
    {
        Ok(c) => c,
        Err(e) => return error_response(e),
    };

    state.budget.reset().await;
    state.audit.log_budget_reset(&claims.username).await;
    success_response(&status_body(state).await)
}
