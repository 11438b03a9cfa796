//! Content endpoints of the admin panel
//!
//! - GET  /api/admin/insights                      - all insights with record count
//! - POST /api/admin/insights                      - `{insightId, variants}` or `{insights: [...]}`
//! - POST /api/admin/insights/bulk                 - `{insights: [...]}`
//! - GET  /api/admin/phases, POST /api/admin/phases
//! - GET  /api/admin/closings, POST /api/admin/closings
//! - GET  /api/admin/vignettes, POST /api/admin/vignettes
//! - GET  /api/admin/vignettes/{phase}/{persona}
//!
//! Every route requires an admin Bearer token.

use hyper::{Request, Response};
use serde::Serialize;
use serde_json::{json, Value};

use super::common::{error_response, parse_json_body, success_response, BoxError, ResponseBody};
use crate::auth::{require_admin, Claims};
use crate::server::AppState;
use crate::store::Collection;
use crate::types::AdminError;

/// Result of one of the save handlers
type Outcome = Result<Response<ResponseBody>, AdminError>;

fn respond(outcome: Outcome) -> Response<ResponseBody> {
    outcome.unwrap_or_else(error_response)
}

/// Authenticate, then read the JSON body
async fn authorized_body<B>(req: Request<B>, state: &AppState) -> Result<(Claims, Value), AdminError>
where
    B: hyper::body::Body,
    B::Error: Into<BoxError>,
{
    let claims = require_admin(req.headers(), &state.jwt)?;
    let body = parse_json_body(req).await?;
    Ok((claims, body))
}

/// The wrapped payload (`{"phases": {...}}`) or the body itself
fn unwrap_payload(body: Value, key: &str) -> Value {
    match body {
        Value::Object(mut map) if map.get(key).is_some_and(Value::is_object) => {
            map.remove(key).unwrap_or(Value::Null)
        }
        other => other,
    }
}

pub async fn get_insights<B>(req: Request<B>, state: &AppState) -> Response<ResponseBody> {
    respond(load_insights(req, state).await)
}

async fn load_insights<B>(req: Request<B>, state: &AppState) -> Outcome {
    require_admin(req.headers(), &state.jwt)?;
    let view = state.content.get_insights().await?;
    Ok(success_response(&view))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VariantsSaved {
    insight_id: String,
    insight: Value,
}

/// POST /api/admin/insights
pub async fn save_insights<B>(req: Request<B>, state: &AppState) -> Response<ResponseBody>
where
    B: hyper::body::Body,
    B::Error: Into<BoxError>,
{
    respond(store_insights(req, state).await)
}

async fn store_insights<B>(req: Request<B>, state: &AppState) -> Outcome
where
    B: hyper::body::Body,
    B::Error: Into<BoxError>,
{
    let (claims, body) = authorized_body(req, state).await?;

    let Some(id) = body.get("insightId") else {
        return bulk_save(&claims, &body, state).await;
    };

    let id = id
        .as_str()
        .ok_or_else(|| AdminError::BadRequest("insightId must be a string".into()))?;
    let variants = body
        .get("variants")
        .ok_or_else(|| AdminError::BadRequest("variants is required".into()))?;

    let insight = state.content.save_insight_variants(id, variants).await?;
    state
        .audit
        .log_saved(Collection::Insights, &claims.username, json!({"insightId": id}))
        .await;

    Ok(success_response(&VariantsSaved {
        insight_id: id.to_string(),
        insight,
    }))
}

/// POST /api/admin/insights/bulk
pub async fn save_insights_bulk<B>(req: Request<B>, state: &AppState) -> Response<ResponseBody>
where
    B: hyper::body::Body,
    B::Error: Into<BoxError>,
{
    let outcome = match authorized_body(req, state).await {
        Ok((claims, body)) => bulk_save(&claims, &body, state).await,
        Err(e) => Err(e),
    };
    respond(outcome)
}

async fn bulk_save(claims: &Claims, body: &Value, state: &AppState) -> Outcome {
    let records = body
        .get("insights")
        .ok_or_else(|| AdminError::BadRequest("insights is required".into()))?;

    let summary = state
        .content
        .save_all_insights(records, &claims.username)
        .await?;
    state
        .audit
        .log_saved(
            Collection::Insights,
            &claims.username,
            json!({"updated": summary.updated, "notFound": summary.not_found.len()}),
        )
        .await;

    Ok(success_response(&summary))
}

/// GET for phases, closings and vignettes
pub async fn get_document<B>(
    req: Request<B>,
    state: &AppState,
    collection: Collection,
) -> Response<ResponseBody> {
    respond(load_document(req, state, collection).await)
}

async fn load_document<B>(req: Request<B>, state: &AppState, collection: Collection) -> Outcome {
    require_admin(req.headers(), &state.jwt)?;
    let document = match collection {
        Collection::Phases => state.content.get_phases().await?,
        Collection::Closings => state.content.get_closings().await?,
        Collection::Vignettes => state.content.get_vignettes().await?,
        Collection::Insights => state.content.get_insights().await?.insights,
    };
    Ok(success_response(&document))
}

/// POST for phases, closings and vignettes
pub async fn save_document<B>(
    req: Request<B>,
    state: &AppState,
    collection: Collection,
) -> Response<ResponseBody>
where
    B: hyper::body::Body,
    B::Error: Into<BoxError>,
{
    respond(store_document(req, state, collection).await)
}

async fn store_document<B>(req: Request<B>, state: &AppState, collection: Collection) -> Outcome
where
    B: hyper::body::Body,
    B::Error: Into<BoxError>,
{
    let (claims, body) = authorized_body(req, state).await?;
    let payload = unwrap_payload(body, &collection.to_string());
    let keys = payload.as_object().map(|m| m.len()).unwrap_or(0);

    let merged = match collection {
        Collection::Phases => state.content.save_phases(&payload).await?,
        Collection::Closings => state.content.save_closings(&payload).await?,
        Collection::Vignettes => state.content.save_vignettes(&payload).await?,
        Collection::Insights => {
            return Err(AdminError::Internal(
                "insights are saved through the insights routes".into(),
            ))
        }
    };
    state
        .audit
        .log_saved(collection, &claims.username, json!({"keys": keys}))
        .await;

    Ok(success_response(&merged))
}

#[derive(Serialize)]
struct PersonaVignettes<'a> {
    phase: &'a str,
    persona: &'a str,
    vignettes: Value,
}

/// GET /api/admin/vignettes/{phase}/{persona}
pub async fn get_vignettes_for<B>(
    req: Request<B>,
    state: &AppState,
    phase: &str,
    persona: &str,
) -> Response<ResponseBody> {
    respond(load_vignettes_for(req, state, phase, persona).await)
}

async fn load_vignettes_for<B>(
    req: Request<B>,
    state: &AppState,
    phase: &str,
    persona: &str,
) -> Outcome {
    require_admin(req.headers(), &state.jwt)?;
    let vignettes = state.content.get_vignettes_for(phase, persona).await?;
    Ok(success_response(&PersonaVignettes {
        phase,
        persona,
        vignettes,
    }))
}
